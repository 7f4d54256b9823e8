//! Request identity, resolved upstream and passed in headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{Actor, Role};

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role. Absent means `user`.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The acting identity of a request.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl Identity {
    /// Fails with `Forbidden` unless the identity is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)?
            .ok_or_else(|| ApiError::Unauthenticated(format!("{USER_ID_HEADER} is required")))?;
        let user_id = uuid::Uuid::parse_str(user_id)
            .map(UserId::from_uuid)
            .map_err(|e| ApiError::Unauthenticated(format!("{USER_ID_HEADER}: {e}")))?;

        let role = match header(parts, USER_ROLE_HEADER)? {
            Some(role) => role
                .parse::<Role>()
                .map_err(|e| ApiError::Unauthenticated(e.to_string()))?,
            None => Role::default(),
        };

        Ok(Identity(Actor::new(user_id, role)))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    parts
        .headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ApiError::Unauthenticated(format!("{name} is not text")))
        })
        .transpose()
}
