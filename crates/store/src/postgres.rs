use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    CartId, CartItemId, CartStatus, ItemId, OrderId, OrderStatus, PantryId, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Cart, CartItem, CartRepository, Item, ItemRepository, Order, OrderQuery, OrderRepository,
    Result, StoreError,
};

const ITEM_COLUMNS: &str = "id, pantry_id, name, quantity, low_stock_threshold, unit, is_available, created_at, updated_at";
const CART_COLUMNS: &str = "id, user_id, pantry_id, status, created_at, updated_at";
const LINE_COLUMNS: &str = "id, cart_id, item_id, quantity, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, cart_id, user_id, pantry_id, status, notes, assigned_to_id, submitted_at, ready_at, picked_up_at, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            pantry_id: PantryId::from_uuid(row.try_get::<Uuid, _>("pantry_id")?),
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            low_stock_threshold: row.try_get("low_stock_threshold")?,
            unit: row.try_get("unit")?,
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        let status: String = row.try_get("status")?;
        Ok(Cart {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            pantry_id: PantryId::from_uuid(row.try_get::<Uuid, _>("pantry_id")?),
            status: status.parse::<CartStatus>()?,
            items: Vec::new(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_line(row: PgRow) -> Result<CartItem> {
        Ok(CartItem {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("item_id")?),
            quantity: row.try_get("quantity")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let assigned_to: Option<Uuid> = row.try_get("assigned_to_id")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            pantry_id: PantryId::from_uuid(row.try_get::<Uuid, _>("pantry_id")?),
            status: status.parse::<OrderStatus>()?,
            notes: row.try_get("notes")?,
            assigned_to: assigned_to.map(UserId::from_uuid),
            submitted_at: row.try_get("submitted_at")?,
            ready_at: row.try_get("ready_at")?,
            picked_up_at: row.try_get("picked_up_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            lines: Vec::new(),
        })
    }

    async fn lines_for_cart(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn with_lines(&self, cart: Option<Cart>) -> Result<Option<Cart>> {
        match cart {
            Some(mut cart) => {
                cart.items = self.lines_for_cart(cart.id).await?;
                Ok(Some(cart))
            }
            None => Ok(None),
        }
    }

    /// Maps a unique-constraint failure to `UniqueViolation`.
    fn map_unique(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e {
            let constraint = match db_err.constraint() {
                Some("carts_one_active_per_user") => Some("carts_one_active_per_user"),
                Some("cart_items_unique_item") => Some("cart_items_unique_item"),
                _ => None,
            };
            if let Some(constraint) = constraint {
                tracing::debug!(constraint, "unique constraint violated");
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Database(e)
    }

    /// Appends the WHERE clause for a query and returns the next parameter index.
    fn push_filters(sql: &mut String, query: &OrderQuery) -> usize {
        let mut param_count = 0;
        sql.push_str(" WHERE 1=1");
        if query.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        param_count
    }
}

#[async_trait]
impl ItemRepository for PostgresStore {
    async fn create_item(&self, item: &Item) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, pantry_id, name, quantity, low_stock_threshold, unit, is_available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.pantry_id.as_uuid())
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.low_stock_threshold)
        .bind(&item.unit)
        .bind(item.is_available)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn update_item(&self, item: &Item) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $2, quantity = $3, low_stock_threshold = $4, unit = $5,
                is_available = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.low_stock_threshold)
        .bind(&item.unit)
        .bind(item.is_available)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Item", item.id));
        }
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PostgresStore {
    async fn create_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, pantry_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.pantry_id.as_uuid())
        .bind(cart.status.as_str())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_unique)?;

        Ok(())
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let cart = sqlx::query(&format!("SELECT {CART_COLUMNS} FROM carts WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_cart)
            .transpose()?;

        self.with_lines(cart).await
    }

    async fn find_active_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let cart = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND status = $2 LIMIT 1"
        ))
        .bind(user_id.as_uuid())
        .bind(CartStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_cart)
        .transpose()?;

        self.with_lines(cart).await
    }

    async fn update_cart(&self, cart: &Cart) -> Result<()> {
        let result = sqlx::query("UPDATE carts SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(cart.id.as_uuid())
            .bind(cart.status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Self::map_unique)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cart", cart.id));
        }
        Ok(())
    }

    async fn find_cart_line(&self, cart_id: CartId, item_id: ItemId) -> Result<Option<CartItem>> {
        let row = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_items WHERE cart_id = $1 AND item_id = $2"
        ))
        .bind(cart_id.as_uuid())
        .bind(item_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_line).transpose()
    }

    async fn add_cart_line(&self, line: &CartItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, item_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(line.cart_id.as_uuid())
        .bind(line.item_id.as_uuid())
        .bind(line.quantity)
        .bind(line.created_at)
        .bind(line.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_unique)?;

        Ok(())
    }

    async fn update_cart_line(&self, line: &CartItem) -> Result<()> {
        let result =
            sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = $3 WHERE id = $1")
                .bind(line.id.as_uuid())
                .bind(line.quantity)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("CartItem", line.id));
        }
        Ok(())
    }

    async fn remove_cart_line(&self, id: CartItemId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_cart_lines(&self, cart_id: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn create_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, cart_id, user_id, pantry_id, status, notes, assigned_to_id,
                                submitted_at, ready_at, picked_up_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.cart_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.pantry_id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.assigned_to.map(|id| id.as_uuid()))
        .bind(order.submitted_at)
        .bind(order.ready_at)
        .bind(order.picked_up_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let order = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_order)
            .transpose()?;

        match order {
            Some(mut order) => {
                order.lines = self.lines_for_cart(order.cart_id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, notes = $3, assigned_to_id = $4, ready_at = $5,
                picked_up_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.assigned_to.map(|id| id.as_uuid()))
        .bind(order.ready_at)
        .bind(order.picked_up_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", order.id));
        }
        Ok(())
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders");
        let mut param_count = Self::push_filters(&mut sql, query);
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(user_id) = query.user_id {
            sqlx_query = sqlx_query.bind(user_id.as_uuid());
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        let mut orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        if orders.is_empty() {
            return Ok(orders);
        }

        // Load every order's lines in one round trip
        let cart_ids: Vec<Uuid> = orders.iter().map(|o| o.cart_id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM cart_items WHERE cart_id = ANY($1) ORDER BY created_at ASC, id ASC"
        ))
        .bind(cart_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_cart: HashMap<CartId, Vec<CartItem>> = HashMap::new();
        for row in rows {
            let line = Self::row_to_line(row)?;
            by_cart.entry(line.cart_id).or_default().push(line);
        }
        for order in &mut orders {
            order.lines = by_cart.get(&order.cart_id).cloned().unwrap_or_default();
        }

        Ok(orders)
    }

    async fn count_orders(&self, query: &OrderQuery) -> Result<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM orders");
        Self::push_filters(&mut sql, query);

        let mut sqlx_query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(user_id) = query.user_id {
            sqlx_query = sqlx_query.bind(user_id.as_uuid());
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }

        let count = sqlx_query.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}
