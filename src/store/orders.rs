//! Orders and their line items

use super::{ensure_exists, now_rfc3339, Database, StoreError};
use crate::models::{Order, OrderInput, OrderItem, OrderItemInput};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

/// Status given to line items created without one
pub const DEFAULT_ITEM_STATUS: &str = "PENDING";

const ORDER_COLUMNS: &str =
    "id, name, description, price, user_id, restaurant_id, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, name, price, quantity, status, product_id, order_id, created_at, updated_at";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        user_id: row.get(4)?,
        restaurant_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<OrderItem> {
    Ok(OrderItem {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        quantity: row.get(3)?,
        status: row.get(4)?,
        product_id: row.get(5)?,
        order_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn check_order_refs(conn: &Connection, input: &OrderInput) -> Result<(), StoreError> {
    ensure_exists(conn, "users", input.user_id)?;
    if let Some(restaurant_id) = input.restaurant_id {
        ensure_exists(conn, "restaurants", restaurant_id)?;
    }
    Ok(())
}

fn check_item_refs(conn: &Connection, input: &OrderItemInput) -> Result<(), StoreError> {
    ensure_exists(conn, "orders", input.order_id)?;
    if let Some(product_id) = input.product_id {
        ensure_exists(conn, "products", product_id)?;
    }
    Ok(())
}

impl Database {
    // ---- orders ----

    pub fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM orders ORDER BY id", ORDER_COLUMNS))?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    pub fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        let order = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
                params![id],
                order_from_row,
            )
            .optional()?;
        Ok(order)
    }

    pub fn create_order(&self, input: &OrderInput) -> Result<Order, StoreError> {
        let now = now_rfc3339();
        let conn = self.conn();
        check_order_refs(&conn, input)?;

        conn.execute(
            "INSERT INTO orders (name, description, price, user_id, restaurant_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                input.name,
                input.description,
                input.price,
                input.user_id,
                input.restaurant_id,
                now,
            ],
        )?;

        let order = Order {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            user_id: input.user_id,
            restaurant_id: input.restaurant_id,
            created_at: now.clone(),
            updated_at: now,
        };

        info!("🧾 Order {} placed by user {} ({:.2})", order.id, order.user_id, order.price);
        Ok(order)
    }

    pub fn update_order(&self, id: i64, input: &OrderInput) -> Result<Order, StoreError> {
        let conn = self.conn();
        check_order_refs(&conn, input)?;

        let changed = conn.execute(
            "UPDATE orders
             SET name = ?1, description = ?2, price = ?3, user_id = ?4, restaurant_id = ?5,
                 updated_at = ?6
             WHERE id = ?7",
            params![
                input.name,
                input.description,
                input.price,
                input.user_id,
                input.restaurant_id,
                now_rfc3339(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("order {}", id)));
        }

        let order = conn.query_row(
            &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
            params![id],
            order_from_row,
        )?;
        Ok(order)
    }

    /// Cascades to the order's items and payment
    pub fn delete_order(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM orders WHERE id = ?1", params![id])?;

        if removed > 0 {
            info!("🗑️  Deleted order: {}", id);
        }
        Ok(removed > 0)
    }

    // ---- order items ----

    pub fn list_order_items(&self) -> Result<Vec<OrderItem>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM order_items ORDER BY id", ITEM_COLUMNS))?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_order_item(&self, id: i64) -> Result<Option<OrderItem>, StoreError> {
        let item = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM order_items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn create_order_item(&self, input: &OrderItemInput) -> Result<OrderItem, StoreError> {
        let now = now_rfc3339();
        let status = input
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_ITEM_STATUS.to_string());

        let conn = self.conn();
        check_item_refs(&conn, input)?;

        conn.execute(
            "INSERT INTO order_items (name, price, quantity, status, product_id, order_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                input.name,
                input.price,
                input.quantity,
                status,
                input.product_id,
                input.order_id,
                now,
            ],
        )?;

        Ok(OrderItem {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            price: input.price,
            quantity: input.quantity,
            status,
            product_id: input.product_id,
            order_id: input.order_id,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// A `None` status keeps the current one
    pub fn update_order_item(
        &self,
        id: i64,
        input: &OrderItemInput,
    ) -> Result<OrderItem, StoreError> {
        let conn = self.conn();
        check_item_refs(&conn, input)?;

        let changed = conn.execute(
            "UPDATE order_items
             SET name = ?1, price = ?2, quantity = ?3, status = COALESCE(?4, status),
                 product_id = ?5, order_id = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                input.name,
                input.price,
                input.quantity,
                input.status,
                input.product_id,
                input.order_id,
                now_rfc3339(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("order item {}", id)));
        }

        let item = conn.query_row(
            &format!("SELECT {} FROM order_items WHERE id = ?1", ITEM_COLUMNS),
            params![id],
            item_from_row,
        )?;
        Ok(item)
    }

    pub fn delete_order_item(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM order_items WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
