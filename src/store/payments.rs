use super::{constraint_error, ensure_exists, now_rfc3339, Database, StoreError};
use crate::models::{Payment, PaymentInput};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

pub const DEFAULT_PAYMENT_STATUS: &str = "PENDING";

const PAYMENT_COLUMNS: &str =
    "id, method, amount, status, transaction_id, payment_date, order_id, created_at";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        method: row.get(1)?,
        amount: row.get(2)?,
        status: row.get(3)?,
        transaction_id: row.get(4)?,
        payment_date: row.get(5)?,
        order_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl Database {
    pub fn list_payments(&self) -> Result<Vec<Payment>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM payments ORDER BY id", PAYMENT_COLUMNS))?;
        let payments = stmt
            .query_map([], payment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(payments)
    }

    pub fn get_payment(&self, id: i64) -> Result<Option<Payment>, StoreError> {
        let payment = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS),
                params![id],
                payment_from_row,
            )
            .optional()?;
        Ok(payment)
    }

    /// One payment per order; a second one conflicts.
    pub fn create_payment(&self, input: &PaymentInput) -> Result<Payment, StoreError> {
        let now = now_rfc3339();
        let status = input
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_PAYMENT_STATUS.to_string());

        let conn = self.conn();
        ensure_exists(&conn, "orders", input.order_id)?;

        conn.execute(
            "INSERT INTO payments (method, amount, status, transaction_id, payment_date, order_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.method,
                input.amount,
                status,
                input.transaction_id,
                input.payment_date,
                input.order_id,
                now,
            ],
        )
        .map_err(|e| constraint_error(e, "payment for this order"))?;

        let payment = Payment {
            id: conn.last_insert_rowid(),
            method: input.method.clone(),
            amount: input.amount,
            status,
            transaction_id: input.transaction_id.clone(),
            payment_date: input.payment_date.clone(),
            order_id: input.order_id,
            created_at: now,
        };

        info!(
            "💳 Payment {} recorded for order {} via {} ({:.2})",
            payment.id, payment.order_id, payment.method, payment.amount
        );
        Ok(payment)
    }

    pub fn update_payment(&self, id: i64, input: &PaymentInput) -> Result<Payment, StoreError> {
        let conn = self.conn();
        ensure_exists(&conn, "orders", input.order_id)?;

        let changed = conn
            .execute(
                "UPDATE payments
                 SET method = ?1, amount = ?2, status = COALESCE(?3, status),
                     transaction_id = ?4, payment_date = ?5, order_id = ?6
                 WHERE id = ?7",
                params![
                    input.method,
                    input.amount,
                    input.status,
                    input.transaction_id,
                    input.payment_date,
                    input.order_id,
                    id,
                ],
            )
            .map_err(|e| constraint_error(e, "payment for this order"))?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("payment {}", id)));
        }

        let payment = conn.query_row(
            &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS),
            params![id],
            payment_from_row,
        )?;
        Ok(payment)
    }

    pub fn delete_payment(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM payments WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
