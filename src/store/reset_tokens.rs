//! Single-use password reset tokens

use super::{Database, StoreError};
use rusqlite::{params, OptionalExtension};

impl Database {
    /// Store a token for `email`, valid until `expires_at` (unix seconds).
    pub fn insert_reset_token(
        &self,
        token: &str,
        email: &str,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO password_reset_tokens (token, email, expires_at, used) VALUES (?1, ?2, ?3, 0)",
            params![token, email, expires_at],
        )?;
        Ok(())
    }

    /// Mark the token used and return its email. `None` when the token is
    /// unknown, already used, or expired at `now` (unix seconds).
    pub fn consume_reset_token(&self, token: &str, now: i64) -> Result<Option<String>, StoreError> {
        let conn = self.conn();

        let row: Option<(String, i64, bool)> = conn
            .query_row(
                "SELECT email, expires_at, used FROM password_reset_tokens WHERE token = ?1",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((email, expires_at, used)) = row else {
            return Ok(None);
        };

        if used || expires_at <= now {
            return Ok(None);
        }

        conn.execute(
            "UPDATE password_reset_tokens SET used = 1 WHERE token = ?1",
            params![token],
        )?;
        Ok(Some(email))
    }

    /// Drop expired or used tokens; returns how many were removed
    pub fn purge_reset_tokens(&self, now: i64) -> Result<usize, StoreError> {
        let removed = self.conn().execute(
            "DELETE FROM password_reset_tokens WHERE used = 1 OR expires_at <= ?1",
            params![now],
        )?;
        Ok(removed)
    }
}
