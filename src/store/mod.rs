//! Relational Storage
//!
//! SQLite-backed persistence for every Totem entity. One connection guarded by
//! a mutex; each entity module adds its own `impl Database` block.
//!
//! # Schema
//!
//! ```sql
//! users(id, name, email UNIQUE, password_hash, phone, cpf UNIQUE, role, ...)
//! managers(id, name, email UNIQUE, password_hash, role, restaurant_id, ...)
//! restaurants(id, name, description, address, phone, email, ...)
//! menu_categories(id, name, restaurant_id -> restaurants ON DELETE CASCADE, ...)
//! products(id, ..., restaurant_id, menu_category_id -> menu_categories, ...)
//! orders(id, ..., user_id -> users NOT NULL, restaurant_id, ...)
//! order_items(id, ..., product_id -> products, order_id -> orders ON DELETE CASCADE, ...)
//! payments(id, ..., order_id -> orders UNIQUE ON DELETE CASCADE, ...)
//! password_reset_tokens(token, email, expires_at, used)
//! ```

pub mod managers;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod reset_tokens;
pub mod restaurants;
pub mod users;

use crate::auth::models::Role;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{ffi, params, types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Handle to the relational store. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    bcrypt_cost: u32,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P, bcrypt_cost: u32) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        Self::from_connection(conn, bcrypt_cost)
    }

    /// In-memory database (tests)
    pub fn in_memory(bcrypt_cost: u32) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, bcrypt_cost)
    }

    fn from_connection(conn: Connection, bcrypt_cost: u32) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            bcrypt_cost,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS restaurants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                address TEXT,
                phone TEXT,
                email TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                phone TEXT,
                cpf TEXT UNIQUE,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS managers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                restaurant_id INTEGER REFERENCES restaurants(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS menu_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                restaurant_id INTEGER NOT NULL REFERENCES restaurants(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                price REAL NOT NULL,
                image_url TEXT,
                ingredients TEXT NOT NULL DEFAULT '[]',
                amount INTEGER,
                restaurant_id INTEGER REFERENCES restaurants(id) ON DELETE CASCADE,
                menu_category_id INTEGER REFERENCES menu_categories(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                price REAL NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                restaurant_id INTEGER REFERENCES restaurants(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                status TEXT NOT NULL,
                product_id INTEGER REFERENCES products(id) ON DELETE SET NULL,
                order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                method TEXT NOT NULL,
                amount REAL NOT NULL,
                status TEXT NOT NULL,
                transaction_id TEXT,
                payment_date TEXT,
                order_id INTEGER NOT NULL UNIQUE REFERENCES orders(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS password_reset_tokens (
                token TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                used INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_products_category ON products(menu_category_id);
            CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);",
        )?;

        Ok(())
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub fn hash_password(&self, password: &str) -> Result<String, StoreError> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(|e| StoreError::Hashing(e.to_string()))
    }

    /// Create the bootstrap admin when no ADMIN manager exists yet.
    /// Returns true if one was created.
    pub fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<bool, StoreError> {
        let existing: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM managers WHERE role = ?1",
            params![Role::Admin.as_str()],
            |row| row.get(0),
        )?;

        if existing > 0 {
            return Ok(false);
        }

        ensure_email_free(&self.conn(), "users", email)?;

        let password_hash = self.hash_password(password)?;
        let now = now_rfc3339();
        self.conn().execute(
            "INSERT INTO managers (name, email, password_hash, role, restaurant_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
            params![name, email, password_hash, Role::Admin.as_str(), now],
        )
        .map_err(|e| constraint_error(e, "manager"))?;

        info!("🔐 Bootstrap admin created ({})", email);
        Ok(true)
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Fail with `InvalidReference` unless `table` has a row with `id`.
pub(crate) fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    id: i64,
) -> Result<(), StoreError> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table),
            params![id],
            |_| Ok(()),
        )
        .optional()?;

    found.ok_or_else(|| StoreError::InvalidReference(format!("{} {} does not exist", table, id)))
}

/// Login searches both account tables, so an email may live in only one.
pub(crate) fn ensure_email_free(
    conn: &Connection,
    other_table: &'static str,
    email: &str,
) -> Result<(), StoreError> {
    let taken: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE email = ?1)", other_table),
        params![email],
        |row| row.get(0),
    )?;
    if taken {
        return Err(StoreError::Conflict("E-mail already registered".to_string()));
    }
    Ok(())
}

/// Read a role column, refusing values outside the closed set.
pub(crate) fn role_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    raw.parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map uniqueness and foreign-key violations onto domain errors.
pub(crate) fn constraint_error(err: rusqlite::Error, entity: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        match e.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StoreError::Conflict(format!("{} already exists", entity));
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StoreError::InvalidReference(format!(
                    "{} references a missing record",
                    entity
                ));
            }
            _ => {}
        }
    }
    StoreError::Sqlite(err)
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Conflict(String),
    NotFound(String),
    InvalidReference(String),
    Hashing(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "SQLite error: {}", e),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::InvalidReference(msg) => write!(f, "Invalid reference: {}", msg),
            Self::Hashing(e) => write!(f, "Password hashing failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}
