//! Totem Backend Library
//!
//! Point-of-sale and ordering backend for a café: JWT authentication,
//! role-guarded REST endpoints and SQLite persistence. The binary in
//! `main.rs` only wires configuration to these modules.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod models;
pub mod store;
