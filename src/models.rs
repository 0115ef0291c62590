//! Domain records and request payloads for the Totem entities.
//!
//! Records are what the store returns and what the API serializes; `*Input`
//! types are request bodies for create/update.

use crate::auth::models::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub restaurant_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInput {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: i64,
    pub name: String,
    pub restaurant_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategoryInput {
    pub name: String,
    pub restaurant_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub ingredients: Vec<String>,
    pub amount: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub menu_category_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub amount: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub menu_category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub user_id: i64,
    pub restaurant_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub user_id: i64,
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub status: String,
    pub product_id: Option<i64>,
    pub order_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub status: Option<String>,
    pub product_id: Option<i64>,
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub method: String,
    pub amount: f64,
    pub status: String,
    pub transaction_id: Option<String>,
    pub payment_date: Option<String>,
    pub order_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub method: String,
    pub amount: f64,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_date: Option<String>,
    pub order_id: i64,
}

/// Rejected request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), ValidationError> {
    let valid = match value.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid {
        return Err(ValidationError(format!("{:?} is not a valid email", value)));
    }
    Ok(())
}

pub fn require_password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError(format!("{} must be a non-negative number", field)));
    }
    Ok(())
}

impl UserInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email(&self.email)?;
        require_password(&self.password)
    }
}

impl ManagerInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email(&self.email)?;
        require_password(&self.password)?;
        if self.role == Some(Role::Client) {
            return Err(ValidationError("managers cannot hold the CLIENT role".to_string()));
        }
        Ok(())
    }
}

impl RestaurantInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }
}

impl MenuCategoryInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_non_negative("price", self.price)?;
        if matches!(self.amount, Some(a) if a < 0) {
            return Err(ValidationError("amount must not be negative".to_string()));
        }
        Ok(())
    }
}

impl OrderInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_non_negative("price", self.price)
    }
}

impl OrderItemInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_non_negative("price", self.price)?;
        if self.quantity <= 0 {
            return Err(ValidationError("quantity must be positive".to_string()));
        }
        Ok(())
    }
}

impl PaymentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("method", &self.method)?;
        require_non_negative("amount", self.amount)
    }
}
