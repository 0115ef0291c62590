//! Menu categories and products

use super::{ensure_exists, now_rfc3339, Database, StoreError};
use crate::models::{MenuCategory, MenuCategoryInput, Product, ProductInput};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use tracing::info;

const CATEGORY_COLUMNS: &str = "id, name, restaurant_id, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, ingredients, amount, \
     restaurant_id, menu_category_id, created_at, updated_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<MenuCategory> {
    Ok(MenuCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        restaurant_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    // Ingredients are stored as a JSON array
    let raw: String = row.get(5)?;
    let ingredients: Vec<String> = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        image_url: row.get(4)?,
        ingredients,
        amount: row.get(6)?,
        restaurant_id: row.get(7)?,
        menu_category_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn ingredients_json(ingredients: &[String]) -> String {
    serde_json::to_string(ingredients).unwrap_or_else(|_| "[]".to_string())
}

fn check_product_refs(conn: &Connection, input: &ProductInput) -> Result<(), StoreError> {
    if let Some(restaurant_id) = input.restaurant_id {
        ensure_exists(conn, "restaurants", restaurant_id)?;
    }
    if let Some(category_id) = input.menu_category_id {
        ensure_exists(conn, "menu_categories", category_id)?;
    }
    Ok(())
}

impl Database {
    // ---- categories ----

    pub fn list_menu_categories(&self) -> Result<Vec<MenuCategory>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM menu_categories ORDER BY id",
            CATEGORY_COLUMNS
        ))?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get_menu_category(&self, id: i64) -> Result<Option<MenuCategory>, StoreError> {
        let category = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM menu_categories WHERE id = ?1", CATEGORY_COLUMNS),
                params![id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn create_menu_category(
        &self,
        input: &MenuCategoryInput,
    ) -> Result<MenuCategory, StoreError> {
        let now = now_rfc3339();
        let conn = self.conn();
        ensure_exists(&conn, "restaurants", input.restaurant_id)?;

        conn.execute(
            "INSERT INTO menu_categories (name, restaurant_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![input.name, input.restaurant_id, now],
        )?;

        Ok(MenuCategory {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            restaurant_id: input.restaurant_id,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn update_menu_category(
        &self,
        id: i64,
        input: &MenuCategoryInput,
    ) -> Result<MenuCategory, StoreError> {
        let conn = self.conn();
        ensure_exists(&conn, "restaurants", input.restaurant_id)?;

        let changed = conn.execute(
            "UPDATE menu_categories SET name = ?1, restaurant_id = ?2, updated_at = ?3 WHERE id = ?4",
            params![input.name, input.restaurant_id, now_rfc3339(), id],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("menu category {}", id)));
        }

        let category = conn.query_row(
            &format!("SELECT {} FROM menu_categories WHERE id = ?1", CATEGORY_COLUMNS),
            params![id],
            category_from_row,
        )?;
        Ok(category)
    }

    /// Cascades to the category's products
    pub fn delete_menu_category(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM menu_categories WHERE id = ?1", params![id])?;

        if removed > 0 {
            info!("🗑️  Deleted menu category: {}", id);
        }
        Ok(removed > 0)
    }

    // ---- products ----

    pub fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS))?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    pub fn get_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let product = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
                params![id],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    pub fn create_product(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let now = now_rfc3339();
        let conn = self.conn();
        check_product_refs(&conn, input)?;

        conn.execute(
            "INSERT INTO products (name, description, price, image_url, ingredients, amount,
                                   restaurant_id, menu_category_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                input.name,
                input.description,
                input.price,
                input.image_url,
                ingredients_json(&input.ingredients),
                input.amount,
                input.restaurant_id,
                input.menu_category_id,
                now,
            ],
        )?;

        let product = Product {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            image_url: input.image_url.clone(),
            ingredients: input.ingredients.clone(),
            amount: input.amount,
            restaurant_id: input.restaurant_id,
            menu_category_id: input.menu_category_id,
            created_at: now.clone(),
            updated_at: now,
        };

        info!("☕ Created product {}: {} ({:.2})", product.id, product.name, product.price);
        Ok(product)
    }

    pub fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, StoreError> {
        let conn = self.conn();
        check_product_refs(&conn, input)?;

        let changed = conn.execute(
            "UPDATE products
             SET name = ?1, description = ?2, price = ?3, image_url = ?4, ingredients = ?5,
                 amount = ?6, restaurant_id = ?7, menu_category_id = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                input.name,
                input.description,
                input.price,
                input.image_url,
                ingredients_json(&input.ingredients),
                input.amount,
                input.restaurant_id,
                input.menu_category_id,
                now_rfc3339(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("product {}", id)));
        }

        let product = conn.query_row(
            &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
            params![id],
            product_from_row,
        )?;
        Ok(product)
    }

    pub fn delete_product(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;

        if removed > 0 {
            info!("🗑️  Deleted product: {}", id);
        }
        Ok(removed > 0)
    }
}
