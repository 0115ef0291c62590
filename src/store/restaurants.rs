use super::{now_rfc3339, Database, StoreError};
use crate::models::{Restaurant, RestaurantInput};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

const RESTAURANT_COLUMNS: &str =
    "id, name, description, address, phone, email, created_at, updated_at";

fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    Ok(Restaurant {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM restaurants ORDER BY id",
            RESTAURANT_COLUMNS
        ))?;
        let restaurants = stmt
            .query_map([], restaurant_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(restaurants)
    }

    pub fn get_restaurant(&self, id: i64) -> Result<Option<Restaurant>, StoreError> {
        let restaurant = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM restaurants WHERE id = ?1", RESTAURANT_COLUMNS),
                params![id],
                restaurant_from_row,
            )
            .optional()?;
        Ok(restaurant)
    }

    pub fn create_restaurant(&self, input: &RestaurantInput) -> Result<Restaurant, StoreError> {
        let now = now_rfc3339();
        let conn = self.conn();

        conn.execute(
            "INSERT INTO restaurants (name, description, address, phone, email, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                input.name,
                input.description,
                input.address,
                input.phone,
                input.email,
                now,
            ],
        )?;

        let restaurant = Restaurant {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            description: input.description.clone(),
            address: input.address.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        info!("🏪 Created restaurant {}: {}", restaurant.id, restaurant.name);
        Ok(restaurant)
    }

    pub fn update_restaurant(
        &self,
        id: i64,
        input: &RestaurantInput,
    ) -> Result<Restaurant, StoreError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE restaurants
             SET name = ?1, description = ?2, address = ?3, phone = ?4, email = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                input.name,
                input.description,
                input.address,
                input.phone,
                input.email,
                now_rfc3339(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("restaurant {}", id)));
        }

        let restaurant = conn.query_row(
            &format!("SELECT {} FROM restaurants WHERE id = ?1", RESTAURANT_COLUMNS),
            params![id],
            restaurant_from_row,
        )?;
        Ok(restaurant)
    }

    /// Cascades to the restaurant's menu categories and products
    pub fn delete_restaurant(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM restaurants WHERE id = ?1", params![id])?;

        if removed > 0 {
            info!("🗑️  Deleted restaurant: {}", id);
        }
        Ok(removed > 0)
    }
}
