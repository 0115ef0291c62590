//! Staff accounts (MANAGER / ADMIN)

use super::{constraint_error, ensure_email_free, ensure_exists, now_rfc3339, role_column, Database, StoreError};
use crate::auth::models::Role;
use crate::models::{Manager, ManagerInput};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

const MANAGER_COLUMNS: &str =
    "id, name, email, password_hash, role, restaurant_id, created_at, updated_at";

fn manager_from_row(row: &Row<'_>) -> rusqlite::Result<Manager> {
    Ok(Manager {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: role_column(row, 4)?,
        restaurant_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    pub fn list_managers(&self) -> Result<Vec<Manager>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM managers ORDER BY id", MANAGER_COLUMNS))?;
        let managers = stmt
            .query_map([], manager_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(managers)
    }

    pub fn get_manager(&self, id: i64) -> Result<Option<Manager>, StoreError> {
        let manager = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM managers WHERE id = ?1", MANAGER_COLUMNS),
                params![id],
                manager_from_row,
            )
            .optional()?;
        Ok(manager)
    }

    pub fn find_manager_by_email(&self, email: &str) -> Result<Option<Manager>, StoreError> {
        let manager = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM managers WHERE email = ?1", MANAGER_COLUMNS),
                params![email],
                manager_from_row,
            )
            .optional()?;
        Ok(manager)
    }

    /// Register staff. `role` defaults to MANAGER.
    pub fn create_manager(&self, input: &ManagerInput) -> Result<Manager, StoreError> {
        let password_hash = self.hash_password(&input.password)?;
        let role = input.role.unwrap_or(Role::Manager);
        let now = now_rfc3339();

        let conn = self.conn();
        ensure_email_free(&conn, "users", &input.email)?;
        if let Some(restaurant_id) = input.restaurant_id {
            ensure_exists(&conn, "restaurants", restaurant_id)?;
        }

        conn.execute(
            "INSERT INTO managers (name, email, password_hash, role, restaurant_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                input.name,
                input.email,
                password_hash,
                role.as_str(),
                input.restaurant_id,
                now,
            ],
        )
        .map_err(|e| constraint_error(e, "manager"))?;

        let manager = Manager {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash,
            role,
            restaurant_id: input.restaurant_id,
            created_at: now.clone(),
            updated_at: now,
        };

        info!("✅ Created manager: {} ({})", manager.email, manager.role);
        Ok(manager)
    }

    pub fn update_manager(&self, id: i64, input: &ManagerInput) -> Result<Manager, StoreError> {
        let password_hash = self.hash_password(&input.password)?;
        let now = now_rfc3339();

        let conn = self.conn();
        ensure_email_free(&conn, "users", &input.email)?;
        if let Some(restaurant_id) = input.restaurant_id {
            ensure_exists(&conn, "restaurants", restaurant_id)?;
        }

        let changed = conn
            .execute(
                "UPDATE managers
                 SET name = ?1, email = ?2, password_hash = ?3, role = COALESCE(?4, role),
                     restaurant_id = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    input.name,
                    input.email,
                    password_hash,
                    input.role.map(|r| r.as_str()),
                    input.restaurant_id,
                    now,
                    id,
                ],
            )
            .map_err(|e| constraint_error(e, "manager"))?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("manager {}", id)));
        }

        let manager = conn.query_row(
            &format!("SELECT {} FROM managers WHERE id = ?1", MANAGER_COLUMNS),
            params![id],
            manager_from_row,
        )?;
        Ok(manager)
    }

    pub fn set_manager_password(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let password_hash = self.hash_password(password)?;
        let changed = self.conn().execute(
            "UPDATE managers SET password_hash = ?1, updated_at = ?2 WHERE email = ?3",
            params![password_hash, now_rfc3339(), email],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("manager {}", email)));
        }
        Ok(())
    }

    pub fn delete_manager(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM managers WHERE id = ?1", params![id])?;

        if removed > 0 {
            info!("🗑️  Deleted manager: {}", id);
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::models::Role;
    use crate::models::{ManagerInput, RestaurantInput, UserInput};
    use crate::store::tests::test_db;
    use crate::store::StoreError;

    fn input(email: &str, restaurant_id: Option<i64>) -> ManagerInput {
        ManagerInput {
            name: "Bruno".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            role: None,
            restaurant_id,
        }
    }

    #[test]
    fn test_create_defaults_to_manager_role() {
        let db = test_db();
        let manager = db.create_manager(&input("bruno@example.com", None)).unwrap();

        assert_eq!(manager.role, Role::Manager);
        let found = db.find_manager_by_email("bruno@example.com").unwrap().unwrap();
        assert_eq!(found.id, manager.id);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let db = test_db();
        db.create_manager(&input("bruno@example.com", None)).unwrap();

        assert!(matches!(
            db.create_manager(&input("bruno@example.com", None)),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_email_held_by_user_conflicts() {
        let db = test_db();
        db.create_user(&UserInput {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
            phone: None,
            cpf: None,
            role: None,
        })
        .unwrap();

        match db.create_manager(&input("ana@example.com", None)) {
            Err(StoreError::Conflict(msg)) => assert_eq!(msg, "E-mail already registered"),
            other => panic!("expected conflict, got {:?}", other),
        }

        let bruno = db.create_manager(&input("bruno@example.com", None)).unwrap();
        assert!(matches!(
            db.update_manager(bruno.id, &input("ana@example.com", None)),
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            db.ensure_admin("Admin", "ana@example.com", "admin123"),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_restaurant_must_exist() {
        let db = test_db();
        assert!(matches!(
            db.create_manager(&input("bruno@example.com", Some(5))),
            Err(StoreError::InvalidReference(_))
        ));

        let restaurant = db
            .create_restaurant(&RestaurantInput {
                name: "Totem Café".to_string(),
                description: None,
                address: None,
                phone: None,
                email: None,
            })
            .unwrap();
        let manager = db
            .create_manager(&input("bruno@example.com", Some(restaurant.id)))
            .unwrap();
        assert_eq!(manager.restaurant_id, Some(restaurant.id));
    }

    #[test]
    fn test_password_change() {
        let db = test_db();
        db.create_manager(&input("bruno@example.com", None)).unwrap();
        db.set_manager_password("bruno@example.com", "changed1").unwrap();

        let manager = db.find_manager_by_email("bruno@example.com").unwrap().unwrap();
        assert!(bcrypt::verify("changed1", &manager.password_hash).unwrap());

        assert!(matches!(
            db.set_manager_password("nobody@example.com", "changed1"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_missing_manager() {
        let db = test_db();
        assert!(matches!(
            db.update_manager(3, &input("x@example.com", None)),
            Err(StoreError::NotFound(_))
        ));
    }
}
