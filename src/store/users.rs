//! Customer accounts

use super::{constraint_error, ensure_email_free, now_rfc3339, role_column, Database, StoreError};
use crate::auth::models::Role;
use crate::models::{User, UserInput};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone, cpf, role, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone: row.get(4)?,
        cpf: row.get(5)?,
        role: role_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Reject an email held by another user or any manager, or a CPF held by
/// another user
fn check_unique(
    conn: &Connection,
    email: &str,
    cpf: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    let exclude = exclude_id.unwrap_or(-1);

    let email_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND id != ?2)",
        params![email, exclude],
        |row| row.get(0),
    )?;
    if email_taken {
        return Err(StoreError::Conflict("E-mail already registered".to_string()));
    }
    ensure_email_free(conn, "managers", email)?;

    if let Some(cpf) = cpf {
        let cpf_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE cpf = ?1 AND id != ?2)",
            params![cpf, exclude],
            |row| row.get(0),
        )?;
        if cpf_taken {
            return Err(StoreError::Conflict("CPF already registered".to_string()));
        }
    }

    Ok(())
}

impl Database {
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.conn();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Register a user. `role` defaults to CLIENT.
    pub fn create_user(&self, input: &UserInput) -> Result<User, StoreError> {
        let password_hash = self.hash_password(&input.password)?;
        let role = input.role.unwrap_or(Role::Client);
        let now = now_rfc3339();

        let conn = self.conn();
        check_unique(&conn, &input.email, input.cpf.as_deref(), None)?;

        conn.execute(
            "INSERT INTO users (name, email, password_hash, phone, cpf, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                input.name,
                input.email,
                password_hash,
                input.phone,
                input.cpf,
                role.as_str(),
                now,
            ],
        )
        .map_err(|e| constraint_error(e, "user"))?;

        let user = User {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash,
            phone: input.phone.clone(),
            cpf: input.cpf.clone(),
            role,
            created_at: now.clone(),
            updated_at: now,
        };

        info!("✅ Created user: {} ({})", user.email, user.role);
        Ok(user)
    }

    /// Replace a user's fields. A `None` role keeps the current one.
    pub fn update_user(&self, id: i64, input: &UserInput) -> Result<User, StoreError> {
        let password_hash = self.hash_password(&input.password)?;
        let now = now_rfc3339();

        let conn = self.conn();
        check_unique(&conn, &input.email, input.cpf.as_deref(), Some(id))?;

        let changed = conn
            .execute(
                "UPDATE users
                 SET name = ?1, email = ?2, password_hash = ?3, phone = ?4, cpf = ?5,
                     role = COALESCE(?6, role), updated_at = ?7
                 WHERE id = ?8",
                params![
                    input.name,
                    input.email,
                    password_hash,
                    input.phone,
                    input.cpf,
                    input.role.map(|r| r.as_str()),
                    now,
                    id,
                ],
            )
            .map_err(|e| constraint_error(e, "user"))?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }

        let user = conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            user_from_row,
        )?;
        Ok(user)
    }

    /// Overwrite only the password (password reset)
    pub fn set_user_password(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let password_hash = self.hash_password(password)?;
        let changed = self.conn().execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE email = ?3",
            params![password_hash, now_rfc3339(), email],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {}", email)));
        }
        Ok(())
    }

    /// Returns false when no such user existed
    pub fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;

        if removed > 0 {
            info!("🗑️  Deleted user: {}", id);
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::models::Role;
    use crate::models::UserInput;
    use crate::store::tests::test_db;
    use crate::store::StoreError;

    fn input(email: &str, cpf: Option<&str>) -> UserInput {
        UserInput {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            phone: Some("11 99999-0000".to_string()),
            cpf: cpf.map(str::to_string),
            role: None,
        }
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let db = test_db();

        let user = db.create_user(&input("ana@example.com", Some("111"))).unwrap();
        assert_eq!(user.role, Role::Client);
        assert!(bcrypt::verify("secret1", &user.password_hash).unwrap());

        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.email, "ana@example.com");
        assert_eq!(fetched.cpf.as_deref(), Some("111"));
    }

    #[test]
    fn test_duplicate_email_and_cpf_conflict() {
        let db = test_db();
        db.create_user(&input("ana@example.com", Some("111"))).unwrap();

        match db.create_user(&input("ana@example.com", Some("222"))) {
            Err(StoreError::Conflict(msg)) => assert!(msg.contains("E-mail")),
            other => panic!("expected conflict, got {:?}", other),
        }

        match db.create_user(&input("bia@example.com", Some("111"))) {
            Err(StoreError::Conflict(msg)) => assert!(msg.contains("CPF")),
            other => panic!("expected conflict, got {:?}", other),
        }

        // Users without CPF never collide on it
        db.create_user(&input("caio@example.com", None)).unwrap();
        db.create_user(&input("duda@example.com", None)).unwrap();
        assert_eq!(db.list_users().unwrap().len(), 3);
    }

    #[test]
    fn test_email_held_by_manager_conflicts() {
        let db = test_db();
        db.ensure_admin("Admin", "admin@totem.local", "admin123").unwrap();

        assert!(matches!(
            db.create_user(&input("admin@totem.local", None)),
            Err(StoreError::Conflict(_))
        ));

        let user = db.create_user(&input("ana@example.com", None)).unwrap();
        assert!(matches!(
            db.update_user(user.id, &input("admin@totem.local", None)),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_update_keeps_role_when_absent() {
        let db = test_db();
        let mut create = input("ana@example.com", None);
        create.role = Some(Role::Manager);
        let user = db.create_user(&create).unwrap();

        let mut change = input("ana.souza@example.com", None);
        change.password = "another1".to_string();
        let updated = db.update_user(user.id, &change).unwrap();

        assert_eq!(updated.email, "ana.souza@example.com");
        assert_eq!(updated.role, Role::Manager);
        assert!(bcrypt::verify("another1", &updated.password_hash).unwrap());
    }

    #[test]
    fn test_update_and_delete_missing_user() {
        let db = test_db();
        assert!(matches!(
            db.update_user(99, &input("x@example.com", None)),
            Err(StoreError::NotFound(_))
        ));
        assert!(!db.delete_user(99).unwrap());
    }

    #[test]
    fn test_delete_user() {
        let db = test_db();
        let user = db.create_user(&input("ana@example.com", None)).unwrap();

        assert!(db.delete_user(user.id).unwrap());
        assert!(db.get_user(user.id).unwrap().is_none());
    }
}
