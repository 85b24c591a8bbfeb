use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{now_ts, parse_ts, Store, StoreError};
use crate::domain::{User, UserRole};

fn user_from_row(row: &Row<'_>) -> Result<User, StoreError> {
    let id: String = row.get("id")?;
    let role: String = row.get("role")?;
    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|err| StoreError::Corrupt(format!("bad user id '{id}': {err}")))?,
        email: row.get("email")?,
        name: row.get("name")?,
        role: UserRole::parse(&role)
            .map_err(|_| StoreError::Corrupt(format!("bad user role '{role}'")))?,
        password_hash: row.get("password_hash")?,
        is_active: row.get("is_active")?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        role: UserRole,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        self.with_conn(|conn| {
            let email = email.trim().to_ascii_lowercase();
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM users WHERE email = ?1",
                    params![email],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::Conflict(format!(
                    "a user with email '{email}' already exists"
                )));
            }

            let id = Uuid::new_v4();
            let now = now_ts();
            conn.execute(
                "INSERT INTO users (id, email, name, role, password_hash, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
                params![id.to_string(), email, name.trim(), role.as_str(), password_hash, now],
            )?;
            get_user(conn, id)
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.with_conn(|conn| get_user(conn, id))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users WHERE email = ?1")?;
            let mut rows = stmt.query_map(params![email.trim().to_ascii_lowercase()], |row| {
                Ok(user_from_row(row))
            })?;
            match rows.next() {
                Some(row) => Ok(Some(row??)),
                None => Ok(None),
            }
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at DESC, id DESC")?;
            let rows = stmt.query_map([], |row| Ok(user_from_row(row)))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row??);
            }
            Ok(out)
        })
    }

    pub fn update_user(
        &self,
        id: Uuid,
        name: &str,
        role: UserRole,
        is_active: bool,
    ) -> Result<User, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET name = ?1, role = ?2, is_active = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![name.trim(), role.as_str(), is_active, now_ts(), id.to_string()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_user(conn, id)
        })
    }

    pub fn set_user_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
                params![password_hash, now_ts(), id.to_string()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    /// Accounts are removed outright; there is no bin for users.
    pub fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM users WHERE id = ?1",
                params![id.to_string()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }
}

fn get_user(conn: &Connection, id: Uuid) -> Result<User, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id.to_string()], |row| Ok(user_from_row(row)))?;
    match rows.next() {
        Some(row) => row?,
        None => Err(StoreError::NotFound),
    }
}
