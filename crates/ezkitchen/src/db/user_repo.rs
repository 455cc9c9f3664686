//! User repository for the `users` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::estimate::model::{NewUser, Role, User};

fn user_from_row(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    let role: String = row.get("role")?;
    let role = Role::parse(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown role {:?}", role).into(),
        )
    })?;

    Ok(User {
        id: row.get("user_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        role,
        created_at: row.get("created_at")?,
    })
}

/// Inserts a user and returns it with its assigned id.
pub fn insert(
    conn: &Connection,
    user: &NewUser,
    created_at: DateTime<Utc>,
) -> Result<User, DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, email, phone, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.name, user.email, user.phone, user.role.as_str(), created_at],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        role: user.role,
        created_at,
    })
}

pub fn get(conn: &Connection, user_id: i64) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            "SELECT user_id, name, email, phone, role, created_at FROM users WHERE user_id = ?1",
            params![user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::TimeZone;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        db.with_conn(|conn| {
            let user = insert(
                conn,
                &NewUser {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    phone: "555-0199".to_string(),
                    role: Role::Customer,
                },
                at,
            )?;
            assert_eq!(get(conn, user.id)?, Some(user.clone()));
            assert_eq!(get(conn, user.id + 1)?, None);
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            // Bypass the CHECK constraint to simulate a corrupt row.
            conn.execute_batch(
                "PRAGMA ignore_check_constraints = ON;
                 INSERT INTO users (name, email, phone, role, created_at)
                 VALUES ('X', 'x@example.com', '', 'OWNER', '2026-01-01 00:00:00+00:00');",
            )?;
            assert!(get(conn, 1).is_err());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }
}
