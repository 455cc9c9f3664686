//! Invoice access token repository for the `invoice_access_tokens` table.
//!
//! Only SHA-256 digests of raw tokens are stored. A token is "outstanding"
//! while it is neither used nor revoked; a partial unique index allows at
//! most one outstanding token per estimate.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A persisted access token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceToken {
    pub id: i64,
    pub estimate_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InvoiceToken {
    /// Whether the token may still be redeemed at `now`.
    ///
    /// A token is usable up to and including its expiry instant.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.revoked_at.is_none() && now <= self.expires_at
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("invoice_token_id")?,
            estimate_id: row.get("estimate_id")?,
            token_hash: row.get("token_hash")?,
            expires_at: row.get("expires_at")?,
            used_at: row.get("used_at")?,
            revoked_at: row.get("revoked_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

const SELECT_TOKEN: &str = "SELECT invoice_token_id, estimate_id, token_hash, expires_at,
    used_at, revoked_at, created_at FROM invoice_access_tokens";

/// Inserts a fresh outstanding token.
///
/// Fails with a constraint error if the estimate already has an
/// outstanding token or the hash collides with an existing one.
pub fn insert(
    conn: &Connection,
    estimate_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<InvoiceToken, DatabaseError> {
    conn.execute(
        "INSERT INTO invoice_access_tokens (estimate_id, token_hash, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![estimate_id, token_hash, expires_at, created_at],
    )?;
    Ok(InvoiceToken {
        id: conn.last_insert_rowid(),
        estimate_id,
        token_hash: token_hash.to_string(),
        expires_at,
        used_at: None,
        revoked_at: None,
        created_at,
    })
}

pub fn find_by_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<InvoiceToken>, DatabaseError> {
    let token = conn
        .query_row(
            &format!("{} WHERE token_hash = ?1", SELECT_TOKEN),
            params![token_hash],
            InvoiceToken::from_row,
        )
        .optional()?;
    Ok(token)
}

pub fn find_by_id(conn: &Connection, token_id: i64) -> Result<Option<InvoiceToken>, DatabaseError> {
    let token = conn
        .query_row(
            &format!("{} WHERE invoice_token_id = ?1", SELECT_TOKEN),
            params![token_id],
            InvoiceToken::from_row,
        )
        .optional()?;
    Ok(token)
}

/// Marks an outstanding token used. Returns false if it was already used
/// or revoked, so exactly one of two racing callers sees `true`.
pub fn mark_used(
    conn: &Connection,
    token_id: i64,
    used_at: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE invoice_access_tokens SET used_at = ?2
         WHERE invoice_token_id = ?1 AND used_at IS NULL AND revoked_at IS NULL",
        params![token_id, used_at],
    )?;
    Ok(changed > 0)
}

/// Revokes every outstanding token of an estimate. Returns how many changed.
pub fn revoke_outstanding(
    conn: &Connection,
    estimate_id: i64,
    revoked_at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE invoice_access_tokens SET revoked_at = ?2
         WHERE estimate_id = ?1 AND used_at IS NULL AND revoked_at IS NULL",
        params![estimate_id, revoked_at],
    )?;
    Ok(changed)
}

/// Whether the estimate has a token that is neither used, revoked nor expired.
pub fn has_outstanding(
    conn: &Connection,
    estimate_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE estimate_id = ?1 AND used_at IS NULL AND revoked_at IS NULL",
        SELECT_TOKEN
    ))?;
    let tokens = stmt
        .query_map(params![estimate_id], InvoiceToken::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tokens.iter().any(|t| t.is_usable_at(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{estimate_repo, user_repo, Database};
    use crate::estimate::model::{EstimateDetails, NewEstimate, NewUser, Role};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
    }

    fn estimate(conn: &Connection) -> i64 {
        let user = user_repo::insert(
            conn,
            &NewUser {
                name: "Cora".to_string(),
                email: "cora@example.com".to_string(),
                phone: String::new(),
                role: Role::Customer,
            },
            now(),
        )
        .unwrap();
        estimate_repo::insert(
            conn,
            &NewEstimate {
                created_by: user.id,
                details: EstimateDetails {
                    customer_id: user.id,
                    dimensions: Default::default(),
                    address: Default::default(),
                },
            },
            now(),
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let estimate_id = estimate(conn);
            let token = insert(conn, estimate_id, "abc123", now() + Duration::hours(72), now())?;

            assert_eq!(find_by_hash(conn, "abc123")?, Some(token.clone()));
            assert_eq!(find_by_id(conn, token.id)?, Some(token));
            assert_eq!(find_by_hash(conn, "nope")?, None);
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_mark_used_only_once() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let estimate_id = estimate(conn);
            let token = insert(conn, estimate_id, "h1", now() + Duration::hours(1), now())?;

            assert!(mark_used(conn, token.id, now())?);
            assert!(!mark_used(conn, token.id, now())?);

            let stored = find_by_id(conn, token.id)?.unwrap();
            assert_eq!(stored.used_at, Some(now()));
            assert!(!stored.is_usable_at(now()));
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_one_outstanding_token_per_estimate() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let estimate_id = estimate(conn);
            let expiry = now() + Duration::hours(72);
            insert(conn, estimate_id, "first", expiry, now())?;
            assert!(insert(conn, estimate_id, "second", expiry, now())
                .unwrap_err()
                .is_constraint_violation());

            assert_eq!(revoke_outstanding(conn, estimate_id, now())?, 1);
            let second = insert(conn, estimate_id, "second", expiry, now())?;
            assert!(find_by_hash(conn, "first")?.unwrap().revoked_at.is_some());
            assert!(second.is_usable_at(now()));
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_revoked_token_cannot_be_used() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let estimate_id = estimate(conn);
            let token = insert(conn, estimate_id, "h", now() + Duration::hours(1), now())?;
            revoke_outstanding(conn, estimate_id, now())?;
            assert!(!mark_used(conn, token.id, now())?);
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_has_outstanding_ignores_expired() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let estimate_id = estimate(conn);
            assert!(!has_outstanding(conn, estimate_id, now())?);

            insert(conn, estimate_id, "h", now() + Duration::hours(1), now())?;
            assert!(has_outstanding(conn, estimate_id, now())?);
            assert!(has_outstanding(conn, estimate_id, now() + Duration::hours(1))?);
            assert!(!has_outstanding(conn, estimate_id, now() + Duration::hours(2))?);
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }
}
