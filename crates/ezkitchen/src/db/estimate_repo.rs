//! Estimate repository: CRUD and guarded status writes for the `estimates` table.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row};

use super::DatabaseError;
use crate::estimate::model::{Address, Estimate, EstimateDetails, KitchenDimensions, NewEstimate};
use crate::estimate::status::EstimateStatus;

impl ToSql for EstimateStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.rank()))
    }
}

impl FromSql for EstimateStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let rank = i64::column_result(value)?;
        EstimateStatus::from_rank(rank).ok_or(FromSqlError::OutOfRange(rank))
    }
}

const SELECT_ESTIMATE: &str = "SELECT estimate_id, customer_id, created_by, status, created_at,
    kitchen_length_inch, kitchen_width_inch, kitchen_height_inch,
    door_width_inch, door_height_inch, street, city, state, zip, signature_object_key
    FROM estimates";

fn estimate_from_row(row: &Row<'_>) -> Result<Estimate, rusqlite::Error> {
    Ok(Estimate {
        id: row.get("estimate_id")?,
        created_by: row.get("created_by")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        details: EstimateDetails {
            customer_id: row.get("customer_id")?,
            dimensions: KitchenDimensions {
                kitchen_length_inch: row.get("kitchen_length_inch")?,
                kitchen_width_inch: row.get("kitchen_width_inch")?,
                kitchen_height_inch: row.get("kitchen_height_inch")?,
                door_width_inch: row.get("door_width_inch")?,
                door_height_inch: row.get("door_height_inch")?,
            },
            address: Address {
                street: row.get("street")?,
                city: row.get("city")?,
                state: row.get("state")?,
                zip: row.get("zip")?,
            },
        },
        signature_object_key: row.get("signature_object_key")?,
    })
}

/// Inserts a new Draft estimate and returns it with its assigned id.
pub fn insert(
    conn: &Connection,
    new: &NewEstimate,
    created_at: DateTime<Utc>,
) -> Result<Estimate, DatabaseError> {
    let d = &new.details;
    conn.execute(
        "INSERT INTO estimates (customer_id, created_by, status, created_at,
         kitchen_length_inch, kitchen_width_inch, kitchen_height_inch,
         door_width_inch, door_height_inch, street, city, state, zip)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            d.customer_id,
            new.created_by,
            EstimateStatus::Draft,
            created_at,
            d.dimensions.kitchen_length_inch,
            d.dimensions.kitchen_width_inch,
            d.dimensions.kitchen_height_inch,
            d.dimensions.door_width_inch,
            d.dimensions.door_height_inch,
            d.address.street,
            d.address.city,
            d.address.state,
            d.address.zip,
        ],
    )?;

    Ok(Estimate {
        id: conn.last_insert_rowid(),
        created_by: new.created_by,
        status: EstimateStatus::Draft,
        created_at,
        details: new.details.clone(),
        signature_object_key: None,
    })
}

/// Finds an estimate by id.
pub fn get(conn: &Connection, estimate_id: i64) -> Result<Option<Estimate>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{} WHERE estimate_id = ?1", SELECT_ESTIMATE))?;
    let mut rows = stmt.query_map(params![estimate_id], estimate_from_row)?;
    match rows.next() {
        Some(Ok(estimate)) => Ok(Some(estimate)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Lists the oldest `limit` estimates created by a surveyor.
pub fn list_by_creator(
    conn: &Connection,
    created_by: i64,
    limit: u32,
) -> Result<Vec<Estimate>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE created_by = ?1 ORDER BY created_at, estimate_id LIMIT ?2",
        SELECT_ESTIMATE
    ))?;
    let rows = stmt
        .query_map(params![created_by, limit], estimate_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrites the editable fields. Returns false if no row matched.
pub fn update_details(
    conn: &Connection,
    estimate_id: i64,
    details: &EstimateDetails,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE estimates SET customer_id=?2, kitchen_length_inch=?3, kitchen_width_inch=?4,
         kitchen_height_inch=?5, door_width_inch=?6, door_height_inch=?7,
         street=?8, city=?9, state=?10, zip=?11
         WHERE estimate_id=?1",
        params![
            estimate_id,
            details.customer_id,
            details.dimensions.kitchen_length_inch,
            details.dimensions.kitchen_width_inch,
            details.dimensions.kitchen_height_inch,
            details.dimensions.door_width_inch,
            details.dimensions.door_height_inch,
            details.address.street,
            details.address.city,
            details.address.state,
            details.address.zip,
        ],
    )?;
    Ok(changed > 0)
}

/// Deletes an estimate; its items and tokens cascade. Returns false if absent.
pub fn delete(conn: &Connection, estimate_id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM estimates WHERE estimate_id = ?1",
        params![estimate_id],
    )?;
    Ok(changed > 0)
}

/// Moves an estimate from `from` to `to` only if it is still in `from`.
///
/// Returns false when the row is missing or its status has moved on.
pub fn update_status(
    conn: &Connection,
    estimate_id: i64,
    from: EstimateStatus,
    to: EstimateStatus,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE estimates SET status = ?3 WHERE estimate_id = ?1 AND status = ?2",
        params![estimate_id, from, to],
    )?;
    Ok(changed > 0)
}

/// Stores the signature key and moves the estimate to `status`.
///
/// Only applies when no signature is stored yet and the current status is
/// strictly before `status`, so the write never regresses the lifecycle and
/// a second signature cannot overwrite the first.
pub fn record_signature(
    conn: &Connection,
    estimate_id: i64,
    object_key: &str,
    status: EstimateStatus,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE estimates SET signature_object_key = ?2, status = ?3
         WHERE estimate_id = ?1 AND signature_object_key IS NULL AND status < ?3",
        params![estimate_id, object_key, status],
    )?;
    Ok(changed > 0)
}
