//! Line item repository for the `estimate_items` table.

use rusqlite::{params, Connection, OptionalExtension};

use super::product_repo::product_from_row;
use super::DatabaseError;
use crate::estimate::model::{LineItem, PricedItem};

/// Adds a line to an estimate and returns it with its assigned id.
pub fn insert(
    conn: &Connection,
    estimate_id: i64,
    product_id: i64,
    quantity: i64,
) -> Result<LineItem, DatabaseError> {
    conn.execute(
        "INSERT INTO estimate_items (estimate_id, product_id, quantity) VALUES (?1, ?2, ?3)",
        params![estimate_id, product_id, quantity],
    )?;
    Ok(LineItem {
        id: conn.last_insert_rowid(),
        estimate_id,
        product_id,
        quantity,
    })
}

pub fn get(conn: &Connection, line_item_id: i64) -> Result<Option<LineItem>, DatabaseError> {
    let item = conn
        .query_row(
            "SELECT line_item_id, estimate_id, product_id, quantity
             FROM estimate_items WHERE line_item_id = ?1",
            params![line_item_id],
            |row| {
                Ok(LineItem {
                    id: row.get("line_item_id")?,
                    estimate_id: row.get("estimate_id")?,
                    product_id: row.get("product_id")?,
                    quantity: row.get("quantity")?,
                })
            },
        )
        .optional()?;
    Ok(item)
}

/// Lists an estimate's lines joined with their products, in insertion order.
pub fn list_priced(conn: &Connection, estimate_id: i64) -> Result<Vec<PricedItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT i.line_item_id, i.quantity, p.product_id, p.name, p.description, p.category,
         p.subcategory, p.color, p.unit_price, p.length, p.width, p.height, p.created_by
         FROM estimate_items i JOIN products p ON p.product_id = i.product_id
         WHERE i.estimate_id = ?1
         ORDER BY i.line_item_id",
    )?;
    let rows = stmt
        .query_map(params![estimate_id], |row| {
            Ok(PricedItem {
                line_item_id: row.get("line_item_id")?,
                quantity: row.get("quantity")?,
                product: product_from_row(row)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_for_estimate(conn: &Connection, estimate_id: i64) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM estimate_items WHERE estimate_id = ?1",
        params![estimate_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

/// Sets a line's quantity. Returns false if the line does not exist.
pub fn update_quantity(
    conn: &Connection,
    line_item_id: i64,
    quantity: i64,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE estimate_items SET quantity = ?2 WHERE line_item_id = ?1",
        params![line_item_id, quantity],
    )?;
    Ok(changed > 0)
}

pub fn delete(conn: &Connection, line_item_id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM estimate_items WHERE line_item_id = ?1",
        params![line_item_id],
    )?;
    Ok(changed > 0)
}
