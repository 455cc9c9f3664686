//! Product catalog repository for the `products` table.

use rusqlite::{params, Connection, Row};

use super::DatabaseError;
use crate::estimate::model::{NewProduct, Product, ProductFilter};

const SELECT_PRODUCT: &str = "SELECT product_id, name, description, category, subcategory,
    color, unit_price, length, width, height, created_by FROM products";

pub(crate) fn product_from_row(row: &Row<'_>) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: row.get("product_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        category: row.get("category")?,
        subcategory: row.get("subcategory")?,
        color: row.get("color")?,
        unit_price_cents: row.get("unit_price")?,
        length_inch: row.get("length")?,
        width_inch: row.get("width")?,
        height_inch: row.get("height")?,
        created_by: row.get("created_by")?,
    })
}

/// Inserts a product and returns it with its assigned id.
pub fn insert(conn: &Connection, product: &NewProduct) -> Result<Product, DatabaseError> {
    conn.execute(
        "INSERT INTO products (name, description, category, subcategory, color,
         unit_price, length, width, height, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            product.name,
            product.description,
            product.category,
            product.subcategory,
            product.color,
            product.unit_price_cents,
            product.length_inch,
            product.width_inch,
            product.height_inch,
            product.created_by,
        ],
    )?;

    Ok(Product {
        id: conn.last_insert_rowid(),
        name: product.name.clone(),
        description: product.description.clone(),
        category: product.category.clone(),
        subcategory: product.subcategory.clone(),
        color: product.color.clone(),
        unit_price_cents: product.unit_price_cents,
        length_inch: product.length_inch,
        width_inch: product.width_inch,
        height_inch: product.height_inch,
        created_by: product.created_by,
    })
}

pub fn get(conn: &Connection, product_id: i64) -> Result<Option<Product>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{} WHERE product_id = ?1", SELECT_PRODUCT))?;
    let mut rows = stmt.query_map(params![product_id], product_from_row)?;
    match rows.next() {
        Some(Ok(product)) => Ok(Some(product)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Lists catalog products matching every set filter, ordered by id.
pub fn list_by_filter(
    conn: &Connection,
    filter: &ProductFilter,
) -> Result<Vec<Product>, DatabaseError> {
    let mut conditions = Vec::new();
    let mut param_values: Vec<&dyn rusqlite::types::ToSql> = Vec::new();

    if let Some(ref category) = filter.category {
        param_values.push(category);
        conditions.push(format!("category = ?{}", param_values.len()));
    }
    if let Some(ref subcategory) = filter.subcategory {
        param_values.push(subcategory);
        conditions.push(format!("subcategory = ?{}", param_values.len()));
    }
    if let Some(ref color) = filter.color {
        param_values.push(color);
        conditions.push(format!("color = ?{}", param_values.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let mut stmt = conn.prepare(&format!(
        "{} {} ORDER BY product_id",
        SELECT_PRODUCT, where_clause
    ))?;
    let rows = stmt
        .query_map(param_values.as_slice(), product_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
