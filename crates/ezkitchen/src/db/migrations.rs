//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies pending
//! ones in order. Column additions are applied conditionally so a database
//! created by an older build can be brought forward idempotently.

use chrono::Utc;
use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN; skipped if the column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_users_table",
        sql: include_str!("sql/001_create_users.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_products_table",
        sql: include_str!("sql/002_create_products.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_estimates_table",
        sql: include_str!("sql/003_create_estimates.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "create_estimate_items_table",
        sql: include_str!("sql/004_create_estimate_items.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 5,
        description: "create_invoice_access_tokens_table",
        sql: include_str!("sql/005_create_invoice_access_tokens.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 6,
        description: "add_revoked_at_to_invoice_access_tokens",
        sql: include_str!("sql/006_add_revoked_at.sql"),
        kind: MigrationKind::AddColumn {
            table: "invoice_access_tokens",
            column: "revoked_at",
        },
    },
    Migration {
        version: 7,
        description: "one_outstanding_token_per_estimate",
        sql: include_str!("sql/007_one_outstanding_token.sql"),
        kind: MigrationKind::Standard,
    },
];

const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TEXT NOT NULL
);";

/// Highest applied migration version, 0 for a fresh database.
pub fn applied_version(conn: &Connection) -> Result<u32, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?)
}

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(CREATE_MIGRATIONS_TABLE)?;
    let applied = applied_version(conn)?;

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        log::debug!("Schema up to date at v{}", applied);
        return Ok(());
    }

    for migration in pending {
        apply(conn, migration)?;
    }
    Ok(())
}

/// Applies one migration and records it in the same transaction.
fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let needed = match migration.kind {
        MigrationKind::Standard => true,
        MigrationKind::AddColumn { table, column } => !column_exists(&tx, table, column)?,
    };

    if needed {
        tx.execute_batch(migration.sql)
            .map_err(|source| DatabaseError::Migration {
                version: migration.version,
                description: migration.description,
                source,
            })?;
        log::info!(
            "Applied migration v{} ({})",
            migration.version,
            migration.description
        );
    } else {
        log::info!(
            "Migration v{} ({}) already reflected in schema",
            migration.version,
            migration.description
        );
    }

    tx.execute(
        "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration.version, migration.description, Utc::now()],
    )?;
    tx.commit()?;
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `table` has a column named `column`, via `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    if !is_identifier(table) {
        return Err(DatabaseError::InvalidIdentifier(table.to_string()));
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    names.try_fold(false, |found, name| -> Result<bool, DatabaseError> {
        Ok(found || name? == column)
    })
}
