use rusqlite::Connection;

use super::error::StorageError;

pub const ORGANIZATIONS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS organizations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    owner_email TEXT NOT NULL,
    limit_operations_monthly INTEGER NOT NULL DEFAULT 0,
    limit_retention_days INTEGER NOT NULL DEFAULT 30,
    updated_at TEXT NOT NULL
);
"#;

pub const TARGETS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS targets (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE
);
"#;

pub const TARGETS_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_targets_organization ON targets(organization_id);
"#;

pub fn init_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(ORGANIZATIONS_TABLE_SCHEMA)?;
    conn.execute_batch(TARGETS_TABLE_SCHEMA)?;
    conn.execute_batch(TARGETS_INDEXES)?;
    Ok(())
}
