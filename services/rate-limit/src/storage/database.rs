use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::limiter::OwnershipRecord;
use crate::sources::{OwnershipStore, SourceFetchError};

use super::error::StorageError;
use super::schema::init_database;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRow {
    pub id: String,
    pub name: String,
    pub owner_email: String,
    pub limit_operations_monthly: i64,
    pub limit_retention_days: u32,
}

/// SQLite-backed ownership store.
#[derive(Clone)]
pub struct OwnershipDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl OwnershipDatabase {
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_database(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::ConnectionPoisoned)
    }

    pub fn upsert_organization(&self, organization: &OrganizationRow) -> Result<(), StorageError> {
        if organization.limit_operations_monthly < 0 {
            return Err(StorageError::InvalidLimitValue(
                "monthly operations limit cannot be negative".into(),
            ));
        }
        if organization.limit_retention_days == 0 {
            return Err(StorageError::InvalidLimitValue(
                "retention must be at least one day".into(),
            ));
        }

        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO organizations (
                id, name, owner_email, limit_operations_monthly, limit_retention_days, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                owner_email = excluded.owner_email,
                limit_operations_monthly = excluded.limit_operations_monthly,
                limit_retention_days = excluded.limit_retention_days,
                updated_at = excluded.updated_at
            "#,
            params![
                organization.id,
                organization.name,
                organization.owner_email,
                organization.limit_operations_monthly,
                organization.limit_retention_days,
                now
            ],
        )?;

        Ok(())
    }

    pub fn upsert_target(
        &self,
        target_id: &str,
        organization_id: &str,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;

        let known: i64 = conn.query_row(
            "SELECT COUNT(*) FROM organizations WHERE id = ?1",
            params![organization_id],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(StorageError::OrganizationNotFound(organization_id.to_string()));
        }

        conn.execute(
            r#"
            INSERT INTO targets (id, organization_id)
            VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET organization_id = excluded.organization_id
            "#,
            params![target_id, organization_id],
        )?;

        Ok(())
    }

    /// Every target joined with the limits of its organization.
    pub fn list_ownership(&self) -> Result<Vec<OwnershipRecord>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, o.id, o.name, o.owner_email,
                   o.limit_operations_monthly, o.limit_retention_days
            FROM targets t
            INNER JOIN organizations o ON o.id = t.organization_id
            ORDER BY o.id, t.id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(OwnershipRecord {
                target: row.get(0)?,
                organization: row.get(1)?,
                org_name: row.get(2)?,
                owner_email: row.get(3)?,
                monthly_limit: row.get(4)?,
                retention_days: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[async_trait]
impl OwnershipStore for OwnershipDatabase {
    async fn fetch_all(&self) -> Result<Vec<OwnershipRecord>, SourceFetchError> {
        let database = self.clone();
        let records = tokio::task::spawn_blocking(move || database.list_ownership())
            .await
            .map_err(|err| StorageError::TaskFailed(err.to_string()))??;

        debug!(targets = records.len(), "fetched ownership records");
        Ok(records)
    }
}
