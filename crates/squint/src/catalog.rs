//! Catalog access.
//!
//! [`Catalog`] is the seam between the aggregator and the database's
//! read-only metadata views. [`PgCatalog`] is the production
//! implementation over `information_schema` and `pg_catalog`; tests
//! substitute in-memory fakes.

use std::collections::HashSet;

use async_trait::async_trait;
use squint_schema::{ForeignKeyConstraint, ViewInfo};

use crate::pool::CatalogPool;
use crate::{Error, Result};

/// A raw column as reported by the catalog, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
}

/// Read-only access to a database's structural metadata.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All relations visible in the target schema, in listing order.
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Column name and raw type name per table, in catalog order.
    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>>;

    /// Distinct column names participating in any key constraint for
    /// the table.
    async fn key_columns(&self, table: &str) -> Result<HashSet<String>>;

    /// Whether the relation is a view, and its defining query text.
    async fn view_info(&self, table: &str) -> Result<ViewInfo>;

    /// Every foreign-key constraint in the database.
    async fn foreign_keys(&self) -> Result<Vec<ForeignKeyConstraint>>;
}

const TABLE_NAMES_SQL: &str = "SELECT table_name
     FROM information_schema.tables
     WHERE table_schema = $1
     ORDER BY table_name";

const COLUMNS_SQL: &str = "SELECT column_name, data_type
     FROM information_schema.columns
     WHERE table_schema = $1 AND table_name = $2
     ORDER BY ordinal_position";

const KEY_COLUMNS_SQL: &str = "SELECT DISTINCT column_name
     FROM information_schema.key_column_usage
     WHERE table_schema = $1 AND table_name = $2";

const VIEW_SQL: &str = "SELECT view_definition
     FROM information_schema.views
     WHERE table_schema = $1 AND table_name = $2";

const FOREIGN_KEYS_SQL: &str = "SELECT
         r.conname,
         r.conrelid::regclass::text,
         pg_catalog.pg_get_constraintdef(r.oid, true)
     FROM pg_catalog.pg_constraint r
     WHERE r.contype = 'f'";

/// Catalog implementation over a live Postgres database.
///
/// Every method acquires a connection from the shared pool for the
/// duration of one query and releases it before returning.
#[derive(Clone)]
pub struct PgCatalog {
    pool: CatalogPool,
    schema: String,
}

impl PgCatalog {
    pub fn new(pool: deadpool_postgres::Pool, schema: impl Into<String>) -> Self {
        Self {
            pool: CatalogPool::new(pool),
            schema: schema.into(),
        }
    }

    pub(crate) fn pool(&self) -> &CatalogPool {
        &self.pool
    }

    /// Cheap connectivity probe.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.query("SELECT 1", &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.pool.get().await?;
        let rows = conn.query(TABLE_NAMES_SQL, &[&self.schema]).await?;
        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            names.push(row.try_get(0)?);
        }
        Ok(names)
    }

    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(COLUMNS_SQL, &[&self.schema, &table])
            .await
            .map_err(|e| Error::catalog(table, e))?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(RawColumn {
                name: row.try_get(0).map_err(|e| Error::catalog(table, e))?,
                data_type: row.try_get(1).map_err(|e| Error::catalog(table, e))?,
            });
        }
        Ok(columns)
    }

    async fn key_columns(&self, table: &str) -> Result<HashSet<String>> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(KEY_COLUMNS_SQL, &[&self.schema, &table])
            .await
            .map_err(|e| Error::catalog(table, e))?;
        let mut set = HashSet::with_capacity(rows.len());
        for row in &rows {
            set.insert(row.try_get(0).map_err(|e| Error::catalog(table, e))?);
        }
        Ok(set)
    }

    async fn view_info(&self, table: &str) -> Result<ViewInfo> {
        let conn = self.pool.get().await?;
        // query_opt rejects multiple matches, which standard catalog
        // semantics rule out anyway.
        let row = conn
            .query_opt(VIEW_SQL, &[&self.schema, &table])
            .await
            .map_err(|e| Error::catalog(table, e))?;
        match row {
            Some(row) => {
                // view_definition is NULL when the current role does not
                // own the view.
                let definition: Option<String> =
                    row.try_get(0).map_err(|e| Error::catalog(table, e))?;
                Ok(ViewInfo {
                    is_view: true,
                    definition: definition.unwrap_or_default(),
                })
            }
            None => Ok(ViewInfo::base_table()),
        }
    }

    async fn foreign_keys(&self) -> Result<Vec<ForeignKeyConstraint>> {
        let conn = self.pool.get().await?;
        let rows = conn.query(FOREIGN_KEYS_SQL, &[]).await?;
        let mut constraints = Vec::with_capacity(rows.len());
        for row in &rows {
            constraints.push(ForeignKeyConstraint {
                constraint_name: row.try_get(0)?,
                owner_table: row.try_get(1)?,
                definition: row.try_get(2)?,
            });
        }
        Ok(constraints)
    }
}
