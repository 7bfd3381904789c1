//! Snapshot assembly.
//!
//! The introspector enumerates relations, fans out the per-table
//! catalog queries concurrently, and joins the results into an ordered
//! [`SchemaSnapshot`]. Aggregation is all-or-nothing: the first failed
//! sub-query fails the whole snapshot and no partial result is
//! returned.

use futures::future::try_join_all;
use squint_schema::{
    Column, ColumnOrder, ForeignKeyConstraint, KeyFirstOrder, SchemaSnapshot, SemanticType, Table,
    sort_columns,
};

use crate::Result;
use crate::catalog::{Catalog, PgCatalog};
use crate::config::ConnectConfig;

/// Schema introspection engine.
///
/// Holds the catalog handle and the column ordering strategy; carries
/// no state between snapshot requests.
pub struct Introspector<C = PgCatalog> {
    catalog: C,
    order: Box<dyn ColumnOrder + Send + Sync>,
}

impl Introspector<PgCatalog> {
    /// Connect to the database described by `config` and probe
    /// connectivity before returning.
    pub async fn connect(config: &ConnectConfig) -> Result<Self> {
        let pool = config.build_pool()?;
        let catalog = PgCatalog::new(pool, config.schema.clone());
        catalog.ping().await?;
        Ok(Self::with_catalog(catalog))
    }

    /// Run a client-supplied statement verbatim, relaying the driver's
    /// rows or error untouched.
    pub async fn run_sql(&self, statement: &str) -> Result<Vec<tokio_postgres::Row>> {
        let conn = self.catalog.pool().get().await?;
        Ok(conn.query(statement, &[]).await?)
    }

    /// Run a statement and report only whether the database accepted it.
    ///
    /// The specific query error is swallowed; failure to acquire a
    /// connection still propagates.
    pub async fn check_syntax(&self, statement: &str) -> Result<bool> {
        let conn = self.catalog.pool().get().await?;
        match conn.query(statement, &[]).await {
            Ok(_) => Ok(true),
            Err(error) => {
                tracing::debug!(%error, "statement rejected");
                Ok(false)
            }
        }
    }
}

impl<C: Catalog> Introspector<C> {
    /// Build an introspector over an arbitrary catalog implementation,
    /// with the default [`KeyFirstOrder`] column ordering.
    pub fn with_catalog(catalog: C) -> Self {
        Self {
            catalog,
            order: Box::new(KeyFirstOrder),
        }
    }

    /// Replace the column ordering strategy.
    pub fn with_column_order(mut self, order: impl ColumnOrder + Send + Sync + 'static) -> Self {
        self.order = Box::new(order);
        self
    }

    /// Produce a fresh snapshot of the target schema.
    ///
    /// Tables fan out concurrently, bounded by the connection pool's
    /// capacity; the output preserves the catalog's listing order
    /// regardless of completion order.
    pub async fn snapshot(&self) -> Result<SchemaSnapshot> {
        let names = self.catalog.table_names().await?;
        tracing::debug!(tables = names.len(), "enumerated relations");
        let tables = try_join_all(names.iter().map(|name| self.describe_table(name))).await?;
        Ok(SchemaSnapshot { tables })
    }

    /// Every foreign-key constraint in the database, independent of
    /// per-table introspection.
    pub async fn foreign_keys(&self) -> Result<Vec<ForeignKeyConstraint>> {
        self.catalog.foreign_keys().await
    }

    async fn describe_table(&self, name: &str) -> Result<Table> {
        let ((has_key, columns), view_info) =
            tokio::try_join!(self.collect_columns(name), self.catalog.view_info(name))?;
        Ok(Table {
            name: name.to_string(),
            has_key,
            columns,
            view_info,
        })
    }

    /// Key set first, then columns: tagging depends on the key set.
    async fn collect_columns(&self, table: &str) -> Result<(bool, Vec<Column>)> {
        let keys = self.catalog.key_columns(table).await?;
        let raw = self.catalog.columns(table).await?;
        let mut columns: Vec<Column> = raw
            .into_iter()
            .map(|c| Column {
                semantic_type: SemanticType::classify(&c.data_type),
                is_key: keys.contains(&c.name),
                name: c.name,
            })
            .collect();
        sort_columns(&mut columns, self.order.as_ref());
        Ok((!keys.is_empty(), columns))
    }
}
