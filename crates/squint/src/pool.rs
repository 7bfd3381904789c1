//! Traced connection pool wrapper.
//!
//! Wraps a `deadpool_postgres::Pool` and logs every query via tracing.
//! The connection guard returns its connection to the pool on drop, so
//! release happens on every exit path, including errors and cancelled
//! futures.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Error, Row};
use tracing::Instrument;

/// A traced connection pool.
///
/// `get()` returns a [`CatalogConn`] whose queries are automatically
/// logged at debug level.
#[derive(Clone)]
pub struct CatalogPool {
    inner: deadpool_postgres::Pool,
}

impl CatalogPool {
    /// Wrap an existing pool.
    pub fn new(pool: deadpool_postgres::Pool) -> Self {
        Self { inner: pool }
    }

    /// Acquire a traced connection from the pool.
    pub async fn get(&self) -> Result<CatalogConn, deadpool_postgres::PoolError> {
        let conn = self.inner.get().await?;
        Ok(CatalogConn { inner: conn })
    }

    /// The underlying pool, for callers that need the raw handle.
    pub fn inner(&self) -> &deadpool_postgres::Pool {
        &self.inner
    }
}

/// A pooled connection that logs all queries via tracing.
pub struct CatalogConn {
    inner: deadpool_postgres::Object,
}

impl CatalogConn {
    /// Execute a query, returning all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.inner.deref();
        let rows = client.query(sql, params).instrument(span.clone()).await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Execute a query, returning at most one row.
    ///
    /// Errors if the query returns more than one row.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Error> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.inner.deref();
        let row = client
            .query_opt(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", if row.is_some() { 1u64 } else { 0u64 });
        Ok(row)
    }
}
