use thiserror::Error;

/// Errors produced by the introspection engine.
///
/// Per-table catalog failures carry the owning table's name; the
/// aggregator propagates the first one and fails the whole snapshot.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection pool could not be built from the configuration.
    #[error("failed to build connection pool: {0}")]
    PoolBuild(#[from] deadpool_postgres::CreatePoolError),

    /// No working connection could be acquired from the pool.
    #[error("failed to acquire database connection: {0}")]
    Connection(#[from] deadpool_postgres::PoolError),

    /// A metadata query failed for a specific table.
    #[error("catalog query failed for table {table}: {source}")]
    Catalog {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A query failed outside per-table introspection.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

impl Error {
    /// A per-table catalog failure.
    ///
    /// Available to any [`Catalog`](crate::Catalog) implementation, not
    /// just the Postgres one.
    pub fn catalog(
        table: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Catalog {
            table: table.into(),
            source: source.into(),
        }
    }
}
