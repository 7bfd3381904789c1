//! Postgres schema introspection for clients that need a normalized
//! view of a database's structure.
//!
//! squint queries the standard catalog views (`information_schema` and
//! `pg_catalog`), classifies raw type names into a small semantic
//! taxonomy, resolves key-constraint membership and view definitions,
//! and assembles everything into an ordered [`SchemaSnapshot`]. Ad-hoc
//! SQL can also be executed or syntax-checked against the same
//! database.
//!
//! # Example
//!
//! ```ignore
//! use squint::{ConnectConfig, Introspector};
//!
//! let config = ConnectConfig {
//!     host: "localhost".into(),
//!     port: 5432,
//!     user: "postgres".into(),
//!     password: "postgres".into(),
//!     dbname: "app".into(),
//!     schema: "public".into(),
//!     pool_size: 16,
//! };
//!
//! let introspector = Introspector::connect(&config).await?;
//! let snapshot = introspector.snapshot().await?;
//! for table in snapshot.iter_tables() {
//!     println!("{} ({} columns)", table.name, table.columns.len());
//! }
//! ```

mod catalog;
mod config;
mod error;
mod introspect;
mod pool;

pub use catalog::{Catalog, PgCatalog, RawColumn};
pub use config::ConnectConfig;
pub use error::Error;
pub use introspect::Introspector;
pub use pool::{CatalogConn, CatalogPool};

// Re-export the snapshot types.
pub use squint_schema::{
    Column, ColumnOrder, ForeignKeyConstraint, KeyFirstOrder, SchemaSnapshot, SemanticType, Table,
    ViewInfo,
};

/// Result type for squint operations.
pub type Result<T> = std::result::Result<T, Error>;
