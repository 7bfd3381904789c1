//! Engine configuration.
//!
//! Connection settings are passed explicitly at engine construction;
//! the engine holds no process-wide database handle and is stateless
//! between requests.

use serde::Deserialize;

/// Connection settings for the target database.
///
/// Deserializable so callers can load it from whatever configuration
/// source they use; the engine only ever sees the finished struct.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    /// Schema whose catalog is introspected.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Pool capacity; also the upper bound on concurrent catalog queries.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_port() -> u16 {
    5432
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_pool_size() -> usize {
    16
}

impl ConnectConfig {
    pub(crate) fn build_pool(
        &self,
    ) -> Result<deadpool_postgres::Pool, deadpool_postgres::CreatePoolError> {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.dbname = Some(self.dbname.clone());
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.pool_size));
        cfg.create_pool(
            Some(deadpool_postgres::Runtime::Tokio1),
            tokio_postgres::NoTls,
        )
    }
}
