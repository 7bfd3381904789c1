//! Aggregator tests against an in-memory catalog.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use squint::{
    Catalog, Column, ColumnOrder, Error, ForeignKeyConstraint, Introspector, RawColumn, Result,
    SemanticType, ViewInfo,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// In-memory catalog fixture.
///
/// `delay_ms` staggers column queries so that tables complete out of
/// listing order; `fail_keys_for` injects a key-column-usage failure
/// for one table.
#[derive(Clone, Default)]
struct FakeCatalog {
    tables: Vec<String>,
    columns: HashMap<String, Vec<RawColumn>>,
    keys: HashMap<String, HashSet<String>>,
    views: HashMap<String, String>,
    fks: Vec<ForeignKeyConstraint>,
    delay_ms: HashMap<String, u64>,
    fail_keys_for: Option<String>,
}

fn raw(name: &str, data_type: &str) -> RawColumn {
    RawColumn {
        name: name.to_string(),
        data_type: data_type.to_string(),
    }
}

fn fixture() -> FakeCatalog {
    let mut columns = HashMap::new();
    columns.insert(
        "orders".to_string(),
        vec![
            raw("order_ref", "text"),
            raw("total", "numeric"),
            raw("placed_at", "timestamp with time zone"),
        ],
    );
    columns.insert(
        "users".to_string(),
        vec![
            raw("id", "integer"),
            raw("email", "character varying"),
            raw("bio", "text"),
            raw("active", "boolean"),
            raw("external_id", "uuid"),
        ],
    );
    columns.insert(
        "user_summary".to_string(),
        vec![raw("name", "text"), raw("order_count", "bigint")],
    );

    let mut keys = HashMap::new();
    keys.insert(
        "users".to_string(),
        HashSet::from(["id".to_string(), "email".to_string()]),
    );

    let mut views = HashMap::new();
    views.insert(
        "user_summary".to_string(),
        "SELECT a FROM b".to_string(),
    );

    FakeCatalog {
        tables: vec![
            "orders".to_string(),
            "user_summary".to_string(),
            "users".to_string(),
        ],
        columns,
        keys,
        views,
        fks: vec![ForeignKeyConstraint {
            constraint_name: "orders_user_id_fkey".to_string(),
            owner_table: "orders".to_string(),
            definition: "FOREIGN KEY (user_id) REFERENCES users(id)".to_string(),
        }],
        delay_ms: HashMap::new(),
        fail_keys_for: None,
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.clone())
    }

    async fn columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        if let Some(ms) = self.delay_ms.get(table) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn key_columns(&self, table: &str) -> Result<HashSet<String>> {
        if self.fail_keys_for.as_deref() == Some(table) {
            return Err(Error::catalog(table, "injected key-column failure"));
        }
        Ok(self.keys.get(table).cloned().unwrap_or_default())
    }

    async fn view_info(&self, table: &str) -> Result<ViewInfo> {
        Ok(match self.views.get(table) {
            Some(definition) => ViewInfo {
                is_view: true,
                definition: definition.clone(),
            },
            None => ViewInfo::base_table(),
        })
    }

    async fn foreign_keys(&self) -> Result<Vec<ForeignKeyConstraint>> {
        Ok(self.fks.clone())
    }
}

#[tokio::test]
async fn snapshot_preserves_listing_order() {
    init_tracing();
    let mut catalog = fixture();
    // Make the first-listed table finish last.
    catalog.delay_ms.insert("orders".to_string(), 50);
    catalog.delay_ms.insert("user_summary".to_string(), 20);

    let snapshot = Introspector::with_catalog(catalog).snapshot().await.unwrap();
    let names: Vec<&str> = snapshot.iter_tables().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "user_summary", "users"]);
}

#[tokio::test]
async fn key_columns_are_tagged() {
    let snapshot = Introspector::with_catalog(fixture())
        .snapshot()
        .await
        .unwrap();

    let users = snapshot.get_table("users").unwrap();
    assert!(users.has_key);

    let keyed: Vec<&str> = users
        .columns
        .iter()
        .filter(|c| c.is_key)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(keyed, vec!["email", "id"]);
}

#[tokio::test]
async fn keyless_table_has_no_key_flags() {
    let snapshot = Introspector::with_catalog(fixture())
        .snapshot()
        .await
        .unwrap();

    let orders = snapshot.get_table("orders").unwrap();
    assert!(!orders.has_key);
    assert!(orders.columns.iter().all(|c| !c.is_key));
}

#[tokio::test]
async fn view_classification() {
    let snapshot = Introspector::with_catalog(fixture())
        .snapshot()
        .await
        .unwrap();

    let view = snapshot.get_table("user_summary").unwrap();
    assert!(view.view_info.is_view);
    assert_eq!(view.view_info.definition, "SELECT a FROM b");

    let base = snapshot.get_table("users").unwrap();
    assert!(!base.view_info.is_view);
    assert_eq!(base.view_info.definition, "");
}

#[tokio::test]
async fn unmapped_types_resolve_to_unknown() {
    let snapshot = Introspector::with_catalog(fixture())
        .snapshot()
        .await
        .unwrap();

    let users = snapshot.get_table("users").unwrap();
    let external_id = users
        .columns
        .iter()
        .find(|c| c.name == "external_id")
        .unwrap();
    assert_eq!(external_id.semantic_type, SemanticType::Unknown);
}

#[tokio::test]
async fn columns_use_default_key_first_order() {
    let snapshot = Introspector::with_catalog(fixture())
        .snapshot()
        .await
        .unwrap();

    let users = snapshot.get_table("users").unwrap();
    let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
    // Keys first (email before id: Text ranks before Integer), then the
    // rest by type rank with catalog order for ties.
    assert_eq!(names, vec!["email", "id", "bio", "active", "external_id"]);
}

/// Ordering strategy that keeps raw catalog order.
struct CatalogOrder;

impl ColumnOrder for CatalogOrder {
    fn compare(&self, _a: &Column, _b: &Column) -> Ordering {
        Ordering::Equal
    }
}

#[tokio::test]
async fn column_order_strategy_is_pluggable() {
    let snapshot = Introspector::with_catalog(fixture())
        .with_column_order(CatalogOrder)
        .snapshot()
        .await
        .unwrap();

    let users = snapshot.get_table("users").unwrap();
    let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "email", "bio", "active", "external_id"]);
}

#[tokio::test]
async fn failed_key_query_fails_whole_snapshot() {
    init_tracing();
    let mut catalog = fixture();
    catalog.fail_keys_for = Some("users".to_string());

    let result = Introspector::with_catalog(catalog).snapshot().await;
    match result {
        Err(Error::Catalog { table, .. }) => assert_eq!(table, "users"),
        other => panic!("expected catalog error, got {other:?}"),
    }
}

#[tokio::test]
async fn snapshot_is_idempotent() {
    let introspector = Introspector::with_catalog(fixture());
    let first = introspector.snapshot().await.unwrap();
    let second = introspector.snapshot().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn foreign_keys_are_independent_of_table_failures() {
    let mut catalog = fixture();
    catalog.fail_keys_for = Some("users".to_string());
    let introspector = Introspector::with_catalog(catalog);

    assert!(introspector.snapshot().await.is_err());

    let fks = introspector.foreign_keys().await.unwrap();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].constraint_name, "orders_user_id_fkey");
    assert_eq!(fks[0].owner_table, "orders");
}
