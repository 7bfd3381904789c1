//! Schema snapshot types for squint.
//!
//! This crate contains the data model shared between the introspection
//! engine and its consumers: the semantic type taxonomy that raw catalog
//! type names are normalized into, the snapshot tree (tables, columns,
//! view info, foreign keys), and the pluggable column ordering strategy.
//!
//! Everything here is plain data. Snapshots are built once per
//! introspection request and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Normalized type categories for catalog columns.
///
/// Raw engine-specific type names (as reported by
/// `information_schema.columns.data_type`) map into this small taxonomy
/// via [`SemanticType::classify`]. Types outside the mapping table
/// resolve to [`SemanticType::Unknown`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    #[serde(rename = "TimeStamp")]
    Timestamp,
    Unknown,
}

impl SemanticType {
    /// Classify a raw catalog type name.
    ///
    /// Total over all inputs: anything absent from the mapping table is
    /// `Unknown`. Matching is exact; the catalog reports lowercase
    /// spellings like `character varying`.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "character" | "character varying" | "text" => SemanticType::Text,
            "bigint" | "smallint" | "integer" => SemanticType::Integer,
            "numeric" | "double precision" => SemanticType::Decimal,
            "bit" | "bit varying" | "boolean" => SemanticType::Boolean,
            "date" => SemanticType::Date,
            "timestamp without time zone" | "timestamp with time zone" => SemanticType::Timestamp,
            _ => SemanticType::Unknown,
        }
    }

    /// Rank used by [`KeyFirstOrder`] to group columns of the same kind.
    fn rank(self) -> u8 {
        match self {
            SemanticType::Text => 0,
            SemanticType::Integer => 1,
            SemanticType::Decimal => 2,
            SemanticType::Boolean => 3,
            SemanticType::Date => 4,
            SemanticType::Timestamp => 5,
            SemanticType::Unknown => 6,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Text => write!(f, "Text"),
            SemanticType::Integer => write!(f, "Integer"),
            SemanticType::Decimal => write!(f, "Decimal"),
            SemanticType::Boolean => write!(f, "Boolean"),
            SemanticType::Date => write!(f, "Date"),
            SemanticType::Timestamp => write!(f, "TimeStamp"),
            SemanticType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A single column of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Normalized type category.
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    /// Whether the column participates in a key constraint.
    pub is_key: bool,
}

/// View classification for a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfo {
    /// Whether the relation is a view.
    pub is_view: bool,
    /// The view's defining query text; empty when not a view.
    pub definition: String,
}

impl ViewInfo {
    /// View info for a plain base table.
    pub fn base_table() -> Self {
        Self {
            is_view: false,
            definition: String::new(),
        }
    }
}

/// One relation of the introspected schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Relation name, unique within the snapshot.
    pub name: String,
    /// Whether any column participates in a key constraint.
    pub has_key: bool,
    /// Columns, ordered by the engine's [`ColumnOrder`] strategy.
    pub columns: Vec<Column>,
    /// View classification.
    pub view_info: ViewInfo,
}

/// A foreign-key constraint as rendered by the engine.
///
/// `definition` is the database's own textual rendering of the
/// constraint; it is not decomposed into referenced tables or columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyConstraint {
    pub constraint_name: String,
    pub owner_table: String,
    pub definition: String,
}

/// One complete materialization of a database's structural metadata.
///
/// Tables appear in the order the catalog listed them. Produced fresh
/// per request; never cached or mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSnapshot {
    pub tables: Vec<Table>,
}

impl SchemaSnapshot {
    /// Look up a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Iterate over all tables in listing order.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }
}

/// A deterministic total order over columns.
///
/// Implementations must depend only on a column's own semantic type and
/// key flag; ties are broken by the stable sort, which preserves
/// catalog order.
pub trait ColumnOrder {
    fn compare(&self, a: &Column, b: &Column) -> Ordering;
}

/// Default ordering: key columns first, then by semantic type rank,
/// remaining ties keep catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFirstOrder;

impl ColumnOrder for KeyFirstOrder {
    fn compare(&self, a: &Column, b: &Column) -> Ordering {
        // true sorts before false
        b.is_key
            .cmp(&a.is_key)
            .then_with(|| a.semantic_type.rank().cmp(&b.semantic_type.rank()))
    }
}

/// Stable-sort columns with the given strategy.
pub fn sort_columns<O: ColumnOrder + ?Sized>(columns: &mut [Column], order: &O) {
    columns.sort_by(|a, b| order.compare(a, b));
}
