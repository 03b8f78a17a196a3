//! Canonical schema model.
//!
//! `Table` owns its `Column`s; `Relationship` is a free-standing edge that
//! names both endpoints by canonical id (never by reference), so an edge stays
//! meaningful after the tables it was inferred from are dropped.
//! `MetadataGraph` is the root aggregate produced by one builder run.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Closed set of canonical column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    String,
    Decimal,
    Datetime,
    Date,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::String => "string",
            DataType::Decimal => "decimal",
            DataType::Datetime => "datetime",
            DataType::Date => "date",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a physical table is the raw landing copy or an enriched derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableType {
    Raw,
    Enriched,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::Raw => "RAW",
            TableType::Enriched => "ENRICHED",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business grouping of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Finance,
    Account,
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Finance => "Finance",
            Domain::Account => "Account",
            Domain::General => "General",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub canonical_id: String,
    #[serde(default)]
    pub is_primary_key: bool,
    /// Set by relationship inference; everything else is fixed at construction.
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub description: String,
}

impl Column {
    /// Build a column of `table_id`; `name` must already be canonical.
    pub fn new(table_id: &str, name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            canonical_id: column_canonical_id(table_id, &name),
            name,
            data_type,
            is_primary_key: false,
            is_foreign_key: false,
            description: String::new(),
        }
    }

    pub fn with_primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = is_primary_key;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub table_name: String,
    pub physical_name: String,
    pub table_type: TableType,
    pub domain: Domain,
    pub columns: Vec<Column>,
    pub canonical_id: String,
    #[serde(default)]
    pub description: String,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub relationship_type: String,
    #[serde(default)]
    pub description: String,
}

impl Relationship {
    /// True when `other` connects the same two columns, in either direction.
    pub fn same_endpoints_unordered(&self, other: &Relationship) -> bool {
        let forward = self.source_column == other.source_column
            && self.target_column == other.target_column;
        let backward = self.source_column == other.target_column
            && self.target_column == other.source_column;
        forward || backward
    }
}

/// Root aggregate of one run: ordered tables plus ordered relationships.
///
/// Fields are private; a graph is read-only once the builder returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataGraph {
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
}

impl MetadataGraph {
    pub fn new(tables: Vec<Table>, relationships: Vec<Relationship>) -> Self {
        Self {
            tables,
            relationships,
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// All tables (variants included) registered under a canonical id.
    pub fn tables_by_id<'a>(&'a self, canonical_id: &'a str) -> impl Iterator<Item = &'a Table> {
        self.tables
            .iter()
            .filter(move |t| t.canonical_id == canonical_id)
    }

    /// Relationships whose source is the given table canonical id.
    pub fn relationships_from<'a>(
        &'a self,
        table_id: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.source_table == table_id)
    }

    /// Check that every id a relationship mentions exists in this graph.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let table_ids: HashSet<&str> = self.tables.iter().map(|t| t.canonical_id.as_str()).collect();
        let column_ids: HashSet<&str> = self
            .tables
            .iter()
            .flat_map(|t| t.columns.iter().map(|c| c.canonical_id.as_str()))
            .collect();

        for rel in &self.relationships {
            for table in [&rel.source_table, &rel.target_table] {
                if !table_ids.contains(table.as_str()) {
                    return Err(SchemaError::DanglingReference {
                        kind: "table",
                        id: table.clone(),
                    });
                }
            }
            for column in [&rel.source_column, &rel.target_column] {
                if !column_ids.contains(column.as_str()) {
                    return Err(SchemaError::DanglingReference {
                        kind: "column",
                        id: column.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Canonical serialized form. Refuses graphs with dangling references.
    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn column_canonical_id(table_id: &str, column: &str) -> String {
    format!("{table_id}.{column}")
}
