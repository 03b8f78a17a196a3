//! Metadata graph builder.
//!
//! Turns raw input (literal table definitions or exported data-dictionary
//! rows) into a `MetadataGraph`: normalize identities, build tables and
//! columns, flag self-referential keys, then run relationship inference over
//! the complete table set. Every run is a full rebuild from its input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::inference::{infer_relationships, EdgeDedup, RelationshipStrategy};
use crate::model::{Column, DataType, MetadataGraph, Table};
use crate::normalize::{
    assign_domain, classify_table_type, is_self_key, normalize_column_name, normalize_data_type,
    normalize_table_name,
};

/// Properties token marking a dictionary row that describes the table itself.
pub const TABLE_ROW_MARKER: &str = "otype=table";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableDefinition {
    /// Physical, possibly qualified, table identifier.
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<RawColumnDefinition>,
}

impl RawTableDefinition {
    pub fn new(table_name: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: columns
                .iter()
                .map(|(name, data_type)| RawColumnDefinition {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
        }
    }
}

/// One row of a data-dictionary export.
///
/// `key` is `<qualified.table.path>.<column_or_marker>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRow {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "al_datadict_item_properties")]
    pub properties: Option<String>,
    #[serde(default, rename = "al_datadict_item_column_data_type")]
    pub data_type: Option<String>,
}

impl DictionaryRow {
    pub fn describes_table(&self) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|p| p.contains(TABLE_ROW_MARKER))
    }

    /// Split the key into (table path, column); `None` for malformed keys.
    pub fn split_key(&self) -> Option<(&str, &str)> {
        let (table, column) = self.key.trim().rsplit_once('.')?;
        let (table, column) = (table.trim(), column.trim());
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some((table, column))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub strategy: RelationshipStrategy,
    pub dedup: EdgeDedup,
}

/// Build from data-dictionary rows with default options.
pub fn build_graph(rows: &[DictionaryRow]) -> MetadataGraph {
    build_graph_with(rows, &BuildOptions::default())
}

/// Build from data-dictionary rows.
///
/// Rows from any number of sources are merged by normalized table name; the
/// first physical name seen for a table is the one kept. Rows whose key cannot
/// be tied to a table are skipped.
pub fn build_graph_with(rows: &[DictionaryRow], options: &BuildOptions) -> MetadataGraph {
    struct Pending {
        physical_name: String,
        description: String,
        columns: Vec<Column>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut pending: HashMap<String, Pending> = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some((table_path, column_raw)) = row.split_key() else {
            debug!(key = %row.key, "skipping row without a table-qualified key");
            skipped += 1;
            continue;
        };
        let table_name = normalize_table_name(table_path);
        if table_name.is_empty() {
            debug!(key = %row.key, "skipping row with an empty table name");
            skipped += 1;
            continue;
        }

        let entry = pending.entry(table_name.clone()).or_insert_with(|| {
            order.push(table_name.clone());
            Pending {
                physical_name: table_path.to_string(),
                description: String::new(),
                columns: Vec::new(),
            }
        });

        if row.describes_table() {
            entry.description = row.description.clone().unwrap_or_default();
            continue;
        }

        let column_name = normalize_column_name(column_raw);
        if column_name.is_empty() {
            skipped += 1;
            continue;
        }
        let data_type = row
            .data_type
            .as_deref()
            .map(normalize_data_type)
            .unwrap_or(DataType::String);
        entry.columns.push(
            make_column(&table_name, column_name, data_type)
                .with_description(row.description.clone().unwrap_or_default()),
        );
    }

    let tables = order
        .into_iter()
        .filter_map(|name| pending.remove(&name).map(|p| (name, p)))
        .map(|(table_name, p)| Table {
            table_type: classify_table_type(&p.physical_name),
            domain: assign_domain(&p.physical_name),
            canonical_id: table_name.clone(),
            table_name,
            physical_name: p.physical_name,
            columns: p.columns,
            description: p.description,
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, "dictionary rows skipped");
    }
    finish(tables, options)
}

/// Build from literal table definitions with default options.
pub fn build_graph_from_definitions(definitions: &[RawTableDefinition]) -> MetadataGraph {
    build_graph_from_definitions_with(definitions, &BuildOptions::default())
}

/// Build from literal table definitions, one table per definition.
///
/// A definition with a blank table name is skipped entirely.
pub fn build_graph_from_definitions_with(
    definitions: &[RawTableDefinition],
    options: &BuildOptions,
) -> MetadataGraph {
    let mut tables = Vec::with_capacity(definitions.len());

    for definition in definitions {
        let physical_name = definition.table_name.as_str();
        let table_name = normalize_table_name(physical_name);
        if table_name.is_empty() {
            debug!(physical = %physical_name, "skipping definition without a table name");
            continue;
        }

        let columns = definition
            .columns
            .iter()
            .filter_map(|raw| {
                let name = normalize_column_name(&raw.name);
                (!name.is_empty())
                    .then(|| make_column(&table_name, name, normalize_data_type(&raw.data_type)))
            })
            .collect();

        let table_type = classify_table_type(physical_name);
        tables.push(Table {
            description: format!("This is the {table_type} version of the {table_name} concept."),
            canonical_id: table_name.clone(),
            table_name,
            physical_name: physical_name.to_string(),
            table_type,
            domain: assign_domain(physical_name),
            columns,
        });
    }

    finish(tables, options)
}

fn make_column(table_name: &str, column_name: String, data_type: DataType) -> Column {
    let is_primary_key = is_self_key(&column_name, table_name);
    Column::new(table_name, column_name, data_type).with_primary_key(is_primary_key)
}

fn finish(mut tables: Vec<Table>, options: &BuildOptions) -> MetadataGraph {
    let relationships = infer_relationships(&mut tables, &options.strategy, options.dedup);
    info!(
        tables = tables.len(),
        relationships = relationships.len(),
        "metadata graph built"
    );
    MetadataGraph::new(tables, relationships)
}
