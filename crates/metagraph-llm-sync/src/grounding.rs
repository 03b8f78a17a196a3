//! Per-table context for documentation generation.
//!
//! Grounding items come from a retrieval step (a JSON file of previously
//! retrieved schema facts) or are derived directly from a `MetadataGraph`.
//! Free-text definitions are joined to them by normalized table name.

use std::collections::HashMap;

use metagraph_core::MetadataGraph;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Keys a textual-definition row may use to name its table, in priority order.
pub const TEXTUAL_TABLE_KEYS: &[&str] = &["table", "technical_table", "table_name"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingColumn {
    #[serde(default)]
    pub technical_column: Option<String>,
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub is_key: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One retrieved table. Unknown fields are kept so the whole item can be
/// handed to the model as mapping context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingItem {
    #[serde(default)]
    pub technical_table: Option<String>,
    #[serde(default)]
    pub columns: Vec<GroundingColumn>,
    #[serde(default = "empty_array")]
    pub primary_key: Value,
    #[serde(default = "empty_array")]
    pub foreign_keys: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

/// The schema block of the prompt.
pub fn schema_context(item: &GroundingItem) -> Value {
    let columns: Vec<Value> = item
        .columns
        .iter()
        .map(|c| {
            json!({
                "name": c.technical_column,
                "type": c.data_type.as_deref().unwrap_or(UNKNOWN_TYPE),
                "is_key": c.is_key,
            })
        })
        .collect();

    json!({
        "table_name": item.technical_table,
        "columns": columns,
        "primary_key": item.primary_key,
        "foreign_keys": item.foreign_keys,
    })
}

/// One grounding item per table of `graph`.
pub fn grounding_from_graph(graph: &MetadataGraph) -> Vec<GroundingItem> {
    graph
        .tables()
        .iter()
        .map(|table| {
            let column_ids: Vec<&str> = table.columns.iter().map(|c| c.canonical_id.as_str()).collect();
            let foreign_keys: Vec<Value> = graph
                .relationships_from(&table.canonical_id)
                .filter(|r| column_ids.contains(&r.source_column.as_str()))
                .map(|r| {
                    json!({
                        "column": r.source_column,
                        "references_table": r.target_table,
                        "references_column": r.target_column,
                        "relationship_type": r.relationship_type,
                    })
                })
                .collect();

            let mut extra = Map::new();
            extra.insert("table_name".to_string(), json!(table.table_name));
            extra.insert("table_type".to_string(), json!(table.table_type));
            extra.insert("domain".to_string(), json!(table.domain));
            extra.insert("description".to_string(), json!(table.description));

            GroundingItem {
                technical_table: Some(table.physical_name.clone()),
                columns: table
                    .columns
                    .iter()
                    .map(|c| GroundingColumn {
                        technical_column: Some(c.name.clone()),
                        data_type: Some(c.data_type.to_string()),
                        is_key: c.is_primary_key || c.is_foreign_key,
                        extra: Map::new(),
                    })
                    .collect(),
                primary_key: json!(table.primary_key_columns().map(|c| c.name.clone()).collect::<Vec<_>>()),
                foreign_keys: Value::Array(foreign_keys),
                extra,
            }
        })
        .collect()
}

/// Lookup key shared by grounding and textual rows.
pub fn normalize_lookup_key(name: &str) -> String {
    name.trim().to_lowercase().replace('.', "_")
}

/// Textual definitions indexed by normalized table name. Later rows for the
/// same table replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TextualLookup {
    rows: HashMap<String, Value>,
}

impl TextualLookup {
    pub fn from_rows(rows: Vec<Value>) -> Self {
        let mut lookup = Self::default();
        for row in rows {
            let table = TEXTUAL_TABLE_KEYS
                .iter()
                .filter_map(|key| row.get(*key).and_then(Value::as_str))
                .find(|name| !name.trim().is_empty())
                .map(normalize_lookup_key);
            if let Some(table) = table {
                lookup.rows.insert(table, row);
            }
        }
        lookup
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, table: &str) -> Option<&Value> {
        self.rows.get(&normalize_lookup_key(table))
    }

    /// The matching row, or an empty object.
    pub fn context_for(&self, table: &str) -> Value {
        self.get(table)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metagraph_core::{build_graph_from_definitions, RawTableDefinition};

    #[test]
    fn grounding_item_keeps_unknown_fields() {
        let item: GroundingItem = serde_json::from_value(json!({
            "technical_table": "foundation.financial.deposits_v4",
            "columns": [
                {"technical_column": "deposit_id", "type": "bigint", "is_key": true, "score": 0.9},
                {"technical_column": "amount"}
            ],
            "business_terms": ["Deposit"]
        }))
        .unwrap();

        assert_eq!(item.columns[0].extra["score"], 0.9);
        assert_eq!(item.extra["business_terms"], json!(["Deposit"]));

        let mapping = serde_json::to_value(&item).unwrap();
        assert_eq!(mapping["business_terms"], json!(["Deposit"]));

        let schema = schema_context(&item);
        assert_eq!(schema["table_name"], "foundation.financial.deposits_v4");
        assert_eq!(schema["columns"][1]["type"], UNKNOWN_TYPE);
        assert_eq!(schema["columns"][1]["is_key"], false);
        assert_eq!(schema["primary_key"], json!([]));
        assert_eq!(schema["foreign_keys"], json!([]));
    }

    #[test]
    fn textual_rows_match_on_any_table_key() {
        let lookup = TextualLookup::from_rows(vec![
            json!({"table": "Foundation.Financial.Deposits_v4", "definition": "Money in."}),
            json!({"technical_table": "", "table_name": "foundation.account.verified_user_details", "definition": "Users."}),
            json!({"definition": "orphan"}),
        ]);

        assert_eq!(lookup.len(), 2);
        assert_eq!(
            lookup.context_for("foundation.financial.deposits_v4")["definition"],
            "Money in."
        );
        assert_eq!(
            lookup.context_for(" foundation.account.verified_user_details ")["definition"],
            "Users."
        );
        assert_eq!(lookup.context_for("missing"), json!({}));
    }

    #[test]
    fn graph_fragments_become_grounding() {
        let graph = build_graph_from_definitions(&[
            RawTableDefinition::new(
                "foundation.financial.deposits_v4",
                &[("deposit_id", "bigint"), ("user_id", "varchar"), ("amount", "decimal")],
            ),
            RawTableDefinition::new("foundation.account.verified_user_details", &[("user_id", "varchar")]),
        ]);
        let items = grounding_from_graph(&graph);

        assert_eq!(items.len(), 2);
        let deposits = &items[0];
        assert_eq!(deposits.technical_table.as_deref(), Some("foundation.financial.deposits_v4"));
        assert_eq!(deposits.primary_key, json!(["deposit_id"]));
        assert!(deposits.columns[0].is_key);
        assert!(deposits.columns[1].is_key);
        assert!(!deposits.columns[2].is_key);
        assert_eq!(deposits.columns[2].data_type.as_deref(), Some("decimal"));
        assert_eq!(deposits.foreign_keys[0]["references_table"], "verified_user_details");
        assert_eq!(deposits.extra["table_type"], "RAW");
    }
}
