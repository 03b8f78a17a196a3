//! Relationship inference.
//!
//! Two interchangeable strategies produce the same `Relationship` shape:
//!
//! - **Heuristic**: scan every ordered pair of tables and link columns whose
//!   canonical names are equal and carry `id`.
//! - **Curated**: emit a fixed list of business edges, keyed on concept names,
//!   for schemas whose relationships are already known.
//!
//! Both only ever link tables that are present in the input, so the resulting
//! graph has no dangling references. Neither can fail; finding nothing is a
//! valid outcome.

use tracing::debug;

use crate::model::{Relationship, Table};
use crate::rules::ID_MARKER;

pub const LINKED_BY_ID: &str = "linked_by_id";

/// What to do with repeated edges.
///
/// The heuristic scans ordered pairs, so `A.x_id`/`B.x_id` yields both
/// `A -> B` and `B -> A`; two variants of one concept can also yield identical
/// edges. `Keep` leaves all of them in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDedup {
    #[default]
    Keep,
    /// Drop edges identical to an earlier one.
    Exact,
    /// Also drop an edge whose reverse was already emitted.
    Unordered,
}

/// A known business relationship between two concepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedEdge {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub relationship_type: String,
    pub description: String,
}

impl CuratedEdge {
    pub fn new(
        (source_table, source_column): (&str, &str),
        (target_table, target_column): (&str, &str),
        relationship_type: &str,
        description: &str,
    ) -> Self {
        Self {
            source_table: source_table.to_string(),
            source_column: source_column.to_string(),
            target_table: target_table.to_string(),
            target_column: target_column.to_string(),
            relationship_type: relationship_type.to_string(),
            description: description.to_string(),
        }
    }
}

/// Business edges of the foundation financial/account schema.
pub fn default_curated_edges() -> Vec<CuratedEdge> {
    vec![
        CuratedEdge::new(
            ("deposits", "user_id"),
            ("verified_user_details", "user_id"),
            "belongs_to",
            "Deposits are made into accounts owned by verified users.",
        ),
        CuratedEdge::new(
            ("withdrawals", "user_id"),
            ("verified_user_details", "user_id"),
            "belongs_to",
            "Withdrawals are performed by users associated with accounts.",
        ),
        CuratedEdge::new(
            ("ledger_account_balances", "user_id"),
            ("verified_user_details", "user_id"),
            "account_owner",
            "Ledger account balances correspond to verified users.",
        ),
        CuratedEdge::new(
            ("authgateway_session_created_events", "user_id"),
            ("verified_user_details", "user_id"),
            "session_of",
            "Authentication sessions belong to verified users.",
        ),
        CuratedEdge::new(
            ("verification_attempt", "user_id"),
            ("verified_user_details", "user_id"),
            "verification_event",
            "Verification attempts relate to user identity validation.",
        ),
        CuratedEdge::new(
            ("worldpay_transactions", "user_id"),
            ("verified_user_details", "user_id"),
            "payment_transaction",
            "Worldpay transactions originate from user-linked accounts.",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelationshipStrategy {
    #[default]
    Heuristic,
    Curated(Vec<CuratedEdge>),
}

impl RelationshipStrategy {
    pub fn curated() -> Self {
        Self::Curated(default_curated_edges())
    }
}

/// Run `strategy` over `tables`, flagging foreign-key columns in place.
pub fn infer_relationships(
    tables: &mut [Table],
    strategy: &RelationshipStrategy,
    dedup: EdgeDedup,
) -> Vec<Relationship> {
    let relationships = match strategy {
        RelationshipStrategy::Heuristic => discover_relationships(tables),
        RelationshipStrategy::Curated(edges) => apply_curated_edges(tables, edges),
    };
    dedup_relationships(relationships, dedup)
}

/// Heuristic discovery over every ordered pair of distinct tables.
///
/// Tables sharing a canonical id (RAW/ENRICHED variants of one concept) are
/// not linked to each other. Every matching source column gets
/// `is_foreign_key = true`.
pub fn discover_relationships(tables: &mut [Table]) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut foreign_keys: Vec<(usize, usize)> = Vec::new();

    for (si, source) in tables.iter().enumerate() {
        for (ci, column) in source.columns.iter().enumerate() {
            for (ti, target) in tables.iter().enumerate() {
                if si == ti || source.canonical_id == target.canonical_id {
                    continue;
                }
                for target_column in &target.columns {
                    if !is_id_link(&column.name, &target_column.name) {
                        continue;
                    }
                    debug!(
                        source = %column.canonical_id,
                        target = %target_column.canonical_id,
                        "linked by id"
                    );
                    foreign_keys.push((si, ci));
                    relationships.push(Relationship {
                        source_table: source.canonical_id.clone(),
                        source_column: column.canonical_id.clone(),
                        target_table: target.canonical_id.clone(),
                        target_column: target_column.canonical_id.clone(),
                        relationship_type: LINKED_BY_ID.to_string(),
                        description: format!("Auto-detected link via {}", column.name),
                    });
                }
            }
        }
    }

    for (ti, ci) in foreign_keys {
        tables[ti].columns[ci].is_foreign_key = true;
    }
    relationships
}

fn is_id_link(source: &str, target: &str) -> bool {
    source == target && source.contains(ID_MARKER)
}

/// Emit the curated edges whose endpoint tables and columns all exist.
///
/// Edges are matched on concept name (`table_name`); one edge is emitted per
/// curated entry no matter how many variants of the concept are present, and
/// the source column is flagged in every variant that has it.
pub fn apply_curated_edges(tables: &mut [Table], edges: &[CuratedEdge]) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for edge in edges {
        let source = find_column(tables, &edge.source_table, &edge.source_column);
        let target = find_column(tables, &edge.target_table, &edge.target_column);
        let (Some((source_table, source_column)), Some((target_table, target_column))) =
            (source, target)
        else {
            debug!(
                source = %edge.source_table,
                target = %edge.target_table,
                "curated edge skipped: endpoint not present"
            );
            continue;
        };

        relationships.push(Relationship {
            source_table,
            source_column,
            target_table,
            target_column,
            relationship_type: edge.relationship_type.clone(),
            description: edge.description.clone(),
        });

        for table in tables.iter_mut().filter(|t| t.table_name == edge.source_table) {
            if let Some(column) = table.column_mut(&edge.source_column) {
                column.is_foreign_key = true;
            }
        }
    }

    relationships
}

/// Canonical (table id, column id) of the first variant of `concept` that has `column`.
fn find_column(tables: &[Table], concept: &str, column: &str) -> Option<(String, String)> {
    tables
        .iter()
        .filter(|t| t.table_name == concept)
        .find_map(|t| {
            t.column(column)
                .map(|c| (t.canonical_id.clone(), c.canonical_id.clone()))
        })
}

pub fn dedup_relationships(relationships: Vec<Relationship>, mode: EdgeDedup) -> Vec<Relationship> {
    if mode == EdgeDedup::Keep {
        return relationships;
    }

    let mut kept: Vec<Relationship> = Vec::with_capacity(relationships.len());
    for rel in relationships {
        let duplicate = kept.iter().any(|k| match mode {
            EdgeDedup::Exact => *k == rel,
            EdgeDedup::Unordered => {
                k.relationship_type == rel.relationship_type && k.same_endpoints_unordered(&rel)
            }
            EdgeDedup::Keep => false,
        });
        if !duplicate {
            kept.push(rel);
        }
    }
    kept
}
