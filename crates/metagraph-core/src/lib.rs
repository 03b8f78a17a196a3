//! Metadata canonicalization and relationship inference.
//!
//! Pipeline:
//! - `normalize`: physical names and type tokens -> canonical forms
//! - `model`: `Table` / `Column` / `Relationship` / `MetadataGraph`
//! - `inference`: heuristic or curated relationship discovery
//! - `builder`: raw rows or literal definitions -> `MetadataGraph`
//!
//! This crate performs no I/O. Reading dictionaries and definitions lives in
//! `metagraph-ingest-dict`; the documentation stage lives in
//! `metagraph-llm-sync`.

pub mod builder;
pub mod error;
pub mod inference;
pub mod model;
pub mod normalize;
pub mod rules;

pub use builder::{
    build_graph, build_graph_from_definitions, build_graph_from_definitions_with,
    build_graph_with, BuildOptions, DictionaryRow, RawColumnDefinition, RawTableDefinition,
};
pub use error::SchemaError;
pub use inference::{
    apply_curated_edges, default_curated_edges, discover_relationships, infer_relationships,
    CuratedEdge, EdgeDedup, RelationshipStrategy,
};
pub use model::{Column, DataType, Domain, MetadataGraph, Relationship, Table, TableType};
pub use normalize::{
    assign_domain, assign_domain_with, classify_table_type, normalize_column_name,
    normalize_data_type, normalize_table_name,
};
