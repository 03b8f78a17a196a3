//! Governance documentation from metadata graphs.
//!
//! For each table fragment this crate:
//! 1. builds a strict-JSON prompt from schema, mapping and textual context
//! 2. calls an external text generator with bounded, sequential retries
//! 3. normalizes the model's loosely keyed JSON into a `DocumentationRecord`
//!
//! The output is a parallel artifact; nothing here feeds back into the
//! `MetadataGraph` it was derived from.

pub mod batch;
pub mod config;
pub mod generator;
pub mod grounding;
pub mod output;
pub mod prompt;
pub mod retry;

pub use batch::{run_documentation_batch, BatchReport, TableDocumentation, TableFailure};
pub use config::{ConfigError, LlmConfig};
pub use generator::TextGenerator;
#[cfg(feature = "ollama")]
pub use generator::OllamaGenerator;
pub use grounding::{grounding_from_graph, schema_context, GroundingItem, TextualLookup};
pub use output::{normalize_model_output, DocumentationRecord, NO_DELTA_SENTINEL};
pub use prompt::build_prompt;
pub use retry::{call_with_retries, RetryPolicy};

use serde::Serialize;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("failed to reach model service at {url}: {message}")]
    Transport { url: String, message: String },
    #[error("model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("empty response from model")]
    EmptyResponse,
    #[error("model returned malformed JSON: {0}")]
    MalformedJson(String),
    #[error("model JSON call failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LlmError>,
    },
    #[error("missing governance_doc_markdown in model output for table {table}")]
    MissingGovernanceDoc { table: String },
    #[error("failed to serialize prompt context: {0}")]
    Context(#[from] serde_json::Error),
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Prompt, call (with retries) and normalize the documentation for one table.
///
/// Any error is fatal for `table_name` only; callers decide whether the rest
/// of a batch continues.
pub fn generate_documentation<G, S, M, T>(
    generator: &G,
    policy: &RetryPolicy,
    table_name: &str,
    table_context: &S,
    mapping_context: &M,
    textual_context: &T,
) -> Result<DocumentationRecord, LlmError>
where
    G: TextGenerator + ?Sized,
    S: Serialize + ?Sized,
    M: Serialize + ?Sized,
    T: Serialize + ?Sized,
{
    let prompt = build_prompt(table_context, mapping_context, textual_context)?;
    debug!(table = table_name, prompt_chars = prompt.len(), "prompt built");
    let raw = call_with_retries(generator, &prompt, policy)?;
    normalize_model_output(&raw, table_name)
}
