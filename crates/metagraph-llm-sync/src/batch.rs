//! Table-at-a-time documentation runs.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generator::TextGenerator;
use crate::grounding::{schema_context, GroundingItem, TextualLookup};
use crate::output::DocumentationRecord;
use crate::retry::RetryPolicy;
use crate::generate_documentation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDocumentation {
    pub table: String,
    pub output: DocumentationRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFailure {
    pub table: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<TableDocumentation>,
    pub failures: Vec<TableFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Document every grounding item in order.
///
/// Items without a `technical_table` are skipped. A failed table is recorded
/// and the run continues, unless `fail_fast` is set, in which case the report
/// stops at the first failure.
pub fn run_documentation_batch<G: TextGenerator + ?Sized>(
    generator: &G,
    policy: &RetryPolicy,
    items: &[GroundingItem],
    textual: &TextualLookup,
    fail_fast: bool,
) -> BatchReport {
    let mut report = BatchReport::default();

    for item in items {
        let Some(table) = item.technical_table.as_deref().filter(|t| !t.trim().is_empty()) else {
            continue;
        };

        let schema = schema_context(item);
        let textual_context = textual.context_for(table);
        match generate_documentation(generator, policy, table, &schema, item, &textual_context) {
            Ok(output) => {
                info!(table, terms = output.new_terms.len(), "documented table");
                report.results.push(TableDocumentation {
                    table: table.to_string(),
                    output,
                });
            }
            Err(e) => {
                warn!(table, error = %e, "documentation failed");
                report.failures.push(TableFailure {
                    table: table.to_string(),
                    error: e.to_string(),
                });
                if fail_fast {
                    break;
                }
            }
        }
    }

    report
}
