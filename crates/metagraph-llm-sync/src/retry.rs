//! Bounded retry around a single-attempt generator.

use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::generator::TextGenerator;
use crate::LlmError;

/// `retries` extra attempts after the first, `delay` apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Call `generator` until it succeeds or the policy runs out.
///
/// Attempts are sequential with `policy.delay` between them. The last error
/// is returned wrapped in `LlmError::RetriesExhausted`.
pub fn call_with_retries<G: TextGenerator + ?Sized>(
    generator: &G,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<Value, LlmError> {
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match generator.generate_json(prompt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(attempt, of = attempts, error = %e, "model call failed, retrying");
                thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(e) => {
                return Err(LlmError::RetriesExhausted {
                    attempts,
                    source: Box::new(e),
                })
            }
        }
    }
}
