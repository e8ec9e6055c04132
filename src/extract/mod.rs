//! Structured extraction: one contract, two interchangeable strategies.
//!
//! `pattern` is the deterministic offline reference; `backend` delegates to a
//! text-to-structure inference service while honoring the same output schema
//! and error taxonomy.

pub mod backend;
pub mod pattern;
pub mod repair;

use thiserror::Error;

use crate::model::PoliceOccurrence;

/// Failures of a single extraction call. Transport problems and malformed
/// responses are deliberately distinct: only the latter carries the
/// "retry with a smaller sub-batch" remedy.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("extraction backend returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error(
        "malformed extraction response, all recovery passes failed; \
         retry with fewer pages per sub-batch"
    )]
    MalformedResponse,
    #[error("extraction backend not configured: {0}")]
    NotConfigured(String),
}

impl ExtractError {
    /// True when the failure points at the model rather than the wire, which
    /// the pipeline surfaces as a user advisory.
    pub fn is_model_side(&self) -> bool {
        matches!(self, ExtractError::MalformedResponse | ExtractError::Api { .. })
    }
}

/// Capability interface injected into the pipeline. An empty result means
/// "nothing extractable" and is not an error.
pub trait Extractor {
    fn extract(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<PoliceOccurrence>, ExtractError>> + Send;
}
