use thiserror::Error;

/// Everything that can go wrong between "sentence in" and "validated
/// analysis out". The orchestrator's escalation policy pattern-matches on
/// these variants, so new failure modes get their own variant instead of a
/// message substring.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The generation call lost the race against its wall-clock timer.
    #[error("request to {model} timed out after {timeout_ms}ms")]
    Timeout { model: String, timeout_ms: u64 },

    /// The model stopped because it hit the output token ceiling. Text may
    /// exist, but it is almost certainly cut off mid-structure.
    #[error("{model} stopped at the output token ceiling")]
    TruncatedOutput { model: String },

    /// The raw text was not parseable JSON and the truncation repairer
    /// could not salvage it.
    #[error("model output could not be parsed as JSON")]
    MalformedOutput,

    /// The parsed payload failed the strict shape check. `path` names the
    /// first offending field, e.g. `words[3].partOfSpeech`.
    #[error("model output failed validation at {path}")]
    SchemaInvalid { path: String },

    /// No provider credential configured. Unrecoverable; retrying with a
    /// different model will not conjure an API key.
    #[error("GEMINI_API_KEY environment variable is not set")]
    ConfigurationMissing,

    /// Provider-side failure not otherwise classified (HTTP error status,
    /// empty candidate list, transport failure).
    #[error("upstream request failed: {0}")]
    UpstreamRejected(String),
}

impl AnalysisError {
    /// Only timeouts and truncation are worth spending another upstream
    /// call on; everything else fails immediately.
    pub fn is_escalatable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Timeout { .. } | AnalysisError::TruncatedOutput { .. }
        )
    }
}
