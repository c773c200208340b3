//! Structured-output schema sent along with each generation request.
//!
//! The schema is derived from the same serde types the validator finally
//! deserializes into, so what we ask the model for and what we accept
//! cannot drift apart. The provider's conformance is best-effort only;
//! the validator stays the authority.

use analysis_utils::AnalysisPayload;
use schemars::generate::SchemaSettings;

/// The response schema for the sentence-analysis task. Subschemas are
/// inlined because the Gemini API does not resolve `$ref`s.
pub fn analysis_response_schema() -> serde_json::Value {
    schema_value::<AnalysisPayload>()
}

fn schema_value<T: schemars::JsonSchema>() -> serde_json::Value {
    let settings = SchemaSettings::default().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let generator = settings.into_generator();
    let mut value = generator.into_root_schema_for::<T>().to_value();
    if let Some(root) = value.as_object_mut() {
        // Metadata keys the generateContent endpoint does not understand.
        root.remove("title");
        root.remove("$schema");
    }
    value
}
