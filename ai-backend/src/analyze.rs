//! The `/analyze` endpoint: retry/fallback orchestration around the model
//! call, plus the parse → normalize → validate pipeline.

use std::time::Duration;

use analysis_utils::{AnalysisPayload, AnalysisResult, AnalyzeRequest, ErrorResponse};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::gemini::{GeminiClient, GeminiConfig, GenerationParams};
use crate::normalize::normalize_response;
use crate::prompt::{analysis_user_message, ANALYSIS_SYSTEM_PROMPT};
use crate::repair::repair_truncated_json;
use crate::schema::analysis_response_schema;
use crate::validate::validate_analysis;
use crate::AppState;

pub const PRIMARY_TIMEOUT: Duration = Duration::from_millis(25_000);
pub const FALLBACK_TIMEOUT: Duration = Duration::from_millis(22_000);
pub const BASE_MAX_OUTPUT_TOKENS: u32 = 4096;
pub const RETRY_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const FALLBACK_MAX_OUTPUT_TOKENS: u32 = 6144;

const ANALYSIS_TEMPERATURE: f32 = 0.1;
const MAX_SENTENCE_CHARS: usize = 200;

/// One upstream call's budget. The orchestrator never runs attempts in
/// parallel; a spurious extra call costs real quota.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub model: String,
    pub timeout: Duration,
    pub max_output_tokens: u32,
}

impl Attempt {
    pub fn first(config: &GeminiConfig) -> Attempt {
        Attempt {
            model: config.primary_model.clone(),
            timeout: PRIMARY_TIMEOUT,
            max_output_tokens: BASE_MAX_OUTPUT_TOKENS,
        }
    }
}

/// The escalation policy, as a pure function over (failed attempt, error).
///
/// - Truncation on the primary at the base budget buys one retry on the
///   same model with a doubled budget, fallback configured or not.
/// - A timeout, or truncation that the bigger budget did not cure, moves
///   to the fallback model once — if one is actually configured. The
///   fallback keeps the large budget when the trouble was truncation.
/// - Any other failure class, or a failure on the fallback itself, ends
///   the sequence. At most three upstream calls can ever happen.
pub fn next_attempt(
    config: &GeminiConfig,
    failed: &Attempt,
    error: &AnalysisError,
) -> Option<Attempt> {
    if !error.is_escalatable() {
        return None;
    }
    if failed.model != config.primary_model {
        return None;
    }

    let truncated = matches!(error, AnalysisError::TruncatedOutput { .. });

    if truncated && failed.max_output_tokens == BASE_MAX_OUTPUT_TOKENS {
        return Some(Attempt {
            model: config.primary_model.clone(),
            timeout: PRIMARY_TIMEOUT,
            max_output_tokens: RETRY_MAX_OUTPUT_TOKENS,
        });
    }

    if config.has_distinct_fallback() {
        return Some(Attempt {
            model: config.fallback_model.clone(),
            timeout: FALLBACK_TIMEOUT,
            max_output_tokens: if truncated {
                RETRY_MAX_OUTPUT_TOKENS
            } else {
                FALLBACK_MAX_OUTPUT_TOKENS
            },
        });
    }

    None
}

/// Strips a leading/trailing markdown fence the model sometimes wraps
/// around its JSON despite being told not to.
pub fn strip_markdown_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    for prefix in ["```json", "```JSON", "```"] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// Raw model text → validated payload: strip fences, parse (salvaging a
/// truncated tail if direct parsing fails), normalize, validate.
pub fn parse_analysis_text(raw: &str) -> Result<AnalysisPayload, AnalysisError> {
    let text = strip_markdown_fences(raw);

    let mut value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(parse_error) => match repair_truncated_json(text) {
            Some(repaired) => {
                log::warn!("[analyze] repaired truncated JSON response (some words may be missing)");
                repaired
            }
            None => {
                log::error!("[analyze] JSON parse failed and repair unsuccessful: {parse_error}");
                let head: String = text.chars().take(500).collect();
                log::error!("[analyze] raw response head: {head}");
                return Err(AnalysisError::MalformedOutput);
            }
        },
    };

    normalize_response(&mut value);
    validate_analysis(&value)
}

async fn run_attempt(
    client: &GeminiClient,
    sentence: &str,
    attempt: &Attempt,
) -> Result<AnalysisPayload, AnalysisError> {
    let params = GenerationParams {
        temperature: ANALYSIS_TEMPERATURE,
        max_output_tokens: attempt.max_output_tokens,
        response_schema: Some(analysis_response_schema()),
    };
    let raw = client
        .generate(
            &attempt.model,
            ANALYSIS_SYSTEM_PROMPT,
            &analysis_user_message(sentence),
            &params,
            attempt.timeout,
        )
        .await?;
    parse_analysis_text(&raw)
}

/// Runs the attempt sequence until one succeeds or the policy gives up.
pub async fn analyze_sentence(
    client: &GeminiClient,
    sentence: &str,
) -> Result<AnalysisPayload, AnalysisError> {
    let mut attempt = Attempt::first(client.config());
    loop {
        match run_attempt(client, sentence, &attempt).await {
            Ok(payload) => return Ok(payload),
            Err(error) => match next_attempt(client.config(), &attempt, &error) {
                Some(next) => {
                    log::warn!(
                        "[analyze] {error}; escalating to {model} with {tokens} output tokens",
                        model = next.model,
                        tokens = next.max_output_tokens,
                    );
                    attempt = next;
                }
                None => return Err(error),
            },
        }
    }
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, (StatusCode, Json<ErrorResponse>)> {
    let sentence = request.sentence.trim();
    if sentence.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Sentence is required and must be a non-empty string",
        ));
    }
    if request.sentence.chars().count() > MAX_SENTENCE_CHARS {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Sentence must be 200 characters or fewer",
        ));
    }

    let payload = analyze_sentence(&state.gemini, sentence).await.map_err(|error| {
        log::error!("[analyze] Gemini call failed: {error}");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Analysis failed: {error}"),
        )
    })?;

    Ok(Json(AnalysisResult {
        id: uuid::Uuid::new_v4().to_string(),
        sentence: payload.sentence,
        sentence_translation: payload.sentence_translation,
        words: payload.words,
        analyzed_at: chrono::Utc::now().to_rfc3339(),
    }))
}

pub fn error_response(
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_fallback() -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            primary_model: "gemini-2.5-flash".to_string(),
            fallback_model: "gemini-2.0-flash".to_string(),
        }
    }

    fn config_without_fallback() -> GeminiConfig {
        GeminiConfig {
            fallback_model: "gemini-2.5-flash".to_string(),
            ..config_with_fallback()
        }
    }

    fn truncated(model: &str) -> AnalysisError {
        AnalysisError::TruncatedOutput {
            model: model.to_string(),
        }
    }

    fn timed_out(model: &str) -> AnalysisError {
        AnalysisError::Timeout {
            model: model.to_string(),
            timeout_ms: 25_000,
        }
    }

    #[test]
    fn truncation_buys_a_larger_budget_on_the_same_model_first() {
        let config = config_with_fallback();
        let first = Attempt::first(&config);
        let retry = next_attempt(&config, &first, &truncated(&first.model)).unwrap();
        assert_eq!(retry.model, config.primary_model);
        assert_eq!(retry.max_output_tokens, RETRY_MAX_OUTPUT_TOKENS);
        assert_eq!(retry.timeout, PRIMARY_TIMEOUT);
    }

    #[test]
    fn timeout_skips_straight_to_the_fallback_model() {
        let config = config_with_fallback();
        let first = Attempt::first(&config);
        let next = next_attempt(&config, &first, &timed_out(&first.model)).unwrap();
        assert_eq!(next.model, config.fallback_model);
        assert_eq!(next.timeout, FALLBACK_TIMEOUT);
        assert_eq!(next.max_output_tokens, FALLBACK_MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn unresolved_truncation_reaches_the_fallback_with_the_large_budget() {
        let config = config_with_fallback();
        let first = Attempt::first(&config);
        let retry = next_attempt(&config, &first, &truncated(&first.model)).unwrap();
        let fallback = next_attempt(&config, &retry, &truncated(&retry.model)).unwrap();
        assert_eq!(fallback.model, config.fallback_model);
        assert_eq!(fallback.max_output_tokens, RETRY_MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn timeout_after_truncation_retry_uses_the_plain_fallback_budget() {
        let config = config_with_fallback();
        let first = Attempt::first(&config);
        let retry = next_attempt(&config, &first, &truncated(&first.model)).unwrap();
        let fallback = next_attempt(&config, &retry, &timed_out(&retry.model)).unwrap();
        assert_eq!(fallback.model, config.fallback_model);
        assert_eq!(fallback.max_output_tokens, FALLBACK_MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn truncation_retry_applies_even_without_a_distinct_fallback() {
        let config = config_without_fallback();
        let first = Attempt::first(&config);
        let retry = next_attempt(&config, &first, &truncated(&first.model)).unwrap();
        assert_eq!(retry.model, config.primary_model);
        // But a second truncation has nowhere left to go.
        assert!(next_attempt(&config, &retry, &truncated(&retry.model)).is_none());
    }

    #[test]
    fn timeout_without_a_distinct_fallback_fails_immediately() {
        let config = config_without_fallback();
        let first = Attempt::first(&config);
        assert!(next_attempt(&config, &first, &timed_out(&first.model)).is_none());
    }

    #[test]
    fn non_escalatable_errors_never_retry() {
        let config = config_with_fallback();
        let first = Attempt::first(&config);
        assert!(next_attempt(&config, &first, &AnalysisError::MalformedOutput).is_none());
        assert!(
            next_attempt(
                &config,
                &first,
                &AnalysisError::SchemaInvalid {
                    path: "words".to_string(),
                },
            )
            .is_none()
        );
        assert!(
            next_attempt(
                &config,
                &first,
                &AnalysisError::UpstreamRejected("503".to_string()),
            )
            .is_none()
        );
    }

    #[test]
    fn at_most_three_attempts_under_any_error_sequence() {
        let config = config_with_fallback();
        for errors in [
            [truncated("a"), truncated("a"), truncated("a")],
            [truncated("a"), timed_out("a"), timed_out("b")],
            [timed_out("a"), timed_out("b"), timed_out("b")],
        ] {
            let mut attempt = Attempt::first(&config);
            let mut calls = 1;
            for error in &errors {
                match next_attempt(&config, &attempt, error) {
                    Some(next) => {
                        attempt = next;
                        calls += 1;
                    }
                    None => break,
                }
            }
            assert!(calls <= 3, "escalated past three calls: {calls}");
        }
    }

    #[test]
    fn fallback_failures_end_the_sequence() {
        let config = config_with_fallback();
        let fallback = Attempt {
            model: config.fallback_model.clone(),
            timeout: FALLBACK_TIMEOUT,
            max_output_tokens: FALLBACK_MAX_OUTPUT_TOKENS,
        };
        assert!(next_attempt(&config, &fallback, &truncated(&fallback.model)).is_none());
        assert!(next_attempt(&config, &fallback, &timed_out(&fallback.model)).is_none());
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_markdown_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_markdown_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_markdown_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn pipeline_accepts_the_phrasal_verb_example() {
        let raw = r#"```json
        {
            "sentence": "She gave up smoking.",
            "sentenceTranslation": "Вона кинула палити.",
            "words": [
                {"id": "0", "original": "She", "lemma": "she", "partOfSpeech": "pronoun",
                 "isPunctuation": false,
                 "morphemes": [{"text": "she", "type": "root", "meaning": "female person"}]},
                {"id": "1", "original": "gave", "lemma": "give", "partOfSpeech": "phrasal_verb",
                 "isPunctuation": false,
                 "morphemes": [{"text": "give", "type": "root", "meaning": "transfer"}],
                 "groupId": "group-0", "groupMeaning": "to quit", "groupTranslation": "кинути"},
                {"id": "2", "original": "up", "lemma": "up", "partOfSpeech": "phrasal_verb",
                 "isPunctuation": false,
                 "morphemes": [{"text": "up", "type": "root", "meaning": "upward direction"}],
                 "groupId": "group-0", "groupMeaning": "to quit", "groupTranslation": "кинути"},
                {"id": "3", "original": "smoking", "lemma": "smoke", "partOfSpeech": "noun",
                 "isPunctuation": false,
                 "morphemes": [{"text": "smok", "type": "root", "meaning": "burning vapor"},
                               {"text": "ing", "type": "suffix", "meaning": "forms gerund"}]},
                {"id": "4", "original": ".", "lemma": ".", "partOfSpeech": "unknown",
                 "isPunctuation": true, "morphemes": []}
            ]
        }
        ```"#;
        let payload = parse_analysis_text(raw).unwrap();
        assert_eq!(payload.words.len(), 5);
        let grouped = payload
            .words
            .iter()
            .filter(|w| w.group_id.is_some())
            .count();
        assert_eq!(grouped, 2);
        assert!(payload.words[4].is_punctuation);
        assert!(payload.words[4].morphemes.is_empty());
    }

    #[test]
    fn pipeline_repairs_a_truncated_response_down_to_three_words() {
        let raw = concat!(
            r#"{"sentence":"one two three four five","sentenceTranslation":"т","words":["#,
            r#"{"id":"0","original":"one","lemma":"one","partOfSpeech":"numeral","isPunctuation":false,"morphemes":[{"text":"one","type":"root","meaning":"the number one"}]},"#,
            r#"{"id":"1","original":"two","lemma":"two","partOfSpeech":"numeral","isPunctuation":false,"morphemes":[{"text":"two","type":"root","meaning":"the number two"}]},"#,
            r#"{"id":"2","original":"three","lemma":"three","partOfSpeech":"numeral","isPunctuation":false,"morphemes":[{"text":"three","type":"root","meaning":"the number three"}]},"#,
            r#"{"id":"3","original":"four","lemma":"four","partOfSpeech":"numeral","isPunc"#,
        );
        let payload = parse_analysis_text(raw).unwrap();
        assert_eq!(payload.words.len(), 3);
        assert_eq!(payload.words[2].original, "three");
    }

    #[test]
    fn pipeline_normalizes_before_validating() {
        // Missing ids, missing punctuation flags, and a rootless word:
        // normalization makes all of it pass.
        let raw = r#"{"sentence":"Run!","words":[
            {"original": "Run", "lemma": "run", "partOfSpeech": "verb", "morphemes": []},
            {"original": "!", "lemma": "!", "partOfSpeech": "unknown", "isPunctuation": true, "morphemes": []}
        ]}"#;
        let payload = parse_analysis_text(raw).unwrap();
        assert_eq!(payload.words[0].id, "0");
        assert_eq!(payload.words[0].morphemes.len(), 1);
        assert_eq!(
            payload.words[0].morphemes[0].morpheme_type,
            analysis_utils::MorphemeType::Root
        );
        assert_eq!(payload.words[0].morphemes[0].text, "run");
    }

    #[test]
    fn pipeline_rejects_hopeless_garbage() {
        match parse_analysis_text("The model felt chatty today.") {
            Err(AnalysisError::MalformedOutput) => {}
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }
}
