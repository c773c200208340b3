//! Strict structural validation of parsed model output.
//!
//! This is the only gate between the model and the rest of the app: a
//! payload that fails any check here is rejected outright, and callers
//! never see a value that violates the data-model invariants. Checks run
//! in order and short-circuit on the first failure, naming the offending
//! field path for the operator logs.

use analysis_utils::{AnalysisPayload, MorphemeType, PartOfSpeech, WordTreeResult};
use serde_json::Value;

use crate::error::AnalysisError;

fn invalid(path: impl Into<String>) -> AnalysisError {
    AnalysisError::SchemaInvalid { path: path.into() }
}

fn require_string(value: Option<&Value>, path: &str) -> Result<(), AnalysisError> {
    match value {
        Some(Value::String(_)) => Ok(()),
        _ => Err(invalid(path)),
    }
}

fn require_optional_string(value: Option<&Value>, path: &str) -> Result<(), AnalysisError> {
    match value {
        None | Some(Value::String(_)) => Ok(()),
        _ => Err(invalid(path)),
    }
}

/// Checks a (normalized) analysis payload against the full contract and
/// hands back the typed payload. Pure: the input is never mutated.
pub fn validate_analysis(value: &Value) -> Result<AnalysisPayload, AnalysisError> {
    let obj = value.as_object().ok_or_else(|| invalid("<root>"))?;

    require_string(obj.get("sentence"), "sentence")?;
    require_optional_string(obj.get("sentenceTranslation"), "sentenceTranslation")?;

    let words = obj
        .get("words")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("words"))?;

    for (i, word) in words.iter().enumerate() {
        validate_word(word, i)?;
    }

    serde_json::from_value(value.clone()).map_err(|e| {
        // Every shape requirement was just checked, so this conversion is
        // not expected to fail; surface it as a validation error rather
        // than panicking if it ever does.
        log::error!("[validate] typed conversion failed after checks: {e}");
        invalid("<payload>")
    })
}

fn validate_word(word: &Value, i: usize) -> Result<(), AnalysisError> {
    let word = word.as_object().ok_or_else(|| invalid(format!("words[{i}]")))?;

    require_string(word.get("id"), &format!("words[{i}].id"))?;
    require_string(word.get("original"), &format!("words[{i}].original"))?;
    require_string(word.get("lemma"), &format!("words[{i}].lemma"))?;

    let is_punctuation = match word.get("isPunctuation") {
        Some(Value::Bool(b)) => *b,
        _ => return Err(invalid(format!("words[{i}].isPunctuation"))),
    };

    require_optional_string(word.get("translation"), &format!("words[{i}].translation"))?;

    match word.get("partOfSpeech").and_then(Value::as_str) {
        Some(tag) if PartOfSpeech::ALL.iter().any(|pos| pos.as_str() == tag) => {}
        _ => return Err(invalid(format!("words[{i}].partOfSpeech"))),
    }

    let morphemes = word
        .get("morphemes")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("words[{i}].morphemes")))?;

    for field in ["groupId", "groupMeaning", "groupTranslation"] {
        require_optional_string(word.get(field), &format!("words[{i}].{field}"))?;
    }

    if !is_punctuation {
        let has_root = morphemes
            .iter()
            .any(|m| m.get("type") == Some(&Value::String("root".to_string())));
        if !has_root {
            return Err(invalid(format!("words[{i}].morphemes (no root)")));
        }
    }

    for (j, morpheme) in morphemes.iter().enumerate() {
        validate_morpheme(morpheme, i, j)?;
    }

    Ok(())
}

fn validate_morpheme(morpheme: &Value, i: usize, j: usize) -> Result<(), AnalysisError> {
    let path = |field: &str| format!("words[{i}].morphemes[{j}].{field}");
    let morpheme = morpheme
        .as_object()
        .ok_or_else(|| invalid(format!("words[{i}].morphemes[{j}]")))?;

    require_string(morpheme.get("text"), &path("text"))?;

    match morpheme.get("type").and_then(Value::as_str) {
        Some(tag) if MorphemeType::ALL.iter().any(|t| t.as_str() == tag) => {}
        _ => return Err(invalid(path("type"))),
    }

    require_string(morpheme.get("meaning"), &path("meaning"))?;
    require_optional_string(morpheme.get("translationUk"), &path("translationUk"))?;

    Ok(())
}

/// Shape check for the word-derivation endpoint: `root` and `rootMeaning`
/// strings, `derivatives` a sequence of `{word, meaning, rootHighlight}`
/// where `rootHighlight` is a pair of non-negative integers. Highlight
/// bounds are deliberately not checked against the word length; the
/// renderer clamps.
pub fn validate_word_tree(value: &Value) -> Result<WordTreeResult, AnalysisError> {
    let obj = value.as_object().ok_or_else(|| invalid("<root>"))?;

    require_string(obj.get("root"), "root")?;
    require_string(obj.get("rootMeaning"), "rootMeaning")?;

    let derivatives = obj
        .get("derivatives")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("derivatives"))?;

    for (i, entry) in derivatives.iter().enumerate() {
        let entry = entry
            .as_object()
            .ok_or_else(|| invalid(format!("derivatives[{i}]")))?;
        require_string(entry.get("word"), &format!("derivatives[{i}].word"))?;
        require_string(entry.get("meaning"), &format!("derivatives[{i}].meaning"))?;

        let highlight = entry
            .get("rootHighlight")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid(format!("derivatives[{i}].rootHighlight")))?;
        if highlight.len() != 2 || !highlight.iter().all(|n| n.as_u64().is_some()) {
            return Err(invalid(format!("derivatives[{i}].rootHighlight")));
        }
    }

    serde_json::from_value(value.clone()).map_err(|e| {
        log::error!("[validate] word tree typed conversion failed after checks: {e}");
        invalid("<payload>")
    })
}
