//! Repairs common, predictable shape drift in model output before the
//! strict validation pass.
//!
//! Normalize liberally, validate strictly: this pass only coerces and
//! fills defaults, it never rejects. Anything it cannot fix is left for
//! the validator to refuse.

use serde_json::{Map, Value};

/// Placeholder meaning for a synthesized root morpheme.
const SYNTHESIZED_ROOT_MEANING: &str = "core lexical meaning";

pub fn normalize_response(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    let Some(words) = obj.get_mut("words").and_then(Value::as_array_mut) else {
        return;
    };

    for (index, word) in words.iter_mut().enumerate() {
        let Some(word) = word.as_object_mut() else {
            continue;
        };
        normalize_word(word, index);
    }
}

fn normalize_word(word: &mut Map<String, Value>, index: usize) {
    // id: number → string, missing → positional index
    match word.get("id") {
        Some(Value::Number(n)) => {
            let id = n.to_string();
            word.insert("id".to_string(), Value::String(id));
        }
        None => {
            word.insert("id".to_string(), Value::String(index.to_string()));
        }
        _ => {}
    }

    if !word.contains_key("isPunctuation") {
        word.insert("isPunctuation".to_string(), Value::Bool(false));
    }

    // lemma: missing or empty → copy the surface form
    let lemma_missing = match word.get("lemma") {
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
        None => true,
    };
    if lemma_missing {
        if let Some(Value::String(original)) = word.get("original") {
            let original = original.clone();
            word.insert("lemma".to_string(), Value::String(original));
        }
    }

    if !word.get("morphemes").is_some_and(Value::is_array) {
        word.insert("morphemes".to_string(), Value::Array(vec![]));
    }

    // The single most common contract violation: a real word with no root
    // morpheme. Synthesize one so validation can pass; the validator still
    // runs afterwards and checks everything else.
    let is_punctuation = word.get("isPunctuation") == Some(&Value::Bool(true));
    if !is_punctuation && !has_root_morpheme(word) {
        let root_text = root_text_for(word);
        if let Some(morphemes) = word.get_mut("morphemes").and_then(Value::as_array_mut) {
            morphemes.push(serde_json::json!({
                "text": root_text,
                "type": "root",
                "meaning": SYNTHESIZED_ROOT_MEANING,
            }));
        }
    }

    // Empty-string group fields count as absent; strip them so the
    // validator only has to reason about present-vs-missing.
    for field in ["groupId", "groupMeaning", "groupTranslation"] {
        if word.get(field) == Some(&Value::String(String::new())) {
            word.remove(field);
        }
    }
}

fn has_root_morpheme(word: &Map<String, Value>) -> bool {
    word.get("morphemes")
        .and_then(Value::as_array)
        .is_some_and(|morphemes| {
            morphemes
                .iter()
                .any(|m| m.get("type") == Some(&Value::String("root".to_string())))
        })
}

fn root_text_for(word: &Map<String, Value>) -> String {
    match word.get("lemma") {
        Some(Value::String(lemma)) if !lemma.trim().is_empty() => lemma.clone(),
        _ => match word.get("original") {
            Some(Value::String(original)) => original.clone(),
            _ => String::new(),
        },
    }
}
