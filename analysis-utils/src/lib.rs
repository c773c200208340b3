//! Wire types shared between the AI backend and the TypeScript frontend.
//!
//! Everything here is serialized with camelCase field names, which is what
//! the Gemini structured-output schema requests and what the UI consumes.

#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    AuxiliaryVerb,
    Adjective,
    Adverb,
    Pronoun,
    Preposition,
    Conjunction,
    Interjection,
    Determiner,
    Particle,
    Numeral,
    PhrasalVerb,
    Idiom,
    ModalStructure,
    Unknown,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 16] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::AuxiliaryVerb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Interjection,
        PartOfSpeech::Determiner,
        PartOfSpeech::Particle,
        PartOfSpeech::Numeral,
        PartOfSpeech::PhrasalVerb,
        PartOfSpeech::Idiom,
        PartOfSpeech::ModalStructure,
        PartOfSpeech::Unknown,
    ];

    /// The wire name of this tag. Must stay in lockstep with the serde
    /// rename; `tests::as_str_matches_serde` pins this.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::AuxiliaryVerb => "auxiliary_verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Determiner => "determiner",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Numeral => "numeral",
            PartOfSpeech::PhrasalVerb => "phrasal_verb",
            PartOfSpeech::Idiom => "idiom",
            PartOfSpeech::ModalStructure => "modal_structure",
            PartOfSpeech::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::AuxiliaryVerb => "auxiliary verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Determiner => "determiner",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Numeral => "numeral",
            PartOfSpeech::PhrasalVerb => "phrasal verb",
            PartOfSpeech::Idiom => "idiom",
            PartOfSpeech::ModalStructure => "modal structure",
            PartOfSpeech::Unknown => "unknown",
        };
        write!(f, "{word}")
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum MorphemeType {
    Prefix,
    Root,
    Suffix,
    Ending,
    Infix,
}

impl MorphemeType {
    pub const ALL: [MorphemeType; 5] = [
        MorphemeType::Prefix,
        MorphemeType::Root,
        MorphemeType::Suffix,
        MorphemeType::Ending,
        MorphemeType::Infix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MorphemeType::Prefix => "prefix",
            MorphemeType::Root => "root",
            MorphemeType::Suffix => "suffix",
            MorphemeType::Ending => "ending",
            MorphemeType::Infix => "infix",
        }
    }
}

/// One meaningful unit of a word. `translation_uk` is only filled in for
/// prefixes and suffixes; roots and endings carry their meaning in
/// `meaning` alone.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Morpheme {
    pub text: String,
    #[serde(rename = "type")]
    pub morpheme_type: MorphemeType,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_uk: Option<String>,
}

/// A single token of the analyzed sentence, in source order.
///
/// Group fields are either all meaningful (the word belongs to a multi-word
/// expression such as a phrasal verb) or all absent.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedWord {
    pub id: String,
    pub original: String,
    pub lemma: String,
    pub part_of_speech: PartOfSpeech,
    pub morphemes: Vec<Morpheme>,
    pub is_punctuation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_translation: Option<String>,
}

/// The shape the model is asked to produce for sentence analysis.
///
/// `sentence_translation` is required in the outbound schema (we always
/// want the model to try) but optional on the way back in; the validator
/// tolerates its absence.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub sentence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(required)]
    pub sentence_translation: Option<String>,
    pub words: Vec<AnalyzedWord>,
}

/// What `/analyze` returns to the UI: the validated payload stamped with an
/// id and a timestamp. Immutable once created; the UI's history panel owns
/// the only durable copy.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    pub sentence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_translation: Option<String>,
    pub words: Vec<AnalyzedWord>,
    pub analyzed_at: String,
}

/// One derived word in a word-derivation tree. `root_highlight` is the
/// 0-based character index and length of the root within `word`; the
/// renderer clamps it defensively.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WordTreeEntry {
    pub word: String,
    pub meaning: String,
    pub root_highlight: (u32, u32),
}

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WordTreeResult {
    pub root: String,
    pub root_meaning: String,
    pub derivatives: Vec<WordTreeEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, schemars::JsonSchema)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AnalyzeRequest {
    pub sentence: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, schemars::JsonSchema)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct WordTreeRequest {
    pub root: String,
    pub word: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, schemars::JsonSchema)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ErrorResponse {
    pub error: String,
}
