//! Fixed instruction blocks for the two generation tasks.
//!
//! The instructions never change between retries or fallbacks; only the
//! invocation parameters (model, timeout, output budget) vary.

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a precise computational linguist. Output strict RFC 8259 JSON only — all keys and string values must use double quotes, no trailing commas, no comments, no markdown.

Schema:
{"sentence":"<original>","sentenceTranslation":"<Ukrainian translation of entire sentence>","words":[{"id":"<index string>","original":"<surface form>","lemma":"<base form>","partOfSpeech":"<noun|verb|auxiliary_verb|adjective|adverb|pronoun|preposition|conjunction|interjection|determiner|particle|numeral|phrasal_verb|idiom|modal_structure|unknown>","translation":"<Ukrainian>","morphemes":[{"text":"<text>","type":"<prefix|root|suffix|ending|infix>","meaning":"<2-5 word description>","translationUk":"<Ukrainian, for prefix/suffix only>"}],"isPunctuation":false,"groupId":"<optional, e.g. group-0>","groupMeaning":"<optional>","groupTranslation":"<optional Ukrainian>"}]}

Rules:
- Include every token. Punctuation: isPunctuation=true, morphemes=[].
- Every non-punctuation word needs at least one "root" morpheme. Order morphemes left→right.
- Always provide sentenceTranslation (natural Ukrainian).
- Provide translation (Ukrainian) for each word. Omit for function words with no standalone Ukrainian equivalent.
- Morpheme meaning: very short (2-5 words). Prefixes: what they add. Suffixes: what they form. Endings: grammatical function. Roots: core meaning.
- translationUk: only for prefix and suffix morphemes. Omit for root and ending.
- Detect phrasal verbs ("give up"), idioms ("piece of cake"), modal structures ("should have been"). For multi-word expressions: assign same groupId to all words, set partOfSpeech to phrasal_verb/idiom/modal_structure for each, include groupMeaning and groupTranslation on each word. Non-grouped words must not have group fields."#;

pub fn analysis_user_message(sentence: &str) -> String {
    format!("Analyze this sentence: \"{sentence}\"")
}

pub const WORD_TREE_SYSTEM_PROMPT: &str = r#"You are a precise computational linguist specializing in morphological derivation.
Given a root morpheme and the word it appeared in, generate a list of words derived from the same root.
Return raw JSON only, no markdown fences.

Schema:
{
  "root": "<the root morpheme>",
  "rootMeaning": "<brief meaning of the root>",
  "derivatives": [
    {
      "word": "<derived word>",
      "meaning": "<short definition>",
      "rootHighlight": [<startIndex>, <length>]
    }
  ]
}

Rules:
- Include 7 common English words sharing this root.
- Order from simplest (closest to root) to most complex (most affixes).
- "rootHighlight" must be the 0-based character index and length of the root within the word.
- Include the original source word in the list.
- Focus on real, commonly used English words."#;

pub fn word_tree_user_message(root: &str, word: &str) -> String {
    format!("Root morpheme: \"{root}\" (from the word \"{word}\"). Generate the word derivation tree.")
}
