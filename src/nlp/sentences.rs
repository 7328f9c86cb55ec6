// Sentence splitting and word tokenization for mixed Hindi/English text.
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Danda, period, question mark, exclamation mark.
pub const TERMINATORS: [char; 4] = ['।', '.', '?', '!'];

static TERMINATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[।.?!]+").unwrap());

// Devanagari letters and signs (danda, double danda, digits and the
// abbreviation sign excluded) plus lowercase Latin letters.
static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{0900}-\x{0963}\x{0971}-\x{097F}a-z]+").unwrap());

// Function words that would otherwise dominate every frequency table.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Hindi
        "और", "है", "हैं", "था", "थी", "थे", "को", "के", "का", "की", "में", "से",
        "पर", "यह", "वह", "तो", "भी", "एक", "कि", "या", "लिए", "तक",
        // English
        "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in",
        "is", "it", "its", "of", "on", "that", "the", "to", "was", "will", "with",
        "this", "but", "they", "have", "had",
    ]
    .iter()
    .copied()
    .collect()
});

/// A terminator-delimited unit of a section body. `index` is 0-based within
/// the section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
}

/// Splits a section body into sentences.
///
/// A run of terminators ends a sentence and stays attached to it, so
/// `"क्या?! हाँ।"` yields `"क्या?!"` and `"हाँ।"`. Whitespace inside a sentence
/// (newlines included) collapses to single spaces. A trailing fragment without
/// terminator is kept; fragments made only of terminators are dropped.
pub fn split_sentences(body: &str) -> Vec<Sentence> {
    let mut fragments: Vec<&str> = Vec::new();
    let mut start = 0;
    for m in TERMINATOR_RUN.find_iter(body) {
        fragments.push(&body[start..m.end()]);
        start = m.end();
    }
    fragments.push(&body[start..]);

    fragments
        .into_iter()
        .map(normalize_whitespace)
        .filter(|f| f.chars().any(|c| !TERMINATORS.contains(&c) && !c.is_whitespace()))
        .enumerate()
        .map(|(index, text)| Sentence { index, text })
        .collect()
}

fn normalize_whitespace(fragment: &str) -> String {
    fragment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased content words of a sentence: punctuation and digits are not
/// part of words, one-character words and stopwords are dropped.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let lowered = sentence.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_split_hindi_punctuation() {
        let text = "यह पहला वाक्य है। यह दूसरा वाक्य है! क्या यह तीसरा वाक्य है? हाँ।";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences[2].text, "क्या यह तीसरा वाक्य है?");
    }

    #[test]
    fn test_terminators_are_retained() {
        let sentences = split_sentences("पहला। दूसरा?! तीसरा बिना विराम");
        assert_eq!(texts(&sentences), vec!["पहला।", "दूसरा?!", "तीसरा बिना विराम"]);
    }

    #[test]
    fn test_indices_are_sequential() {
        let sentences = split_sentences("एक। दो। तीन। चार।");
        let indices: Vec<usize> = sentences.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_whitespace_and_empty_fragments() {
        let text = "  पहली   पंक्ति\nजारी है।\n\n।।  . दूसरी।  \n";
        let sentences = split_sentences(text);
        assert_eq!(texts(&sentences), vec!["पहली पंक्ति जारी है।", "दूसरी।"]);
        assert_eq!(sentences[1].index, 1);
    }

    #[test]
    fn test_split_without_whitespace_after_terminator() {
        let sentences = split_sentences("One.Two!Three");
        assert_eq!(texts(&sentences), vec!["One.", "Two!", "Three"]);
    }

    #[test]
    fn test_split_empty_body() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("  \n ").is_empty());
        assert!(split_sentences("।।।").is_empty());
    }

    #[test]
    fn test_tokenize_strips_attached_punctuation() {
        assert_eq!(tokenize("अनुशासन, अभ्यास।"), vec!["अनुशासन", "अभ्यास"]);
        assert_eq!(tokenize("Growth-mindset!"), vec!["growth", "mindset"]);
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_words() {
        assert_eq!(tokenize("यह पुस्तक अनुशासन के बारे में है।"), vec!["पुस्तक", "अनुशासन", "बारे"]);
        assert_eq!(tokenize("This is a Test"), vec!["test"]);
    }

    #[test]
    fn test_tokenize_ignores_digits() {
        assert_eq!(tokenize("अध्याय १२ chapter 12"), vec!["अध्याय", "chapter"]);
    }
}
