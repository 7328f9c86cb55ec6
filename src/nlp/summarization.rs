// Extractive summarization: per-section frequency scoring and proportional
// top-K selection that keeps the original sentence order.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{SummaryError, SummaryResult};
use crate::loader::Document;
use crate::nlp::sections::{split_sections, Section};
use crate::nlp::sentences::{split_sentences, tokenize, Sentence};

pub const DEFAULT_RATIO: f64 = 0.3;

// Absorbs float error in `n * ratio` (10 * 0.3 == 3.0000000000000004,
// 100 * 0.29 == 28.999999999999996).
const COUNT_EPSILON: f64 = 1e-9;

/// Validated summarization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryConfig {
    ratio: f64,
}

impl SummaryConfig {
    pub fn new(ratio: f64) -> SummaryResult<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(SummaryError::Config(ratio));
        }
        Ok(Self { ratio })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { ratio: DEFAULT_RATIO }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub sentence: Sentence,
    pub score: f64,
}

/// Selected sentences of one section, in original order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySection {
    pub title: Option<String>,
    pub sentences: Vec<Sentence>,
    pub source_sentences: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sections: Vec<SummarySection>,
    pub text: String,
}

impl Summary {
    pub fn selected_sentences(&self) -> usize {
        self.sections.iter().map(|s| s.sentences.len()).sum()
    }

    pub fn source_sentences(&self) -> usize {
        self.sections.iter().map(|s| s.source_sentences).sum()
    }
}

/// Scores each sentence by the average normalized frequency of its words.
///
/// Frequencies are counted over the given sentences only. A word's weight is
/// its count divided by the highest count; sentences without content words
/// score 0.
pub fn score_sentences(sentences: &[Sentence]) -> Vec<ScoredSentence> {
    let tokens: Vec<Vec<String>> = sentences.iter().map(|s| tokenize(&s.text)).collect();

    let mut word_freq: HashMap<&str, usize> = HashMap::new();
    for word in tokens.iter().flatten() {
        *word_freq.entry(word.as_str()).or_insert(0) += 1;
    }
    let max_freq = word_freq.values().max().copied().unwrap_or(1) as f64;

    sentences
        .iter()
        .zip(tokens.iter())
        .map(|(sentence, words)| {
            let score = if words.is_empty() {
                0.0
            } else {
                let total: f64 = words
                    .iter()
                    .map(|w| word_freq.get(w.as_str()).copied().unwrap_or(0) as f64 / max_freq)
                    .sum();
                total / words.len() as f64
            };
            ScoredSentence {
                sentence: sentence.clone(),
                score,
            }
        })
        .collect()
}

/// Number of sentences kept from a section of `n` sentences: at least one,
/// `floor(n * ratio)` otherwise.
pub fn selection_count(n: usize, ratio: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let wanted = (n as f64 * ratio + COUNT_EPSILON).floor() as usize;
    wanted.clamp(1, n)
}

/// Keeps the best `selection_count` sentences and returns them in original
/// order. Equal scores favour the earlier sentence.
pub fn select_sentences(mut scored: Vec<ScoredSentence>, ratio: f64) -> Vec<Sentence> {
    let keep = selection_count(scored.len(), ratio);
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.sentence.index.cmp(&b.sentence.index))
    });
    scored.truncate(keep);

    let mut selected: Vec<Sentence> = scored.into_iter().map(|s| s.sentence).collect();
    selected.sort_by_key(|s| s.index);
    selected
}

pub fn summarize_section(section: &Section, ratio: f64) -> SummarySection {
    let sentences = split_sentences(&section.body);
    let source_sentences = sentences.len();
    let selected = select_sentences(score_sentences(&sentences), ratio);
    tracing::debug!(
        title = section.title.as_deref().unwrap_or("(untitled)"),
        sentences = source_sentences,
        selected = selected.len(),
        "summarized section"
    );
    SummarySection {
        title: section.title.clone(),
        sentences: selected,
        source_sentences,
    }
}

/// Runs segmentation, splitting, scoring and selection over a document.
pub fn summarize_document(doc: &Document, config: &SummaryConfig) -> Summary {
    let sections = split_sections(doc.text());
    tracing::info!(sections = sections.len(), ratio = config.ratio(), "segmented document");

    let sections: Vec<SummarySection> = sections
        .iter()
        .map(|section| summarize_section(section, config.ratio()))
        .collect();
    let text = render_summary(&sections);
    Summary { sections, text }
}

/// Renders sections as text: optional title line, then the selected sentences
/// on one line separated by single spaces. Sections are separated by a blank
/// line and the result ends with one newline. Sections without selected
/// sentences are skipped.
pub fn render_summary(sections: &[SummarySection]) -> String {
    let blocks: Vec<String> = sections
        .iter()
        .filter(|s| !s.sentences.is_empty())
        .map(|s| {
            let body = s
                .sentences
                .iter()
                .map(|sentence| sentence.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            match &s.title {
                Some(title) => format!("{}\n{}", title, body),
                None => body,
            }
        })
        .collect();

    if blocks.is_empty() {
        String::new()
    } else {
        format!("{}\n", blocks.join("\n\n"))
    }
}

/// Writes the summary as UTF-8, creating parent directories and replacing any
/// existing file.
pub fn write_summary(path: &Path, text: &str) -> SummaryResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SummaryError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| SummaryError::io(path, e))?;
    tracing::info!(path = %path.display(), bytes = text.len(), "wrote summary");
    Ok(())
}
