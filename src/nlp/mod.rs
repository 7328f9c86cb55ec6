// NLP module for granth: chapter segmentation, sentence splitting and
// extractive summarization.
pub mod sections;
pub mod sentences;
pub mod summarization;

pub use summarization::{summarize_document, write_summary, Summary, SummaryConfig, DEFAULT_RATIO};
