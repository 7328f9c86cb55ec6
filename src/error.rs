// Error types for the summarization core and the media layer.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Invalid ratio {0}: must be in (0, 1]")]
    Config(f64),

    #[error("{} is not valid UTF-8 (first invalid byte at offset {offset})", .path.display())]
    Encoding { path: PathBuf, offset: usize },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SummaryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SummaryError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} is required but was not found on PATH")]
    MissingBinary(String),

    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    BadResponse(String),

    #[error("TTS returned empty audio data")]
    EmptyAudio,

    #[error("Nothing to synthesize: text is empty")]
    EmptyText,

    #[error("No images available: {0}")]
    NoImages(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SummaryResult<T> = Result<T, SummaryError>;
pub type MediaResult<T> = Result<T, MediaError>;
