// Analysis error type - the "soft failure" contract shared by all analyzers.
//
// Analyzer methods never panic on degenerate data; an empty or unusable window
// comes back as InsufficientData with a human-readable message, and callers
// must handle the Err before reading any metrics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The filtered/windowed input was empty or too small to analyze.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl AnalysisError {
    pub fn insufficient(msg: impl Into<String>) -> Self {
        AnalysisError::InsufficientData(msg.into())
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
