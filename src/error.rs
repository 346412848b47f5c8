use std::path::PathBuf;

/// Errors from a speech-synthesis engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Synthesis failed: {0}")]
    Failed(String),
}

/// Errors from the external forced aligner.
///
/// None of these are retried. The orchestrator decides per segment whether
/// to fall back to uniform timing or drop the segment.
#[derive(thiserror::Error, Debug)]
pub enum AlignmentError {
    #[error("aligner '{binary}' could not be executed: {source}")]
    Unavailable {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("aligner timed out after {timeout:?} and was killed")]
    Timeout { timeout: std::time::Duration },
    #[error("aligner exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("aligner report {} unusable: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AlignmentError {
    pub(crate) fn parse(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Why a single segment was dropped from a broadcast.
#[derive(thiserror::Error, Debug)]
pub enum SegmentError {
    #[error("segment text is empty")]
    EmptyText,
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("alignment failed: {0}")]
    Alignment(#[from] AlignmentError),
    #[error("failed to write {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Batch-level failures. These abort the whole run.
#[derive(thiserror::Error, Debug)]
pub enum BroadcastError {
    #[error("cannot read input file {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid input file {}: {source}", path.display())]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no usable segments in input ({total} found, all without text)")]
    NoUsableSegments { total: usize },
    #[error("cannot write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}
