use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("recording exhausted after {0} frames")]
    EndOfStream(u64),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no detection recorded for frame {0}")]
    MissingFrame(u64),
    #[error("landmark inference failed: {0}")]
    Inference(String),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: unknown handedness label '{label}'")]
    UnknownHandedness { line: usize, label: String },
    #[error("line {line}: frame dimensions must be positive")]
    EmptyFrame { line: usize },
}
