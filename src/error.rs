use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::prediction::PredictionError;
use crate::thresholds::ThresholdError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to open log {path}: {source}")]
    OpenLog { source: io::Error, path: PathBuf },
    #[error("failed to write log record: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

pub type Result<T> = std::result::Result<T, Error>;
