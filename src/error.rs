//! Ошибки конвейера

use std::path::PathBuf;
use thiserror::Error;

/// Ошибки уровня модели (совместимы с `linfa::traits::Fit`)
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Dimension mismatch: expected {expected} rows, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Feature count mismatch: model has {expected} features, input has {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("Not enough samples to fit the model: {0}")]
    NotEnoughSamples(usize),

    #[error(transparent)]
    Linfa(#[from] linfa::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Schema of {path:?} differs from the first input: missing {missing:?}, unexpected {unexpected:?}")]
    SchemaMismatch {
        path: PathBuf,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Duplicate column {column:?} in {path:?}")]
    DuplicateColumn { path: PathBuf, column: String },

    #[error("Row has {got} cells, table has {expected} columns")]
    RowWidth { expected: usize, got: usize },

    #[error("Required column {0:?} is absent")]
    MissingColumn(String),

    #[error("Row {row}: all_data has {found} comma-separated segments, expected 7")]
    CompositeShape { row: usize, found: usize },

    #[error("Row {row}: price {value:?} is not a number")]
    PriceParse { row: usize, value: String },

    #[error("Row {row}: feature {column} has no numeric value")]
    MissingFeature { row: usize, column: &'static str },

    #[error("Row {row}: seller type {value:?} is not in the vocabulary")]
    UnrecognizedSeller { row: usize, value: String },

    #[error("Not enough samples for a train/test split: {0}")]
    NotEnoughSamples(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Model serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
