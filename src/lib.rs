//! bina-price - предсказание цены объявлений bina.az (Rust библиотека)

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use config::{NullFeaturePolicy, PipelineConfig, UnknownSellerPolicy};
pub use error::{ModelError, PipelineError, Result};
pub use models::*;
pub use pipeline::{Pipeline, PipelineOutcome, StageCounts};
pub use preprocessing::*;
pub use types::*;
