//! Конфигурация конвейера

use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Что делать со строками, у которых после feature engineering
/// не извлечён `view_count`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullFeaturePolicy {
    /// Повторная очистка: строка удаляется вместе с целью
    #[default]
    Drop,
    /// Прерывание запуска с указанием строки и признака
    Fail,
}

/// Что делать с типом продавца вне словаря (у него нет кода 0/1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownSellerPolicy {
    /// Строка удаляется, значения логируются один раз
    #[default]
    Drop,
    /// Прерывание запуска с исходным значением
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_paths: Vec<PathBuf>,
    pub keywords: Vec<String>,
    pub model_path: PathBuf,
    pub seed: u64,
    pub test_size: f64,
    pub null_policy: NullFeaturePolicy,
    pub unknown_seller: UnknownSellerPolicy,
    pub features_out: Option<PathBuf>,
    pub report_out: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(input_paths: Vec<PathBuf>) -> Self {
        Self {
            input_paths,
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_null_policy(mut self, policy: NullFeaturePolicy) -> Self {
        self.null_policy = policy;
        self
    }

    pub fn with_unknown_seller(mut self, policy: UnknownSellerPolicy) -> Self {
        self.unknown_seller = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_paths.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one input file is required".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_paths: vec![
                PathBuf::from("bina_az_19092023.csv"),
                PathBuf::from("bina_az_21092023.csv"),
            ],
            keywords: ["icare", "kiraye", "ицаре", "кирае", "Сдается"]
                .into_iter()
                .map(String::from)
                .collect(),
            model_path: PathBuf::from("model.bin"),
            seed: 42,
            test_size: 0.2,
            null_policy: NullFeaturePolicy::default(),
            unknown_seller: UnknownSellerPolicy::default(),
            features_out: None,
            report_out: None,
        }
    }
}
