//! Конвейер: загрузка → очистка → фильтр → признаки → обучение → сохранение

use std::fs::File;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{train_and_evaluate, PriceModel};
use crate::preprocessing::{
    drop_missing, filter_by_keywords, load_and_combine, save_features, FeatureEngineer,
};
use crate::types::{PreparedData, RegressionReport};

/// Число строк после каждого этапа
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub loaded: usize,
    pub cleaned: usize,
    pub filtered: usize,
    pub engineered: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub model: PriceModel,
    pub report: RegressionReport,
    pub counts: StageCounts,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Этапы до обучения включительно с feature engineering
    pub fn prepare(&self) -> Result<(PreparedData, StageCounts)> {
        self.config.validate()?;
        let mut counts = StageCounts::default();

        let combined = load_and_combine(&self.config.input_paths)?;
        counts.loaded = combined.len();

        let cleaned = drop_missing(combined);
        counts.cleaned = cleaned.len();

        let filtered = filter_by_keywords(cleaned, &self.config.keywords)?;
        counts.filtered = filtered.len();

        let data = FeatureEngineer::new(self.config.null_policy)
            .with_unknown_seller(self.config.unknown_seller)
            .engineer(&filtered)?;
        counts.engineered = data.len();

        Ok((data, counts))
    }

    pub fn run(&self) -> Result<PipelineOutcome> {
        let (data, counts) = self.prepare()?;
        tracing::info!(
            "Rows per stage: loaded {}, cleaned {}, filtered {}, engineered {}",
            counts.loaded,
            counts.cleaned,
            counts.filtered,
            counts.engineered
        );

        if let Some(path) = &self.config.features_out {
            save_features(&data, path)?;
        }

        let (model, report) = train_and_evaluate(&data, self.config.seed, self.config.test_size)?;
        model.save(&self.config.model_path)?;

        if let Some(path) = &self.config.report_out {
            let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
            serde_json::to_writer_pretty(file, &ReportFile { report, counts })?;
        }

        Ok(PipelineOutcome {
            model,
            report,
            counts,
        })
    }
}

#[derive(Serialize)]
struct ReportFile {
    #[serde(flatten)]
    report: RegressionReport,
    counts: StageCounts,
}
