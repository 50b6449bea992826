/// CLI: обучение модели цены на выгрузках bina.az

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use bina_price::{NullFeaturePolicy, Pipeline, PipelineConfig, UnknownSellerPolicy};

/// Train a linear price model on scraped bina.az listings
#[derive(Parser, Debug)]
#[command(name = "bina-price")]
#[command(about = "Train a listing price regression model", long_about = None)]
#[command(version)]
struct Cli {
    /// Input CSV exports (defaults to the two bina.az dumps)
    inputs: Vec<PathBuf>,

    /// Keyword the description must contain (repeatable, case-insensitive)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Where the trained model is written (overwritten on every run)
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Seed for the train/test split
    #[arg(long)]
    seed: Option<u64>,

    /// Held-out fraction
    #[arg(long)]
    test_size: Option<f64>,

    /// Rows without a view count: drop them or abort
    #[arg(long, value_enum, default_value = "drop")]
    null_policy: CliPolicy,

    /// Rows whose seller type is outside the vocabulary: drop them or abort
    #[arg(long, value_enum, default_value = "drop")]
    unknown_seller: CliPolicy,

    /// Export the engineered feature table as CSV
    #[arg(long)]
    features_out: Option<PathBuf>,

    /// Export the evaluation report as JSON
    #[arg(long)]
    report_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPolicy {
    Drop,
    Fail,
}

impl From<CliPolicy> for NullFeaturePolicy {
    fn from(policy: CliPolicy) -> Self {
        match policy {
            CliPolicy::Drop => NullFeaturePolicy::Drop,
            CliPolicy::Fail => NullFeaturePolicy::Fail,
        }
    }
}

impl From<CliPolicy> for UnknownSellerPolicy {
    fn from(policy: CliPolicy) -> Self {
        match policy {
            CliPolicy::Drop => UnknownSellerPolicy::Drop,
            CliPolicy::Fail => UnknownSellerPolicy::Fail,
        }
    }
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::default()
            .with_null_policy(self.null_policy.into())
            .with_unknown_seller(self.unknown_seller.into());

        if !self.inputs.is_empty() {
            config.input_paths = self.inputs;
        }
        if !self.keywords.is_empty() {
            config = config.with_keywords(self.keywords);
        }
        if let Some(path) = self.model_path {
            config = config.with_model_path(path);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(test_size) = self.test_size {
            config = config.with_test_size(test_size);
        }
        config.features_out = self.features_out;
        config.report_out = self.report_out;
        config
    }
}

fn main() -> anyhow::Result<()> {
    // Логи в stderr, stdout только для метрик
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config();
    tracing::info!("Training on {} input files", config.input_paths.len());

    let outcome = Pipeline::new(config)
        .run()
        .context("Price model pipeline failed")?;

    println!("{}", outcome.report);
    Ok(())
}
