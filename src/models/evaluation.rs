//! Разбиение на train/test, обучение и метрики качества

use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{ModelError, PipelineError, Result};
use crate::models::{OrdinaryLeastSquares, PriceModel};
use crate::types::{PreparedData, RegressionReport};

/// Индексы строк обучающей и тестовой частей
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Воспроизводимое разбиение: `ceil(n * test_size)` строк в тест,
/// остальные в обучение; перестановка зависит только от `seed` и `n`
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let n_test = (n_samples as f64 * test_size).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::NotEnoughSamples(n_samples));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (p - t).powi(2))
        .sum::<f64>()
        / n
}

/// Коэффициент детерминации; отрицателен, если модель хуже среднего.
/// Меньше двух точек: не определён (NaN). При нулевой дисперсии цели:
/// 1.0 для точного предсказания, иначе 0.0
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.len() < 2 {
        tracing::warn!("R2 is undefined for {} test samples", y_true.len());
        return f64::NAN;
    }
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Обучение OLS на обучающей части и оценка на тестовой
pub fn train_and_evaluate(
    data: &PreparedData,
    seed: u64,
    test_size: f64,
) -> Result<(PriceModel, RegressionReport)> {
    if data.features.nrows() != data.target.len() {
        return Err(ModelError::DimensionMismatch {
            expected: data.features.nrows(),
            got: data.target.len(),
        }
        .into());
    }

    let split = train_test_split(data.len(), test_size, seed)?;
    tracing::debug!(
        "Split {} rows: {} train, {} test (seed {})",
        data.len(),
        split.train.len(),
        split.test.len(),
        seed
    );

    let x_train = data.features.select(Axis(0), &split.train);
    let y_train = data.target.select(Axis(0), &split.train);
    let x_test = data.features.select(Axis(0), &split.test);
    let y_test = data.target.select(Axis(0), &split.test);

    let model = OrdinaryLeastSquares::default()
        .fit(&DatasetBase::new(x_train, y_train))?
        .with_feature_names(data.feature_names.clone());

    if x_test.ncols() != model.n_features() {
        return Err(ModelError::FeatureMismatch {
            expected: model.n_features(),
            got: x_test.ncols(),
        }
        .into());
    }
    let predictions: Array1<f64> = model.predict(&x_test);

    let report = RegressionReport {
        mse: mean_squared_error(&y_test, &predictions),
        r2: r2_score(&y_test, &predictions),
        n_train: split.train.len(),
        n_test: split.test.len(),
    };
    tracing::info!(
        "Model trained on {} rows, evaluated on {}. MSE: {:.2}, R2: {:.2}",
        report.n_train,
        report.n_test,
        report.mse,
        report.r2
    );

    Ok((model, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn prepared(features: Array2<f64>, target: Array1<f64>) -> PreparedData {
        PreparedData {
            feature_names: (0..features.ncols()).map(|i| format!("f{i}")).collect(),
            features,
            target,
            listings: Vec::new(),
        }
    }

    #[test]
    fn test_split_sizes_match_sklearn_rounding() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);

        let split = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = train_test_split(25, 0.2, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let a = train_test_split(50, 0.2, 42).unwrap();
        let b = train_test_split(50, 0.2, 42).unwrap();
        let c = train_test_split(50, 0.2, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_split_needs_two_rows() {
        assert!(matches!(
            train_test_split(1, 0.2, 42),
            Err(PipelineError::NotEnoughSamples(1))
        ));
        assert!(matches!(
            train_test_split(0, 0.2, 42),
            Err(PipelineError::NotEnoughSamples(0))
        ));
    }

    #[test]
    fn test_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![1.0, 2.0, 3.0, 6.0];

        assert_abs_diff_eq!(mean_squared_error(&y_true, &y_pred), 1.0);
        // ss_res = 4, ss_tot = 5
        assert_abs_diff_eq!(r2_score(&y_true, &y_pred), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![3.0, 2.0, 1.0];
        // ss_res = 8, ss_tot = 2
        assert_abs_diff_eq!(r2_score(&y_true, &y_pred), -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        let y_true = array![5.0, 5.0];
        assert_eq!(r2_score(&y_true, &array![5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&y_true, &array![4.0, 5.0]), 0.0);
    }

    #[test]
    fn test_r2_undefined_for_single_sample() {
        assert!(r2_score(&array![5.0], &array![5.0]).is_nan());
        assert!(r2_score(&array![5.0], &array![4.0]).is_nan());
    }

    #[test]
    fn test_single_test_row_reports_undefined_r2() {
        // 4 строки, test_size 0.2: одна тестовая строка
        let features = array![[1.0], [2.0], [3.0], [4.0]];
        let target = array![3.0, 5.0, 7.0, 9.0];

        let (_, report) = train_and_evaluate(&prepared(features, target), 42, 0.2).unwrap();

        assert_eq!(report.n_test, 1);
        assert!(report.r2.is_nan());
        assert!(report.mse.is_finite());
    }

    #[test]
    fn test_train_and_evaluate_on_exact_relation() {
        let features = Array2::from_shape_fn((20, 2), |(i, j)| ((i * (j + 2)) % 7) as f64 + i as f64 * j as f64);
        let target = features.map_axis(Axis(1), |row| 100.0 + 3.0 * row[0] - 2.0 * row[1]);

        let (model, report) = train_and_evaluate(&prepared(features, target), 42, 0.2).unwrap();

        assert_eq!(report.n_test, 4);
        assert_eq!(report.n_train, 16);
        assert_abs_diff_eq!(report.mse, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(model.intercept(), 100.0, epsilon = 1e-8);
        assert_eq!(model.feature_names(), &["f0", "f1"]);
    }

    #[test]
    fn test_train_and_evaluate_rejects_misaligned_data() {
        let data = prepared(Array2::zeros((4, 1)), array![1.0, 2.0, 3.0]);
        assert!(matches!(
            train_and_evaluate(&data, 42, 0.2),
            Err(PipelineError::Model(ModelError::DimensionMismatch { .. }))
        ));
    }
}
