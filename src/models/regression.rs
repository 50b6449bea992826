//! Модель цены: линейная регрессия методом наименьших квадратов

#![allow(non_snake_case)]

use chrono::{DateTime, Utc};
use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Гиперпараметры OLS: свободный член и по коэффициенту на признак,
/// без регуляризации
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdinaryLeastSquares {
    /// Относительный порог, ниже которого ведущий элемент считается нулём
    pivot_tolerance: f64,
}

impl OrdinaryLeastSquares {
    pub fn new() -> Self {
        Self {
            pivot_tolerance: 1e-10,
        }
    }
}

impl Default for OrdinaryLeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl Fit<Array2<f64>, Array1<f64>, ModelError> for OrdinaryLeastSquares {
    type Object = PriceModel;

    fn fit(
        &self,
        dataset: &DatasetBase<Array2<f64>, Array1<f64>>,
    ) -> Result<Self::Object, ModelError> {
        let X = &dataset.records;
        let y = &dataset.targets;
        let n_samples = X.nrows();

        if y.len() != n_samples {
            return Err(ModelError::DimensionMismatch {
                expected: n_samples,
                got: y.len(),
            });
        }

        // Центрирование убирает свободный член из системы
        let x_mean = X
            .mean_axis(Axis(0))
            .ok_or(ModelError::NotEnoughSamples(n_samples))?;
        let y_mean = y.mean().ok_or(ModelError::NotEnoughSamples(n_samples))?;
        let X_centered = X - &x_mean;
        let y_centered = y - y_mean;

        // Нормальные уравнения: (X^T X) β = X^T y
        let xtx = X_centered.t().dot(&X_centered);
        let xty = X_centered.t().dot(&y_centered);
        let coefficients = solve_normal_equations(&xtx, &xty, self.pivot_tolerance);

        let intercept = y_mean - x_mean.dot(&coefficients);
        tracing::debug!(
            "OLS fit on {} samples: intercept {:.4}, coefficients {:?}",
            n_samples,
            intercept,
            coefficients
        );

        Ok(PriceModel {
            feature_names: Vec::new(),
            coefficients,
            intercept,
            trained_at: Utc::now(),
        })
    }
}

/// Метод Гаусса с выбором ведущего элемента по столбцу.
///
/// Столбцы с нулевым (в пределах допуска) ведущим элементом линейно зависят
/// от предыдущих (полный one-hot блок + свободный член, категория без строк
/// в обучающей выборке). Из частного решения вычитается его проекция на ядро
/// матрицы: остаётся решение МНК минимальной нормы, не зависящее от порядка
/// столбцов.
fn solve_normal_equations(A: &Array2<f64>, b: &Array1<f64>, tolerance: f64) -> Array1<f64> {
    let echelon = Echelon::reduce(A, b, tolerance);
    let n = A.nrows();

    // Частное решение, свободные переменные равны нулю
    let particular = echelon.back_substitute(Array1::zeros(n), true);

    let free_columns = echelon.free_columns(n);
    if free_columns.is_empty() {
        return particular;
    }

    // Базис ядра: единица в одном свободном столбце, нули в остальных
    let k = free_columns.len();
    let mut kernel = Array2::<f64>::zeros((n, k));
    for (j, &free) in free_columns.iter().enumerate() {
        let mut seed = Array1::<f64>::zeros(n);
        seed[free] = 1.0;
        kernel
            .column_mut(j)
            .assign(&echelon.back_substitute(seed, false));
    }

    // x = x_p - N (N^T N)^{-1} N^T x_p; N^T N положительно определена
    let gram = kernel.t().dot(&kernel);
    let projected = kernel.t().dot(&particular);
    let weights =
        Echelon::reduce(&gram, &projected, tolerance).back_substitute(Array1::zeros(k), true);

    particular - kernel.dot(&weights)
}

/// Ступенчатая форма расширенной матрицы после прямого хода
struct Echelon {
    augmented: Array2<f64>,
    pivot_columns: Vec<usize>,
}

impl Echelon {
    fn reduce(A: &Array2<f64>, b: &Array1<f64>, tolerance: f64) -> Self {
        let n = A.nrows();
        let mut augmented = Array2::<f64>::zeros((n, n + 1));
        for i in 0..n {
            for j in 0..n {
                augmented[[i, j]] = A[[i, j]];
            }
            augmented[[i, n]] = b[i];
        }

        let mut pivot_columns = Vec::with_capacity(n);
        let mut row = 0;

        for col in 0..n {
            if row == n {
                break;
            }

            let mut max_row = row;
            let mut max_val = augmented[[row, col]].abs();
            for k in (row + 1)..n {
                if augmented[[k, col]].abs() > max_val {
                    max_val = augmented[[k, col]].abs();
                    max_row = k;
                }
            }

            if max_val <= tolerance * A[[col, col]].abs() || max_val == 0.0 {
                continue;
            }

            if max_row != row {
                for j in 0..=n {
                    augmented.swap([row, j], [max_row, j]);
                }
            }

            let pivot = augmented[[row, col]];
            for k in (row + 1)..n {
                let factor = augmented[[k, col]] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for j in col..=n {
                    augmented[[k, j]] -= factor * augmented[[row, j]];
                }
            }

            pivot_columns.push(col);
            row += 1;
        }

        Self {
            augmented,
            pivot_columns,
        }
    }

    fn free_columns(&self, n: usize) -> Vec<usize> {
        (0..n).filter(|c| !self.pivot_columns.contains(c)).collect()
    }

    /// Обратный ход. Значения свободных переменных берутся из `x`;
    /// `with_rhs = false` решает однородную систему (вектор ядра)
    fn back_substitute(&self, mut x: Array1<f64>, with_rhs: bool) -> Array1<f64> {
        let n = x.len();
        for (r, &col) in self.pivot_columns.iter().enumerate().rev() {
            let mut sum = if with_rhs { self.augmented[[r, n]] } else { 0.0 };
            for j in (col + 1)..n {
                sum -= self.augmented[[r, j]] * x[j];
            }
            x[col] = sum / self.augmented[[r, col]];
        }
        x
    }
}

/// Обученная модель; неизменяема после обучения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceModel {
    feature_names: Vec<String>,
    coefficients: Array1<f64>,
    intercept: f64,
    trained_at: DateTime<Utc>,
}

impl PriceModel {
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = names;
        self
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Коэффициент признака по имени
    pub fn coefficient(&self, feature: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|name| name == feature)
            .and_then(|idx| self.coefficients.get(idx).copied())
    }
}

impl PredictInplace<Array2<f64>, Array1<f64>> for PriceModel {
    fn predict_inplace(&self, x: &Array2<f64>, y: &mut Array1<f64>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        *y = x.dot(&self.coefficients) + self.intercept;
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::traits::Predict;
    use ndarray::array;

    fn fit(x: Array2<f64>, y: Array1<f64>) -> PriceModel {
        OrdinaryLeastSquares::default()
            .fit(&DatasetBase::new(x, y))
            .unwrap()
    }

    #[test]
    fn test_recovers_exact_linear_relation() {
        // y = 1 + 2 x1 - 3 x2
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 3.0], [3.0, 1.0], [4.0, 5.0]];
        let y = x.map_axis(Axis(1), |row| 1.0 + 2.0 * row[0] - 3.0 * row[1]);

        let model = fit(x, y);

        assert_abs_diff_eq!(model.intercept(), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.coefficients()[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(model.coefficients()[1], -3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_full_one_hot_block_is_handled() {
        // x0 числовой, x1 + x2 = 1 в каждой строке (коллинеарно со свободным членом)
        let x = array![
            [1.0, 1.0, 0.0],
            [2.0, 0.0, 1.0],
            [3.0, 1.0, 0.0],
            [4.0, 0.0, 1.0],
            [5.0, 1.0, 0.0],
        ];
        let y = x.map_axis(Axis(1), |row| 10.0 + 2.0 * row[0] + 5.0 * row[1]);

        let model = fit(x.clone(), y.clone());
        let predictions: Array1<f64> = model.predict(&x);

        assert!(model.coefficients().iter().all(|c| c.is_finite()));
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*p, *t, epsilon = 1e-8);
        }
        assert_abs_diff_eq!(model.coefficients()[0], 2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_unseen_category_prediction_ignores_column_order() {
        // Категория C не встречается в обучении
        let y = array![100.0, 110.0, 300.0, 310.0];
        let abc = array![
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let bac = array![
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
        ];

        let first = fit(abc, y.clone());
        let second = fit(bac, y);
        let unseen = array![[0.0, 0.0, 1.0]];

        let p1: Array1<f64> = first.predict(&unseen);
        let p2: Array1<f64> = second.predict(&unseen);
        assert_abs_diff_eq!(p1[0], 205.0, epsilon = 1e-8);
        assert_abs_diff_eq!(p2[0], 205.0, epsilon = 1e-8);

        // Решение минимальной нормы: коэффициенты симметричны
        assert_abs_diff_eq!(first.coefficients()[0], -100.0, epsilon = 1e-8);
        assert_abs_diff_eq!(first.coefficients()[1], 100.0, epsilon = 1e-8);
        assert_abs_diff_eq!(first.coefficients()[2], 0.0, epsilon = 1e-8);
        assert_abs_diff_eq!(second.coefficients()[0], 100.0, epsilon = 1e-8);
    }

    #[test]
    fn test_constant_column_gets_zero_coefficient() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let y = array![3.0, 5.0, 7.0];

        let model = fit(x, y);

        assert_eq!(model.coefficients()[1], 0.0);
        assert_abs_diff_eq!(model.coefficients()[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(model.intercept(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_dimension_mismatch() {
        let dataset = DatasetBase::new(array![[1.0], [2.0]], array![1.0]);
        let result = OrdinaryLeastSquares::default().fit(&dataset);
        assert!(matches!(
            result,
            Err(ModelError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_coefficient_lookup_by_name() {
        let model = fit(array![[1.0], [2.0], [3.0]], array![2.0, 4.0, 6.0])
            .with_feature_names(vec!["view_count".to_string()]);

        assert_abs_diff_eq!(model.coefficient("view_count").unwrap(), 2.0, epsilon = 1e-10);
        assert_eq!(model.coefficient("is_near_metro"), None);
    }
}
