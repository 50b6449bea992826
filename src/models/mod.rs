/// ML модели

pub mod evaluation;
pub mod persistence;
pub mod regression;

pub use evaluation::{mean_squared_error, r2_score, train_and_evaluate, train_test_split, TrainTestSplit};
pub use regression::{OrdinaryLeastSquares, PriceModel};
