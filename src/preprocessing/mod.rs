/// Модуль предобработки данных

pub mod cleaning;
pub mod feature_engineering;
pub mod loading;
pub mod vocabulary;

pub use cleaning::{drop_missing, filter_by_keywords};
pub use feature_engineering::FeatureEngineer;
pub use loading::{load_and_combine, load_table, save_features};
