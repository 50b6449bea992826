//! Сохранение и загрузка обученной модели (bincode)

use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::models::PriceModel;

impl PriceModel {
    /// Сохраняет модель, безусловно перезаписывая существующий файл
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)?;
        fs::write(path, &bytes).map_err(|e| PipelineError::io(path, e))?;
        tracing::info!(
            "Saved model trained at {} ({} bytes) to {:?}",
            self.trained_at().to_rfc3339(),
            bytes.len(),
            path
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        let model = bincode::deserialize(&bytes)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrdinaryLeastSquares;
    use linfa::traits::{Fit, Predict};
    use linfa::DatasetBase;
    use ndarray::{array, Array1};
    use tempfile::tempdir;

    #[test]
    fn test_loaded_model_predicts_the_same() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = array![10.0, 25.0, 30.0, 41.0];
        let model = OrdinaryLeastSquares::default()
            .fit(&DatasetBase::new(x.clone(), y))
            .unwrap()
            .with_feature_names(vec!["view_count".into(), "is_near_metro".into()]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        model.save(&path).unwrap();
        let loaded = PriceModel::load(&path).unwrap();

        assert_eq!(loaded, model);
        assert_eq!(loaded.trained_at(), model.trained_at());
        let expected: Array1<f64> = model.predict(&x);
        let actual: Array1<f64> = loaded.predict(&x);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, vec![0u8; 4096]).unwrap();

        let model = OrdinaryLeastSquares::default()
            .fit(&DatasetBase::new(array![[1.0], [2.0]], array![1.0, 2.0]))
            .unwrap();
        model.save(&path).unwrap();

        assert!(fs::metadata(&path).unwrap().len() < 4096);
        assert_eq!(PriceModel::load(&path).unwrap(), model);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            PriceModel::load("/no/such/model.bin"),
            Err(PipelineError::Io { .. })
        ));
    }
}
