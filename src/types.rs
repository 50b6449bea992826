/// Типы данных конвейера

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Таблица строк CSV: имена колонок и ячейки, `None` = пропуск.
///
/// Строки адресуются позицией, поэтому после любой операции, меняющей
/// число строк, индекс всегда непрерывен `0..n`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|cell| cell.as_deref())
    }

    /// Оставляет строки, для которых предикат истинен, сохраняя порядок
    pub fn retain_rows<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        self.rows.retain(|row| keep(row));
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Option<String>>>) {
        (self.columns, self.rows)
    }
}

/// Сырая запись объявления (только поля, нужные для признаков)
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub description: String,
    pub view: String,
    pub seller_type: String,
    pub price: String,
    pub building_type: String,
    pub all_data: String,
    pub location: String,
    pub address_all: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellerType {
    Agent,
    Owner,
    Unrecognized(String),
}

impl SellerType {
    /// 0 = посредник, 1 = собственник; для нераспознанных значений кода нет
    pub fn encoded(&self) -> Option<u8> {
        match self {
            SellerType::Agent => Some(0),
            SellerType::Owner => Some(1),
            SellerType::Unrecognized(_) => None,
        }
    }
}

/// Семь позиционных слотов поля `all_data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeDetails {
    pub property_type: String,
    pub floor_info: String,
    pub area: String,
    pub room_count: String,
    pub data_1: String,
    pub data_2: String,
    pub data_3: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredListing {
    pub view_count: Option<u64>,
    pub seller_type: SellerType,
    pub price: f64,
    pub description_length: usize,
    pub building_type: String, // унифицированная категория
    pub details: CompositeDetails,
    pub is_near_metro: bool,
}

/// Матрица признаков и цель, выровненные по строкам
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub target: Array1<f64>,
    pub listings: Vec<EngineeredListing>,
}

impl PreparedData {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub mse: f64,
    pub r2: f64,
    pub n_train: usize,
    pub n_test: usize,
}

impl std::fmt::Display for RegressionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mean Squared Error: {:.2}", self.mse)?;
        write!(f, "R-squared (R2) Score: {:.2}", self.r2)
    }
}
