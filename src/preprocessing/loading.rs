//! Загрузка и объединение CSV-выгрузок
//!
//! Все файлы должны иметь одинаковый набор колонок. Файл с тем же набором
//! в другом порядке приводится к порядку первого файла.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Writer};

use crate::error::{PipelineError, Result};
use crate::types::{PreparedData, Table};

/// Значения, которые читаются как пропуск (совпадает с NA-токенами pandas)
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// Чтение одного CSV-файла с заголовком
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.as_str()) {
            return Err(PipelineError::DuplicateColumn {
                path: path.to_path_buf(),
                column: column.clone(),
            });
        }
    }

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        let row = record
            .iter()
            .map(|field| (!is_missing(field)).then(|| field.to_string()))
            .collect();
        table.push_row(row)?;
    }

    tracing::debug!("Loaded {} rows from {:?}", table.len(), path);
    Ok(table)
}

/// Загрузка и конкатенация: строки файла 1, затем файла 2 и т.д.
pub fn load_and_combine<P: AsRef<Path>>(paths: &[P]) -> Result<Table> {
    let (first, rest) = paths.split_first().ok_or_else(|| {
        PipelineError::InvalidConfig("at least one input file is required".to_string())
    })?;

    let (columns, mut rows) = load_table(first)?.into_parts();

    for path in rest {
        let path = path.as_ref();
        let table = load_table(path)?;
        let order = reconcile_columns(&columns, table.columns(), path)?;
        let (_, other_rows) = table.into_parts();
        rows.extend(other_rows.into_iter().map(|mut row| {
            order
                .iter()
                .map(|&idx| row[idx].take())
                .collect::<Vec<_>>()
        }));
    }

    let combined = Table::from_rows(columns, rows)?;
    tracing::info!(
        "Combined {} files into {} rows",
        paths.len(),
        combined.len()
    );
    Ok(combined)
}

/// Для каждой колонки эталонной схемы возвращает её позицию в `actual`
fn reconcile_columns(expected: &[String], actual: &[String], path: &Path) -> Result<Vec<usize>> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|c| !actual.contains(c))
        .cloned()
        .collect();
    let unexpected: Vec<String> = actual
        .iter()
        .filter(|c| !expected.contains(c))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(PipelineError::SchemaMismatch {
            path: path.to_path_buf(),
            missing,
            unexpected,
        });
    }

    Ok(expected
        .iter()
        .filter_map(|c| actual.iter().position(|a| a == c))
        .collect())
}

/// Выгрузка таблицы признаков (в порядке сортировки по цене) с колонкой `price`
pub fn save_features<P: AsRef<Path>>(data: &PreparedData, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = Writer::from_writer(file);

    let mut header: Vec<&str> = data.feature_names.iter().map(String::as_str).collect();
    header.push("price");
    writer
        .write_record(&header)
        .map_err(|e| PipelineError::csv(path, e))?;

    for (row, price) in data.features.rows().into_iter().zip(data.target.iter()) {
        let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        record.push(price.to_string());
        writer
            .write_record(&record)
            .map_err(|e| PipelineError::csv(path, e))?;
    }

    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    tracing::info!("Wrote {} feature rows to {:?}", data.len(), path);
    Ok(())
}
