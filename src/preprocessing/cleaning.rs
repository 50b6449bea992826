//! Очистка и фильтрация объявлений

use regex::{Regex, RegexBuilder};

use crate::error::{PipelineError, Result};
use crate::types::Table;

/// Удаляет каждую строку, в которой есть хотя бы один пропуск
pub fn drop_missing(table: Table) -> Table {
    let before = table.len();
    let cleaned = table.retain_rows(|row| row.iter().all(Option::is_some));
    tracing::info!(
        "Dropped {} rows with missing values, {} remain",
        before - cleaned.len(),
        cleaned.len()
    );
    cleaned
}

/// Оставляет строки, в `description` которых есть хотя бы одно ключевое
/// слово (без учёта регистра, как подстрока)
pub fn filter_by_keywords<S: AsRef<str>>(table: Table, keywords: &[S]) -> Result<Table> {
    let column = table.require_column("description")?;

    let Some(matcher) = keyword_matcher(keywords)? else {
        tracing::warn!("No keywords given, every row is filtered out");
        return Ok(table.retain_rows(|_| false));
    };

    let before = table.len();
    let filtered = table.retain_rows(|row| {
        row[column]
            .as_deref()
            .map_or(false, |description| matcher.is_match(description))
    });
    tracing::info!(
        "Keyword filter kept {} of {} rows",
        filtered.len(),
        before
    );
    Ok(filtered)
}

fn keyword_matcher<S: AsRef<str>>(keywords: &[S]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| regex::escape(k.as_ref()))
        .filter(|k| !k.is_empty())
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| PipelineError::InvalidConfig(format!("keyword pattern: {e}")))
}
