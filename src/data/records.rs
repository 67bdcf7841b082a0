//! Pathway Record Module
//! Maps user-selected table columns to pathway enrichment records.

use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// One enrichment result row.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayRecord {
    pub name: String,
    pub p_value: f64,
    pub count: u64,
}

impl PathwayRecord {
    pub fn new(name: impl Into<String>, p_value: f64, count: u64) -> Self {
        Self {
            name: name.into(),
            p_value,
            count,
        }
    }

    /// Significance on the chart axis.
    pub fn neg_log_p(&self) -> f64 {
        -self.p_value.log10()
    }
}

/// Which table columns hold the pathway name, p-value and gene count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub pathway: String,
    pub p_value: String,
    pub count: String,
}

impl ColumnMapping {
    /// Guess a mapping from the table's column list.
    pub fn guess(columns: &[String], numeric: &[String]) -> Self {
        let pathway = columns
            .iter()
            .find(|c| c.as_str() == "KEGGpathways")
            .or_else(|| {
                columns.iter().find(|c| {
                    let n = c.to_ascii_lowercase();
                    n.contains("pathway") || n.contains("term") || n.contains("description")
                })
            })
            .or_else(|| columns.first())
            .cloned()
            .unwrap_or_default();

        let p_value = find_column(columns, "pvalue", &["pvalue", "p.value", "pval"])
            .or_else(|| numeric.first().cloned())
            .unwrap_or_default();

        let count = find_column(columns, "count", &["count"])
            .or_else(|| numeric.iter().rev().find(|c| **c != p_value).cloned())
            .unwrap_or_default();

        Self {
            pathway,
            p_value,
            count,
        }
    }

    /// Replace guessed columns with explicitly requested ones.
    pub fn override_with(
        mut self,
        pathway: Option<&str>,
        p_value: Option<&str>,
        count: Option<&str>,
    ) -> Self {
        if let Some(name) = pathway {
            self.pathway = name.to_string();
        }
        if let Some(name) = p_value {
            self.p_value = name.to_string();
        }
        if let Some(name) = count {
            self.count = name.to_string();
        }
        self
    }

    /// True once all three columns are chosen.
    pub fn is_complete(&self) -> bool {
        !self.pathway.is_empty() && !self.p_value.is_empty() && !self.count.is_empty()
    }
}

/// Lowercase and drop separators so "P-Value", "p_value" and "PValue" compare equal.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn find_column(columns: &[String], exact: &str, fragments: &[&str]) -> Option<String> {
    columns
        .iter()
        .find(|c| normalize(c) == exact)
        .or_else(|| {
            columns.iter().find(|c| {
                let n = c.to_ascii_lowercase();
                fragments.iter().any(|f| n.contains(f))
            })
        })
        .cloned()
}

/// Extracts pathway records from a loaded table.
pub struct RecordExtractor;

impl RecordExtractor {
    /// Build records from the mapped columns, keeping table order.
    ///
    /// Rows with a blank name, a p-value outside (0, 1], or a missing or
    /// negative count are skipped.
    pub fn extract(
        df: &DataFrame,
        mapping: &ColumnMapping,
    ) -> Result<Vec<PathwayRecord>, ExtractError> {
        let name_col = Self::column(df, &mapping.pathway)?.cast(&DataType::String)?;
        let p_col = Self::column(df, &mapping.p_value)?.cast(&DataType::Float64)?;
        let count_col = Self::column(df, &mapping.count)?.cast(&DataType::Float64)?;

        let names = name_col.str()?;
        let p_values = p_col.f64()?;
        let counts = count_col.f64()?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;

        for i in 0..df.height() {
            let row = (names.get(i), p_values.get(i), counts.get(i));
            match row {
                (Some(name), Some(p), Some(c))
                    if !name.trim().is_empty()
                        && p.is_finite()
                        && p > 0.0
                        && p <= 1.0
                        && c.is_finite()
                        && c >= 0.0 =>
                {
                    records.push(PathwayRecord::new(name.trim(), p, c.round() as u64));
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, kept = records.len(), "skipped rows with missing or invalid values");
        }
        debug!(records = records.len(), ?mapping, "records extracted");

        Ok(records)
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, ExtractError> {
        if name.is_empty() {
            return Err(ExtractError::MissingColumn("(none selected)".to_string()));
        }
        df.column(name)
            .map_err(|_| ExtractError::MissingColumn(name.to_string()))
    }
}
