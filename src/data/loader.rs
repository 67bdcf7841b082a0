//! Table Loader Module
//! Handles spreadsheet loading (CSV/TSV through Polars, workbooks through calamine)
//! and column discovery.

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File extensions accepted by the file picker.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods"];

/// Stand-in for cells past the end of a short worksheet row.
const EMPTY_CELL: &Data = &Data::Empty;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to parse table: {0}")]
    Parse(#[from] PolarsError),
    #[error("Failed to read workbook: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("The first worksheet has no header row")]
    EmptySheet,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No data loaded")]
    NoData,
}

/// Source format, resolved from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" | "txt" => Ok(TableFormat::Tsv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(TableFormat::Workbook),
            _ => Err(LoaderError::UnsupportedFormat(if ext.is_empty() {
                path.display().to_string()
            } else {
                ext
            })),
        }
    }
}

/// Holds the loaded table and the path it came from.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a table from disk and keep it.
    pub fn load(&mut self, path: &Path) -> Result<&DataFrame, LoaderError> {
        let df = Self::read_table(path)?;
        self.file_path = Some(path.to_path_buf());
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Read a table without touching loader state (used from the background thread).
    pub fn read_table(path: &Path) -> Result<DataFrame, LoaderError> {
        let format = TableFormat::from_path(path)?;
        debug!(path = %path.display(), ?format, "reading table");

        let df = match format {
            TableFormat::Csv => Self::read_delimited(path, b',')?,
            TableFormat::Tsv => Self::read_delimited(path, b'\t')?,
            TableFormat::Workbook => Self::read_workbook(path)?,
        };

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "table loaded"
        );
        Ok(df)
    }

    fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_separator(separator)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Read the first worksheet of a workbook into a DataFrame.
    ///
    /// The first row is the header. A column becomes Float64 when every
    /// non-empty cell is numeric, otherwise it is kept as text.
    fn read_workbook(path: &Path) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook.worksheet_range_at(0).ok_or(LoaderError::EmptySheet)??;

        let mut rows = range.rows();
        let header = rows.next().ok_or(LoaderError::EmptySheet)?;
        let names = Self::header_names(header);
        let body: Vec<&[Data]> = rows.collect();

        let columns = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&Data> = body
                    .iter()
                    .map(|row| row.get(idx).unwrap_or(EMPTY_CELL))
                    .collect();
                Self::workbook_column(name, &cells)
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Header cells to unique, non-empty column names.
    fn header_names(header: &[Data]) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(header.len());
        for (idx, cell) in header.iter().enumerate() {
            let raw = cell.to_string().trim().to_string();
            let mut name = if raw.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                raw
            };
            if names.contains(&name) {
                let base = name;
                let mut suffix = idx + 1;
                name = format!("{}_{}", base, suffix);
                // a suffixed name may itself be a header further along
                while names.contains(&name)
                    || header[idx + 1..]
                        .iter()
                        .any(|c| c.to_string().trim() == name)
                {
                    suffix += 1;
                    name = format!("{}_{}", base, suffix);
                }
            }
            names.push(name);
        }
        names
    }

    fn workbook_column(name: &str, cells: &[&Data]) -> Column {
        let numeric = cells
            .iter()
            .all(|cell| matches!(cell, Data::Int(_) | Data::Float(_) | Data::Empty));

        if numeric {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        } else {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), values)
        }
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get list of numeric column names.
    pub fn get_numeric_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(numeric_columns)
            .unwrap_or_default()
    }

    /// First `n` rows rendered as display strings.
    pub fn preview_rows(&self, n: usize) -> Vec<Vec<String>> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        let head = df.head(Some(n));
        (0..head.height())
            .map(|i| {
                head.get_columns()
                    .iter()
                    .map(|col| match col.get(i) {
                        Ok(val) if !val.is_null() => val.to_string().trim_matches('"').to_string(),
                        _ => String::new(),
                    })
                    .collect()
            })
            .collect()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Set DataFrame directly (used for async loading)
    pub fn set_dataframe(&mut self, df: DataFrame, path: PathBuf) {
        self.df = Some(df);
        self.file_path = Some(path);
    }
}

/// Names of the numeric columns of a DataFrame, in table order.
fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| {
            matches!(
                col.dtype(),
                DataType::Float32
                    | DataType::Float64
                    | DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
            )
        })
        .map(|col| col.name().to_string())
        .collect()
}
