use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Column holding the instance name of each run, used as the x axis.
pub const FILE_COLUMN: &str = "File";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Parse error: {0}")]
    Parse(#[from] csv::Error),
    #[error("Missing column {0}")]
    MissingColumn(String),
    #[error("Non-numeric value {value:?} in column {column:?}, row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
}

/// A group of result columns drawn together on one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    /// Substring a column name must contain to belong to the family
    pub needle: String,
    /// Removed from the column name to build the legend label
    pub prefix: String,
    /// Removed after the prefix to build the legend label
    pub suffix: String,
    pub title: String,
    /// File stem of the rendered chart
    pub slug: String,
}

impl MetricFamily {
    pub fn new(needle: &str, prefix: &str, suffix: &str, title: &str, slug: &str) -> Self {
        Self {
            needle: needle.to_owned(),
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
            title: title.to_owned(),
            slug: slug.to_owned(),
        }
    }

    pub fn success_ratio() -> Self {
        Self::new(
            "Success Ratio",
            "Success Ratio (",
            ")",
            "Proporción de éxito",
            "success-ratio",
        )
    }

    pub fn time() -> Self {
        Self::new("Time", "Time (", ")", "Tiempos de ejecución (s)", "time")
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::success_ratio(), Self::time()]
    }

    pub fn matches(&self, column: &str) -> bool {
        column.contains(&self.needle)
    }

    /// Every occurrence of the prefix, then of the suffix, is removed.
    pub fn legend_label(&self, column: &str) -> String {
        let label = if self.prefix.is_empty() {
            column.to_owned()
        } else {
            column.replace(&self.prefix, "")
        };
        if self.suffix.is_empty() {
            label
        } else {
            label.replace(&self.suffix, "")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// Tab separated results, one row per benchmark run, in file order.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl ResultsTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_owned())
            .collect::<Vec<_>>();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} columns, {} rows", headers.len(), rows.len());
        Ok(Self { headers, rows })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).context(format!("Open results table {}", path.display()))?;
        Self::from_reader(file).context(format!("Parse results table {}", path.display()))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_owned()))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>, TableError> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).unwrap_or_default())
            .collect())
    }

    pub fn categories(&self) -> Result<Vec<String>, TableError> {
        Ok(self
            .column(FILE_COLUMN)?
            .into_iter()
            .map(|x| x.to_owned())
            .collect())
    }

    /// One series per matching column, in header order. Empty cells are
    /// kept as NaN so the line shows a gap.
    pub fn series(&self, family: &MetricFamily) -> Result<Vec<Series>, TableError> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, name)| family.matches(name))
            .map(|(idx, name)| {
                let values = self
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(row, record)| {
                        let cell = record.get(idx).unwrap_or_default().trim();
                        if cell.is_empty() {
                            return Ok(f64::NAN);
                        }
                        cell.parse::<f64>().map_err(|_| TableError::NonNumeric {
                            column: name.clone(),
                            row,
                            value: cell.to_owned(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Series {
                    label: family.legend_label(name),
                    values,
                })
            })
            .collect()
    }
}
