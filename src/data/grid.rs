//! Rectangular cell grids read from delimited text files.

use crate::error::{OmicsGedError, Result};
use std::path::Path;

/// A rectangular grid of string cells, as produced by CSV tokenizing.
///
/// Row 0 is the header row and column 0 the header column of whatever table
/// the grid was read from; the grid itself attaches no meaning to them.
#[derive(Debug, Clone)]
pub struct CellGrid {
    rows: Vec<Vec<String>>,
    n_cols: usize,
}

impl CellGrid {
    /// Build a grid from rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(OmicsGedError::SchemaMismatch(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
        }
        Ok(Self { rows, n_cols })
    }

    /// Read a grid from a delimited file.
    pub fn from_path(path: &Path, separator: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(false)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
        }
        Self::from_rows(rows)
    }

    /// Number of rows, including the header row.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, including the header column.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Cell content at (row, col).
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }
}
