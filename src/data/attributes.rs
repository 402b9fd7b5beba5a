//! Per-sample attribute tables used for graph labeling.

use crate::data::CellGrid;
use crate::error::{OmicsGedError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Sample attributes: sample name -> attribute name -> value.
///
/// Attributes never influence graph structure; they only feed label
/// generation.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    samples: BTreeMap<String, BTreeMap<String, String>>,
}

impl AttributeTable {
    /// Create an empty attribute table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an incoming grid and merge it into the table.
    ///
    /// Header row holds attribute names, header column sample names. Returns
    /// the overwrite warnings recorded during the merge.
    pub fn merge_grid(&mut self, grid: &CellGrid) -> Result<Vec<String>> {
        if grid.n_rows() < 2 || grid.n_cols() < 2 {
            return Err(OmicsGedError::SchemaMismatch(
                "attribute table needs at least one sample row and one attribute column"
                    .to_string(),
            ));
        }

        let mut incoming = BTreeSet::new();
        for row in 1..grid.n_rows() {
            let name = grid.cell(row, 0);
            if !incoming.insert(name) {
                return Err(OmicsGedError::DuplicateKey {
                    kind: "sample",
                    name: name.to_string(),
                });
            }
        }

        let mut warnings = Vec::new();
        for row in 1..grid.n_rows() {
            let sample_name = grid.cell(row, 0);
            if self.samples.contains_key(sample_name) {
                warnings.push(format!(
                    "attributes for sample '{}' are already loaded; they will be overwritten",
                    sample_name
                ));
            }
            let mut values = BTreeMap::new();
            for col in 1..grid.n_cols() {
                values.insert(grid.cell(0, col).to_string(), grid.cell(row, col).to_string());
            }
            self.samples.insert(sample_name.to_string(), values);
        }
        Ok(warnings)
    }

    /// Whether any attributes have been loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the table holds attributes for a sample.
    #[inline]
    pub fn contains(&self, sample: &str) -> bool {
        self.samples.contains_key(sample)
    }

    /// The value of an attribute for a sample, if both exist.
    pub fn value(&self, sample: &str, attribute: &str) -> Option<&str> {
        self.samples
            .get(sample)
            .and_then(|attrs| attrs.get(attribute))
            .map(|s| s.as_str())
    }
}
