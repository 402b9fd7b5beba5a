//! Cumulative sample-by-feature abundance table with validated merging.

use crate::data::CellGrid;
use crate::error::{OmicsGedError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// The cumulative omics dataset: sample name -> feature name -> abundance.
///
/// Sorted maps keep sample and feature ordering deterministic, which fixes
/// the id assignment used everywhere downstream.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    samples: BTreeMap<String, BTreeMap<String, f64>>,
}

impl SampleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an incoming grid and merge it into the cumulative table.
    ///
    /// The grid's header row holds feature names and its header column sample
    /// names. The whole grid is validated and parsed before anything is
    /// committed, so a failing merge leaves the table untouched. Returns the
    /// warnings recorded during the merge (currently only sample overwrites).
    pub fn merge_grid(&mut self, grid: &CellGrid) -> Result<Vec<String>> {
        if grid.n_rows() < 2 || grid.n_cols() < 2 {
            return Err(OmicsGedError::SchemaMismatch(
                "abundance table needs at least one sample row and one feature column".to_string(),
            ));
        }

        // Reject duplicate sample names within the incoming table.
        let mut incoming_samples = BTreeSet::new();
        for row in 1..grid.n_rows() {
            let name = grid.cell(row, 0);
            if !incoming_samples.insert(name) {
                return Err(OmicsGedError::DuplicateKey {
                    kind: "sample",
                    name: name.to_string(),
                });
            }
        }

        // Reject duplicate feature names within the incoming table.
        let mut incoming_features = BTreeSet::new();
        for col in 1..grid.n_cols() {
            let name = grid.cell(0, col);
            if !incoming_features.insert(name) {
                return Err(OmicsGedError::DuplicateKey {
                    kind: "feature",
                    name: name.to_string(),
                });
            }
        }

        // Once a table has been loaded, later tables must carry exactly the
        // same feature-name set.
        if let Some(existing) = self.samples.values().next() {
            for &name in &incoming_features {
                if !existing.contains_key(name) {
                    return Err(OmicsGedError::SchemaMismatch(format!(
                        "feature '{}' is not part of the previously loaded table",
                        name
                    )));
                }
            }
            for name in existing.keys() {
                if !incoming_features.contains(name.as_str()) {
                    return Err(OmicsGedError::SchemaMismatch(format!(
                        "previously loaded feature '{}' is missing from the incoming table",
                        name
                    )));
                }
            }
        }

        // Parse every cell into a staging area; nothing is committed yet.
        let mut staged = Vec::with_capacity(grid.n_rows() - 1);
        for row in 1..grid.n_rows() {
            let sample_name = grid.cell(row, 0);
            let mut values = BTreeMap::new();
            for col in 1..grid.n_cols() {
                let feature_name = grid.cell(0, col);
                let value: f64 = grid.cell(row, col).parse().map_err(|_| {
                    OmicsGedError::Parse(format!(
                        "feature '{}' of sample '{}' has a non-numeric value",
                        feature_name, sample_name
                    ))
                })?;
                if value < 0.0 {
                    return Err(OmicsGedError::Parse(format!(
                        "feature '{}' of sample '{}' has a negative value",
                        feature_name, sample_name
                    )));
                }
                values.insert(feature_name.to_string(), value);
            }
            staged.push((sample_name.to_string(), values));
        }

        // Commit. Re-loaded sample names overwrite with a warning.
        let mut warnings = Vec::new();
        for (name, values) in staged {
            if self.samples.contains_key(&name) {
                warnings.push(format!(
                    "sample '{}' is already loaded; its previous values will be overwritten",
                    name
                ));
            }
            self.samples.insert(name, values);
        }
        Ok(warnings)
    }

    /// Number of samples in the cumulative table.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Whether any table has been loaded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample names in sorted order.
    pub fn sample_names(&self) -> Vec<&str> {
        self.samples.keys().map(|s| s.as_str()).collect()
    }

    /// Feature names in sorted order (shared by every sample).
    pub fn feature_names(&self) -> Vec<&str> {
        self.samples
            .values()
            .next()
            .map(|features| features.keys().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Abundance of a feature in a sample.
    pub fn value(&self, sample: &str, feature: &str) -> Option<f64> {
        self.samples.get(sample).and_then(|f| f.get(feature)).copied()
    }

    /// Iterate samples in sorted order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &BTreeMap<String, f64>)> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> CellGrid {
        CellGrid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_merge_disjoint_tables_adds_up() {
        let mut table = SampleTable::new();
        let w1 = table
            .merge_grid(&grid(&[&["", "a", "b"], &["s1", "1", "2"], &["s2", "3", "4"]]))
            .unwrap();
        let w2 = table
            .merge_grid(&grid(&[&["", "a", "b"], &["s3", "5", "6"]]))
            .unwrap();

        assert!(w1.is_empty());
        assert!(w2.is_empty());
        assert_eq!(table.n_samples(), 3);
        assert_eq!(table.value("s3", "b"), Some(6.0));
    }

    #[test]
    fn test_reload_overwrites_with_warning() {
        let mut table = SampleTable::new();
        table
            .merge_grid(&grid(&[&["", "a", "b"], &["s1", "1", "2"]]))
            .unwrap();
        let warnings = table
            .merge_grid(&grid(&[&["", "a", "b"], &["s1", "9", "8"]]))
            .unwrap();

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("s1"));
        assert_eq!(table.n_samples(), 1);
        assert_eq!(table.value("s1", "a"), Some(9.0));
    }

    #[test]
    fn test_duplicate_sample_names_rejected() {
        let mut table = SampleTable::new();
        let result =
            table.merge_grid(&grid(&[&["", "a"], &["s1", "1"], &["s1", "2"]]));
        assert!(matches!(
            result,
            Err(OmicsGedError::DuplicateKey { kind: "sample", .. })
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_feature_names_rejected() {
        let mut table = SampleTable::new();
        let result = table.merge_grid(&grid(&[&["", "a", "a"], &["s1", "1", "2"]]));
        assert!(matches!(
            result,
            Err(OmicsGedError::DuplicateKey { kind: "feature", .. })
        ));
    }

    #[test]
    fn test_schema_mismatch_leaves_table_unmodified() {
        let mut table = SampleTable::new();
        table
            .merge_grid(&grid(&[&["", "a", "b"], &["s1", "1", "2"]]))
            .unwrap();
        let result = table.merge_grid(&grid(&[&["", "a", "c"], &["s2", "1", "2"]]));

        assert!(matches!(result, Err(OmicsGedError::SchemaMismatch(_))));
        assert_eq!(table.n_samples(), 1);
        assert_eq!(table.value("s1", "b"), Some(2.0));
    }

    #[test]
    fn test_feature_subset_rejected() {
        let mut table = SampleTable::new();
        table
            .merge_grid(&grid(&[&["", "a", "b"], &["s1", "1", "2"]]))
            .unwrap();
        let result = table.merge_grid(&grid(&[&["", "a"], &["s2", "1"]]));
        assert!(matches!(result, Err(OmicsGedError::SchemaMismatch(_))));
    }

    #[test]
    fn test_non_numeric_and_negative_rejected_without_commit() {
        let mut table = SampleTable::new();
        let result = table.merge_grid(&grid(&[
            &["", "a", "b"],
            &["s1", "1", "2"],
            &["s2", "x", "2"],
        ]));
        assert!(matches!(result, Err(OmicsGedError::Parse(_))));
        assert!(table.is_empty());

        let result = table.merge_grid(&grid(&[&["", "a"], &["s1", "-1"]]));
        assert!(matches!(result, Err(OmicsGedError::Parse(_))));
        assert!(table.is_empty());
    }
}
