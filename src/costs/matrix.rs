//! Feature relabeling cost matrices parsed from external cost tables.

use crate::data::CellGrid;
use crate::error::{OmicsGedError, Result};
use nalgebra::DMatrix;

/// Normalized feature-by-feature relabeling costs.
///
/// Entries lie in [0, 1] with a zero diagonal; the maximum entry is 1 unless
/// the whole matrix is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    costs: DMatrix<f64>,
}

impl CostMatrix {
    /// The fallback used when no cost table is supplied: cost 1 between any
    /// two distinct features, 0 on the diagonal.
    pub fn constant(n_features: usize) -> Self {
        let mut costs = DMatrix::from_element(n_features, n_features, 1.0);
        costs.fill_diagonal(0.0);
        Self { costs }
    }

    /// Parse a cost table into a normalized cost matrix.
    ///
    /// The grid's header row and header column name features; the cell at
    /// (row feature, column feature) is the relabeling cost between them.
    /// Returns the matrix together with the warnings recorded while building
    /// it.
    pub fn from_grid(grid: &CellGrid, feature_names: &[String]) -> Result<(Self, Vec<String>)> {
        if grid.n_rows() != grid.n_cols() {
            return Err(OmicsGedError::SchemaMismatch(format!(
                "cost table has {} rows but {} columns",
                grid.n_rows(),
                grid.n_cols()
            )));
        }

        let feature_ids: std::collections::BTreeMap<&str, usize> = feature_names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.as_str(), id))
            .collect();

        let n = feature_names.len();
        let mut costs = DMatrix::from_element(n, n, -1.0);
        let mut warnings = Vec::new();

        for row in 1..grid.n_rows() {
            let row_name = grid.cell(row, 0);
            let row_id = match feature_ids.get(row_name) {
                Some(&id) => id,
                None => {
                    warnings.push(format!(
                        "feature '{}' is not part of the omics data; its cost data will be ignored",
                        row_name
                    ));
                    continue;
                }
            };

            for col in 1..grid.n_cols() {
                let col_name = grid.cell(0, col);
                // A warning here would repeat the row-side one.
                let col_id = match feature_ids.get(col_name) {
                    Some(&id) => id,
                    None => continue,
                };
                let cost: f64 = grid.cell(row, col).parse().map_err(|_| {
                    OmicsGedError::Parse(format!(
                        "cost between features '{}' and '{}' has a non-numeric value",
                        row_name, col_name
                    ))
                })?;
                costs[(row_id, col_id)] = cost;
            }
        }

        // Features the table never covers fall back to a uniform cost of 1.
        for id in 0..n {
            if (0..n).all(|col| costs[(id, col)] < 0.0) {
                warnings.push(format!(
                    "cost table is missing cost data for feature '{}'; defaulting to costs of 1, \
                     which might lead to inconsistent results",
                    feature_names[id]
                ));
                for other in 0..n {
                    costs[(id, other)] = 1.0;
                    costs[(other, id)] = 1.0;
                }
                costs[(id, id)] = 0.0;
            }
        }

        // Individual cells can still be unfilled when a known feature appears
        // as a row but not as a column (or vice versa); they get the same
        // cost-of-1 fallback.
        let mut unfilled = 0usize;
        for row in 0..n {
            for col in 0..n {
                if costs[(row, col)] < 0.0 {
                    costs[(row, col)] = 1.0;
                    unfilled += 1;
                }
            }
        }
        if unfilled > 0 {
            warnings.push(format!(
                "{} cost entries were missing from the cost table; defaulting them to 1",
                unfilled
            ));
        }

        // The data model requires a zero diagonal.
        for id in 0..n {
            if costs[(id, id)] != 0.0 {
                warnings.push(format!(
                    "cost table declares a nonzero self-cost for feature '{}'; forcing it to 0",
                    feature_names[id]
                ));
                costs[(id, id)] = 0.0;
            }
        }

        let max = costs.max();
        if max > 0.0 {
            costs.unscale_mut(max);
        }

        Ok((Self { costs }, warnings))
    }

    /// Number of features covered by the matrix.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.costs.nrows()
    }

    /// The cost stored at (i, j), or `None` outside the matrix.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.costs.nrows() || j >= self.costs.ncols() {
            return None;
        }
        Some(self.costs[(i, j)])
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

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_non_square_table_rejected() {
        let result = CostMatrix::from_grid(
            &grid(&[&["", "a", "b"], &["a", "0", "1"]]),
            &names(&["a", "b"]),
        );
        assert!(matches!(result, Err(OmicsGedError::SchemaMismatch(_))));
    }

    #[test]
    fn test_entries_normalized_with_zero_diagonal() {
        let (matrix, warnings) = CostMatrix::from_grid(
            &grid(&[
                &["", "a", "b"],
                &["a", "0", "4"],
                &["b", "2", "0"],
            ]),
            &names(&["a", "b"]),
        )
        .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(matrix.get(0, 0), Some(0.0));
        assert_eq!(matrix.get(1, 1), Some(0.0));
        assert_eq!(matrix.get(0, 1), Some(1.0));
        assert_eq!(matrix.get(1, 0), Some(0.5));
        for i in 0..2 {
            for j in 0..2 {
                let v = matrix.get(i, j).unwrap();
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_unknown_row_warned_unknown_column_silent() {
        let (matrix, warnings) = CostMatrix::from_grid(
            &grid(&[
                &["", "a", "x"],
                &["a", "0", "7"],
                &["x", "7", "0"],
            ]),
            &names(&["a", "b"]),
        )
        .unwrap();

        // Row 'x' is warned about; column 'x' is dropped silently. Feature
        // 'b' never appears and gets the uniform default.
        assert!(warnings.iter().any(|w| w.contains("'x'")));
        assert!(warnings.iter().any(|w| w.contains("'b'")));
        assert_eq!(matrix.get(0, 1), Some(1.0));
        assert_eq!(matrix.get(1, 0), Some(1.0));
        assert_eq!(matrix.get(1, 1), Some(0.0));
    }

    #[test]
    fn test_missing_feature_defaults_to_uniform_row_and_column() {
        let (matrix, warnings) = CostMatrix::from_grid(
            &grid(&[
                &["", "a", "b"],
                &["a", "0", "0.5"],
                &["b", "0.5", "0"],
            ]),
            &names(&["a", "b", "c"]),
        )
        .unwrap();

        assert!(warnings.iter().any(|w| w.contains("'c'")));
        assert_eq!(matrix.get(2, 0), Some(1.0));
        assert_eq!(matrix.get(0, 2), Some(1.0));
        assert_eq!(matrix.get(2, 2), Some(0.0));
        // Supplied costs are rescaled by the new maximum of 1.
        assert_eq!(matrix.get(0, 1), Some(0.5));
    }

    #[test]
    fn test_nonzero_diagonal_forced_to_zero() {
        let (matrix, warnings) = CostMatrix::from_grid(
            &grid(&[
                &["", "a", "b"],
                &["a", "3", "6"],
                &["b", "6", "0"],
            ]),
            &names(&["a", "b"]),
        )
        .unwrap();

        assert!(warnings.iter().any(|w| w.contains("self-cost")));
        assert_eq!(matrix.get(0, 0), Some(0.0));
        assert_eq!(matrix.get(0, 1), Some(1.0));
    }

    #[test]
    fn test_identity_table_equals_constant_fallback() {
        let (matrix, warnings) = CostMatrix::from_grid(
            &grid(&[
                &["", "a", "b", "c"],
                &["a", "0", "1", "1"],
                &["b", "1", "0", "1"],
                &["c", "1", "1", "0"],
            ]),
            &names(&["a", "b", "c"]),
        )
        .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(matrix, CostMatrix::constant(3));
    }

    #[test]
    fn test_out_of_range_lookup_is_none() {
        let matrix = CostMatrix::constant(2);
        assert_eq!(matrix.get(0, 2), None);
        assert_eq!(matrix.get(5, 0), None);
    }
}
