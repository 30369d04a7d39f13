//! Pairwise distance matrices
//!
//! Symmetric dense matrices indexed by an ordered list of labels, plus the
//! distance measures used to fill them: simple identity distance over
//! alignment columns and the Jukes-Cantor correction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Alignment, GAP};

#[derive(Debug, Error, PartialEq)]
pub enum DistanceError {
    #[error("Sequences must have equal length, got {0} and {1}")]
    LengthMismatch(usize, usize),
}

pub type DistanceResult<T> = Result<T, DistanceError>;

/// A symmetric distance matrix over labeled items.
///
/// Stored dense in row-major order with a zero diagonal. `set` writes both
/// mirror cells, so the matrix cannot become asymmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// A zero matrix over the given labels.
    pub fn zeroed(labels: Vec<String>) -> Self {
        let dim = labels.len();
        Self {
            labels,
            values: vec![0.0; dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Distance between items `i` and `j`. Panics if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.dim() + j]
    }

    /// Set the distance between `i` and `j`, mirroring across the
    /// diagonal. Writes to the diagonal itself are ignored.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if i == j {
            return;
        }
        let dim = self.dim();
        self.values[i * dim + j] = value;
        self.values[j * dim + i] = value;
    }
}

/// Identity distance matrix over the rows of an alignment.
///
/// For each pair of rows, the distance is the fraction of mismatching
/// columns among columns where neither row has a gap. Pairs with no such
/// column get distance 0.
pub fn identity_matrix(alignment: &Alignment) -> DistanceMatrix {
    let rows = alignment.rows();
    let labels: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut matrix = DistanceMatrix::zeroed(labels);

    for i in 0..rows.len() {
        for j in 0..i {
            matrix.set(i, j, identity_distance(&rows[i].residues, &rows[j].residues));
        }
    }
    matrix
}

fn identity_distance(a: &str, b: &str) -> f64 {
    let (differences, valid_columns) = column_diffs(a, b);
    if valid_columns == 0 {
        0.0
    } else {
        differences as f64 / valid_columns as f64
    }
}

/// Count (mismatches, comparable columns) over positions where neither
/// side is a gap. Trailing positions of the longer input are ignored.
fn column_diffs(a: &str, b: &str) -> (usize, usize) {
    let mut differences = 0usize;
    let mut valid_columns = 0usize;
    for (x, y) in a.chars().zip(b.chars()) {
        if x == GAP || y == GAP {
            continue;
        }
        valid_columns += 1;
        if x != y {
            differences += 1;
        }
    }
    (differences, valid_columns)
}

/// Jukes-Cantor corrected distance between two equal-length gapped
/// sequences.
///
/// Columns where either side is a gap are skipped. Returns infinity when
/// the observed mismatch fraction reaches the saturation point of 0.75,
/// and 0 when no comparable column exists.
pub fn jukes_cantor(a: &str, b: &str) -> DistanceResult<f64> {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len != b_len {
        return Err(DistanceError::LengthMismatch(a_len, b_len));
    }

    let (differences, valid_columns) = column_diffs(a, b);
    if valid_columns == 0 {
        return Ok(0.0);
    }

    let p = differences as f64 / valid_columns as f64;
    if p >= 0.75 {
        return Ok(f64::INFINITY);
    }
    Ok((-0.75 * (1.0 - 4.0 * p / 3.0).ln()).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn alignment_of(pairs: &[(&str, &str)]) -> Alignment {
        let mut alignment = Alignment::new();
        for (id, residues) in pairs {
            alignment.insert(id, residues.to_string());
        }
        alignment
    }

    #[test]
    fn test_matrix_set_mirrors() {
        let mut matrix = DistanceMatrix::zeroed(vec!["a".to_string(), "b".to_string()]);
        matrix.set(1, 0, 0.25);
        assert!((matrix.get(0, 1) - 0.25).abs() < EPS);
        assert!((matrix.get(1, 0) - 0.25).abs() < EPS);
        assert_eq!(matrix.get(0, 0), 0.0);
    }

    #[test]
    fn test_matrix_ignores_diagonal_writes() {
        let mut matrix = DistanceMatrix::zeroed(vec!["a".to_string(), "b".to_string()]);
        matrix.set(0, 0, 9.0);
        assert_eq!(matrix.get(0, 0), 0.0);
    }

    #[test]
    fn test_identity_matrix_masks_gaps() {
        let alignment = alignment_of(&[("a", "ACG"), ("b", "ATG"), ("c", "A-G")]);
        let matrix = identity_matrix(&alignment);

        assert_eq!(matrix.labels(), &["a", "b", "c"]);
        assert!((matrix.get(0, 1) - 1.0 / 3.0).abs() < EPS);
        // Gap columns are excluded, so "A-G" is identical to both others
        // over the two comparable columns of "ACG", and to "ATG" likewise.
        assert!(matrix.get(0, 2).abs() < EPS);
        assert!(matrix.get(1, 2).abs() < EPS);
    }

    #[test]
    fn test_identity_distance_no_comparable_columns() {
        let alignment = alignment_of(&[("a", "AC--"), ("b", "--GT")]);
        let matrix = identity_matrix(&alignment);
        assert_eq!(matrix.get(0, 1), 0.0);
    }

    #[test]
    fn test_jukes_cantor_zero_for_identical() {
        assert_eq!(jukes_cantor("ACGT", "ACGT").unwrap(), 0.0);
    }

    #[test]
    fn test_jukes_cantor_known_value() {
        // p = 1/4 over four columns: d = -3/4 ln(1 - 1/3)
        let d = jukes_cantor("ACGT", "ACGA").unwrap();
        let expected = -0.75 * (1.0f64 - 1.0 / 3.0).ln();
        assert!((d - expected).abs() < EPS);
    }

    #[test]
    fn test_jukes_cantor_saturates_to_infinity() {
        // All four columns differ, p = 1.0
        assert!(jukes_cantor("ACGT", "TGCA").unwrap().is_infinite());
    }

    #[test]
    fn test_jukes_cantor_skips_gap_columns() {
        let d = jukes_cantor("A-GT", "ACGT").unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_jukes_cantor_length_mismatch() {
        let err = jukes_cantor("ACGT", "ACG").unwrap_err();
        assert_eq!(err, DistanceError::LengthMismatch(4, 3));
    }
}
