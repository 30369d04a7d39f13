//! Global pairwise alignment
//!
//! Needleman-Wunsch over the full (n+1) x (m+1) dynamic-programming table
//! with linear gap costs. Ties between moves resolve diagonal first, then
//! up, then left, so results are deterministic for identical inputs.

use serde::{Deserialize, Serialize};

use crate::types::GAP;

/// Scoring scheme for pairwise alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringParams {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_score: i32,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_score: -1,
            gap_score: -2,
        }
    }
}

/// Result of aligning two sequences: both inputs padded with gaps to the
/// same length, plus the optimal score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAlignment {
    pub aligned_a: String,
    pub aligned_b: String,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Start,
    Diagonal,
    Up,
    Left,
}

/// Score and traceback tables stored as flat row-major vectors.
struct AlignTable {
    cols: usize,
    scores: Vec<i32>,
    directions: Vec<Direction>,
}

impl AlignTable {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            scores: vec![0; rows * cols],
            directions: vec![Direction::Start; rows * cols],
        }
    }

    fn idx(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    fn score(&self, i: usize, j: usize) -> i32 {
        self.scores[self.idx(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, score: i32, direction: Direction) {
        let idx = self.idx(i, j);
        self.scores[idx] = score;
        self.directions[idx] = direction;
    }

    fn direction(&self, i: usize, j: usize) -> Direction {
        self.directions[self.idx(i, j)]
    }
}

/// Globally align two sequences, returning the gapped pair and its score.
///
/// Empty inputs are valid: the other sequence aligns against gaps only and
/// the score is the accumulated gap cost.
pub fn align(a: &str, b: &str, params: &ScoringParams) -> PairwiseAlignment {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = a.len();
    let m = b.len();

    let mut table = AlignTable::new(n + 1, m + 1);
    for i in 1..=n {
        table.set(i, 0, i as i32 * params.gap_score, Direction::Up);
    }
    for j in 1..=m {
        table.set(0, j, j as i32 * params.gap_score, Direction::Left);
    }

    for i in 1..=n {
        for j in 1..=m {
            let pair_score = if a[i - 1] == b[j - 1] {
                params.match_score
            } else {
                params.mismatch_score
            };
            let diagonal = table.score(i - 1, j - 1) + pair_score;
            let up = table.score(i - 1, j) + params.gap_score;
            let left = table.score(i, j - 1) + params.gap_score;

            let best = diagonal.max(up).max(left);
            let direction = if best == diagonal {
                Direction::Diagonal
            } else if best == up {
                Direction::Up
            } else {
                Direction::Left
            };
            table.set(i, j, best, direction);
        }
    }

    let score = table.score(n, m);
    let (aligned_a, aligned_b) = traceback(&table, &a, &b);

    PairwiseAlignment {
        aligned_a,
        aligned_b,
        score,
    }
}

fn traceback(table: &AlignTable, a: &[char], b: &[char]) -> (String, String) {
    let mut i = a.len();
    let mut j = b.len();
    let mut rev_a = Vec::with_capacity(i + j);
    let mut rev_b = Vec::with_capacity(i + j);

    while i > 0 || j > 0 {
        match table.direction(i, j) {
            Direction::Diagonal => {
                rev_a.push(a[i - 1]);
                rev_b.push(b[j - 1]);
                i -= 1;
                j -= 1;
            }
            Direction::Up => {
                rev_a.push(a[i - 1]);
                rev_b.push(GAP);
                i -= 1;
            }
            Direction::Left => {
                rev_a.push(GAP);
                rev_b.push(b[j - 1]);
                j -= 1;
            }
            Direction::Start => break,
        }
    }

    let aligned_a: String = rev_a.into_iter().rev().collect();
    let aligned_b: String = rev_b.into_iter().rev().collect();
    (aligned_a, aligned_b)
}
