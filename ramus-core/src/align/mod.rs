//! Sequence alignment
//!
//! `pairwise` implements global Needleman-Wunsch alignment of two
//! sequences; `progressive` layers a star-style multiple alignment on top
//! of it, using the first input sequence as the evolving reference.

pub mod pairwise;
pub mod progressive;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    #[error("At least 2 sequences are required for multiple alignment, got {0}")]
    TooFewSequences(usize),
}

pub type AlignResult<T> = Result<T, AlignError>;

pub use pairwise::{PairwiseAlignment, ScoringParams};
pub use progressive::align_many;
