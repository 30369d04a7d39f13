//! Progressive multiple alignment
//!
//! Star alignment against an evolving reference: the first input sequence
//! anchors the alignment, and every later sequence is aligned pairwise
//! against the current gapped form of that anchor. Gaps introduced by a
//! later pairwise step are not propagated back into earlier rows; rows are
//! right-padded with gaps at the end so all columns line up. This trades
//! column-level consistency for speed and predictability.

use log::debug;

use crate::align::pairwise::{self, ScoringParams};
use crate::align::{AlignError, AlignResult};
use crate::types::{Alignment, SequenceSet};

/// Align every sequence in the set against the first one.
///
/// Row order matches input order. Requires at least two sequences.
pub fn align_many(sequences: &SequenceSet, params: &ScoringParams) -> AlignResult<Alignment> {
    if sequences.len() < 2 {
        return Err(AlignError::TooFewSequences(sequences.len()));
    }

    let records = sequences.records();
    let anchor_id = records[0].id.clone();
    let mut anchor = records[0].residues.clone();

    let mut alignment = Alignment::new();
    alignment.insert(&anchor_id, anchor.clone());

    for record in &records[1..] {
        let pair = pairwise::align(&anchor, &record.residues, params);
        anchor = pair.aligned_a;
        alignment.insert(&anchor_id, anchor.clone());
        alignment.insert(&record.id, pair.aligned_b);
    }

    alignment.equalize_widths();
    debug!(
        "aligned {} sequences into {} columns",
        alignment.len(),
        alignment.width()
    );
    Ok(alignment)
}
