use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Gap symbol used in aligned sequences.
pub const GAP: char = '-';

#[derive(Debug, Error, PartialEq)]
pub enum SequenceSetError {
    #[error("Duplicate sequence id: {0}")]
    DuplicateId(String),
}

/// A single named sequence, optionally carrying a free-text description
/// from its source file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    pub description: Option<String>,
    pub residues: String,
}

impl SequenceRecord {
    pub fn new(id: String, residues: String) -> Self {
        Self {
            id,
            description: None,
            residues,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Number of residue symbols, counting gaps.
    pub fn len(&self) -> usize {
        self.residues.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Residues with all gap symbols removed.
    pub fn degapped(&self) -> String {
        self.residues.chars().filter(|&c| c != GAP).collect()
    }
}

/// An ordered collection of sequences with unique ids.
///
/// Insertion order is preserved and is significant: downstream consumers
/// treat the first record as the alignment reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceSet {
    records: Vec<SequenceRecord>,
    id_map: HashMap<String, usize>,
}

impl SequenceSet {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            id_map: HashMap::new(),
        }
    }

    /// Append a record, returning its index. Ids must be unique.
    pub fn push(&mut self, record: SequenceRecord) -> Result<usize, SequenceSetError> {
        if self.id_map.contains_key(&record.id) {
            return Err(SequenceSetError::DuplicateId(record.id.clone()));
        }
        let index = self.records.len();
        self.id_map.insert(record.id.clone(), index);
        self.records.push(record);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SequenceRecord> {
        self.records.get(index)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&SequenceRecord> {
        self.id_map.get(id).and_then(|&index| self.get(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_map.contains_key(id)
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

/// One row of an alignment: a sequence id and its gapped residues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSequence {
    pub id: String,
    pub residues: String,
}

/// A gapped multiple alignment keyed by sequence id.
///
/// Rows keep their insertion order. Once an alignment is finalized every
/// row has the same number of columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    rows: Vec<AlignedSequence>,
    id_map: HashMap<String, usize>,
}

impl Alignment {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            id_map: HashMap::new(),
        }
    }

    /// Insert or replace a row. Replacing keeps the row's original position.
    pub fn insert(&mut self, id: &str, residues: String) {
        match self.id_map.get(id) {
            Some(&index) => self.rows[index].residues = residues,
            None => {
                self.id_map.insert(id.to_string(), self.rows.len());
                self.rows.push(AlignedSequence {
                    id: id.to_string(),
                    residues,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns, i.e. the longest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.residues.chars().count()).max().unwrap_or(0)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.id_map
            .get(id)
            .map(|&index| self.rows[index].residues.as_str())
    }

    pub fn rows(&self) -> &[AlignedSequence] {
        &self.rows
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.id.as_str())
    }

    /// Right-pad every row with the gap symbol up to the widest row.
    pub fn equalize_widths(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            let len = row.residues.chars().count();
            for _ in len..width {
                row.residues.push(GAP);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_set_push_and_lookup() {
        let mut set = SequenceSet::new();
        let i = set.push(SequenceRecord::new("s1".to_string(), "ACGT".to_string())).unwrap();
        let j = set.push(SequenceRecord::new("s2".to_string(), "ACGA".to_string())).unwrap();

        assert_eq!(i, 0);
        assert_eq!(j, 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_by_id("s2").unwrap().residues, "ACGA");
        assert!(set.contains("s1"));
        assert!(!set.contains("s3"));
    }

    #[test]
    fn test_sequence_set_rejects_duplicate_ids() {
        let mut set = SequenceSet::new();
        set.push(SequenceRecord::new("s1".to_string(), "ACGT".to_string())).unwrap();
        let err = set
            .push(SequenceRecord::new("s1".to_string(), "TTTT".to_string()))
            .unwrap_err();
        assert_eq!(err, SequenceSetError::DuplicateId("s1".to_string()));
    }

    #[test]
    fn test_sequence_record_degapped() {
        let record = SequenceRecord::new("s1".to_string(), "A-CG--T".to_string());
        assert_eq!(record.degapped(), "ACGT");
        assert_eq!(record.len(), 7);
    }

    #[test]
    fn test_alignment_insert_replaces_in_place() {
        let mut alignment = Alignment::new();
        alignment.insert("a", "ACG".to_string());
        alignment.insert("b", "AC".to_string());
        alignment.insert("a", "A-CG".to_string());

        let ids: Vec<&str> = alignment.ids().collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(alignment.get("a"), Some("A-CG"));
        assert_eq!(alignment.width(), 4);
    }

    #[test]
    fn test_alignment_equalize_widths() {
        let mut alignment = Alignment::new();
        alignment.insert("a", "ACGTT".to_string());
        alignment.insert("b", "ACG".to_string());
        alignment.equalize_widths();

        assert_eq!(alignment.get("a"), Some("ACGTT"));
        assert_eq!(alignment.get("b"), Some("ACG--"));
        assert_eq!(alignment.width(), 5);
    }

    #[test]
    fn test_empty_alignment_width() {
        let alignment = Alignment::new();
        assert_eq!(alignment.width(), 0);
        assert!(alignment.is_empty());
    }
}
