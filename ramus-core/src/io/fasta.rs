//! FASTA sequence input and output
//!
//! Reading is backed by the needletail library, which accepts multi-line
//! records and transparently handles FASTQ input. Gzipped files are
//! recognised by their `.gz` extension. Writing wraps residue lines at a
//! fixed width.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;
use needletail::parser::FastxReader;
use needletail::{parse_fastx_file, parse_fastx_reader};
use thiserror::Error;

use crate::types::{Alignment, SequenceRecord, SequenceSet, SequenceSetError};

/// Residues per line when writing FASTA output.
const LINE_WIDTH: usize = 60;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty file or no sequences found")]
    EmptyFile,
    #[error(transparent)]
    Set(#[from] SequenceSetError),
}

/// FASTA/FASTQ parser for reading sequence data
pub struct FastaParser;

impl FastaParser {
    /// Parse a FASTA/FASTQ file into a sequence set.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<SequenceSet> {
        let path_str = path.as_ref().to_string_lossy();

        if path_str.ends_with(".gz") {
            Self::parse_gzipped_file(path)
        } else {
            let reader = parse_fastx_file(&path).map_err(|e| FastaError::Parse(e.to_string()))?;
            Self::collect_records(reader)
        }
    }

    /// Parse a gzipped FASTA/FASTQ file
    fn parse_gzipped_file<P: AsRef<Path>>(path: P) -> Result<SequenceSet> {
        let file = File::open(&path)?;
        let decoder = GzDecoder::new(file);
        let buf_reader = BufReader::new(decoder);

        Self::parse_reader(buf_reader)
    }

    /// Parse FASTA/FASTQ data from any readable source
    pub fn parse_reader<R: std::io::Read + std::marker::Send>(reader: R) -> Result<SequenceSet> {
        let fastx_reader =
            parse_fastx_reader(reader).map_err(|e| FastaError::Parse(e.to_string()))?;
        Self::collect_records(fastx_reader)
    }

    fn collect_records(mut reader: Box<dyn FastxReader + '_>) -> Result<SequenceSet> {
        let mut sequences = SequenceSet::new();

        while let Some(record) = reader.next() {
            let record = record.map_err(|e| FastaError::Parse(e.to_string()))?;
            sequences
                .push(Self::record_to_sequence(record))
                .map_err(FastaError::from)?;
        }

        if sequences.is_empty() {
            Err(FastaError::EmptyFile.into())
        } else {
            Ok(sequences)
        }
    }

    /// Convert a needletail record, splitting the header at the first
    /// whitespace into an id and an optional description.
    fn record_to_sequence(record: needletail::parser::SequenceRecord) -> SequenceRecord {
        let header = String::from_utf8_lossy(record.id());
        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or_default().to_string();
        let description = parts
            .next()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let residues = String::from_utf8_lossy(&record.seq()).to_string();
        let mut sequence = SequenceRecord::new(id, residues);
        if let Some(description) = description {
            sequence = sequence.with_description(description);
        }
        sequence
    }
}

/// Write a sequence set as FASTA, keeping descriptions in the headers.
pub fn write_file<P: AsRef<Path>>(path: P, sequences: &SequenceSet) -> Result<()> {
    let mut out = String::new();
    for record in sequences.iter() {
        push_record(
            &mut out,
            &record.id,
            record.description.as_deref(),
            &record.residues,
        );
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Write alignment rows as FASTA, gaps included.
pub fn write_alignment<P: AsRef<Path>>(path: P, alignment: &Alignment) -> Result<()> {
    let mut out = String::new();
    for row in alignment.rows() {
        push_record(&mut out, &row.id, None, &row.residues);
    }
    std::fs::write(path, out)?;
    Ok(())
}

fn push_record(out: &mut String, id: &str, description: Option<&str>, residues: &str) {
    out.push('>');
    out.push_str(id);
    if let Some(description) = description {
        out.push(' ');
        out.push_str(description);
    }
    out.push('\n');
    let symbols: Vec<char> = residues.chars().collect();
    for chunk in symbols.chunks(LINE_WIDTH) {
        out.extend(chunk.iter());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_fasta_reader() {
        let fasta_data = ">seq1 description of sequence 1\n\
                          ATCGATCGATCG\n\
                          >seq2\n\
                          GCTAGCTAGCTA\n";

        let cursor = Cursor::new(fasta_data);
        let sequences = FastaParser::parse_reader(cursor).unwrap();

        assert_eq!(sequences.len(), 2);
        let first = sequences.get(0).unwrap();
        assert_eq!(first.id, "seq1");
        assert_eq!(
            first.description,
            Some("description of sequence 1".to_string())
        );
        assert_eq!(first.residues, "ATCGATCGATCG");

        let second = sequences.get(1).unwrap();
        assert_eq!(second.id, "seq2");
        assert_eq!(second.description, None);
        assert_eq!(second.residues, "GCTAGCTAGCTA");
    }

    #[test]
    fn test_parse_fastq_reader() {
        let fastq_data = "@seq1 description\n\
                          ATCGATCG\n\
                          +\n\
                          IIIIIIII\n\
                          @seq2\n\
                          GCTAGCTA\n\
                          +\n\
                          HHHHHHHH\n";

        let cursor = Cursor::new(fastq_data);
        let sequences = FastaParser::parse_reader(cursor).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences.get(0).unwrap().id, "seq1");
        assert_eq!(
            sequences.get(0).unwrap().description,
            Some("description".to_string())
        );
        assert_eq!(sequences.get(1).unwrap().residues, "GCTAGCTA");
    }

    #[test]
    fn test_multiline_fasta() {
        let fasta_data = ">seq1\n\
                          ATCGATCG\n\
                          ATCGATCG\n\
                          GCTAGCTA\n";

        let cursor = Cursor::new(fasta_data);
        let sequences = FastaParser::parse_reader(cursor).unwrap();

        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences.get(0).unwrap().residues, "ATCGATCGATCGATCGGCTAGCTA");
    }

    #[test]
    fn test_empty_reader() {
        let cursor = Cursor::new("");
        let result = FastaParser::parse_reader(cursor);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let fasta_data = ">dup\nACGT\n>dup\nTTTT\n";
        let cursor = Cursor::new(fasta_data);
        let result = FastaParser::parse_reader(cursor);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_gzipped_file() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">s1 gz header\nACGTACGT\n").unwrap();
        let bytes = encoder.finish().unwrap();

        let mut file = tempfile::Builder::new().suffix(".fa.gz").tempfile().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let sequences = FastaParser::parse_file(file.path()).unwrap();
        assert_eq!(sequences.len(), 1);
        let record = sequences.get_by_id("s1").unwrap();
        assert_eq!(record.residues, "ACGTACGT");
        assert_eq!(record.description, Some("gz header".to_string()));
    }

    #[test]
    fn test_write_file_wraps_long_lines() {
        let mut set = SequenceSet::new();
        let residues = "ACGT".repeat(35);
        set.push(SequenceRecord::new("long".to_string(), residues.clone()))
            .unwrap();
        set.push(
            SequenceRecord::new("short".to_string(), "ACG".to_string())
                .with_description("a test".to_string()),
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
        write_file(file.path(), &set).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">long");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 20);
        assert_eq!(lines[4], ">short a test");
        assert_eq!(lines[5], "ACG");

        let back = FastaParser::parse_file(file.path()).unwrap();
        assert_eq!(back.get_by_id("long").unwrap().residues, residues);
        assert_eq!(
            back.get_by_id("short").unwrap().description.as_deref(),
            Some("a test")
        );
    }

    #[test]
    fn test_write_alignment_preserves_gaps() {
        let mut alignment = Alignment::new();
        alignment.insert("a", "AC-GT".to_string());
        alignment.insert("b", "ACTGT".to_string());

        let file = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
        write_alignment(file.path(), &alignment).unwrap();

        let back = FastaParser::parse_file(file.path()).unwrap();
        assert_eq!(back.get_by_id("a").unwrap().residues, "AC-GT");
        assert_eq!(back.get_by_id("b").unwrap().residues, "ACTGT");
    }
}
