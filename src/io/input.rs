//! # Input Loading
//!
//! The input file carries the reference sequence on its first line and one
//! pairwise alignment per subsequent line: five tab-separated fields
//! (`ref`, `query`, `name`, `start`, `last`), positions 1-based inclusive.
//! Internally everything becomes 0-based (`start` = index of the first
//! consumed base, `end` exclusive).
//!
//! Loading runs each record through the expected-alleles scan and the
//! gap-bounded splitter before publication into the [`AlignmentSet`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::data::alignment::{is_gap, AlignmentSet, PairwiseAlignment};
use crate::error::{MsaVcfError, Result};
use crate::model::splitter::{scan_expected_alleles, split_gappy_alignment, ExpectedAlleles};

/// Load-phase counters, printed to stdout after loading
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Alignments published intact
    pub n_loaded: usize,
    /// Alignments that had to be split
    pub n_split: usize,
    /// Sub-alignments produced by splitting
    pub n_sub: usize,
}

impl LoadStats {
    pub fn print(&self, max_gap_length: usize) {
        println!("For max. gap length {}", max_gap_length);
        println!("\tn_alignments_loaded: {}", self.n_loaded);
        println!(
            "\tn_alignments_split: {} (into {} subalignments.)",
            self.n_split, self.n_sub
        );
    }
}

/// Everything the load phase produces
#[derive(Debug)]
pub struct LoadedInput {
    pub reference: Vec<u8>,
    pub alignments: AlignmentSet,
    pub expected: ExpectedAlleles,
    pub stats: LoadStats,
}

/// Open and load an input file
pub fn load_file(path: &Path, max_gap_length: usize) -> Result<LoadedInput> {
    let file = File::open(path)?;
    load_input(BufReader::new(file), max_gap_length)
}

/// Load from any buffered reader (tests feed a `Cursor`)
pub fn load_input<R: BufRead>(reader: R, max_gap_length: usize) -> Result<LoadedInput> {
    let mut lines = reader.lines();

    let reference = match lines.next() {
        Some(line) => strip_cr(line?).into_bytes(),
        None => return Err(MsaVcfError::parse(1, "empty input: no reference line")),
    };

    let mut alignments = AlignmentSet::new();
    let mut expected = ExpectedAlleles::new();
    let mut stats = LoadStats::default();

    for (line_idx, line) in lines.enumerate() {
        let line_no = line_idx + 2;
        let line = strip_cr(line?);
        if line.is_empty() {
            continue;
        }

        let record = parse_alignment_line(&line, line_no)?;
        scan_expected_alleles(&record, &mut expected);

        let outcome = split_gappy_alignment(&record, max_gap_length)?;
        if outcome.was_split() {
            stats.n_split += 1;
            stats.n_sub += outcome.parts.len();
            for part in outcome.parts {
                alignments.publish(part)?;
            }
        } else {
            // an uncut alignment is published as-is, under its own name
            alignments.publish(record)?;
            stats.n_loaded += 1;
        }
    }

    Ok(LoadedInput {
        reference,
        alignments,
        expected,
        stats,
    })
}

/// Parse one five-field record, converting to internal coordinates and
/// applying the start==0 hack
fn parse_alignment_line(line: &str, line_no: usize) -> Result<PairwiseAlignment> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 5 {
        return Err(MsaVcfError::parse(
            line_no,
            format!("expected 5 tab-separated fields, found {}", fields.len()),
        ));
    }

    let mut ref_row = fields[0].as_bytes().to_vec();
    let mut query_row = fields[1].as_bytes().to_vec();
    let name = fields[2].to_string();
    let start_field: usize = fields[3]
        .parse()
        .map_err(|_| MsaVcfError::parse(line_no, format!("non-numeric start {:?}", fields[3])))?;
    let last_field: usize = fields[4]
        .parse()
        .map_err(|_| MsaVcfError::parse(line_no, format!("non-numeric last {:?}", fields[4])))?;

    if ref_row.len() != query_row.len() {
        return Err(MsaVcfError::parse(
            line_no,
            format!(
                "ref and query rows differ in length ({} vs {})",
                ref_row.len(),
                query_row.len()
            ),
        ));
    }

    // start is 1-based inclusive, last is 1-based inclusive; internally the
    // 0-based exclusive end equals the 1-based inclusive last
    let (start, end) = if start_field == 0 {
        // upstream occasionally emits a bogus zero start; the alignment is
        // salvaged by dropping its first column
        if ref_row.len() < 2 || is_gap(ref_row[1]) || is_gap(query_row[1]) {
            return Err(MsaVcfError::parse(
                line_no,
                "start 0 alignment whose second column is not a match/mismatch",
            ));
        }
        ref_row.remove(0);
        query_row.remove(0);
        (1, last_field)
    } else {
        (start_field - 1, last_field)
    };

    if end <= start {
        return Err(MsaVcfError::parse(
            line_no,
            format!("last position {} does not lie beyond start {}", last_field, start_field),
        ));
    }

    Ok(PairwiseAlignment {
        ref_row,
        query_row,
        name,
        start,
        end,
    })
}

fn strip_cr(mut line: String) -> String {
    if line.ends_with('\r') {
        line.pop();
    }
    line
}
