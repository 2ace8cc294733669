//! # Alignment Pre-processing
//!
//! Two load-time walks over each incoming alignment:
//!
//! 1. the **expected-alleles scan**, which records every single-base
//!    substitution a contig claims, independently of the variant caller
//!    proper (downstream validation compares the two); and
//! 2. the **gap-bounded splitter**, which cuts an alignment into
//!    sub-alignments wherever a query-gap run exceeds the configured
//!    maximum. A running haplotype copying from an alignment that is inside
//!    a 50 kb deletion never agrees with the reference, so a single long
//!    gap would keep the enumerator's flush condition unreachable for its
//!    whole length; cutting the run caps that window.
//!
//! Only query-gap runs (deletions) trigger a cut. Reference-gap runs
//! (insertions) are bounded by contig length and do not stall the flush
//! condition the same way.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::alignment::{is_gap, PairwiseAlignment};
use crate::error::{MsaVcfError, Result};

/// Substitution alleles observed per 0-based reference position.
///
/// Purely a load-time side observation; emitted verbatim to the
/// `.expectedSNPs` side file.
#[derive(Debug, Default)]
pub struct ExpectedAlleles {
    by_pos: BTreeMap<usize, BTreeSet<u8>>,
}

impl ExpectedAlleles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pos: usize, allele: u8) {
        self.by_pos.entry(pos).or_default().insert(allele);
    }

    /// Iterate `(0-based position, allele)` sorted by position, then allele
    pub fn iter(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.by_pos
            .iter()
            .flat_map(|(&pos, alleles)| alleles.iter().map(move |&a| (pos, a)))
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }
}

/// Scan one alignment for single-to-single substitutions.
///
/// Maintains a rolling column pair that a non-gap reference column closes;
/// a closed pair that is exactly one non-gap base against one differing
/// non-gap base is a substitution at the base the pair belongs to.
pub fn scan_expected_alleles(alignment: &PairwiseAlignment, expected: &mut ExpectedAlleles) {
    let mut pair_ref: Vec<u8> = Vec::new();
    let mut pair_query: Vec<u8> = Vec::new();
    // 0-based index of the last consumed reference base
    let mut last_base: Option<usize> = None;

    for (&c_ref, &c_query) in alignment.ref_row.iter().zip(&alignment.query_row) {
        if !is_gap(c_ref) {
            if pair_ref.len() == 1
                && pair_query.len() == 1
                && pair_ref[0] != pair_query[0]
                && !is_gap(pair_ref[0])
                && !is_gap(pair_query[0])
            {
                // pair_ref[0] non-gap implies at least one base was consumed
                expected.record(last_base.expect("pair implies a consumed base"), pair_query[0]);
            }
            pair_ref.clear();
            pair_query.clear();
            last_base = Some(last_base.map_or(alignment.start, |p| p + 1));
        }
        pair_ref.push(c_ref);
        pair_query.push(c_query);
    }
}

/// Outcome of splitting one loaded alignment
#[derive(Debug)]
pub struct SplitOutcome {
    /// The gap-bounded parts, in reference order. Exactly one part means no
    /// cut was necessary and the caller should publish the original record.
    pub parts: Vec<PairwiseAlignment>,
}

impl SplitOutcome {
    pub fn was_split(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Split an alignment into sub-alignments free of oversized query-gap runs.
///
/// The walk accumulates columns into a running buffer. When a match/mismatch
/// column arrives while the current gap run holds more than `max_gap_length`
/// query-gap characters, the buffer minus its trailing non-match run is
/// emitted as a sub-alignment and the run itself is dropped. Boundary
/// violations (gap first/last column, span mismatch, oversized trailing run)
/// are fatal.
pub fn split_gappy_alignment(
    alignment: &PairwiseAlignment,
    max_gap_length: usize,
) -> Result<SplitOutcome> {
    let columns = alignment.columns();

    let mut running_ref: Vec<u8> = Vec::new();
    let mut running_query: Vec<u8> = Vec::new();
    let mut running_non_match = 0usize;
    let mut running_query_gaps = 0usize;
    // reference-coord bounds of the sub-alignment being accumulated
    let mut first_match: Option<usize> = None;
    let mut last_match: Option<usize> = None;
    // 0-based index of the last consumed reference base
    let mut ref_pos: Option<usize> = None;

    let mut parts: Vec<PairwiseAlignment> = Vec::new();

    // kept + dropped columns, to verify the walk loses nothing but gap runs
    let mut reconstituted_ref: Vec<u8> = Vec::new();
    let mut reconstituted_query: Vec<u8> = Vec::new();

    for i in 0..columns {
        let c_ref = alignment.ref_row[i];
        let c_query = alignment.query_row[i];
        let ref_gap = is_gap(c_ref);
        let query_gap = is_gap(c_query);

        if !ref_gap {
            ref_pos = Some(ref_pos.map_or(alignment.start, |p| p + 1));
        }

        let is_match = !ref_gap && !query_gap;
        if (i == 0 || i == columns - 1) && !is_match {
            return Err(MsaVcfError::invalid_alignment(
                &alignment.name,
                format!("column {} is a gap column at an alignment boundary", i),
            ));
        }

        if is_match {
            if running_query_gaps > max_gap_length {
                // a match arrived with too many gaps pending: close the
                // current sub-alignment before the run
                let first = first_match.ok_or_else(|| {
                    MsaVcfError::algorithm("gap run before any match column")
                })?;
                let last = last_match.expect("first_match implies last_match");
                debug_assert!(running_ref.len() >= running_non_match);
                let remaining = running_ref.len() - running_non_match;

                reconstituted_ref.extend_from_slice(&running_ref);
                reconstituted_query.extend_from_slice(&running_query);

                if remaining > 0 {
                    parts.push(PairwiseAlignment {
                        ref_row: running_ref[..remaining].to_vec(),
                        query_row: running_query[..remaining].to_vec(),
                        name: format!("{}_part{}", alignment.name, parts.len()),
                        start: first,
                        end: last + 1,
                    });
                }

                running_ref.clear();
                running_query.clear();
                first_match = None;
            }

            let p = ref_pos.expect("match column consumes a base");
            if first_match.is_none() {
                first_match = Some(p);
            }
            last_match = Some(p);
            running_non_match = 0;
            running_query_gaps = 0;
        } else {
            running_non_match += 1;
            if query_gap && !ref_gap {
                running_query_gaps += 1;
            }
        }

        running_ref.push(c_ref);
        running_query.push(c_query);
    }

    // the walk must have consumed exactly the declared reference span,
    // ending on a match
    let last_base = ref_pos.ok_or_else(|| {
        MsaVcfError::invalid_alignment(&alignment.name, "no reference base consumed")
    })?;
    if last_base + 1 != alignment.end {
        return Err(MsaVcfError::invalid_alignment(
            &alignment.name,
            format!("consumed bases end at {} but span ends at {}", last_base + 1, alignment.end),
        ));
    }
    if last_match != Some(last_base) {
        return Err(MsaVcfError::invalid_alignment(
            &alignment.name,
            "alignment does not end on a match/mismatch column",
        ));
    }
    if running_non_match > max_gap_length {
        return Err(MsaVcfError::invalid_alignment(
            &alignment.name,
            format!("trailing gap run of {} exceeds {}", running_non_match, max_gap_length),
        ));
    }

    if !running_ref.is_empty() {
        reconstituted_ref.extend_from_slice(&running_ref);
        reconstituted_query.extend_from_slice(&running_query);
        parts.push(PairwiseAlignment {
            ref_row: running_ref,
            query_row: running_query,
            name: format!("{}_part{}", alignment.name, parts.len()),
            start: first_match.expect("non-empty buffer starts with a match"),
            end: last_base + 1,
        });
    }

    debug_assert_eq!(reconstituted_ref, alignment.ref_row);
    debug_assert_eq!(reconstituted_query, alignment.query_row);

    Ok(SplitOutcome { parts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(ref_row: &str, query_row: &str, start: usize, end: usize) -> PairwiseAlignment {
        PairwiseAlignment {
            ref_row: ref_row.as_bytes().to_vec(),
            query_row: query_row.as_bytes().to_vec(),
            name: "contig7".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_scan_records_substitution() {
        let mut expected = ExpectedAlleles::new();
        scan_expected_alleles(&aln("ACGT", "AGGT", 0, 4), &mut expected);
        let obs: Vec<(usize, u8)> = expected.iter().collect();
        assert_eq!(obs, vec![(1, b'G')]);
    }

    #[test]
    fn test_scan_skips_indels() {
        let mut expected = ExpectedAlleles::new();
        // insertion: the closing pair spans two columns
        scan_expected_alleles(&aln("AC-GT", "ACTGT", 0, 4), &mut expected);
        // deletion: the query side of the pair is a gap
        scan_expected_alleles(&aln("ACGT", "A--T", 0, 4), &mut expected);
        assert!(expected.is_empty());
    }

    #[test]
    fn test_scan_respects_start_offset() {
        let mut expected = ExpectedAlleles::new();
        scan_expected_alleles(&aln("GTAC", "GTCC", 10, 14), &mut expected);
        let obs: Vec<(usize, u8)> = expected.iter().collect();
        assert_eq!(obs, vec![(12, b'C')]);
    }

    #[test]
    fn test_no_split_below_threshold() {
        let outcome = split_gappy_alignment(&aln("ACGT", "A--T", 0, 4), 5).unwrap();
        assert!(!outcome.was_split());
        assert_eq!(outcome.parts[0].ref_row, b"ACGT");
        assert_eq!(outcome.parts[0].start, 0);
        assert_eq!(outcome.parts[0].end, 4);
    }

    #[test]
    fn test_split_drops_long_deletion() {
        // ten query gaps against a threshold of five: the run is cut out and
        // only the flanking matches survive
        let outcome =
            split_gappy_alignment(&aln("AAAAAAAAAAAA", "A----------A", 0, 12), 5).unwrap();
        assert!(outcome.was_split());
        assert_eq!(outcome.parts.len(), 2);

        assert_eq!(outcome.parts[0].ref_row, b"A");
        assert_eq!(outcome.parts[0].query_row, b"A");
        assert_eq!(outcome.parts[0].name, "contig7_part0");
        assert_eq!(outcome.parts[0].start, 0);
        assert_eq!(outcome.parts[0].end, 1);

        assert_eq!(outcome.parts[1].ref_row, b"A");
        assert_eq!(outcome.parts[1].name, "contig7_part1");
        assert_eq!(outcome.parts[1].start, 11);
        assert_eq!(outcome.parts[1].end, 12);

        for part in &outcome.parts {
            part.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_split_keeps_interior_context() {
        // matches on both sides of the cut carry their local columns along
        let outcome =
            split_gappy_alignment(&aln("ACGTACGTACGT", "ACGT------GT", 0, 12), 3).unwrap();
        assert_eq!(outcome.parts.len(), 2);
        assert_eq!(outcome.parts[0].ref_row, b"ACGT");
        assert_eq!(outcome.parts[0].query_row, b"ACGT");
        assert_eq!(outcome.parts[0].end, 4);
        assert_eq!(outcome.parts[1].ref_row, b"GT");
        assert_eq!(outcome.parts[1].start, 10);
        assert_eq!(outcome.parts[1].end, 12);
    }

    #[test]
    fn test_long_insertion_does_not_split() {
        let outcome =
            split_gappy_alignment(&aln("A----------A", "AGGGGGGGGGGA", 0, 2), 5).unwrap();
        assert!(!outcome.was_split());
    }

    #[test]
    fn test_boundary_gap_rejected() {
        assert!(split_gappy_alignment(&aln("ACG-", "ACGT", 0, 3), 5).is_err());
    }

    #[test]
    fn test_span_mismatch_rejected() {
        assert!(split_gappy_alignment(&aln("ACGT", "ACGT", 0, 5), 5).is_err());
    }
}
