//! # Haplotype Enumerator
//!
//! Walks the reference left to right, maintaining the set of *open
//! haplotypes*: every MSA-consistent path through the reference and the
//! loaded alignments whose output decision is still pending. Whenever a new
//! alignment starts, every open haplotype can recombine into it
//! (entry-recombination); whenever an alignment is exhausted, its paths
//! recombine back into the reference and into every other running template
//! (exit-recombination). At any position where every open haplotype extends
//! with exactly the reference base, the set collapses: sequences that
//! differ from the reference over the open span are flushed to the variant
//! sink and the survivors restart from the current position.
//!
//! All open haplotypes advance through the same MSA columns, so their
//! accumulated sequences must stay equal in length at every synchronization
//! point; drift is fatal. Reference-sourced haplotypes pad across insertion
//! columns with `-` (catch-up) and `*` (extension). Both pad characters are
//! stripped before anything reaches the sink, so the reuse of `*` as an
//! input gap character cannot leak into output.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::data::alignment::{is_gap, AlignmentSet, AlnId};
use crate::error::{MsaVcfError, Result};
use crate::io::vcf::{VariantRecord, VariantSink};
use crate::model::gap_structure::GapStructure;

/// Where an open haplotype is currently copying from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    /// Copying the reference itself
    Reference,
    /// Copying from an alignment; `consumed` counts the columns already
    /// copied (`consumed == columns` means exhausted)
    Contig { aln: AlnId, consumed: usize },
}

/// One candidate haplotype path whose REF-or-ALT decision is still pending
#[derive(Clone, Debug)]
struct OpenHaplotype {
    /// Sequence accumulated since the last flush (may contain `-`/`*` pads)
    seq: Vec<u8>,
    template: Template,
}

impl OpenHaplotype {
    /// Value-equality deduplication key
    fn key(&self) -> (Vec<u8>, Template) {
        (self.seq.clone(), self.template)
    }
}

/// End-of-run statistics, reported through the logs
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumeratorStats {
    /// Alignments that entered the open set
    pub opened_alignments: usize,
    /// Positions at which the set collapsed
    pub flushes: usize,
    /// Variant records handed to the sink
    pub records_emitted: usize,
    /// Largest open-set size observed
    pub peak_open: usize,
}

/// The position-by-position haplotype enumerator
pub struct HaplotypeEnumerator<'a> {
    reference: &'a [u8],
    alignments: &'a AlignmentSet,
    gaps: &'a GapStructure,
    max_running: usize,
    open: Vec<OpenHaplotype>,
    /// Reference position at which every open haplotype's unflushed suffix
    /// begins; everything before it is already in the output
    start_open: usize,
    /// The open set changed last position: deduplicate before extending
    modified_last_pos: bool,
    stats: EnumeratorStats,
}

impl<'a> HaplotypeEnumerator<'a> {
    pub fn new(
        reference: &'a [u8],
        alignments: &'a AlignmentSet,
        gaps: &'a GapStructure,
        max_running: usize,
    ) -> Self {
        // a single reference-sourced path is open from the start
        let initial = OpenHaplotype {
            seq: Vec::new(),
            template: Template::Reference,
        };
        Self {
            reference,
            alignments,
            gaps,
            max_running,
            open: vec![initial],
            start_open: 0,
            modified_last_pos: false,
            stats: EnumeratorStats::default(),
        }
    }

    /// Walk the whole reference, flushing variants into `sink`
    pub fn run(mut self, sink: &mut dyn VariantSink) -> Result<EnumeratorStats> {
        for pos in 0..self.reference.len() {
            let seq_len = self.open.first().map_or(0, |h| h.seq.len());
            let duplicated = self.dedup_if_modified();
            if pos % 1000 == 0 {
                println!(
                    "{}, open haplotypes: {} -- duplicated: {} -- length: {}",
                    pos,
                    self.open.len(),
                    duplicated,
                    seq_len
                );
            }

            self.catch_up(pos);
            self.check_lengths(pos)?;
            self.enter_alignments(pos);
            self.exit_alignments(pos);
            let extensions = self.extend(pos)?;
            self.flush(pos, &extensions, sink)?;

            self.stats.peak_open = self.stats.peak_open.max(self.open.len());
        }
        println!("Done.");
        debug!(stats = ?self.stats, "enumerator finished");
        Ok(self.stats)
    }

    /// MSA insertion columns between positions `pos - 1` and `pos`
    fn pending_insertions(&self, pos: usize) -> usize {
        if pos == 0 {
            0
        } else {
            self.gaps.insertions_after(pos - 1)
        }
    }

    /// Drop open haplotypes whose `(seq, template)` key repeats, keeping
    /// first occurrences. Returns -1 when no pass ran.
    fn dedup_if_modified(&mut self) -> i64 {
        if !self.modified_last_pos {
            return -1;
        }
        self.modified_last_pos = false;

        let before = self.open.len();
        let mut seen: HashSet<(Vec<u8>, Template)> = HashSet::with_capacity(before);
        self.open.retain(|h| seen.insert(h.key()));
        let removed = before - self.open.len();
        if removed > 0 {
            println!("\tRemoved {} haplotypes.", removed);
        }
        removed as i64
    }

    /// Bring every open haplotype up to the MSA column just before `pos`:
    /// contig-sourced paths consume their pending insertion columns,
    /// reference-sourced (and exhausted) paths pad with dashes.
    fn catch_up(&mut self, pos: usize) {
        let alignments = self.alignments;
        let pending = self.pending_insertions(pos);

        for h in &mut self.open {
            match h.template {
                Template::Contig { aln, consumed } => {
                    let a = alignments.get(aln);
                    if consumed == a.columns() {
                        // exhausted: trailing MSA gaps are not part of the
                        // alignment and must be padded in
                        push_dashes(&mut h.seq, pending);
                    } else {
                        if consumed > 0 && is_gap(a.ref_row[consumed - 1]) {
                            warn!(
                                pos,
                                name = %a.name,
                                consumed,
                                "open haplotype parked on a gap column"
                            );
                        }
                        let mut c = consumed;
                        while c < a.columns() && is_gap(a.ref_row[c]) {
                            h.seq.push(a.query_row[c]);
                            c += 1;
                        }
                        h.template = Template::Contig { aln, consumed: c };
                    }
                }
                Template::Reference => {
                    push_dashes(&mut h.seq, pending);
                }
            }
        }
    }

    /// All open haplotypes must have reached the same MSA column
    fn check_lengths(&self, pos: usize) -> Result<()> {
        let Some(first) = self.open.first() else {
            return Ok(());
        };
        let expected = first.seq.len();
        if self.open.iter().all(|h| h.seq.len() == expected) {
            return Ok(());
        }

        eprintln!("Haplotype length mismatch at position {}", pos);
        for h in &self.open {
            eprintln!("\t{}\t{}", h.seq.len(), self.describe(h.template));
        }
        plot_haplotypes_around(self.reference, self.alignments, pos);
        Err(MsaVcfError::column_drift(
            pos,
            format!("open haplotype sequence lengths diverge (expected {})", expected),
        ))
    }

    fn describe(&self, template: Template) -> String {
        match template {
            Template::Reference => "REF".to_string(),
            Template::Contig { aln, consumed } => {
                let a = self.alignments.get(aln);
                format!(
                    "consumed until: {} of nonRef {} / length {}",
                    consumed,
                    a.name,
                    a.columns()
                )
            }
        }
    }

    /// Entry-recombination: every alignment starting at `pos` forks a copy
    /// of each open haplotype, plus one pure-reference-prefix recombinant.
    fn enter_alignments(&mut self, pos: usize) {
        let alignments = self.alignments;
        let Some(ids) = alignments.starting_at(pos) else {
            return;
        };
        let snapshot = self.open.len();

        for &aln_id in ids {
            let name = &alignments.get(aln_id).name;
            if self.open.len() > self.max_running {
                println!(
                    "Position {}, would have new haplotype {}, but have {} open haplotypes already, so skip.",
                    pos,
                    name,
                    self.open.len()
                );
                continue;
            }

            self.stats.opened_alignments += 1;
            for i in 0..snapshot {
                let seq = self.open[i].seq.clone();
                self.open.push(OpenHaplotype {
                    seq,
                    template: Template::Contig {
                        aln: aln_id,
                        consumed: 0,
                    },
                });
            }

            // the "I was reference until here" recombinant: reference bases
            // since the last flush, interleaved with the insertion gaps the
            // MSA demands after each of them
            let mut seq = Vec::with_capacity(pos - self.start_open);
            for r in self.start_open..pos {
                seq.push(self.reference[r]);
                push_dashes(&mut seq, self.gaps.insertions_after(r));
            }
            self.open.push(OpenHaplotype {
                seq,
                template: Template::Contig {
                    aln: aln_id,
                    consumed: 0,
                },
            });
            self.modified_last_pos = true;

            println!(
                "Position {}, enter new haplotype {} --> {} haplotypes.",
                pos,
                name,
                self.open.len()
            );
        }
    }

    /// Exit-recombination: every exhausted contig path switches to the
    /// reference template in place, and additionally recombines into each
    /// other still-running template.
    fn exit_alignments(&mut self, pos: usize) {
        let alignments = self.alignments;
        let snapshot = self.open.len();
        let mut exited = vec![false; snapshot];
        // key set of all open haplotypes, built once at the first exit of
        // this position and extended as recombinants are added
        let mut keys: Option<HashSet<(Vec<u8>, Template)>> = None;

        for outer in 0..snapshot {
            let Template::Contig { aln, consumed } = self.open[outer].template else {
                continue;
            };
            if consumed != alignments.get(aln).columns() {
                continue;
            }

            if keys.is_none() {
                keys = Some(self.open.iter().map(|h| h.key()).collect());
            }
            let keys = keys.as_mut().expect("just initialized");

            eprintln!(
                "Position {}, exit haplotype {} length {} (open haplotypes {})",
                pos,
                alignments.get(aln).name,
                self.open[outer].seq.len(),
                self.open.len()
            );

            self.open[outer].template = Template::Reference;
            exited[outer] = true;
            self.modified_last_pos = true;

            if self.open.len() > self.max_running {
                continue;
            }

            let exited_seq = self.open[outer].seq.clone();
            for inner in 0..snapshot {
                if inner == outer || exited[inner] {
                    continue;
                }
                let donor = self.open[inner].template;
                // the recombinant must still be extensible
                if let Template::Contig {
                    aln: donor_aln,
                    consumed: donor_consumed,
                } = donor
                {
                    if donor_consumed == alignments.get(donor_aln).columns() {
                        continue;
                    }
                }
                let key = (exited_seq.clone(), donor);
                if keys.contains(&key) {
                    continue;
                }
                if self.open.len() <= self.max_running {
                    keys.insert(key);
                    self.open.push(OpenHaplotype {
                        seq: exited_seq.clone(),
                        template: donor,
                    });
                }
            }
        }
    }

    /// Extend every open haplotype across the MSA columns of position `pos`.
    ///
    /// Contig-sourced paths consume columns until exactly one non-gap
    /// reference character is absorbed; all such extensions must share one
    /// length, which is the MSA column count for this position. A
    /// reference-sourced path appends the reference base padded with `*`.
    fn extend(&mut self, pos: usize) -> Result<HashSet<Vec<u8>>> {
        let alignments = self.alignments;

        // pre-pass: agree on the extension length before mutating anything
        let mut ext_len: Option<usize> = None;
        for h in &self.open {
            let Template::Contig { aln, consumed } = h.template else {
                continue;
            };
            let a = alignments.get(aln);
            let mut n = consumed;
            let mut len = 0usize;
            loop {
                if n >= a.columns() {
                    return Err(MsaVcfError::algorithm(format!(
                        "alignment {} exhausted mid-extension at position {}",
                        a.name, pos
                    )));
                }
                let c = a.ref_row[n];
                len += 1;
                n += 1;
                if !is_gap(c) {
                    break;
                }
            }
            match ext_len {
                None => ext_len = Some(len),
                Some(l) if l != len => {
                    return Err(MsaVcfError::column_drift(
                        pos,
                        format!("extension length mismatch: {} vs {}", l, len),
                    ));
                }
                Some(_) => {}
            }
        }
        let ext_len = ext_len.unwrap_or(1);

        let ref_c = self.reference[pos];
        let mut extensions: HashSet<Vec<u8>> = HashSet::new();
        for h in &mut self.open {
            let ext = match &mut h.template {
                Template::Reference => {
                    let mut e = Vec::with_capacity(ext_len);
                    e.push(ref_c);
                    e.resize(ext_len, b'*');
                    e
                }
                Template::Contig { aln, consumed } => {
                    let a = alignments.get(*aln);
                    let mut e = Vec::new();
                    loop {
                        let c = a.ref_row[*consumed];
                        e.push(a.query_row[*consumed]);
                        *consumed += 1;
                        if !is_gap(c) {
                            break;
                        }
                    }
                    e
                }
            };
            h.seq.extend_from_slice(&ext);
            extensions.insert(ext);
        }
        Ok(extensions)
    }

    /// When every extension was exactly the reference base, write out the
    /// accumulated differences and restart the open set from `pos`.
    fn flush(
        &mut self,
        pos: usize,
        extensions: &HashSet<Vec<u8>>,
        sink: &mut dyn VariantSink,
    ) -> Result<()> {
        let reference = self.reference;
        let ref_c = reference[pos];
        let all_equal = extensions.len() == 1 && extensions.contains(&[ref_c][..]);

        if pos == 0 {
            // nothing can diverge before the first reference base
            if !all_equal {
                return Err(MsaVcfError::column_drift(
                    0,
                    "haplotypes diverge at the first reference position",
                ));
            }
            return Ok(());
        }
        if !all_equal {
            return Ok(());
        }

        let ref_span = pos - self.start_open;
        debug_assert!(ref_span > 0);
        let reference_sequence = &reference[self.start_open..pos];

        let mut alts: BTreeSet<Vec<u8>> = BTreeSet::new();
        let mut seen: HashSet<(Vec<u8>, Template)> = HashSet::new();
        let mut kept: Vec<OpenHaplotype> = Vec::with_capacity(self.open.len());

        for mut h in self.open.drain(..) {
            debug_assert!(h.seq.len() >= ref_span + 1);
            // everything but the final (agreeing) character is covered by
            // this flush; pads and placeholders are stripped for comparison
            let covered = strip_gaps(&h.seq[..h.seq.len() - 1]);
            if covered != reference_sequence {
                alts.insert(covered);
            }

            let last = *h.seq.last().expect("extension leaves seq non-empty");
            h.seq.clear();
            h.seq.push(last);
            if seen.insert(h.key()) {
                kept.push(h);
            }
        }
        self.open = kept;

        self.stats.flushes += 1;
        if !alts.is_empty() {
            self.stats.records_emitted += 1;
            sink.emit(&VariantRecord {
                pos0: self.start_open,
                reference: reference_sequence.to_vec(),
                alts,
            })?;
        }
        self.start_open = pos;
        Ok(())
    }
}

fn push_dashes(seq: &mut Vec<u8>, n: usize) {
    seq.resize(seq.len() + n, b'-');
}

/// Remove gap and placeholder characters (`-`, `*`, `_`)
fn strip_gaps(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .copied()
        .filter(|&c| c != b'-' && c != b'*' && c != b'_')
        .collect()
}

/// Diagnostic: print, for every alignment overlapping `pos +/- 2`, the
/// query allele it carries at each of those reference positions.
pub fn plot_haplotypes_around(reference: &[u8], alignments: &AlignmentSet, pos: usize) {
    println!("Positions plot around {}", pos);
    let window_start = pos.saturating_sub(2);
    let window_end = (pos + 2).min(reference.len().saturating_sub(1));

    for id in alignments.ids_by_start() {
        let alignment = alignments.get(id);
        if alignment.start > window_end || alignment.end <= window_start {
            continue;
        }

        // allele per base: the query character at the base's column plus any
        // following insertion columns
        let mut gt_per_position: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
        let mut running: Vec<u8> = Vec::new();
        let mut last_base: Option<usize> = None;
        for (&c_ref, &c_query) in alignment.ref_row.iter().zip(&alignment.query_row) {
            if is_gap(c_ref) {
                running.push(c_query);
            } else {
                if !running.is_empty() {
                    if let Some(p) = last_base {
                        gt_per_position.insert(p, std::mem::take(&mut running));
                    }
                }
                running.clear();
                running.push(c_query);
                last_base = Some(last_base.map_or(alignment.start, |p| p + 1));
            }
        }
        if !running.is_empty() {
            if let Some(p) = last_base {
                gt_per_position.insert(p, running);
            }
        }

        println!("Positions {}", alignment.name);
        for p in window_start..=window_end {
            if let Some(allele) = gt_per_position.get(&p) {
                println!("\t{}\t{}", p, String::from_utf8_lossy(allele));
            }
        }
    }
    println!(" -- end positions plot.");
}
