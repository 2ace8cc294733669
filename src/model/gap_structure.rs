//! # MSA Gap Structure
//!
//! Every input alignment implies, for each reference base it covers, a
//! number of MSA insertion columns following that base. Because all
//! alignments are cut from one consistent multiple-sequence alignment,
//! those counts must agree wherever two alignments overlap; the builder
//! verifies this while recording them. The enumerator later uses the counts
//! to keep reference-sourced haplotypes column-synchronous with
//! contig-sourced ones.

use tracing::debug;

use crate::data::alignment::{is_gap, AlignmentSet};
use crate::error::{MsaVcfError, Result};

/// Window length for the coverage diagnostics report
const COVERAGE_WINDOW: usize = 10_000;

/// Per-position MSA insertion counts plus coverage diagnostics
#[derive(Debug)]
pub struct GapStructure {
    /// `gaps[p]` = insertion columns between reference base `p` and `p+1`;
    /// `None` means no spanning alignment constrained the value yet
    gaps: Vec<Option<usize>>,
    /// Number of alignments covering each reference base (diagnostic only)
    coverage: Vec<u32>,
}

impl GapStructure {
    /// Walk every alignment and record/verify its insertion-column counts.
    ///
    /// Also re-checks that each non-gap reference column matches the
    /// reference sequence and that the alignment consumes exactly its
    /// declared span.
    pub fn build(reference: &[u8], alignments: &AlignmentSet) -> Result<Self> {
        let mut gaps: Vec<Option<usize>> = vec![None; reference.len()];
        let mut coverage: Vec<u32> = vec![0; reference.len()];

        let mut n_alignments = 0usize;
        for id in alignments.ids_by_start() {
            let alignment = alignments.get(id);
            let mut running_gaps = 0usize;
            // 0-based index of the last consumed reference base
            let mut last_base: Option<usize> = None;

            for &c_ref in &alignment.ref_row {
                if is_gap(c_ref) {
                    running_gaps += 1;
                    continue;
                }

                if let Some(prev) = last_base {
                    match gaps[prev] {
                        None => gaps[prev] = Some(running_gaps),
                        Some(existing) if existing != running_gaps => {
                            eprintln!(
                                "Gap structure mismatch at position {} - this is alignment {} / {}, have existing value {}, want to set {}",
                                prev, n_alignments, alignment.name, existing, running_gaps
                            );
                            eprintln!("Alignment start {}", alignment.start);
                            eprintln!("Alignment stop {}", alignment.end);
                            return Err(MsaVcfError::GapStructure {
                                pos: prev,
                                name: alignment.name.clone(),
                                existing,
                                wanted: running_gaps,
                            });
                        }
                        Some(_) => {}
                    }
                }

                let p = last_base.map_or(alignment.start, |prev| prev + 1);
                let expected = reference.get(p).copied().ok_or_else(|| {
                    MsaVcfError::invalid_alignment(
                        &alignment.name,
                        format!("position {} lies beyond the reference ({} bases)", p, reference.len()),
                    )
                })?;
                if c_ref != expected {
                    return Err(MsaVcfError::ReferenceMismatch {
                        pos: p,
                        name: alignment.name.clone(),
                        expected: expected as char,
                        found: c_ref as char,
                    });
                }
                coverage[p] += 1;
                last_base = Some(p);
                running_gaps = 0;
            }

            if last_base.map(|p| p + 1) != Some(alignment.end) {
                return Err(MsaVcfError::invalid_alignment(
                    &alignment.name,
                    format!(
                        "walk ended at base {:?} but span ends at {}",
                        last_base, alignment.end
                    ),
                ));
            }
            n_alignments += 1;
        }

        println!("Loaded {} alignments.", n_alignments);

        let structure = Self { gaps, coverage };
        structure.report_coverage();
        Ok(structure)
    }

    /// Insertion columns between reference base `p` and `p+1` (unset = 0)
    #[inline]
    pub fn insertions_after(&self, p: usize) -> usize {
        self.gaps[p].unwrap_or(0)
    }

    #[inline]
    pub fn coverage_at(&self, p: usize) -> u32 {
        self.coverage[p]
    }

    /// Windowed average coverage, for the logs only
    fn report_coverage(&self) {
        for window_start in (0..self.coverage.len()).step_by(COVERAGE_WINDOW) {
            let window_end = (window_start + COVERAGE_WINDOW).min(self.coverage.len());
            let total: u64 = self.coverage[window_start..window_end]
                .iter()
                .map(|&c| c as u64)
                .sum();
            let avg = total as f64 / (window_end - window_start) as f64;
            debug!(window_start, avg_coverage = avg, "coverage window");
        }
    }
}
