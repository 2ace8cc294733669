//! # Model Module
//!
//! The MSA-reconstruction and haplotype-graph traversal engine.
//!
//! ## Core Algorithms
//! - `splitter`: cuts oversized query-gap runs out of loaded alignments and
//!   collects expected substitution alleles along the way
//! - `gap_structure`: derives the per-position MSA insertion-column counts
//!   that every alignment must agree on
//! - `enumerator`: walks the reference position by position, maintaining the
//!   set of open haplotype paths and flushing variants whenever the set
//!   collapses back to pure reference

pub mod enumerator;
pub mod gap_structure;
pub mod splitter;
