//! # msa2vcf Library
//!
//! Converts a collection of pairwise reference/contig alignments into a
//! VCF body. The pairwise alignments are column-aligned into an implicit
//! multiple-sequence alignment; a position-by-position enumerator tracks
//! every consistent haplotype path through it and emits the alternative
//! alleles observed whenever all running paths collapse back to pure
//! reference.
//!
//! ## Modules
//! - `config`: CLI argument parsing and validation
//! - `data`: alignment records, arena and start-position index
//! - `error`: error types and result alias
//! - `io`: input loading, VCF body and side-file writing, sentinel
//! - `model`: splitter, gap structure, haplotype enumerator
//! - `pipelines`: end-to-end workflow orchestration

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;

// Re-export commonly used types
pub use config::Config;
pub use data::alignment::{AlignmentSet, AlnId, PairwiseAlignment};
pub use error::{MsaVcfError, Result};
pub use io::input::{load_file, load_input, LoadedInput};
pub use io::vcf::{CollectSink, VariantRecord, VariantSink, VcfWriter};
pub use model::enumerator::{EnumeratorStats, HaplotypeEnumerator};
pub use model::gap_structure::GapStructure;
pub use pipelines::CallingPipeline;
