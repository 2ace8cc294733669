//! # Configuration Logic
//!
//! CLI argument parsing and validation using clap derive.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{MsaVcfError, Result};

/// Default limit on the length of a query-gap run inside one alignment.
/// Longer runs are cut out by the splitter so that the enumerator's flush
/// condition can still be reached.
pub const DEFAULT_MAX_GAP_LENGTH: usize = 5000;

/// Default cap on the open-haplotype set size beyond which incoming
/// alignments are skipped rather than recombined in.
pub const DEFAULT_MAX_RUNNING_HAPLOTYPES: usize = 5000;

/// msa2vcf: turn pairwise reference/contig alignments into variant calls
#[derive(Parser, Debug, Clone)]
#[command(name = "msa2vcf")]
#[command(version = "0.1.0")]
#[command(
    about = "Project pairwise alignments onto an implicit MSA and emit variant calls",
    long_about = None
)]
pub struct Config {
    /// Input file: first line is the reference sequence, remaining lines are
    /// tab-separated pairwise alignments (ref, query, name, start, last)
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Reference sequence ID written to the CHROM column
    #[arg(long = "referenceSequenceID", value_name = "ID")]
    pub reference_sequence_id: String,

    /// Maximum query-gap run length tolerated inside one alignment before
    /// the splitter cuts it into gap-free sub-alignments
    #[arg(long = "maxGapLength", default_value_t = DEFAULT_MAX_GAP_LENGTH)]
    pub max_gap_length: usize,

    /// Open-haplotype count above which newly starting alignments are
    /// skipped (throttles combinatorial blow-up)
    #[arg(long = "maxRunningHaplotypes", default_value_t = DEFAULT_MAX_RUNNING_HAPLOTYPES)]
    pub max_running_haplotypes: usize,
}

impl Config {
    /// Parse command-line arguments and validate them
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(MsaVcfError::FileNotFound {
                path: self.input.clone(),
            });
        }
        if self.reference_sequence_id.is_empty() {
            return Err(MsaVcfError::config("referenceSequenceID must not be empty"));
        }
        Ok(())
    }

    /// Path of the primary VCF output: `<input>.VCF`
    pub fn vcf_path(&self) -> PathBuf {
        append_extension(&self.input, ".VCF")
    }

    /// Path of the completion sentinel: `<input>.VCF.done`
    pub fn done_path(&self) -> PathBuf {
        append_extension(&self.input, ".VCF.done")
    }

    /// Path of the expected-SNPs side file: `<input>.VCF.expectedSNPs`
    pub fn expected_snps_path(&self) -> PathBuf {
        append_extension(&self.input, ".VCF.expectedSNPs")
    }
}

fn append_extension(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let config = Config {
            input: PathBuf::from("/data/chr21"),
            reference_sequence_id: "chr21".to_string(),
            max_gap_length: DEFAULT_MAX_GAP_LENGTH,
            max_running_haplotypes: DEFAULT_MAX_RUNNING_HAPLOTYPES,
        };
        assert_eq!(config.vcf_path(), PathBuf::from("/data/chr21.VCF"));
        assert_eq!(config.done_path(), PathBuf::from("/data/chr21.VCF.done"));
        assert_eq!(
            config.expected_snps_path(),
            PathBuf::from("/data/chr21.VCF.expectedSNPs")
        );
    }

    #[test]
    fn test_validate_missing_input() {
        let config = Config {
            input: PathBuf::from("/no/such/file"),
            reference_sequence_id: "chr1".to_string(),
            max_gap_length: DEFAULT_MAX_GAP_LENGTH,
            max_running_haplotypes: DEFAULT_MAX_RUNNING_HAPLOTYPES,
        };
        assert!(matches!(
            config.validate(),
            Err(MsaVcfError::FileNotFound { .. })
        ));
    }
}
