//! # Variant-Calling Pipeline
//!
//! One invocation, start to finish:
//! 1. write the `0` completion sentinel
//! 2. load the reference and all alignments (splitting oversized gap runs,
//!    collecting expected alleles)
//! 3. build and verify the MSA gap structure
//! 4. run the haplotype enumerator into the VCF writer
//! 5. write the expected-SNPs side file
//! 6. flip the sentinel to `1`

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::io::done::DoneFile;
use crate::io::input::load_file;
use crate::io::vcf::{write_expected_snps, VcfWriter};
use crate::model::enumerator::{EnumeratorStats, HaplotypeEnumerator};
use crate::model::gap_structure::GapStructure;

/// Owns the configuration and runs one complete conversion
pub struct CallingPipeline {
    config: Config,
}

impl CallingPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<EnumeratorStats> {
        let done = DoneFile::begin(&self.config.done_path())?;

        let input = load_file(&self.config.input, self.config.max_gap_length)?;
        input.stats.print(self.config.max_gap_length);
        info!(
            reference_len = input.reference.len(),
            alignments = input.alignments.len(),
            "input loaded"
        );

        let gaps = GapStructure::build(&input.reference, &input.alignments)?;

        let mut writer = VcfWriter::create(
            &self.config.vcf_path(),
            &self.config.reference_sequence_id,
        )?;
        let enumerator = HaplotypeEnumerator::new(
            &input.reference,
            &input.alignments,
            &gaps,
            self.config.max_running_haplotypes,
        );
        let stats = enumerator.run(&mut writer)?;
        writer.flush()?;
        drop(writer);

        write_expected_snps(
            &self.config.expected_snps_path(),
            &self.config.reference_sequence_id,
            &input.expected,
        )?;

        done.finish()?;
        Ok(stats)
    }
}
