//! # msa2vcf
//!
//! Turn pairwise reference/contig alignments into variant calls.
//!
//! ## Usage
//! ```bash
//! msa2vcf --input chr21.alignments --referenceSequenceID chr21
//! ```
//!
//! Writes `<input>.VCF`, `<input>.VCF.expectedSNPs`, and the completion
//! sentinel `<input>.VCF.done` (`0` while running, `1` on success).

use msa2vcf::config::Config;
use msa2vcf::pipelines::CallingPipeline;
use msa2vcf::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Route diagnostics to stderr; stdout stays a clean protocol stream
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let config = Config::parse_and_validate()?;
    init_logging();

    let stats = CallingPipeline::new(config).run()?;
    tracing::info!(
        opened_alignments = stats.opened_alignments,
        flushes = stats.flushes,
        records = stats.records_emitted,
        peak_open = stats.peak_open,
        "run complete"
    );
    Ok(())
}
