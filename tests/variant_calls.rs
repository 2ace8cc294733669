//! End-to-end scenarios: write an input file, run the whole pipeline, and
//! check every output artifact (VCF body, expected-SNPs side file,
//! completion sentinel).

use std::fs;
use std::path::PathBuf;

use msa2vcf::config::Config;
use msa2vcf::pipelines::CallingPipeline;

struct PipelineRun {
    _dir: tempfile::TempDir,
    input: PathBuf,
}

impl PipelineRun {
    /// Write `content` as the input file and run the pipeline over it
    fn execute(content: &str, max_gap_length: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("alignments");
        fs::write(&input, content).unwrap();

        let config = Config {
            input: input.clone(),
            reference_sequence_id: "chr".to_string(),
            max_gap_length,
            max_running_haplotypes: 5000,
        };
        CallingPipeline::new(config).run().unwrap();

        Self { _dir: dir, input }
    }

    fn vcf(&self) -> String {
        fs::read_to_string(self.input.with_file_name("alignments.VCF")).unwrap()
    }

    fn done(&self) -> String {
        fs::read_to_string(self.input.with_file_name("alignments.VCF.done")).unwrap()
    }

    fn expected_snps(&self) -> String {
        fs::read_to_string(self.input.with_file_name("alignments.VCF.expectedSNPs")).unwrap()
    }
}

#[test]
fn trivial_no_variant() {
    let run = PipelineRun::execute("ACGT\nACGT\tACGT\th1\t1\t4\n", 5000);
    assert_eq!(run.vcf(), "");
    assert_eq!(run.done(), "1\n");
    assert_eq!(run.expected_snps(), "");
}

#[test]
fn single_snp() {
    let run = PipelineRun::execute("ACGT\nACGT\tAGGT\th1\t1\t4\n", 5000);
    assert_eq!(run.vcf(), "chr\t2\t.\tC\tG\t.\tPASS\t.\n");
    assert_eq!(run.expected_snps(), "chr\t2\tG\n");
    assert_eq!(run.done(), "1\n");
}

#[test]
fn insertion() {
    let run = PipelineRun::execute("ACGT\nAC-GT\tACTGT\th1\t1\t4\n", 5000);
    // the C->CT insertion flushes as soon as the next base agrees
    assert_eq!(run.vcf(), "chr\t2\t.\tC\tCT\t.\tPASS\t.\n");
    // an insertion is not a single-column substitution
    assert_eq!(run.expected_snps(), "");
}

#[test]
fn deletion() {
    let run = PipelineRun::execute("ACGT\nACGT\tA--T\th1\t1\t4\n", 5000);
    assert_eq!(run.vcf(), "chr\t1\t.\tACG\tA\t.\tPASS\t.\n");
    assert_eq!(run.expected_snps(), "");
}

#[test]
fn two_contigs_distinct_positions() {
    let run = PipelineRun::execute(
        "ACGTACGT\nACGTACGT\tAGGTACGT\th1\t1\t8\nACGTACGT\tACGTACCT\th2\t1\t8\n",
        5000,
    );
    assert_eq!(
        run.vcf(),
        "chr\t2\t.\tC\tG\t.\tPASS\t.\nchr\t7\t.\tG\tC\t.\tPASS\t.\n"
    );
    assert_eq!(run.expected_snps(), "chr\t2\tG\nchr\t7\tC\n");
}

#[test]
fn long_deletion_exceeds_splitter_threshold() {
    // ten query gaps against a threshold of five: the splitter drops the
    // run, the flanks match the reference, and nothing is called
    let run = PipelineRun::execute(
        "AAAAAAAAAAAA\nAAAAAAAAAAAA\tA----------A\th1\t1\t12\n",
        5,
    );
    assert_eq!(run.vcf(), "");
    assert_eq!(run.done(), "1\n");
}

#[test]
fn multiallelic_alts_are_comma_joined_sorted() {
    let run = PipelineRun::execute("ACGT\nACGT\tATGT\th1\t1\t4\nACGT\tAGGT\th2\t1\t4\n", 5000);
    assert_eq!(run.vcf(), "chr\t2\t.\tC\tG,T\t.\tPASS\t.\n");
    assert_eq!(run.expected_snps(), "chr\t2\tG\nchr\t2\tT\n");
}

#[test]
fn done_file_lifecycle_on_failure() {
    // a malformed record aborts after the sentinel was written as 0
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alignments");
    fs::write(&input, "ACGT\nACGT\tACGT\th1\tx\t4\n").unwrap();

    let config = Config {
        input: input.clone(),
        reference_sequence_id: "chr".to_string(),
        max_gap_length: 5000,
        max_running_haplotypes: 5000,
    };
    assert!(CallingPipeline::new(config).run().is_err());
    assert_eq!(
        fs::read_to_string(input.with_file_name("alignments.VCF.done")).unwrap(),
        "0\n"
    );
}

#[test]
fn crlf_input_accepted() {
    let run = PipelineRun::execute("ACGT\r\nACGT\tAGGT\th1\t1\t4\r\n", 5000);
    assert_eq!(run.vcf(), "chr\t2\t.\tC\tG\t.\tPASS\t.\n");
}
