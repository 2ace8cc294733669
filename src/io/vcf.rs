//! # VCF Output
//!
//! Writes the VCF body produced by the enumerator, plus the expected-SNPs
//! side file. No header is written; a wrapper may prepend one. QUAL,
//! FILTER and INFO are literal (`.`, `PASS`, `.`): this tool reports
//! observed alternative alleles, it does not genotype.
//!
//! The enumerator talks to a [`VariantSink`] rather than a concrete writer
//! so tests can collect records in memory.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MsaVcfError, Result};
use crate::model::splitter::ExpectedAlleles;

/// One flush event: the reference slice since the last flush and the set of
/// differing haplotype sequences observed across it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// 0-based reference position at which the flushed span starts
    pub pos0: usize,
    /// Reference bases across the span (gap-free by construction)
    pub reference: Vec<u8>,
    /// Alternative sequences, gap-stripped, byte-lexicographic order
    pub alts: BTreeSet<Vec<u8>>,
}

impl VariantRecord {
    /// True when the record can use the SNP fast path: a two-base REF whose
    /// alternatives are all two bases long (one shared context base plus
    /// the substituted one).
    pub fn is_snp(&self) -> bool {
        self.reference.len() == 2 && self.alts.iter().all(|a| a.len() == 2)
    }
}

/// Where the enumerator sends flushed variants
pub trait VariantSink {
    fn emit(&mut self, record: &VariantRecord) -> Result<()>;
}

/// Collects records in memory; the sink used by unit and scenario tests
#[derive(Debug, Default)]
pub struct CollectSink {
    pub records: Vec<VariantRecord>,
}

impl VariantSink for CollectSink {
    fn emit(&mut self, record: &VariantRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Buffered writer for the VCF body
pub struct VcfWriter<W: Write> {
    writer: W,
    chrom: String,
}

impl VcfWriter<BufWriter<File>> {
    /// Create `<input>.VCF` for writing
    pub fn create(path: &Path, chrom: &str) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file), chrom))
    }
}

impl<W: Write> VcfWriter<W> {
    pub fn from_writer(writer: W, chrom: &str) -> Self {
        Self {
            writer,
            chrom: chrom.to_string(),
        }
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn write_line(&mut self, pos1: usize, reference: &[u8], alts: &[&[u8]]) -> Result<()> {
        write!(
            self.writer,
            "{}\t{}\t.\t",
            self.chrom, pos1
        )?;
        self.writer.write_all(reference)?;
        self.writer.write_all(b"\t")?;
        for (i, alt) in alts.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b",")?;
            }
            self.writer.write_all(alt)?;
        }
        writeln!(self.writer, "\t.\tPASS\t.")?;
        Ok(())
    }
}

impl<W: Write> VariantSink for VcfWriter<W> {
    fn emit(&mut self, record: &VariantRecord) -> Result<()> {
        if record.is_snp() {
            // every alternative shares the leading context base with REF
            for alt in &record.alts {
                if alt[0] != record.reference[0] {
                    return Err(MsaVcfError::algorithm(format!(
                        "SNP at position {} does not share its context base: REF {:?}, ALT {:?}",
                        record.pos0,
                        String::from_utf8_lossy(&record.reference),
                        String::from_utf8_lossy(alt),
                    )));
                }
            }
            let alts: Vec<&[u8]> = record.alts.iter().map(|a| &a[1..2]).collect();
            self.write_line(record.pos0 + 2, &record.reference[1..2], &alts)
        } else {
            let alts: Vec<&[u8]> = record.alts.iter().map(|a| a.as_slice()).collect();
            self.write_line(record.pos0 + 1, &record.reference, &alts)
        }
    }
}

impl<W: Write> Drop for VcfWriter<W> {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Write the `.expectedSNPs` side file: one `<id>\t<1-based pos>\t<allele>`
/// line per observed substitution allele, sorted
pub fn write_expected_snps(path: &Path, chrom: &str, expected: &ExpectedAlleles) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (pos, allele) in expected.iter() {
        writeln!(writer, "{}\t{}\t{}", chrom, pos + 1, allele as char)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pos0: usize, reference: &str, alts: &[&str]) -> VariantRecord {
        VariantRecord {
            pos0,
            reference: reference.as_bytes().to_vec(),
            alts: alts.iter().map(|a| a.as_bytes().to_vec()).collect(),
        }
    }

    fn emit_to_string(records: &[VariantRecord]) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = VcfWriter::from_writer(&mut buf, "chr");
            for r in records {
                writer.emit(r).unwrap();
            }
            writer.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_snp_fast_path() {
        let out = emit_to_string(&[record(0, "AC", &["AG"])]);
        assert_eq!(out, "chr\t2\t.\tC\tG\t.\tPASS\t.\n");
    }

    #[test]
    fn test_snp_multiple_alts_sorted() {
        let out = emit_to_string(&[record(4, "TG", &["TT", "TA"])]);
        assert_eq!(out, "chr\t6\t.\tG\tA,T\t.\tPASS\t.\n");
    }

    #[test]
    fn test_general_path_insertion() {
        let out = emit_to_string(&[record(1, "C", &["CT"])]);
        assert_eq!(out, "chr\t2\t.\tC\tCT\t.\tPASS\t.\n");
    }

    #[test]
    fn test_general_path_mixed_lengths() {
        // a two-base REF stays on the general path when any ALT is not
        // two bases long
        let out = emit_to_string(&[record(0, "AC", &["A", "AG"])]);
        assert_eq!(out, "chr\t1\t.\tAC\tA,AG\t.\tPASS\t.\n");
    }

    #[test]
    fn test_snp_context_base_mismatch_is_fatal() {
        let mut buf = Vec::new();
        let mut writer = VcfWriter::from_writer(&mut buf, "chr");
        assert!(writer.emit(&record(0, "AC", &["GG"])).is_err());
    }

    #[test]
    fn test_expected_snps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.VCF.expectedSNPs");
        let mut expected = ExpectedAlleles::new();
        expected.record(9, b'T');
        expected.record(1, b'G');
        expected.record(1, b'A');
        write_expected_snps(&path, "chr", &expected).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "chr\t2\tA\nchr\t2\tG\nchr\t10\tT\n"
        );
    }
}
