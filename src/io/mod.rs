//! # I/O Module
//!
//! File-format boundaries. Converts between the on-disk formats (the
//! five-field alignment input, the VCF body, the side files) and the
//! in-memory representations the model layer works on.

pub mod done;
pub mod input;
pub mod vcf;
