//! # Completion Sentinel
//!
//! `<input>.VCF.done` is the sole cross-process success signal: it holds
//! `0` from the moment processing begins and flips to `1` only after every
//! output file has been written and closed. A missing file or a lingering
//! `0` means a crash or a run still in progress.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Sentinel file handle; create with [`DoneFile::begin`], flip with
/// [`DoneFile::finish`]
#[derive(Debug)]
pub struct DoneFile {
    path: PathBuf,
}

impl DoneFile {
    /// Write `0\n`, marking the run as in progress
    pub fn begin(path: &Path) -> Result<Self> {
        write_flag(path, b"0\n")?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Overwrite with `1\n`, marking the run as complete. Consumes the
    /// handle: there is nothing meaningful to do with the sentinel after.
    pub fn finish(self) -> Result<()> {
        write_flag(&self.path, b"1\n")
    }
}

fn write_flag(path: &Path, flag: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(flag)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.VCF.done");

        let done = DoneFile::begin(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0\n");

        done.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n");
    }
}
