//! core::atomic
//!
//! Crash-safe file replacement.
//!
//! # Protocol
//!
//! 1. Write the full contents to `<target>.tmp` in the same directory
//! 2. `fsync` the temporary file
//! 3. Rename it over the target
//!
//! The rename is the only point at which the target changes, so readers
//! see either the old file or the new one, never a partial write.
//!
//! [`StagedWrite`] exposes the gap between steps 2 and 3 so callers (and
//! tests) can stage a write and decide later whether to commit it. A staged
//! write that is dropped without [`commit`](StagedWrite::commit) removes its
//! temporary file and leaves the target untouched.
//!
//! # Example
//!
//! ```no_run
//! use portledger::core::atomic::{stage, write_atomic};
//! use std::path::Path;
//!
//! write_atomic(Path::new("versions/baseline.json"), b"{}\n")?;
//!
//! let staged = stage(Path::new("versions/z-/zlib.json"), b"{}\n")?;
//! staged.commit()?;
//! # Ok::<(), std::io::Error>(())
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix appended to the target file name for the temporary sibling.
pub const TEMP_SUFFIX: &str = ".tmp";

/// The temporary sibling path used while writing `target`.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name: OsString = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    target.with_file_name(name)
}

/// A fully written temporary file that has not yet replaced its target.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    temp: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// The temporary file holding the new contents.
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Rename the temporary file over the target.
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        // Best-effort cleanup of an abandoned write
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Write `contents` to the temporary sibling of `target` and sync it.
///
/// Parent directories are created as needed. The target is not touched.
pub fn stage(target: &Path, contents: &[u8]) -> io::Result<StagedWrite> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path_for(target);
    // The guard exists before the file so a failed write is cleaned up too
    let staged = StagedWrite {
        target: target.to_path_buf(),
        temp,
        committed: false,
    };

    let mut file = fs::File::create(&staged.temp)?;
    file.write_all(contents)?;
    file.sync_all()?;

    Ok(staged)
}

/// Stage and immediately commit a write.
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    stage(target, contents)?.commit()
}
