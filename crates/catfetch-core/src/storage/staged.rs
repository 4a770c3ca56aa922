//! Staged writer: buffered writes into a unique `.<name>.XXXXXX.part`
//! sibling, then fsync + rename.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::TEMP_SUFFIX;

/// A file being written next to its final location.
///
/// Nothing is visible at `final_path` until [`StagedFile::commit`]. Each
/// `StagedFile` owns its own randomly named staging file, so concurrent
/// writers of the same destination never clobber each other's bytes.
/// Dropping an uncommitted `StagedFile` removes the staging file.
pub struct StagedFile {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl StagedFile {
    /// Create a fresh staging file for `final_path`, creating parent dirs as needed.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let dir = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        Ok(StagedFile {
            writer: BufWriter::new(temp),
            final_path: final_path.to_path_buf(),
        })
    }

    /// Path to the current staging file.
    pub fn temp_path(&self) -> &Path {
        self.writer.get_ref().path()
    }

    /// Final path the file is renamed to on commit.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Flush, fsync and atomically rename the staging file to the final path.
    /// Fails if `final_path` is on a different filesystem; the staging file
    /// is removed on any failure.
    pub fn commit(self) -> io::Result<()> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.final_path).map_err(|e| e.error)?;
        sync_parent_dir(&self.final_path);
        Ok(())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Persist the rename itself. Best effort: not every platform can open a directory.
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        let dir = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(d) = File::open(dir) {
            let _ = d.sync_all();
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
