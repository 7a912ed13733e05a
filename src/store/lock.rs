use super::error::{Result, StoreError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive claim on a store directory, held for the lifetime of a
/// [`Database`](super::Database).
///
/// The claim is an OS file lock on `.lock`, so it ends with the owning
/// process even after a crash. The file itself stays in place and carries
/// the pid of the last owner for error messages.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    file: File,
}

impl StoreLock {
    pub const FILE_NAME: &'static str = ".lock";

    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        let path = dir.join(Self::FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked {
                path: dir.to_path_buf(),
                pid: read_owner(&path).unwrap_or_default(),
            });
        }

        let pid = std::process::id();
        write_owner(&mut file, pid).map_err(|e| StoreError::io(&path, e))?;

        debug!("Acquired store lock {:?} (pid {})", path, pid);
        Ok(Self { path, file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release store lock {:?}: {}", self.path, e);
        }
    }
}

fn write_owner(file: &mut File, pid: u32) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", pid)?;
    file.flush()
}

fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
