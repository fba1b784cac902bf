use std::{
    fs::OpenOptions,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::errors::StitchErr;

// Create the file at `path` unless it already exists. Ok(false) means somebody else has it.
fn create_lock(path: &Path) -> std::io::Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err),
    }
}

/// A lock held for as long as the lock file exists. The file is removed when dropped.
#[derive(Debug)]
pub(crate) struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Take the lock at `path`, or `None` if another run holds it.
    pub(crate) fn try_acquire(path: PathBuf) -> Result<Option<Self>, StitchErr> {
        if create_lock(&path)? {
            Ok(Some(LockFile { path }))
        } else {
            Ok(None)
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            log::warn!("Unable to remove lock {}: {}", self.path.display(), err);
        }
    }
}

/// A working directory owned by one run. Removed, with everything in it, when dropped.
#[derive(Debug)]
pub(crate) struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    const LOCK_FILE: &'static str = ".lock";

    /// Create `<work_root>/<name>` and lock it for this run.
    ///
    /// If another run holds the lock the directory is left alone and `WorkDirBusy` is returned.
    /// Anything left in an unlocked directory by an earlier run is removed first.
    pub(crate) fn acquire(work_root: &Path, name: &str) -> Result<Self, StitchErr> {
        std::fs::create_dir_all(work_root)?;
        let path = work_root.canonicalize()?.join(name);
        std::fs::create_dir_all(&path)?;

        match create_lock(&path.join(Self::LOCK_FILE)) {
            Ok(true) => {}
            Ok(false) => return Err(StitchErr::WorkDirBusy(path)),
            Err(err) => {
                let _ = std::fs::remove_dir_all(&path);
                return Err(err.into());
            }
        }

        // Owned from here on, so any failure below still cleans up.
        let work = WorkDir { path };
        work.clear_leftovers()?;

        log::debug!("Acquired working directory {}", work.path.display());
        Ok(work)
    }

    fn clear_leftovers(&self) -> Result<(), StitchErr> {
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_name() == Self::LOCK_FILE {
                continue;
            }

            log::warn!("Removing leftover {}", entry.path().display());
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(entry.path())?;
            } else {
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Absolute path of the working directory.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Create a directory inside the working directory and return its path.
    pub(crate) fn sub_dir<P: AsRef<Path>>(&self, name: P) -> Result<PathBuf, StitchErr> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("Removed working directory {}", self.path.display()),
            Err(err) => log::warn!(
                "Unable to remove working directory {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}
