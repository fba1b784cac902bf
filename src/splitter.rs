//! Adapter for the external program that splits a tank into one file per subset.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use crate::errors::StitchErr;

/// Something that splits a combined tank into one file per subset code.
///
/// A splitter is staged into a directory of the run before use. That directory holds nothing
/// else, so a staged executable cannot collide with the run's own files. `split` must write one
/// file per subset code found in `input` into `out_dir`, each named exactly by its code.
pub trait Splitter: Sized {
    /// Make a copy of this splitter that lives in `bin_dir`.
    fn stage(&self, bin_dir: &Path) -> Result<Self, StitchErr>;

    /// Split `input`, writing the subset files into `out_dir`.
    fn split(&self, input: &Path, out_dir: &Path) -> Result<(), StitchErr>;
}

/// Runs a third party executable as `<exe> <input>` from inside the output directory.
#[derive(Clone, Debug)]
pub struct ExternalSplitter {
    exe: PathBuf,
}

impl ExternalSplitter {
    /// Create a new one. Bare program names are looked up on `PATH` when staged.
    pub fn new<P: AsRef<Path>>(exe: P) -> Self {
        ExternalSplitter {
            exe: exe.as_ref().to_path_buf(),
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        if self.exe.is_file() {
            return Some(self.exe.clone());
        }

        // Only bare names are searched for, anything with a directory in it is taken literally.
        if self.exe.components().count() != 1 {
            return None;
        }

        std::env::var_os("PATH").and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(&self.exe))
                .find(|candidate| candidate.is_file())
        })
    }
}

impl Splitter for ExternalSplitter {
    fn stage(&self, bin_dir: &Path) -> Result<Self, StitchErr> {
        let found = self
            .locate()
            .ok_or_else(|| StitchErr::MissingSplitter(self.exe.clone()))?;

        let file_name = found
            .file_name()
            .unwrap_or_else(|| OsStr::new("splitter"));
        let staged = bin_dir.join(file_name);

        // Permission bits come along with the copy.
        std::fs::copy(&found, &staged)?;
        log::debug!("Staged splitter {} as {}", found.display(), staged.display());

        Ok(ExternalSplitter { exe: staged })
    }

    fn split(&self, input: &Path, out_dir: &Path) -> Result<(), StitchErr> {
        log::info!("Splitting {}", input.display());

        let output = Command::new(&self.exe)
            .arg(input)
            .current_dir(out_dir)
            .output()?;

        if !output.stdout.is_empty() {
            log::debug!("splitter: {}", String::from_utf8_lossy(&output.stdout).trim_end());
        }

        if output.status.success() {
            Ok(())
        } else {
            if !output.stderr.is_empty() {
                log::error!("splitter: {}", String::from_utf8_lossy(&output.stderr).trim_end());
            }

            Err(StitchErr::SplitterFailed {
                exe: self.exe.clone(),
                input: input.to_path_buf(),
                status: output.status,
            })
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
