//! Where tanks live on disk.
//!
//! Tanks are stored as `<root>/<dump>.<YYYYMMDD>/<HH>/atmos/<dump>.t<HH>z.<tank>.tm00.bufr_d`.

use std::path::{Path, PathBuf};

use crate::dump::DumpId;

/// A tree of tanks under one root directory.
#[derive(Clone, Copy, Debug)]
pub struct TankLayout<'a> {
    root: &'a Path,
    tank: &'a str,
}

impl<'a> TankLayout<'a> {
    const SUB_DIR: &'static str = "atmos";

    /// Create a new layout for the tank named `tank`, e.g. `satwnd`.
    pub fn new(root: &'a Path, tank: &'a str) -> Self {
        TankLayout { root, tank }
    }

    /// The conventional file name of a dump's tank.
    pub fn file_name(&self, id: &DumpId) -> String {
        format!(
            "{}.t{}z.{}.tm00.bufr_d",
            id.dump,
            id.cycle.hh(),
            self.tank
        )
    }

    /// The full path to a dump's tank.
    pub fn path(&self, id: &DumpId) -> PathBuf {
        self.root
            .join(format!("{}.{}", id.dump, id.cycle.ymd()))
            .join(id.cycle.hh())
            .join(Self::SUB_DIR)
            .join(self.file_name(id))
    }

    /// The path to a dump's tank, if it exists.
    pub fn find(&self, id: &DumpId) -> Option<PathBuf> {
        Some(self.path(id)).filter(|path| path.is_file())
    }
}
