//! Settings for a stitching run.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{errors::StitchErr, policy::MissingPolicy, subset::SubsetCode};

/// Get the default working directory, `${HOME}/bufr-stitch`.
pub fn default_work_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bufr-stitch")
}

/// Everything a run needs besides the dumps and cycle.
///
/// Loaded from YAML, any key left out takes its default value.
///
/// ```yaml
/// base_root: /data/tanks/ops
/// spec_root: /data/tanks/experiment
/// work_root: /scratch/stitch
/// subsets: [NC005030, NC005031]
/// missing_policy: KILL
/// splitter: /usr/local/bin/split_by_subset
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StitchConfig {
    /// Root of the tree holding the base tanks.
    pub base_root: PathBuf,
    /// Root of the tree holding the spec tanks.
    pub spec_root: PathBuf,
    /// Where per-run working directories are created.
    pub work_root: PathBuf,
    /// Where the stitched file goes. Defaults to `work_root`.
    pub output_dir: Option<PathBuf>,
    /// The tank name used in file names, e.g. `satwnd`.
    pub tank: String,
    /// Subsets to take from the spec tank instead of the base tank.
    pub subsets: Vec<SubsetCode>,
    /// What to do when a selected subset is not in the spec tank.
    pub missing_policy: MissingPolicy,
    /// The splitter executable.
    pub splitter: PathBuf,
    /// Spacing of cycles when stitching a range.
    pub hours_between_cycles: i64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        StitchConfig {
            base_root: PathBuf::from("."),
            spec_root: PathBuf::from("."),
            work_root: default_work_root(),
            output_dir: None,
            tank: "satwnd".to_owned(),
            subsets: vec![],
            missing_policy: MissingPolicy::default(),
            splitter: PathBuf::from("split_by_subset"),
            hours_between_cycles: crate::cycle::Cycle::DEFAULT_HOURS_BETWEEN,
        }
    }
}

impl StitchConfig {
    /// Load a configuration file.
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self, StitchErr> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, StitchErr> {
        let config: StitchConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The directory the stitched file is written to.
    pub fn output_dir(&self) -> &Path {
        self.output_dir
            .as_deref()
            .unwrap_or_else(|| self.work_root.as_path())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), StitchErr> {
        let tank_ok = !self.tank.is_empty()
            && self
                .tank
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if !tank_ok {
            return Err(StitchErr::InvalidConfig(format!(
                "tank name {:?}",
                self.tank
            )));
        }

        if self.hours_between_cycles < 1 || self.hours_between_cycles > 24 {
            return Err(StitchErr::InvalidConfig(format!(
                "hours_between_cycles must be 1 to 24, got {}",
                self.hours_between_cycles
            )));
        }

        if self.splitter.as_os_str().is_empty() {
            return Err(StitchErr::InvalidConfig("splitter is empty".to_owned()));
        }

        Ok(())
    }
}
