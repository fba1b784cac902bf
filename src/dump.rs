use std::{convert::TryFrom, fmt::Display, str::FromStr};

use crate::{cycle::Cycle, errors::StitchErr};

/// New type wrapper for the name of a dump, e.g. `gdas` or `gfs`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dump {
    name: String,
}

impl Dump {
    /// Validate and wrap a dump name.
    ///
    /// Dump names become part of directory and file names, so only ASCII letters, digits, `_`,
    /// and `-` are allowed.
    pub fn new(name: &str) -> Result<Self, StitchErr> {
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

        if valid {
            Ok(Dump {
                name: name.to_owned(),
            })
        } else {
            Err(StitchErr::InvalidDumpName(name.to_owned()))
        }
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl FromStr for Dump {
    type Err = StitchErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dump::new(s)
    }
}

impl TryFrom<String> for Dump {
    type Error = StitchErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Dump::new(&s)
    }
}

impl Display for Dump {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "{}", self.name)
    }
}

/// A dump at a cycle, which determines where its tank lives.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DumpId {
    pub dump: Dump,
    pub cycle: Cycle,
}

impl DumpId {
    /// Create a new one.
    pub fn new(dump: Dump, cycle: Cycle) -> Self {
        DumpId { dump, cycle }
    }
}

impl Display for DumpId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "{} {}", self.dump, self.cycle)
    }
}
