//! Subset codes name the per-subset files the splitter writes.

use serde::Deserialize;
use std::{convert::TryFrom, fmt::Display, path::Path, str::FromStr};

use crate::errors::StitchErr;

/// A subset code, e.g. `NC005030`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct SubsetCode {
    code: String,
}

impl SubsetCode {
    const MAX_LEN: usize = 32;

    /// Validate and wrap a code.
    pub fn new(code: &str) -> Result<Self, StitchErr> {
        let valid = !code.is_empty()
            && code.len() <= Self::MAX_LEN
            && code.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');

        if valid {
            Ok(SubsetCode {
                code: code.to_owned(),
            })
        } else {
            Err(StitchErr::InvalidSubsetCode(code.to_owned()))
        }
    }

    /// Get the code for a file produced by the splitter, if the file is named like one.
    pub fn from_file_name(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| SubsetCode::new(name).ok())
    }

    /// Get the code as a string slice. This is also the subset's file name.
    pub fn as_str(&self) -> &str {
        &self.code
    }
}

impl FromStr for SubsetCode {
    type Err = StitchErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubsetCode::new(s)
    }
}

impl TryFrom<String> for SubsetCode {
    type Error = StitchErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        SubsetCode::new(&s)
    }
}

impl AsRef<Path> for SubsetCode {
    fn as_ref(&self) -> &Path {
        Path::new(&self.code)
    }
}

impl Display for SubsetCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "{}", self.code)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
