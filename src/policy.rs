//! What to do when a selected subset is missing from the spec tank.

use serde::Deserialize;
use std::{convert::Infallible, fmt, str::FromStr};

/// Policy applied to a selected subset code that the spec tank does not have.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MissingPolicy {
    /// Keep whatever the base tank had for that code.
    CopyFromBase,
    /// Remove the code from the output even if the base tank had it.
    DropEntirely,
    /// A value nobody recognized. Behaves like `CopyFromBase`, with a warning.
    Unrecognized(String),
}

// Accepted spellings of the known policies.
#[derive(Clone, Copy, Debug, EnumString)]
enum Keyword {
    #[strum(serialize = "COPY", serialize = "copy", serialize = "copy-from-base")]
    Copy,
    #[strum(
        serialize = "KILL",
        serialize = "kill",
        serialize = "drop",
        serialize = "drop-entirely"
    )]
    Kill,
}

impl MissingPolicy {
    /// Parse a policy, never failing. Unknown values are kept so they can be reported.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().parse::<Keyword>() {
            Ok(Keyword::Copy) => MissingPolicy::CopyFromBase,
            Ok(Keyword::Kill) => MissingPolicy::DropEntirely,
            Err(_) => MissingPolicy::Unrecognized(value.to_owned()),
        }
    }

    /// Whether a missing code should be removed from the output.
    pub fn drops_missing(&self) -> bool {
        match self {
            MissingPolicy::DropEntirely => true,
            MissingPolicy::CopyFromBase | MissingPolicy::Unrecognized(_) => false,
        }
    }
}

impl Default for MissingPolicy {
    fn default() -> Self {
        MissingPolicy::CopyFromBase
    }
}

impl From<String> for MissingPolicy {
    fn from(value: String) -> Self {
        MissingPolicy::parse_lenient(&value)
    }
}

impl FromStr for MissingPolicy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MissingPolicy::parse_lenient(s))
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MissingPolicy::CopyFromBase => write!(f, "COPY"),
            MissingPolicy::DropEntirely => write!(f, "KILL"),
            MissingPolicy::Unrecognized(value) => write!(f, "{}", value),
        }
    }
}
