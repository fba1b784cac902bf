//! Module for errors.
use std::{error::Error, fmt::Display, path::PathBuf, process::ExitStatus};

/// Error from stitching tanks together.
#[derive(Debug)]
pub enum StitchErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// Error reading a configuration file.
    Yaml(::serde_yaml::Error),
    /// Error forwarded from chrono while parsing a date.
    ChronoParse(::chrono::ParseError),

    // My own errors from this crate
    /// The base tank for the requested cycle does not exist.
    MissingBaseTank(PathBuf),
    /// The spec tank for the requested cycle does not exist.
    MissingSpecTank(PathBuf),
    /// The splitter executable could not be found.
    MissingSplitter(PathBuf),
    /// The splitter ran, but reported failure.
    SplitterFailed {
        /// The executable that was run.
        exe: PathBuf,
        /// The file it was asked to split.
        input: PathBuf,
        /// How it exited.
        status: ExitStatus,
    },
    /// Another run already owns this working directory.
    WorkDirBusy(PathBuf),
    /// Another run is writing the same output file.
    OutputBusy(PathBuf),
    /// Not a valid subset code.
    InvalidSubsetCode(String),
    /// Not a valid dump name.
    InvalidDumpName(String),
    /// Not a valid date, hour, or cycle.
    InvalidCycle(String),
    /// A configuration value that cannot be used.
    InvalidConfig(String),
    /// There was an internal logic error.
    LogicError(&'static str),
}

impl Display for StitchErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::StitchErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            Yaml(err) => write!(f, "error reading configuration: {}", err),
            ChronoParse(err) => write!(f, "error parsing date: {}", err),

            MissingBaseTank(path) => write!(f, "base tank missing: {}", path.display()),
            MissingSpecTank(path) => write!(f, "spec tank missing: {}", path.display()),
            MissingSplitter(path) => {
                write!(f, "splitter executable not found: {}", path.display())
            }
            SplitterFailed { exe, input, status } => write!(
                f,
                "splitter {} failed on {}: {}",
                exe.display(),
                input.display(),
                status
            ),
            WorkDirBusy(path) => write!(
                f,
                "working directory already in use by another run: {}",
                path.display()
            ),
            OutputBusy(path) => write!(
                f,
                "output already being written by another run: {}",
                path.display()
            ),
            InvalidSubsetCode(code) => write!(f, "invalid subset code: {:?}", code),
            InvalidDumpName(name) => write!(f, "invalid dump name: {:?}", name),
            InvalidCycle(val) => write!(f, "invalid cycle: {}", val),
            InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            LogicError(msg) => write!(f, "internal logic error: {}", msg),
        }
    }
}

impl Error for StitchErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StitchErr::IO(err) => Some(err),
            StitchErr::Yaml(err) => Some(err),
            StitchErr::ChronoParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<::std::io::Error> for StitchErr {
    fn from(err: ::std::io::Error) -> StitchErr {
        StitchErr::IO(err)
    }
}

impl From<::serde_yaml::Error> for StitchErr {
    fn from(err: ::serde_yaml::Error) -> StitchErr {
        StitchErr::Yaml(err)
    }
}

impl From<::chrono::ParseError> for StitchErr {
    fn from(err: ::chrono::ParseError) -> StitchErr {
        StitchErr::ChronoParse(err)
    }
}
