#![deny(missing_docs)]
//! Package to stitch selected subsets of one BUFR observation tank into another.
//!
//! A base tank and a spec tank for the same cycle are each split into one file per subset by an
//! external splitter program. The base subsets are kept, except that selected subsets are taken
//! from the spec tank instead, and the result is concatenated back into a single tank.

//
// Public API
//
pub use cmd_line::CommonCmdLineArgs;
pub use config::{default_work_root, StitchConfig};
pub use cycle::Cycle;
pub use dump::{Dump, DumpId};
pub use errors::StitchErr;
pub use inventory::Inventory;
pub use policy::MissingPolicy;
pub use splitter::{ExternalSplitter, Splitter};
pub use stitch::{StitchReport, Stitcher};
pub use subset::SubsetCode;
pub use tank::TankLayout;

//
// Implementation only
//
#[macro_use]
extern crate strum_macros;

mod cmd_line;
mod config;
mod cycle;
mod dump;
mod errors;
mod inventory;
mod policy;
mod splitter;
mod stitch;
mod subset;
mod tank;
