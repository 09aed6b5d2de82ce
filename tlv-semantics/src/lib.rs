#![forbid(unsafe_code)]

mod encoding;
mod error;
pub mod locations;
pub mod naming;
mod semantics;

pub use encoding::{Encoding, POSITION_VAR, TRACE_VAR};
pub use error::{Result, SemanticsError};
pub use locations::{annotate, ActiveVarMap, ProgramAnnotations, TimePointMap};
pub use semantics::Semantics;
