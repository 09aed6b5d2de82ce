#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;
use tlv_logic::LogicError;
use tlv_program::StmtId;

#[derive(Debug, Error, Diagnostic)]
pub enum SemanticsError {
    #[error("no {which} time-point for statement {id} at location {location}")]
    #[diagnostic(
        code(tlv::semantics::missing_time_point),
        help("the location pass must assign start and end time-points to every statement")
    )]
    MissingTimePoint {
        which: &'static str,
        id: StmtId,
        location: String,
    },

    #[error("no active-variable set for location {0}")]
    #[diagnostic(code(tlv::semantics::missing_active_vars))]
    MissingActiveVarSet(String),

    #[error("{block} of the statement at location {location} is empty")]
    #[diagnostic(
        code(tlv::semantics::empty_block),
        help("front-ends put a `skip` into empty branches and loop bodies")
    )]
    EmptyBlock {
        block: &'static str,
        location: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Logic(#[from] LogicError),
}

pub type Result<T, E = SemanticsError> = std::result::Result<T, E>;
