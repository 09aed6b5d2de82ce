#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LogicError {
    #[error("sort mismatch in {context}: expected {expected}, found {found}")]
    #[diagnostic(code(tlv::logic::sort_mismatch))]
    SortMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("symbol {symbol} expects {expected} argument(s), got {found}")]
    #[diagnostic(code(tlv::logic::arity))]
    ArityMismatch {
        symbol: String,
        expected: usize,
        found: usize,
    },

    #[error("symbol {name} already declared as {existing}, cannot redeclare as {requested}")]
    #[diagnostic(
        code(tlv::logic::signature_conflict),
        help("symbol names are global to a registry; pick a distinct name")
    )]
    SignatureConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("symbol {0} does not have range Bool and cannot be used as a predicate")]
    #[diagnostic(code(tlv::logic::not_a_predicate))]
    NotAPredicate(String),

    #[error("quantifier without bound variables")]
    #[diagnostic(code(tlv::logic::empty_quantifier))]
    EmptyQuantifier,

    #[error("problem has no conjecture")]
    #[diagnostic(
        code(tlv::logic::missing_conjecture),
        help("call `Problem::set_conjecture` before serializing")
    )]
    MissingConjecture,

    #[error("failed to write problem: {0}")]
    #[diagnostic(code(tlv::logic::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = LogicError> = std::result::Result<T, E>;
