#![forbid(unsafe_code)]

mod error;
mod formula;
mod problem;
mod registry;
pub mod sort;
mod symbol;
mod term;
mod theory;

pub use error::{LogicError, Result};
pub use formula::{Formula, FormulaKind};
pub use problem::Problem;
pub use registry::Registry;
pub use sort::Sort;
pub use symbol::Symbol;
pub use term::Term;
pub use theory::Theory;
