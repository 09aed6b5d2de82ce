#![forbid(unsafe_code)]

use std::fmt;

pub const INT: &str = "Int";
pub const BOOL: &str = "Bool";
pub const TIME: &str = "Time";
pub const TRACE: &str = "Trace";

/// A named type. Two sorts are the same sort iff their names agree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sort {
    pub name: String,
}

impl Sort {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_builtin(&self) -> bool {
        self.name == INT || self.name == BOOL
    }

    pub fn is_time(&self) -> bool {
        self.name == TIME
    }

    pub fn is_bool(&self) -> bool {
        self.name == BOOL
    }

    /// The declaration emitted for this sort, empty for solver built-ins.
    ///
    /// `Time` is an inductive datatype `zero | s(p: Time)`; the strict order
    /// `Sub` over it is defined right after the datatype by structural
    /// recursion on the successor.
    pub fn declaration(&self) -> String {
        if self.is_builtin() {
            String::new()
        } else if self.is_time() {
            let mut out = String::new();
            out.push_str("(declare-datatypes ((Time 0)) (( (zero) (s (p Time)) )) )\n");
            out.push_str("(define-fun-rec Sub ((a Time) (b Time)) Bool\n");
            out.push_str("   (and ((_ is s) b) (or (= a (p b)) (Sub a (p b)))))\n");
            out
        } else {
            format!("(declare-sort {} 0)\n", self.name)
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
