#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use crate::sort::Sort;
use crate::theory;

/// A function or predicate name together with its signature.
///
/// Registered symbols come from [`crate::Registry::fetch_or_declare_symbol`].
/// Bound variables are built with [`Symbol::variable`] and never enter a
/// registry, so they are never declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub arg_sorts: Vec<Arc<Sort>>,
    pub range: Arc<Sort>,
    pub interpreted: bool,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, sort: Arc<Sort>) -> Arc<Symbol> {
        Arc::new(Symbol {
            name: name.into(),
            arg_sorts: Vec::new(),
            range: sort,
            interpreted: false,
        })
    }

    pub fn arity(&self) -> usize {
        self.arg_sorts.len()
    }

    pub fn is_predicate(&self) -> bool {
        self.range.is_bool()
    }

    /// Human-readable signature, e.g. `(Time Int) -> Int`.
    pub fn signature(&self) -> String {
        let args = self
            .arg_sorts
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let kind = if self.interpreted { "interpreted" } else { "free" };
        format!("({args}) -> {} [{kind}]", self.range)
    }

    pub fn same_signature(&self, other: &Symbol) -> bool {
        self.arg_sorts == other.arg_sorts
            && self.range == other.range
            && self.interpreted == other.interpreted
    }

    /// Name used in solver text. Interpreted symbols map to their theory
    /// operator; everything else keeps its own name.
    pub fn smtlib_name(&self) -> &str {
        if self.interpreted {
            if let Some(op) = theory::smtlib_operator(&self.name) {
                return op;
            }
        }
        &self.name
    }

    /// `declare-fun` line for free symbols, empty for interpreted ones.
    pub fn declaration(&self) -> String {
        if self.interpreted {
            return String::new();
        }
        let args = self
            .arg_sorts
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        format!("(declare-fun {} ({args}) {})\n", self.name, self.range)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
