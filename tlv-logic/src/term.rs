#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use crate::error::{LogicError, Result};
use crate::sort::Sort;
use crate::symbol::Symbol;

/// A sorted term. Equality is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(Arc<Symbol>),
    App { symbol: Arc<Symbol>, args: Vec<Term> },
}

/// Checks `args` against the domain of `symbol`; shared by function terms
/// and predicate formulas.
pub(crate) fn check_args(symbol: &Symbol, args: &[Term]) -> Result<()> {
    if args.len() != symbol.arity() {
        return Err(LogicError::ArityMismatch {
            symbol: symbol.name.clone(),
            expected: symbol.arity(),
            found: args.len(),
        });
    }
    for (i, (arg, expected)) in args.iter().zip(&symbol.arg_sorts).enumerate() {
        if arg.sort() != expected {
            return Err(LogicError::SortMismatch {
                context: format!("argument {i} of {}", symbol.name),
                expected: expected.name.clone(),
                found: arg.sort().name.clone(),
            });
        }
    }
    Ok(())
}

impl Term {
    pub fn var(symbol: &Arc<Symbol>) -> Term {
        Term::Var(Arc::clone(symbol))
    }

    pub fn app(symbol: &Arc<Symbol>, args: Vec<Term>) -> Result<Term> {
        check_args(symbol, &args)?;
        Ok(Term::App {
            symbol: Arc::clone(symbol),
            args,
        })
    }

    pub fn constant(symbol: &Arc<Symbol>) -> Result<Term> {
        Term::app(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &Arc<Symbol> {
        match self {
            Term::Var(symbol) | Term::App { symbol, .. } => symbol,
        }
    }

    pub fn sort(&self) -> &Arc<Sort> {
        &self.symbol().range
    }

    pub fn args(&self) -> &[Term] {
        match self {
            Term::Var(_) => &[],
            Term::App { args, .. } => args,
        }
    }

    pub fn to_smtlib(&self) -> String {
        match self {
            Term::Var(symbol) => symbol.name.clone(),
            Term::App { symbol, args } => render_application(symbol, args),
        }
    }
}

/// `(f a b)` for applications, bare `f` for constants. Negative integer
/// literals become `(- n)`.
pub(crate) fn render_application(symbol: &Symbol, args: &[Term]) -> String {
    let name = symbol.smtlib_name();
    if args.is_empty() {
        return match name.strip_prefix('-') {
            Some(magnitude) if symbol.interpreted && !magnitude.is_empty() => {
                format!("(- {magnitude})")
            }
            _ => name.to_string(),
        };
    }
    let rendered = args.iter().map(Term::to_smtlib).collect::<Vec<_>>().join(" ");
    format!("({name} {rendered})")
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_smtlib())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    #[test]
    fn application_checks_arity() {
        let reg = Registry::new();
        let x = reg
            .fetch_or_declare_symbol("x", vec![reg.time_sort()], reg.int_sort(), false)
            .unwrap();
        let err = Term::app(&x, Vec::new()).unwrap_err();
        assert!(matches!(err, LogicError::ArityMismatch { expected: 1, found: 0, .. }));
    }

    #[test]
    fn application_checks_sorts() {
        let reg = Registry::new();
        let x = reg
            .fetch_or_declare_symbol("x", vec![reg.time_sort()], reg.int_sort(), false)
            .unwrap();
        let pos = Symbol::variable("pos", reg.int_sort());
        let err = Term::app(&x, vec![Term::var(&pos)]).unwrap_err();
        match err {
            LogicError::SortMismatch { expected, found, .. } => {
                assert_eq!(expected, "Time");
                assert_eq!(found, "Int");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn renders_nested_applications() {
        let reg = Registry::new();
        let l = reg
            .fetch_or_declare_symbol("l3", Vec::new(), reg.time_sort(), false)
            .unwrap();
        let a = reg
            .fetch_or_declare_symbol(
                "a",
                vec![reg.time_sort(), reg.int_sort()],
                reg.int_sort(),
                false,
            )
            .unwrap();
        let pos = Symbol::variable("pos", reg.int_sort());
        let t = Term::app(&a, vec![Term::constant(&l).unwrap(), Term::var(&pos)]).unwrap();
        assert_eq!(t.to_smtlib(), "(a l3 pos)");
        assert_eq!(t.sort().name, "Int");
    }
}
