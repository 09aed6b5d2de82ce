#![forbid(unsafe_code)]

//! Interpreted symbols: integer arithmetic and comparison, boolean
//! constants, and the `Time` domain (`zero`, `s`, `p`, `Sub`).

use std::sync::Arc;

use crate::error::Result;
use crate::formula::Formula;
use crate::registry::Registry;
use crate::sort::Sort;
use crate::symbol::Symbol;
use crate::term::Term;

const INT_PLUS: &str = "int_plus";
const INT_MINUS: &str = "int_minus";
const INT_MULTIPLY: &str = "int_multiply";
const INT_UNARY_MINUS: &str = "int_unary_minus";
const INT_LESS: &str = "int_less";
const INT_LESS_EQ: &str = "int_less_eq";
const INT_GREATER: &str = "int_greater";
const INT_GREATER_EQ: &str = "int_greater_eq";
const BOOL_TRUE: &str = "bool_true";
const BOOL_FALSE: &str = "bool_false";
const TIME_ZERO: &str = "time_zero";
const TIME_SUCC: &str = "time_succ";
const TIME_PRE: &str = "time_pre";
const TIME_SUB: &str = "time_sub";

pub(crate) fn smtlib_operator(name: &str) -> Option<&'static str> {
    Some(match name {
        INT_PLUS => "+",
        INT_MINUS | INT_UNARY_MINUS => "-",
        INT_MULTIPLY => "*",
        INT_LESS => "<",
        INT_LESS_EQ => "<=",
        INT_GREATER => ">",
        INT_GREATER_EQ => ">=",
        BOOL_TRUE => "true",
        BOOL_FALSE => "false",
        TIME_ZERO => "zero",
        TIME_SUCC => "s",
        TIME_PRE => "p",
        TIME_SUB => "Sub",
        _ => return None,
    })
}

/// Constructors for interpreted terms and formulas over a registry.
#[derive(Clone, Copy, Debug)]
pub struct Theory<'r> {
    registry: &'r Registry,
}

impl<'r> Theory<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    fn interpreted(
        &self,
        name: &str,
        args: Vec<Arc<Sort>>,
        range: Arc<Sort>,
    ) -> Result<Arc<Symbol>> {
        self.registry.fetch_or_declare_symbol(name, args, range, true)
    }

    fn int_binary(&self, name: &str, lhs: Term, rhs: Term) -> Result<Term> {
        let int = self.registry.int_sort();
        let symbol = self.interpreted(name, vec![Arc::clone(&int), Arc::clone(&int)], int)?;
        Term::app(&symbol, vec![lhs, rhs])
    }

    fn int_comparison(&self, name: &str, lhs: Term, rhs: Term) -> Result<Formula> {
        let int = self.registry.int_sort();
        let symbol =
            self.interpreted(name, vec![Arc::clone(&int), int], self.registry.bool_sort())?;
        Formula::predicate(&symbol, vec![lhs, rhs])
    }

    pub fn int_constant(&self, value: i64) -> Result<Term> {
        let symbol = self.interpreted(&value.to_string(), Vec::new(), self.registry.int_sort())?;
        Term::constant(&symbol)
    }

    pub fn int_add(&self, lhs: Term, rhs: Term) -> Result<Term> {
        self.int_binary(INT_PLUS, lhs, rhs)
    }

    pub fn int_sub(&self, lhs: Term, rhs: Term) -> Result<Term> {
        self.int_binary(INT_MINUS, lhs, rhs)
    }

    pub fn int_mul(&self, lhs: Term, rhs: Term) -> Result<Term> {
        self.int_binary(INT_MULTIPLY, lhs, rhs)
    }

    pub fn int_neg(&self, operand: Term) -> Result<Term> {
        let int = self.registry.int_sort();
        let symbol = self.interpreted(INT_UNARY_MINUS, vec![Arc::clone(&int)], int)?;
        Term::app(&symbol, vec![operand])
    }

    pub fn int_less(&self, lhs: Term, rhs: Term) -> Result<Formula> {
        self.int_comparison(INT_LESS, lhs, rhs)
    }

    pub fn int_less_eq(&self, lhs: Term, rhs: Term) -> Result<Formula> {
        self.int_comparison(INT_LESS_EQ, lhs, rhs)
    }

    pub fn int_greater(&self, lhs: Term, rhs: Term) -> Result<Formula> {
        self.int_comparison(INT_GREATER, lhs, rhs)
    }

    pub fn int_greater_eq(&self, lhs: Term, rhs: Term) -> Result<Formula> {
        self.int_comparison(INT_GREATER_EQ, lhs, rhs)
    }

    pub fn bool_true(&self) -> Result<Formula> {
        let symbol = self.interpreted(BOOL_TRUE, Vec::new(), self.registry.bool_sort())?;
        Formula::predicate(&symbol, Vec::new())
    }

    pub fn bool_false(&self) -> Result<Formula> {
        let symbol = self.interpreted(BOOL_FALSE, Vec::new(), self.registry.bool_sort())?;
        Formula::predicate(&symbol, Vec::new())
    }

    pub fn time_zero(&self) -> Result<Term> {
        let symbol = self.interpreted(TIME_ZERO, Vec::new(), self.registry.time_sort())?;
        Term::constant(&symbol)
    }

    pub fn time_succ(&self, t: Term) -> Result<Term> {
        let time = self.registry.time_sort();
        let symbol = self.interpreted(TIME_SUCC, vec![Arc::clone(&time)], time)?;
        Term::app(&symbol, vec![t])
    }

    pub fn time_pre(&self, t: Term) -> Result<Term> {
        let time = self.registry.time_sort();
        let symbol = self.interpreted(TIME_PRE, vec![Arc::clone(&time)], time)?;
        Term::app(&symbol, vec![t])
    }

    /// `lhs < rhs` in the iteration order: `lhs` is reached from `rhs` by
    /// one or more predecessor steps.
    pub fn nat_sub(&self, lhs: Term, rhs: Term) -> Result<Formula> {
        let time = self.registry.time_sort();
        let symbol = self.interpreted(
            TIME_SUB,
            vec![Arc::clone(&time), time],
            self.registry.bool_sort(),
        )?;
        Formula::predicate(&symbol, vec![lhs, rhs])
    }
}
