#![forbid(unsafe_code)]

//! How program entities become symbols and terms.
//!
//! A non-constant variable `x` is a function of time, `x(tp)`; arrays take
//! the position as a second argument, `a(tp, pos)`. Constants drop the time
//! argument. In two-trace mode every value function and every
//! last-iteration function takes a trailing `Trace` argument, bound by the
//! `tr` quantifier around each top-level statement.

use std::sync::Arc;

use tlv_logic::{Formula, LogicError, Registry, Symbol, Term, Theory};
use tlv_program::{BoolExpr, CmpOp, IntExpr, Variable, WhileStatement};

type Result<T> = std::result::Result<T, LogicError>;

pub const POSITION_VAR: &str = "pos";
pub const TRACE_VAR: &str = "tr";
pub const ITERATOR_PREFIX: &str = "It_";
pub const LAST_ITERATION_PREFIX: &str = "n_";

pub struct Encoding<'r> {
    registry: &'r Registry,
    theory: Theory<'r>,
    trace: Option<Arc<Symbol>>,
    position: Arc<Symbol>,
}

impl<'r> Encoding<'r> {
    pub fn new(registry: &'r Registry, two_traces: bool) -> Self {
        let trace = two_traces.then(|| Symbol::variable(TRACE_VAR, registry.trace_sort()));
        Self {
            registry,
            theory: Theory::new(registry),
            trace,
            position: Symbol::variable(POSITION_VAR, registry.int_sort()),
        }
    }

    pub fn theory(&self) -> &Theory<'r> {
        &self.theory
    }

    pub fn two_traces(&self) -> bool {
        self.trace.is_some()
    }

    /// The bound trace variable, present only in two-trace mode.
    pub fn trace_symbol(&self) -> Option<&Arc<Symbol>> {
        self.trace.as_ref()
    }

    /// The bound position variable used by every array frame condition.
    pub fn position_symbol(&self) -> &Arc<Symbol> {
        &self.position
    }

    fn push_trace(&self, args: &mut Vec<Term>) {
        if let Some(tr) = &self.trace {
            args.push(Term::var(tr));
        }
    }

    pub fn variable_symbol(&self, var: &Variable) -> Result<Arc<Symbol>> {
        let mut domain = Vec::new();
        if !var.is_constant {
            domain.push(self.registry.time_sort());
        }
        if var.is_array {
            domain.push(self.registry.int_sort());
        }
        if self.two_traces() {
            domain.push(self.registry.trace_sort());
        }
        self.registry
            .fetch_or_declare_symbol(&var.name, domain, self.registry.int_sort(), false)
    }

    /// Value of a scalar variable at `tp`.
    pub fn value_at(&self, var: &Variable, tp: &Term) -> Result<Term> {
        let symbol = self.variable_symbol(var)?;
        let mut args = Vec::new();
        if !var.is_constant {
            args.push(tp.clone());
        }
        self.push_trace(&mut args);
        Term::app(&symbol, args)
    }

    /// Value of array `var` at position `index` and time-point `tp`.
    pub fn array_value_at(&self, var: &Variable, tp: &Term, index: Term) -> Result<Term> {
        let symbol = self.variable_symbol(var)?;
        let mut args = Vec::new();
        if !var.is_constant {
            args.push(tp.clone());
        }
        args.push(index);
        self.push_trace(&mut args);
        Term::app(&symbol, args)
    }

    /// Location symbol of a statement nested in `enclosing_loops` loops.
    pub fn location_symbol(&self, location: &str, enclosing_loops: usize) -> Result<Arc<Symbol>> {
        let time = self.registry.time_sort();
        let domain = vec![Arc::clone(&time); enclosing_loops];
        self.registry.fetch_or_declare_symbol(location, domain, time, false)
    }

    /// Location symbol of a loop head: one iteration argument per enclosing
    /// loop plus one for the loop itself.
    pub fn loop_location_symbol(&self, w: &WhileStatement) -> Result<Arc<Symbol>> {
        self.location_symbol(&w.location, w.enclosing_loops.len() + 1)
    }

    pub fn iterator_symbol(&self, loop_location: &str) -> Arc<Symbol> {
        Symbol::variable(format!("{ITERATOR_PREFIX}{loop_location}"), self.registry.time_sort())
    }

    pub fn iterator_term(&self, loop_location: &str) -> Term {
        Term::var(&self.iterator_symbol(loop_location))
    }

    /// Iterator terms of the given loops, in the given order.
    pub fn iterator_terms(&self, loops: &[String]) -> Vec<Term> {
        loops.iter().map(|l| self.iterator_term(l)).collect()
    }

    pub fn last_iteration_symbol(&self, w: &WhileStatement) -> Result<Arc<Symbol>> {
        let time = self.registry.time_sort();
        let mut domain = vec![Arc::clone(&time); w.enclosing_loops.len()];
        if self.two_traces() {
            domain.push(self.registry.trace_sort());
        }
        let name = format!("{LAST_ITERATION_PREFIX}{}", w.location);
        self.registry.fetch_or_declare_symbol(&name, domain, time, false)
    }

    /// The iteration in which the loop condition first fails, one per
    /// iteration of every enclosing loop and, in two-trace mode, per trace.
    pub fn last_iteration_term(&self, w: &WhileStatement) -> Result<Term> {
        let symbol = self.last_iteration_symbol(w)?;
        let mut args = self.iterator_terms(&w.enclosing_loops);
        self.push_trace(&mut args);
        Term::app(&symbol, args)
    }

    pub fn int_term(&self, expr: &IntExpr, tp: &Term) -> Result<Term> {
        let th = &self.theory;
        match expr {
            IntExpr::Constant(n) => th.int_constant(*n),
            IntExpr::Variable(var) => self.value_at(var, tp),
            IntExpr::ArrayRead { array, index } => {
                let index = self.int_term(index, tp)?;
                self.array_value_at(array, tp, index)
            }
            IntExpr::Add(lhs, rhs) => th.int_add(self.int_term(lhs, tp)?, self.int_term(rhs, tp)?),
            IntExpr::Sub(lhs, rhs) => th.int_sub(self.int_term(lhs, tp)?, self.int_term(rhs, tp)?),
            IntExpr::Mul(lhs, rhs) => th.int_mul(self.int_term(lhs, tp)?, self.int_term(rhs, tp)?),
            IntExpr::Neg(operand) => th.int_neg(self.int_term(operand, tp)?),
        }
    }

    pub fn bool_formula(&self, expr: &BoolExpr, tp: &Term) -> Result<Formula> {
        let th = &self.theory;
        match expr {
            BoolExpr::Constant(true) => th.bool_true(),
            BoolExpr::Constant(false) => th.bool_false(),
            BoolExpr::Compare { op, lhs, rhs } => {
                let lhs = self.int_term(lhs, tp)?;
                let rhs = self.int_term(rhs, tp)?;
                match op {
                    CmpOp::Lt => th.int_less(lhs, rhs),
                    CmpOp::Le => th.int_less_eq(lhs, rhs),
                    CmpOp::Gt => th.int_greater(lhs, rhs),
                    CmpOp::Ge => th.int_greater_eq(lhs, rhs),
                    CmpOp::Eq => Formula::equality(lhs, rhs),
                    CmpOp::Ne => Formula::disequality(lhs, rhs),
                }
            }
            BoolExpr::And(parts) => Ok(Formula::conjunction(
                parts
                    .iter()
                    .map(|p| self.bool_formula(p, tp))
                    .collect::<Result<Vec<_>>>()?,
            )),
            BoolExpr::Or(parts) => Ok(Formula::disjunction(
                parts
                    .iter()
                    .map(|p| self.bool_formula(p, tp))
                    .collect::<Result<Vec<_>>>()?,
            )),
            BoolExpr::Not(inner) => Ok(Formula::negation(self.bool_formula(inner, tp)?)),
        }
    }
}
