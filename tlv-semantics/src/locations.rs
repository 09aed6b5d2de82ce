#![forbid(unsafe_code)]

//! A conservative location pass.
//!
//! Assigns start and end time-points to every statement and reports every
//! declared variable of a function as active at every one of its locations.
//! The result over-approximates what a liveness analysis would compute, so
//! frame conditions come out larger but stay sound.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tlv_logic::Term;
use tlv_program::{Function, Program, Statement, StmtId, Variable};
use tracing::debug;

use crate::encoding::Encoding;
use crate::error::Result;

pub type TimePointMap = BTreeMap<StmtId, Term>;
pub type ActiveVarMap = BTreeMap<String, BTreeSet<Arc<Variable>>>;

/// Time-points and active variables for a whole program.
#[derive(Clone, Debug, Default)]
pub struct ProgramAnnotations {
    pub start_time_points: TimePointMap,
    pub end_time_points: TimePointMap,
    /// Keyed by the name of a time-point's location symbol.
    pub active_vars: ActiveVarMap,
    /// Time-point reached after the last statement of each function.
    pub function_ends: BTreeMap<String, Term>,
}

impl ProgramAnnotations {
    pub fn start(&self, id: StmtId) -> Option<&Term> {
        self.start_time_points.get(&id)
    }

    pub fn end(&self, id: StmtId) -> Option<&Term> {
        self.end_time_points.get(&id)
    }
}

struct Annotator<'a, 'r> {
    encoding: &'a Encoding<'r>,
    vars: BTreeSet<Arc<Variable>>,
    out: &'a mut ProgramAnnotations,
}

impl Annotator<'_, '_> {
    fn mark_active(&mut self, tp: &Term) {
        self.out
            .active_vars
            .insert(tp.symbol().name.clone(), self.vars.clone());
    }

    fn location(&mut self, name: &str, enclosing: &[String]) -> Result<Term> {
        let symbol = self.encoding.location_symbol(name, enclosing.len())?;
        let tp = Term::app(&symbol, self.encoding.iterator_terms(enclosing))?;
        self.mark_active(&tp);
        Ok(tp)
    }

    fn start_of(&mut self, stmt: &Statement, enclosing: &[String]) -> Result<Term> {
        match stmt {
            Statement::While(w) => {
                let symbol = self.encoding.loop_location_symbol(w)?;
                let mut args = self.encoding.iterator_terms(enclosing);
                args.push(self.encoding.theory().time_zero()?);
                let tp = Term::app(&symbol, args)?;
                self.mark_active(&tp);
                Ok(tp)
            }
            _ => self.location(stmt.location(), enclosing),
        }
    }

    fn block(&mut self, stmts: &[Statement], block_end: &Term, enclosing: &[String]) -> Result<()> {
        let starts = stmts
            .iter()
            .map(|s| self.start_of(s, enclosing))
            .collect::<Result<Vec<_>>>()?;

        for (i, stmt) in stmts.iter().enumerate() {
            let end = starts.get(i + 1).unwrap_or(block_end).clone();
            self.out.start_time_points.insert(stmt.id(), starts[i].clone());
            self.out.end_time_points.insert(stmt.id(), end);
            self.nested(stmt, enclosing)?;
        }
        Ok(())
    }

    fn nested(&mut self, stmt: &Statement, enclosing: &[String]) -> Result<()> {
        match stmt {
            Statement::IfElse(ite) => {
                let left_end = self.location(&format!("{}_left_end", ite.location), enclosing)?;
                let right_end = self.location(&format!("{}_right_end", ite.location), enclosing)?;
                self.block(&ite.then_branch, &left_end, enclosing)?;
                self.block(&ite.else_branch, &right_end, enclosing)
            }
            Statement::While(w) => {
                let symbol = self.encoding.loop_location_symbol(w)?;
                let mut args = self.encoding.iterator_terms(enclosing);
                let it = self.encoding.iterator_term(&w.location);
                args.push(self.encoding.theory().time_succ(it)?);
                let next_iteration = Term::app(&symbol, args)?;

                let mut inner = enclosing.to_vec();
                inner.push(w.location.clone());
                self.block(&w.body, &next_iteration, &inner)
            }
            Statement::IntAssignment(_) | Statement::Skip(_) => Ok(()),
        }
    }

    fn function(&mut self, function: &Function) -> Result<Term> {
        self.vars = function.variables.iter().cloned().collect();
        let end = self.location(&format!("{}_end", function.name), &[])?;
        self.block(&function.statements, &end, &[])?;
        Ok(end)
    }
}

/// Runs the location pass over every function of `program`.
pub fn annotate(program: &Program, encoding: &Encoding<'_>) -> Result<ProgramAnnotations> {
    let mut out = ProgramAnnotations::default();
    for function in &program.functions {
        let mut annotator = Annotator {
            encoding,
            vars: BTreeSet::new(),
            out: &mut out,
        };
        let end = annotator.function(function)?;
        out.function_ends.insert(function.name.clone(), end);
    }
    debug!(
        statements = out.start_time_points.len(),
        locations = out.active_vars.len(),
        "assigned time-points"
    );
    Ok(out)
}
