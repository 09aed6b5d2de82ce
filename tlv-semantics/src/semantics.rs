#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace};

use tlv_logic::{Formula, Registry, Term};
use tlv_program::{
    AssignTarget, Function, IfElse, IntAssignment, Program, SkipStatement, Statement, StmtId,
    Variable, WhileStatement,
};

use crate::encoding::Encoding;
use crate::error::{Result, SemanticsError};
use crate::locations::{ActiveVarMap, ProgramAnnotations, TimePointMap};

/// Compositional translation of a program into trace-logic axioms.
pub struct Semantics<'a> {
    program: &'a Program,
    encoding: Encoding<'a>,
    start_time_points: &'a TimePointMap,
    end_time_points: &'a TimePointMap,
    active_vars: &'a ActiveVarMap,
}

fn intersection<'s>(
    a: &'s BTreeSet<Arc<Variable>>,
    b: &'s BTreeSet<Arc<Variable>>,
) -> Vec<&'s Arc<Variable>> {
    a.intersection(b).collect()
}

fn first<'s>(stmts: &'s [Statement], block: &'static str, location: &str) -> Result<&'s Statement> {
    stmts.first().ok_or_else(|| SemanticsError::EmptyBlock {
        block,
        location: location.to_string(),
    })
}

fn last<'s>(stmts: &'s [Statement], block: &'static str, location: &str) -> Result<&'s Statement> {
    stmts.last().ok_or_else(|| SemanticsError::EmptyBlock {
        block,
        location: location.to_string(),
    })
}

impl<'a> Semantics<'a> {
    pub fn new(
        program: &'a Program,
        registry: &'a Registry,
        annotations: &'a ProgramAnnotations,
        two_traces: bool,
    ) -> Self {
        Self::from_maps(
            program,
            registry,
            &annotations.start_time_points,
            &annotations.end_time_points,
            &annotations.active_vars,
            two_traces,
        )
    }

    /// Builds a generator over time-point and active-variable maps supplied
    /// by an external location pass.
    pub fn from_maps(
        program: &'a Program,
        registry: &'a Registry,
        start_time_points: &'a TimePointMap,
        end_time_points: &'a TimePointMap,
        active_vars: &'a ActiveVarMap,
        two_traces: bool,
    ) -> Self {
        Self {
            program,
            encoding: Encoding::new(registry, two_traces),
            start_time_points,
            end_time_points,
            active_vars,
        }
    }

    pub fn encoding(&self) -> &Encoding<'a> {
        &self.encoding
    }

    /// Declares every free symbol generation will touch, in program order,
    /// so the declaration order does not depend on generation order.
    pub fn declare_program_symbols(&self) -> Result<()> {
        for function in &self.program.functions {
            for var in &function.variables {
                self.encoding.variable_symbol(var)?;
            }
            for stmt in function.all_statements() {
                if let Statement::While(w) = stmt {
                    self.encoding.loop_location_symbol(w)?;
                    self.encoding.last_iteration_symbol(w)?;
                }
            }
        }
        Ok(())
    }

    /// One formula per function, in program order.
    pub fn generate(&self) -> Result<Vec<Formula>> {
        self.declare_program_symbols()?;
        self.program
            .functions
            .iter()
            .map(|f| self.function(f))
            .collect()
    }

    /// Same result as [`Semantics::generate`], with functions translated on
    /// the rayon pool.
    pub fn generate_parallel(&self) -> Result<Vec<Formula>> {
        self.declare_program_symbols()?;
        self.program
            .functions
            .par_iter()
            .map(|f| self.function(f))
            .collect()
    }

    fn function(&self, function: &Function) -> Result<Formula> {
        debug!(
            function = %function.name,
            statements = function.statements.len(),
            "generating semantics"
        );
        let mut conjuncts = Vec::with_capacity(function.statements.len());
        for stmt in &function.statements {
            let semantics = self.statement(stmt)?;
            match self.encoding.trace_symbol() {
                Some(tr) => conjuncts.push(Formula::universal(vec![Arc::clone(tr)], semantics)?),
                None => conjuncts.push(semantics),
            }
        }
        let formula = Formula::conjunction(conjuncts)
            .with_label(format!("Semantics of function {}", function.name));
        debug_assert!(!formula.has_name_capture());
        Ok(formula)
    }

    pub fn statement(&self, stmt: &Statement) -> Result<Formula> {
        trace!(kind = stmt.kind_name(), location = stmt.location(), "statement");
        match stmt {
            Statement::IntAssignment(a) => self.int_assignment(a),
            Statement::IfElse(ite) => self.if_else(ite),
            Statement::While(w) => self.while_statement(w),
            Statement::Skip(s) => self.skip(s),
        }
    }

    fn start(&self, id: StmtId, location: &str) -> Result<&'a Term> {
        self.start_time_points
            .get(&id)
            .ok_or_else(|| SemanticsError::MissingTimePoint {
                which: "start",
                id,
                location: location.to_string(),
            })
    }

    fn end(&self, id: StmtId, location: &str) -> Result<&'a Term> {
        self.end_time_points
            .get(&id)
            .ok_or_else(|| SemanticsError::MissingTimePoint {
                which: "end",
                id,
                location: location.to_string(),
            })
    }

    fn active(&self, tp: &Term) -> Result<&'a BTreeSet<Arc<Variable>>> {
        let name = &tp.symbol().name;
        self.active_vars
            .get(name)
            .ok_or_else(|| SemanticsError::MissingActiveVarSet(name.clone()))
    }

    /// `var(lhs) = var(rhs)`, or `forall pos. var(lhs, pos) = var(rhs, pos)`
    /// for arrays.
    fn same_value(&self, var: &Variable, lhs: &Term, rhs: &Term) -> Result<Formula> {
        let enc = &self.encoding;
        if !var.is_array {
            return Ok(Formula::equality(enc.value_at(var, lhs)?, enc.value_at(var, rhs)?)?);
        }
        let pos_symbol = enc.position_symbol();
        let pos = Term::var(pos_symbol);
        let eq = Formula::equality(
            enc.array_value_at(var, lhs, pos.clone())?,
            enc.array_value_at(var, rhs, pos)?,
        )?;
        Ok(Formula::universal(vec![Arc::clone(pos_symbol)], eq)?)
    }

    fn int_assignment(&self, a: &IntAssignment) -> Result<Formula> {
        let enc = &self.encoding;
        let l1 = self.start(a.id, &a.location)?;
        let l2 = self.end(a.id, &a.location)?;
        let active = intersection(self.active(l1)?, self.active(l2)?);
        let written = a.lhs.variable();

        let mut conjuncts = Vec::new();
        let label = match &a.lhs {
            AssignTarget::Variable(var) => {
                // x(l2) = rhs(l1)
                conjuncts.push(Formula::equality(
                    enc.value_at(var, l2)?,
                    enc.int_term(&a.rhs, l1)?,
                )?);
                format!("Update variable {} at location {}", var.name, a.location)
            }
            AssignTarget::ArrayElement { array, index } => {
                let index = enc.int_term(index, l1)?;

                // a(l2, e(l1)) = rhs(l1)
                conjuncts.push(Formula::equality(
                    enc.array_value_at(array, l2, index.clone())?,
                    enc.int_term(&a.rhs, l1)?,
                )?);

                // forall pos. pos != e(l1) => a(l2, pos) = a(l1, pos)
                let pos_symbol = enc.position_symbol();
                let pos = Term::var(pos_symbol);
                let untouched = Formula::implication(
                    Formula::disequality(pos.clone(), index)?,
                    Formula::equality(
                        enc.array_value_at(array, l2, pos.clone())?,
                        enc.array_value_at(array, l1, pos)?,
                    )?,
                );
                conjuncts.push(Formula::universal(vec![Arc::clone(pos_symbol)], untouched)?);
                format!("Update array variable {} at location {}", array.name, a.location)
            }
        };

        for var in active {
            if var.is_constant || var.name == written.name {
                continue;
            }
            conjuncts.push(self.same_value(var, l2, l1)?);
        }

        Ok(Formula::conjunction(conjuncts).with_label(label))
    }

    fn if_else(&self, ite: &IfElse) -> Result<Formula> {
        let loc = ite.location.as_str();
        let l_start = self.start(ite.id, loc)?;
        let l_end = self.end(ite.id, loc)?;

        let then_first = first(&ite.then_branch, "then-branch", loc)?;
        let else_first = first(&ite.else_branch, "else-branch", loc)?;
        let then_last = last(&ite.then_branch, "then-branch", loc)?;
        let else_last = last(&ite.else_branch, "else-branch", loc)?;

        let l_left_start = self.start(then_first.id(), then_first.location())?;
        let l_right_start = self.start(else_first.id(), else_first.location())?;
        let l_left_end = self.end(then_last.id(), then_last.location())?;
        let l_right_end = self.end(else_last.id(), else_last.location())?;

        let mut conjuncts = Vec::new();

        // Entering a branch changes nothing. Variables active at the start
        // of the if-statement are active at both branch starts.
        let entry_vars = self.active(l_start)?;
        let mut entry = Vec::new();
        for branch_start in [l_left_start, l_right_start] {
            for var in entry_vars.iter().filter(|v| !v.is_constant) {
                entry.push(self.same_value(var, branch_start, l_start)?);
            }
        }
        conjuncts.push(
            Formula::conjunction(entry)
                .with_label("Entering either branch leaves all values unchanged"),
        );

        // The condition, evaluated at the start, selects which branch end
        // provides the values after the if-statement.
        let condition = self.encoding.bool_formula(&ite.condition, l_start)?;
        let end_vars = self.active(l_end)?;
        let mut merge = Vec::new();
        for var in intersection(self.active(l_left_end)?, end_vars) {
            if !var.is_constant {
                merge.push(Formula::implication(
                    condition.clone(),
                    self.same_value(var, l_end, l_left_end)?,
                ));
            }
        }
        for var in intersection(self.active(l_right_end)?, end_vars) {
            if !var.is_constant {
                merge.push(Formula::implication(
                    Formula::negation(condition.clone()),
                    self.same_value(var, l_end, l_right_end)?,
                ));
            }
        }
        conjuncts.push(
            Formula::conjunction(merge)
                .with_label("The branch condition selects the values after the if-statement"),
        );

        for stmt in ite.then_branch.iter().chain(&ite.else_branch) {
            conjuncts.push(self.statement(stmt)?);
        }

        Ok(Formula::conjunction(conjuncts)
            .with_label(format!("Semantics of if-else at location {loc}")))
    }

    fn while_statement(&self, w: &WhileStatement) -> Result<Formula> {
        let enc = &self.encoding;
        let loc = w.location.as_str();

        let it_symbol = enc.iterator_symbol(loc);
        let it = Term::var(&it_symbol);
        let n = enc.last_iteration_term(w)?;

        let loop_symbol = enc.loop_location_symbol(w)?;
        let mut it_args = enc.iterator_terms(&w.enclosing_loops);
        let mut n_args = it_args.clone();
        it_args.push(it.clone());
        n_args.push(n.clone());
        let l_start_it = Term::app(&loop_symbol, it_args)?;
        let l_start_n = Term::app(&loop_symbol, n_args)?;

        let l_start = self.start(w.id, loc)?;
        let l_end = self.end(w.id, loc)?;
        let body_first = first(&w.body, "loop body", loc)?;
        let l_body_start = self.start(body_first.id(), body_first.location())?;

        let loop_vars = self.active(l_start)?;
        let mut conjuncts = Vec::new();

        // forall i. v(lBodyStart) = v(l(i))
        let mut entry = Vec::new();
        for var in loop_vars.iter().filter(|v| !v.is_constant) {
            entry.push(self.same_value(var, l_body_start, &l_start_it)?);
        }
        conjuncts.push(
            Formula::universal(vec![Arc::clone(&it_symbol)], Formula::conjunction(entry))?
                .with_label("Entering the loop body leaves all values unchanged"),
        );

        // One generic iteration, for every i.
        let body = w
            .body
            .iter()
            .map(|s| self.statement(s))
            .collect::<Result<Vec<_>>>()?;
        conjuncts.push(
            Formula::universal(vec![Arc::clone(&it_symbol)], Formula::conjunction(body))?
                .with_label("Semantics of the loop body"),
        );

        // forall i. i < n => c(l(i))
        let before_last = Formula::implication(
            enc.theory().nat_sub(it, n)?,
            enc.bool_formula(&w.condition, &l_start_it)?,
        );
        conjuncts.push(
            Formula::universal(vec![Arc::clone(&it_symbol)], before_last)?
                .with_label("The loop condition holds before the last iteration"),
        );

        // not c(l(n))
        conjuncts.push(
            Formula::negation(enc.bool_formula(&w.condition, &l_start_n)?)
                .with_label("The loop condition fails in the last iteration"),
        );

        // v(lEnd) = v(l(n))
        let mut exit = Vec::new();
        for var in loop_vars.iter().filter(|v| !v.is_constant) {
            exit.push(self.same_value(var, l_end, &l_start_n)?);
        }
        conjuncts.push(
            Formula::conjunction(exit)
                .with_label("Values after the loop are the values of the last iteration"),
        );

        Ok(Formula::conjunction(conjuncts).with_label(format!("Loop at location {loc}")))
    }

    fn skip(&self, s: &SkipStatement) -> Result<Formula> {
        let start = self.start(s.id, &s.location)?;
        let end = self.end(s.id, &s.location)?;
        Ok(Formula::equality(start.clone(), end.clone())?
            .with_label(format!("Skip at location {}", s.location)))
    }
}
