#![allow(dead_code)]

use std::sync::Arc;

use tlv_logic::{Formula, FormulaKind, Problem, Registry};
use tlv_program::{
    AssignTarget, BoolExpr, Function, IfElse, IntAssignment, IntExpr, Program, SkipStatement,
    Statement, StmtId, Variable, WhileStatement,
};
use tlv_semantics::{annotate, Encoding, Semantics};

/// Hands out ids and `l<n>` locations in pre-order and tracks loop nesting.
#[derive(Default)]
pub struct Builder {
    next: u32,
    loops: Vec<String>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh(&mut self) -> (StmtId, String) {
        self.next += 1;
        (StmtId(self.next), format!("l{}", self.next))
    }

    pub fn assign(&mut self, var: &Arc<Variable>, rhs: IntExpr) -> Statement {
        let (id, location) = self.fresh();
        Statement::IntAssignment(IntAssignment {
            id,
            location,
            lhs: AssignTarget::Variable(Arc::clone(var)),
            rhs,
        })
    }

    pub fn assign_element(
        &mut self,
        array: &Arc<Variable>,
        index: IntExpr,
        rhs: IntExpr,
    ) -> Statement {
        let (id, location) = self.fresh();
        Statement::IntAssignment(IntAssignment {
            id,
            location,
            lhs: AssignTarget::ArrayElement {
                array: Arc::clone(array),
                index,
            },
            rhs,
        })
    }

    pub fn skip(&mut self) -> Statement {
        let (id, location) = self.fresh();
        Statement::Skip(SkipStatement { id, location })
    }

    pub fn if_else(
        &mut self,
        condition: BoolExpr,
        then_branch: impl FnOnce(&mut Builder) -> Vec<Statement>,
        else_branch: impl FnOnce(&mut Builder) -> Vec<Statement>,
    ) -> Statement {
        let (id, location) = self.fresh();
        let then_branch = then_branch(self);
        let else_branch = else_branch(self);
        Statement::IfElse(IfElse {
            id,
            location,
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn while_loop(
        &mut self,
        condition: BoolExpr,
        body: impl FnOnce(&mut Builder) -> Vec<Statement>,
    ) -> Statement {
        let (id, location) = self.fresh();
        let enclosing_loops = self.loops.clone();
        self.loops.push(location.clone());
        let body = body(self);
        self.loops.pop();
        Statement::While(WhileStatement {
            id,
            location,
            condition,
            body,
            enclosing_loops,
        })
    }
}

pub fn program(vars: &[&Arc<Variable>], statements: Vec<Statement>) -> Program {
    Program {
        functions: vec![Function {
            name: "main".to_string(),
            variables: vars.iter().map(|v| Arc::clone(v)).collect(),
            statements,
            postcondition: None,
        }],
    }
}

pub fn generate(program: &Program, two_traces: bool) -> (Registry, Vec<Formula>) {
    let registry = Registry::new();
    let formulas = {
        let encoding = Encoding::new(&registry, two_traces);
        let annotations = annotate(program, &encoding).expect("location pass");
        Semantics::new(program, &registry, &annotations, two_traces)
            .generate()
            .expect("semantics")
    };
    (registry, formulas)
}

pub fn serialize(registry: &Registry, formulas: Vec<Formula>) -> String {
    let mut problem = Problem::new();
    problem.add_axioms(formulas);
    problem.set_conjecture(Formula::conjunction(Vec::new()));
    problem.to_smtlib(registry).expect("serialize")
}

pub fn conjuncts(f: &Formula) -> &[Formula] {
    match f.kind() {
        FormulaKind::Conjunction(parts) => parts,
        other => panic!("expected a conjunction, got {other:?}"),
    }
}

/// Formula of the `i`-th top-level statement of the only function.
pub fn statement_formula(formulas: &[Formula], i: usize) -> &Formula {
    &conjuncts(&formulas[0])[i]
}

/// Every sub-formula rendered on a single line, for substring checks that
/// ignore layout and labels.
pub fn flat(f: &Formula) -> String {
    f.to_smtlib(0)
        .lines()
        .filter(|l| !l.trim_start().starts_with(';'))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .replace("( ", "(")
        .replace(" )", ")")
}
