#![forbid(unsafe_code)]

//! Program entities consumed by the semantics generator.
//!
//! The tree is built once by a front-end and then only read. Every statement
//! carries a [`StmtId`] (the key for time-point maps) and a location label
//! such as `l7` that names its location symbol and appears in diagnostics.

use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(pub u32);

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An integer program variable, either scalar or array.
///
/// Ordering and equality are structural with the name first, so sets of
/// variables iterate in name order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    pub name: String,
    pub is_constant: bool,
    pub is_array: bool,
}

impl Variable {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_constant: false,
            is_array: false,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_constant: false,
            is_array: true,
        }
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntExpr {
    Constant(i64),
    Variable(Arc<Variable>),
    ArrayRead {
        array: Arc<Variable>,
        index: Box<IntExpr>,
    },
    Add(Box<IntExpr>, Box<IntExpr>),
    Sub(Box<IntExpr>, Box<IntExpr>),
    Mul(Box<IntExpr>, Box<IntExpr>),
    Neg(Box<IntExpr>),
}

impl IntExpr {
    pub fn var(v: &Arc<Variable>) -> Self {
        IntExpr::Variable(Arc::clone(v))
    }

    pub fn read(array: &Arc<Variable>, index: IntExpr) -> Self {
        IntExpr::ArrayRead {
            array: Arc::clone(array),
            index: Box::new(index),
        }
    }

    pub fn add(lhs: IntExpr, rhs: IntExpr) -> Self {
        IntExpr::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: IntExpr, rhs: IntExpr) -> Self {
        IntExpr::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: IntExpr, rhs: IntExpr) -> Self {
        IntExpr::Mul(Box::new(lhs), Box::new(rhs))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoolExpr {
    Constant(bool),
    Compare {
        op: CmpOp,
        lhs: IntExpr,
        rhs: IntExpr,
    },
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Not(Box<BoolExpr>),
}

impl BoolExpr {
    pub fn cmp(op: CmpOp, lhs: IntExpr, rhs: IntExpr) -> Self {
        BoolExpr::Compare { op, lhs, rhs }
    }

    pub fn not(inner: BoolExpr) -> Self {
        BoolExpr::Not(Box::new(inner))
    }
}

/// Left-hand side of an assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignTarget {
    Variable(Arc<Variable>),
    ArrayElement {
        array: Arc<Variable>,
        index: IntExpr,
    },
}

impl AssignTarget {
    /// The variable whose value the assignment changes.
    pub fn variable(&self) -> &Arc<Variable> {
        match self {
            AssignTarget::Variable(v) => v,
            AssignTarget::ArrayElement { array, .. } => array,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntAssignment {
    pub id: StmtId,
    pub location: String,
    pub lhs: AssignTarget,
    pub rhs: IntExpr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfElse {
    pub id: StmtId,
    pub location: String,
    pub condition: BoolExpr,
    pub then_branch: Vec<Statement>,
    pub else_branch: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhileStatement {
    pub id: StmtId,
    pub location: String,
    pub condition: BoolExpr,
    pub body: Vec<Statement>,
    /// Locations of the loops enclosing this one, outermost first.
    pub enclosing_loops: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipStatement {
    pub id: StmtId,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    IntAssignment(IntAssignment),
    IfElse(IfElse),
    While(WhileStatement),
    Skip(SkipStatement),
}

impl Statement {
    pub fn id(&self) -> StmtId {
        match self {
            Statement::IntAssignment(s) => s.id,
            Statement::IfElse(s) => s.id,
            Statement::While(s) => s.id,
            Statement::Skip(s) => s.id,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Statement::IntAssignment(s) => &s.location,
            Statement::IfElse(s) => &s.location,
            Statement::While(s) => &s.location,
            Statement::Skip(s) => &s.location,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::IntAssignment(_) => "assignment",
            Statement::IfElse(_) => "if-else",
            Statement::While(_) => "while",
            Statement::Skip(_) => "skip",
        }
    }

    /// Pre-order walk over this statement and everything nested in it.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Statement)) {
        f(self);
        match self {
            Statement::IfElse(s) => {
                for stmt in s.then_branch.iter().chain(&s.else_branch) {
                    stmt.visit(f);
                }
            }
            Statement::While(s) => {
                for stmt in &s.body {
                    stmt.visit(f);
                }
            }
            Statement::IntAssignment(_) | Statement::Skip(_) => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub variables: Vec<Arc<Variable>>,
    pub statements: Vec<Statement>,
    pub postcondition: Option<BoolExpr>,
}

impl Function {
    /// All statements of the function, nested ones included, in pre-order.
    pub fn all_statements(&self) -> Vec<&Statement> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            stmt.visit(&mut |s| out.push(s));
        }
        out
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}
