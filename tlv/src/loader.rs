#![forbid(unsafe_code)]
#![allow(unused_assignments)]

//! JSON program descriptions.
//!
//! The raw serde types mirror the file format; [`Resolver`] turns them into
//! the program model, binding variable names, numbering statements `#1, #2,
//! ...` and labelling them `l1, l2, ...` in pre-order across the whole
//! program.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use tlv_program::{
    AssignTarget, BoolExpr, CmpOp, Function, IfElse, IntAssignment, IntExpr, Program,
    SkipStatement, Statement, StmtId, Variable, WhileStatement,
};
use tlv_semantics::naming::{check_function_name, check_variable_name, NameClash};

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("failed to read {path}: {message}")]
    #[diagnostic(code(tlv::load::io))]
    Io { path: String, message: String },

    #[error("invalid program description: {message}")]
    #[diagnostic(code(tlv::load::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("function `{function}` uses undeclared variable `{name}`")]
    #[diagnostic(
        code(tlv::load::unknown_variable),
        help("declare it in the function's `variables` list")
    )]
    UnknownVariable { function: String, name: String },

    #[error("function `{function}` declares variable `{name}` twice")]
    #[diagnostic(code(tlv::load::duplicate_variable))]
    DuplicateVariable { function: String, name: String },

    #[error("function `{0}` is defined twice")]
    #[diagnostic(code(tlv::load::duplicate_function))]
    DuplicateFunction(String),

    #[error("function `{function}` uses `{name}` as {used}, but it is declared as {declared}")]
    #[diagnostic(code(tlv::load::shape_mismatch))]
    ShapeMismatch {
        function: String,
        name: String,
        used: &'static str,
        declared: &'static str,
    },

    #[error("function `{function}` assigns to constant `{name}`")]
    #[diagnostic(code(tlv::load::assign_to_constant))]
    AssignToConstant { function: String, name: String },

    #[error("`{name}` in function `{function}` is not a valid identifier")]
    #[diagnostic(
        code(tlv::load::invalid_identifier),
        help("identifiers are letters, digits and `_`, and do not start with a digit")
    )]
    InvalidIdentifier { function: String, name: String },

    #[error("`{name}` in function `{function}` is reserved as {role}")]
    #[diagnostic(code(tlv::load::reserved_name), help("rename it"))]
    ReservedName {
        function: String,
        name: String,
        role: &'static str,
    },
}

impl LoadError {
    fn name_clash(function: &str, name: &str, clash: NameClash) -> Self {
        let (function, name) = (function.to_string(), name.to_string());
        match clash {
            NameClash::NotASymbol => LoadError::InvalidIdentifier { function, name },
            NameClash::Reserved(role) => LoadError::ReservedName {
                function,
                name,
                role,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgram {
    functions: Vec<RawFunction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFunction {
    name: String,
    #[serde(default)]
    variables: Vec<RawVariable>,
    #[serde(default)]
    statements: Vec<RawStatement>,
    #[serde(default)]
    postcondition: Option<RawBool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVariable {
    name: String,
    #[serde(default)]
    array: bool,
    #[serde(default)]
    constant: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawStatement {
    Assign {
        lhs: RawTarget,
        rhs: RawInt,
    },
    If {
        cond: RawBool,
        #[serde(default)]
        then: Vec<RawStatement>,
        #[serde(default, rename = "else")]
        otherwise: Vec<RawStatement>,
    },
    While {
        cond: RawBool,
        #[serde(default)]
        body: Vec<RawStatement>,
    },
    Skip,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Scalar(String),
    Element { array: String, index: RawInt },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawInt {
    Const(i64),
    Var(String),
    Read(Box<(String, RawInt)>),
    Add(Box<(RawInt, RawInt)>),
    Sub(Box<(RawInt, RawInt)>),
    Mul(Box<(RawInt, RawInt)>),
    Neg(Box<RawInt>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawBool {
    Bool(bool),
    Lt(Box<(RawInt, RawInt)>),
    Le(Box<(RawInt, RawInt)>),
    Gt(Box<(RawInt, RawInt)>),
    Ge(Box<(RawInt, RawInt)>),
    Eq(Box<(RawInt, RawInt)>),
    Ne(Box<(RawInt, RawInt)>),
    And(Vec<RawBool>),
    Or(Vec<RawBool>),
    Not(Box<RawBool>),
}

pub fn load_file(path: &Path) -> Result<Program, LoadError> {
    let raw = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_str(&raw, &path.display().to_string())
}

pub fn load_str(source: &str, origin: &str) -> Result<Program, LoadError> {
    let raw: RawProgram = serde_json::from_str(source).map_err(|e| LoadError::Syntax {
        message: e.to_string(),
        span: (byte_offset(source, e.line(), e.column()), 0).into(),
        src: NamedSource::new(origin, source.to_string()),
    })?;

    let mut resolver = Resolver {
        function_names: raw.functions.iter().map(|f| f.name.clone()).collect(),
        ..Resolver::default()
    };
    let mut program = Program::new();
    for f in raw.functions {
        check_function_name(&f.name).map_err(|c| LoadError::name_clash(&f.name, &f.name, c))?;
        if program.functions.iter().any(|g| g.name == f.name) {
            return Err(LoadError::DuplicateFunction(f.name));
        }
        program.functions.push(resolver.function(f)?);
    }
    debug!(
        functions = program.functions.len(),
        statements = resolver.next_id,
        "loaded program"
    );
    Ok(program)
}

/// serde_json reports 1-based lines and columns.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let before: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (before + column.saturating_sub(1)).min(source.len())
}

#[derive(Default)]
struct Resolver {
    next_id: u32,
    function: String,
    function_names: Vec<String>,
    vars: BTreeMap<String, Arc<Variable>>,
    loops: Vec<String>,
}

impl Resolver {
    fn function(&mut self, raw: RawFunction) -> Result<Function, LoadError> {
        self.function = raw.name.clone();
        self.vars.clear();
        self.loops.clear();

        let mut variables = Vec::with_capacity(raw.variables.len());
        for v in raw.variables {
            check_variable_name(&v.name, self.function_names.iter().map(String::as_str))
                .map_err(|c| LoadError::name_clash(&raw.name, &v.name, c))?;
            let mut var = if v.array {
                Variable::array(v.name.clone())
            } else {
                Variable::scalar(v.name.clone())
            };
            if v.constant {
                var = var.constant();
            }
            let var = Arc::new(var);
            if self.vars.insert(v.name.clone(), Arc::clone(&var)).is_some() {
                return Err(LoadError::DuplicateVariable {
                    function: raw.name,
                    name: v.name,
                });
            }
            variables.push(var);
        }

        let statements = self.block(raw.statements, false)?;
        let postcondition = raw.postcondition.map(|p| self.bool_expr(p)).transpose()?;

        Ok(Function {
            name: raw.name,
            variables,
            statements,
            postcondition,
        })
    }

    fn fresh(&mut self) -> (StmtId, String) {
        self.next_id += 1;
        (StmtId(self.next_id), format!("l{}", self.next_id))
    }

    /// Nested blocks never come out empty.
    fn block(&mut self, raw: Vec<RawStatement>, nested: bool) -> Result<Vec<Statement>, LoadError> {
        if raw.is_empty() && nested {
            let (id, location) = self.fresh();
            return Ok(vec![Statement::Skip(SkipStatement { id, location })]);
        }
        raw.into_iter().map(|s| self.statement(s)).collect()
    }

    fn statement(&mut self, raw: RawStatement) -> Result<Statement, LoadError> {
        let (id, location) = self.fresh();
        match raw {
            RawStatement::Assign { lhs, rhs } => {
                let lhs = match lhs {
                    RawTarget::Scalar(name) => {
                        AssignTarget::Variable(self.writable(&name, false)?)
                    }
                    RawTarget::Element { array, index } => AssignTarget::ArrayElement {
                        array: self.writable(&array, true)?,
                        index: self.int_expr(index)?,
                    },
                };
                let rhs = self.int_expr(rhs)?;
                Ok(Statement::IntAssignment(IntAssignment {
                    id,
                    location,
                    lhs,
                    rhs,
                }))
            }
            RawStatement::If {
                cond,
                then,
                otherwise,
            } => {
                let condition = self.bool_expr(cond)?;
                let then_branch = self.block(then, true)?;
                let else_branch = self.block(otherwise, true)?;
                Ok(Statement::IfElse(IfElse {
                    id,
                    location,
                    condition,
                    then_branch,
                    else_branch,
                }))
            }
            RawStatement::While { cond, body } => {
                let condition = self.bool_expr(cond)?;
                let enclosing_loops = self.loops.clone();
                self.loops.push(location.clone());
                let body = self.block(body, true);
                self.loops.pop();
                Ok(Statement::While(WhileStatement {
                    id,
                    location,
                    condition,
                    body: body?,
                    enclosing_loops,
                }))
            }
            RawStatement::Skip => Ok(Statement::Skip(SkipStatement { id, location })),
        }
    }

    fn lookup(&self, name: &str, array: bool) -> Result<Arc<Variable>, LoadError> {
        let var = self.vars.get(name).ok_or_else(|| LoadError::UnknownVariable {
            function: self.function.clone(),
            name: name.to_string(),
        })?;
        if var.is_array != array {
            let shape = |a: bool| if a { "an array" } else { "a scalar" };
            return Err(LoadError::ShapeMismatch {
                function: self.function.clone(),
                name: name.to_string(),
                used: shape(array),
                declared: shape(var.is_array),
            });
        }
        Ok(Arc::clone(var))
    }

    fn writable(&self, name: &str, array: bool) -> Result<Arc<Variable>, LoadError> {
        let var = self.lookup(name, array)?;
        if var.is_constant {
            return Err(LoadError::AssignToConstant {
                function: self.function.clone(),
                name: name.to_string(),
            });
        }
        Ok(var)
    }

    fn int_expr(&self, raw: RawInt) -> Result<IntExpr, LoadError> {
        Ok(match raw {
            RawInt::Const(n) => IntExpr::Constant(n),
            RawInt::Var(name) => IntExpr::Variable(self.lookup(&name, false)?),
            RawInt::Read(read) => {
                let (array, index) = *read;
                IntExpr::read(&self.lookup(&array, true)?, self.int_expr(index)?)
            }
            RawInt::Add(ops) => {
                let (l, r) = *ops;
                IntExpr::add(self.int_expr(l)?, self.int_expr(r)?)
            }
            RawInt::Sub(ops) => {
                let (l, r) = *ops;
                IntExpr::sub(self.int_expr(l)?, self.int_expr(r)?)
            }
            RawInt::Mul(ops) => {
                let (l, r) = *ops;
                IntExpr::mul(self.int_expr(l)?, self.int_expr(r)?)
            }
            RawInt::Neg(inner) => IntExpr::Neg(Box::new(self.int_expr(*inner)?)),
        })
    }

    fn compare(&self, op: CmpOp, ops: Box<(RawInt, RawInt)>) -> Result<BoolExpr, LoadError> {
        let (l, r) = *ops;
        Ok(BoolExpr::cmp(op, self.int_expr(l)?, self.int_expr(r)?))
    }

    fn bool_expr(&self, raw: RawBool) -> Result<BoolExpr, LoadError> {
        match raw {
            RawBool::Bool(b) => Ok(BoolExpr::Constant(b)),
            RawBool::Lt(ops) => self.compare(CmpOp::Lt, ops),
            RawBool::Le(ops) => self.compare(CmpOp::Le, ops),
            RawBool::Gt(ops) => self.compare(CmpOp::Gt, ops),
            RawBool::Ge(ops) => self.compare(CmpOp::Ge, ops),
            RawBool::Eq(ops) => self.compare(CmpOp::Eq, ops),
            RawBool::Ne(ops) => self.compare(CmpOp::Ne, ops),
            RawBool::And(parts) => Ok(BoolExpr::And(
                parts
                    .into_iter()
                    .map(|p| self.bool_expr(p))
                    .collect::<Result<_, _>>()?,
            )),
            RawBool::Or(parts) => Ok(BoolExpr::Or(
                parts
                    .into_iter()
                    .map(|p| self.bool_expr(p))
                    .collect::<Result<_, _>>()?,
            )),
            RawBool::Not(inner) => Ok(BoolExpr::not(self.bool_expr(*inner)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = r#"{
      "functions": [{
        "name": "main",
        "variables": [{"name": "x"}, {"name": "a", "array": true}, {"name": "n", "constant": true}],
        "statements": [
          {"assign": {"lhs": "x", "rhs": {"const": 0}}},
          {"while": {"cond": {"lt": [{"var": "x"}, {"var": "n"}]},
                     "body": [
                       {"assign": {"lhs": {"array": "a", "index": {"var": "x"}}, "rhs": {"read": ["a", {"const": 0}]}}},
                       {"assign": {"lhs": "x", "rhs": {"add": [{"var": "x"}, {"const": 1}]}}}
                     ]}},
          "skip"
        ],
        "postcondition": {"ge": [{"var": "x"}, {"var": "n"}]}
      }]
    }"#;

    #[test]
    fn numbers_statements_in_pre_order() {
        let program = load_str(COUNTER, "counter.json").unwrap();
        let f = &program.functions[0];
        let locations: Vec<_> = f
            .all_statements()
            .iter()
            .map(|s| s.location().to_string())
            .collect();
        assert_eq!(locations, vec!["l1", "l2", "l3", "l4", "l5"]);
        assert!(f.postcondition.is_some());

        match &f.statements[1] {
            Statement::While(w) => {
                assert!(w.enclosing_loops.is_empty());
                assert_eq!(w.body.len(), 2);
            }
            other => panic!("expected a loop, got {}", other.kind_name()),
        }
    }

    #[test]
    fn nested_loops_record_their_enclosing_loops() {
        let src = r#"{"functions": [{"name": "f", "variables": [{"name": "i"}],
            "statements": [{"while": {"cond": {"bool": true}, "body": [
                {"if": {"cond": {"bool": false}, "then": [
                    {"while": {"cond": {"bool": true}, "body": ["skip"]}}
                ]}}
            ]}}]}]}"#;
        let program = load_str(src, "nested.json").unwrap();
        let inner = program.functions[0]
            .all_statements()
            .into_iter()
            .find_map(|s| match s {
                Statement::While(w) if w.location == "l3" => Some(w.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(inner.enclosing_loops, vec!["l1".to_string()]);
    }

    #[test]
    fn empty_blocks_get_a_skip() {
        let src = r#"{"functions": [{"name": "f", "variables": [{"name": "x"}],
            "statements": [{"if": {"cond": {"bool": true}, "then": []}}, {"while": {"cond": {"bool": false}}}]}]}"#;
        let program = load_str(src, "empty.json").unwrap();
        let kinds: Vec<_> = program.functions[0]
            .all_statements()
            .iter()
            .map(|s| s.kind_name())
            .collect();
        assert_eq!(kinds, vec!["if-else", "skip", "skip", "while", "skip"]);
    }

    #[test]
    fn rejects_unknown_variables() {
        let src = r#"{"functions": [{"name": "f", "statements": [{"assign": {"lhs": "y", "rhs": {"const": 1}}}]}]}"#;
        let err = load_str(src, "bad.json").unwrap_err();
        assert!(matches!(err, LoadError::UnknownVariable { ref name, .. } if name == "y"));
    }

    #[test]
    fn rejects_writes_to_constants() {
        let src = r#"{"functions": [{"name": "f", "variables": [{"name": "n", "constant": true}],
            "statements": [{"assign": {"lhs": "n", "rhs": {"const": 1}}}]}]}"#;
        let err = load_str(src, "bad.json").unwrap_err();
        assert!(matches!(err, LoadError::AssignToConstant { .. }));
    }

    #[test]
    fn rejects_scalar_used_as_array() {
        let src = r#"{"functions": [{"name": "f", "variables": [{"name": "x"}],
            "statements": [{"assign": {"lhs": "x", "rhs": {"read": ["x", {"const": 0}]}}}]}]}"#;
        let err = load_str(src, "bad.json").unwrap_err();
        assert!(matches!(err, LoadError::ShapeMismatch { used: "an array", .. }));
    }

    #[test]
    fn rejects_duplicate_functions() {
        let src = r#"{"functions": [{"name": "f"}, {"name": "f"}]}"#;
        assert!(matches!(load_str(src, "dup.json"), Err(LoadError::DuplicateFunction(_))));
    }

    fn single_variable(function: &str, variable: &str) -> String {
        format!(
            r#"{{"functions": [{{"name": "{function}",
                "variables": [{{"name": "a", "array": true}}, {{"name": "{variable}", "constant": true}}],
                "statements": [{{"assign": {{"lhs": {{"array": "a", "index": {{"var": "{variable}"}}}},
                                            "rhs": {{"const": 1}}}}}}]}}]}}"#
        )
    }

    #[test]
    fn bound_variable_names_are_rejected() {
        assert!(load_str(&single_variable("main", "k"), "ok.json").is_ok());
        for name in ["pos", "tr", "It_l1"] {
            let err = load_str(&single_variable("main", name), "bad.json").unwrap_err();
            assert!(
                matches!(err, LoadError::ReservedName { role: "a bound variable", .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn encoding_symbols_are_rejected() {
        for name in ["s", "zero", "Sub", "l1", "n_l2", "l3_left_end", "main_end", "axiom0"] {
            let err = load_str(&single_variable("main", name), "bad.json").unwrap_err();
            assert!(
                matches!(err, LoadError::ReservedName { ref function, .. } if function == "main"),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn end_symbols_of_other_functions_are_rejected() {
        let src = r#"{"functions": [{"name": "f"}, {"name": "g", "variables": [{"name": "f_end"}]}]}"#;
        let err = load_str(src, "bad.json").unwrap_err();
        assert!(matches!(err, LoadError::ReservedName { ref name, .. } if name == "f_end"));
    }

    #[test]
    fn identifiers_must_be_plain_symbols() {
        let err = load_str(&single_variable("main", "a-b"), "bad.json").unwrap_err();
        assert!(matches!(err, LoadError::InvalidIdentifier { ref name, .. } if name == "a-b"));

        let err = load_str(r#"{"functions": [{"name": "my fn"}]}"#, "bad.json").unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidIdentifier { ref function, .. } if function == "my fn"
        ));
    }

    #[test]
    fn syntax_errors_point_into_the_source() {
        let src = "{\"functions\": [\n  {\"name\": 3}\n]}";
        match load_str(src, "broken.json").unwrap_err() {
            LoadError::Syntax { span, .. } => assert!(span.offset() > 15),
            other => panic!("unexpected error: {other}"),
        }
    }
}
