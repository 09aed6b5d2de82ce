#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use crate::error::{LogicError, Result};
use crate::symbol::Symbol;
use crate::term::{check_args, render_application, Term};

const INDENT_STEP: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaKind {
    Equality(Term, Term),
    Disequality(Term, Term),
    Predicate { symbol: Arc<Symbol>, args: Vec<Term> },
    Negation(Box<Formula>),
    Implication(Box<Formula>, Box<Formula>),
    Conjunction(Vec<Formula>),
    Disjunction(Vec<Formula>),
    Universal { vars: Vec<Arc<Symbol>>, body: Box<Formula> },
    Existential { vars: Vec<Arc<Symbol>>, body: Box<Formula> },
}

/// An immutable formula tree with an optional provenance label.
///
/// The label is carried into the solver text as a comment and never takes
/// part in equality.
#[derive(Clone, Debug)]
pub struct Formula {
    kind: FormulaKind,
    label: Option<String>,
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Formula {}

impl From<FormulaKind> for Formula {
    fn from(kind: FormulaKind) -> Self {
        Formula { kind, label: None }
    }
}

fn same_sort(context: &str, lhs: &Term, rhs: &Term) -> Result<()> {
    if lhs.sort() != rhs.sort() {
        return Err(LogicError::SortMismatch {
            context: context.to_string(),
            expected: lhs.sort().name.clone(),
            found: rhs.sort().name.clone(),
        });
    }
    Ok(())
}

impl Formula {
    pub fn equality(lhs: Term, rhs: Term) -> Result<Formula> {
        same_sort("equality", &lhs, &rhs)?;
        Ok(FormulaKind::Equality(lhs, rhs).into())
    }

    pub fn disequality(lhs: Term, rhs: Term) -> Result<Formula> {
        same_sort("disequality", &lhs, &rhs)?;
        Ok(FormulaKind::Disequality(lhs, rhs).into())
    }

    pub fn predicate(symbol: &Arc<Symbol>, args: Vec<Term>) -> Result<Formula> {
        if !symbol.is_predicate() {
            return Err(LogicError::NotAPredicate(symbol.name.clone()));
        }
        check_args(symbol, &args)?;
        Ok(FormulaKind::Predicate {
            symbol: Arc::clone(symbol),
            args,
        }
        .into())
    }

    pub fn negation(inner: Formula) -> Formula {
        FormulaKind::Negation(Box::new(inner)).into()
    }

    pub fn implication(premise: Formula, conclusion: Formula) -> Formula {
        FormulaKind::Implication(Box::new(premise), Box::new(conclusion)).into()
    }

    /// Empty conjunction is `true`.
    pub fn conjunction(conjuncts: Vec<Formula>) -> Formula {
        FormulaKind::Conjunction(conjuncts).into()
    }

    /// Empty disjunction is `false`.
    pub fn disjunction(disjuncts: Vec<Formula>) -> Formula {
        FormulaKind::Disjunction(disjuncts).into()
    }

    pub fn universal(vars: Vec<Arc<Symbol>>, body: Formula) -> Result<Formula> {
        if vars.is_empty() {
            return Err(LogicError::EmptyQuantifier);
        }
        Ok(FormulaKind::Universal {
            vars,
            body: Box::new(body),
        }
        .into())
    }

    pub fn existential(vars: Vec<Arc<Symbol>>, body: Formula) -> Result<Formula> {
        if vars.is_empty() {
            return Err(LogicError::EmptyQuantifier);
        }
        Ok(FormulaKind::Existential {
            vars,
            body: Box::new(body),
        }
        .into())
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Formula {
        self.label = Some(label.into());
        self
    }

    pub fn kind(&self) -> &FormulaKind {
        &self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Pre-order walk over this formula and all its sub-formulas.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Formula)) {
        f(self);
        match &self.kind {
            FormulaKind::Equality(..)
            | FormulaKind::Disequality(..)
            | FormulaKind::Predicate { .. } => {}
            FormulaKind::Negation(inner) => inner.walk(f),
            FormulaKind::Implication(premise, conclusion) => {
                premise.walk(f);
                conclusion.walk(f);
            }
            FormulaKind::Conjunction(parts) | FormulaKind::Disjunction(parts) => {
                for part in parts {
                    part.walk(f);
                }
            }
            FormulaKind::Universal { body, .. } | FormulaKind::Existential { body, .. } => {
                body.walk(f)
            }
        }
    }

    /// True if some quantifier binds a name that an enclosing quantifier
    /// already binds, or if a declared symbol under a quantifier has the
    /// name of one of its binders.
    pub fn has_name_capture(&self) -> bool {
        fn applies(term: &Term, bound: &[&str]) -> bool {
            match term {
                Term::Var(_) => false,
                Term::App { symbol, args } => {
                    bound.contains(&symbol.smtlib_name()) || args.iter().any(|a| applies(a, bound))
                }
            }
        }

        fn go<'a>(f: &'a Formula, bound: &mut Vec<&'a str>) -> bool {
            match &f.kind {
                FormulaKind::Equality(lhs, rhs) | FormulaKind::Disequality(lhs, rhs) => {
                    applies(lhs, bound) || applies(rhs, bound)
                }
                FormulaKind::Predicate { symbol, args } => {
                    bound.contains(&symbol.smtlib_name()) || args.iter().any(|a| applies(a, bound))
                }
                FormulaKind::Negation(inner) => go(inner, bound),
                FormulaKind::Implication(premise, conclusion) => {
                    go(premise, bound) || go(conclusion, bound)
                }
                FormulaKind::Conjunction(parts) | FormulaKind::Disjunction(parts) => {
                    parts.iter().any(|p| go(p, bound))
                }
                FormulaKind::Universal { vars, body } | FormulaKind::Existential { vars, body } => {
                    if vars.iter().any(|v| bound.contains(&v.name.as_str())) {
                        return true;
                    }
                    let depth = bound.len();
                    bound.extend(vars.iter().map(|v| v.name.as_str()));
                    let shadowed = go(body, bound);
                    bound.truncate(depth);
                    shadowed
                }
            }
        }
        go(self, &mut Vec::new())
    }

    pub fn to_smtlib(&self, indent: usize) -> String {
        let mut out = String::new();
        self.write_smtlib(&mut out, indent);
        out
    }

    fn write_smtlib(&self, out: &mut String, indent: usize) {
        let pad = " ".repeat(indent);
        if let Some(label) = &self.label {
            for line in label.lines() {
                out.push_str(&pad);
                out.push_str("; ");
                out.push_str(line);
                out.push('\n');
            }
        }

        match &self.kind {
            FormulaKind::Equality(lhs, rhs) => {
                out.push_str(&format!("{pad}(= {} {})", lhs.to_smtlib(), rhs.to_smtlib()));
            }
            FormulaKind::Disequality(lhs, rhs) => {
                out.push_str(&format!(
                    "{pad}(not (= {} {}))",
                    lhs.to_smtlib(),
                    rhs.to_smtlib()
                ));
            }
            FormulaKind::Predicate { symbol, args } => {
                out.push_str(&pad);
                out.push_str(&render_application(symbol, args));
            }
            FormulaKind::Negation(inner) => {
                write_node(out, &pad, "not", std::slice::from_ref(inner.as_ref()), indent);
            }
            FormulaKind::Implication(premise, conclusion) => {
                out.push_str(&pad);
                out.push_str("(=>\n");
                premise.write_smtlib(out, indent + INDENT_STEP);
                out.push('\n');
                conclusion.write_smtlib(out, indent + INDENT_STEP);
                out.push('\n');
                out.push_str(&pad);
                out.push(')');
            }
            FormulaKind::Conjunction(parts) => {
                write_connective(out, &pad, "and", "true", parts, indent)
            }
            FormulaKind::Disjunction(parts) => {
                write_connective(out, &pad, "or", "false", parts, indent)
            }
            FormulaKind::Universal { vars, body } => {
                write_quantifier(out, &pad, "forall", vars, body, indent)
            }
            FormulaKind::Existential { vars, body } => {
                write_quantifier(out, &pad, "exists", vars, body, indent)
            }
        }
    }
}

fn write_node(out: &mut String, pad: &str, op: &str, children: &[Formula], indent: usize) {
    out.push_str(pad);
    out.push('(');
    out.push_str(op);
    out.push('\n');
    for child in children {
        child.write_smtlib(out, indent + INDENT_STEP);
        out.push('\n');
    }
    out.push_str(pad);
    out.push(')');
}

fn write_connective(
    out: &mut String,
    pad: &str,
    op: &str,
    unit: &str,
    parts: &[Formula],
    indent: usize,
) {
    match parts {
        [] => {
            out.push_str(pad);
            out.push_str(unit);
        }
        [single] => single.write_smtlib(out, indent),
        _ => write_node(out, pad, op, parts, indent),
    }
}

fn write_quantifier(
    out: &mut String,
    pad: &str,
    quantifier: &str,
    vars: &[Arc<Symbol>],
    body: &Formula,
    indent: usize,
) {
    let binders = vars
        .iter()
        .map(|v| format!("({} {})", v.name, v.range))
        .collect::<String>();
    out.push_str(&format!("{pad}({quantifier} ({binders})\n"));
    body.write_smtlib(out, indent + INDENT_STEP);
    out.push('\n');
    out.push_str(pad);
    out.push(')');
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_smtlib(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    fn int_const(reg: &Registry, name: &str) -> Term {
        let s = reg
            .fetch_or_declare_symbol(name, Vec::new(), reg.int_sort(), false)
            .unwrap();
        Term::constant(&s).unwrap()
    }

    #[test]
    fn equality_rejects_mixed_sorts() {
        let reg = Registry::new();
        let zero = reg
            .fetch_or_declare_symbol("l0", Vec::new(), reg.time_sort(), false)
            .unwrap();
        let err =
            Formula::equality(int_const(&reg, "x"), Term::constant(&zero).unwrap()).unwrap_err();
        assert!(matches!(err, LogicError::SortMismatch { .. }));
    }

    #[test]
    fn predicate_requires_bool_range() {
        let reg = Registry::new();
        let f = reg
            .fetch_or_declare_symbol("f", Vec::new(), reg.int_sort(), false)
            .unwrap();
        assert!(matches!(
            Formula::predicate(&f, Vec::new()),
            Err(LogicError::NotAPredicate(name)) if name == "f"
        ));
    }

    #[test]
    fn quantifier_needs_a_binder() {
        let f = Formula::conjunction(Vec::new());
        assert!(matches!(Formula::universal(Vec::new(), f), Err(LogicError::EmptyQuantifier)));
    }

    #[test]
    fn labels_do_not_affect_equality() {
        let reg = Registry::new();
        let eq = Formula::equality(int_const(&reg, "x"), int_const(&reg, "y")).unwrap();
        assert_eq!(eq.clone().with_label("first"), eq.with_label("second"));
    }

    #[test]
    fn empty_connectives_render_as_units() {
        assert_eq!(Formula::conjunction(Vec::new()).to_smtlib(0), "true");
        assert_eq!(Formula::disjunction(Vec::new()).to_smtlib(2), "  false");
    }

    #[test]
    fn renders_labelled_quantifier() {
        let reg = Registry::new();
        let pos = Symbol::variable("pos", reg.int_sort());
        let body = Formula::disequality(Term::var(&pos), int_const(&reg, "x")).unwrap();
        let f = Formula::universal(vec![pos], body).unwrap().with_label("frame");
        assert_eq!(
            f.to_smtlib(0),
            "; frame\n(forall ((pos Int))\n   (not (= pos x))\n)"
        );
    }

    #[test]
    fn detects_declared_symbols_named_like_a_binder() {
        let reg = Registry::new();
        let pos = Symbol::variable("pos", reg.int_sort());
        let body = Formula::disequality(Term::var(&pos), int_const(&reg, "pos")).unwrap();
        assert!(!body.has_name_capture());
        assert!(Formula::universal(vec![Arc::clone(&pos)], body).unwrap().has_name_capture());

        let apart = Formula::disequality(Term::var(&pos), int_const(&reg, "k")).unwrap();
        assert!(!Formula::universal(vec![pos], apart).unwrap().has_name_capture());
    }

    #[test]
    fn existential_renders_and_compares_structurally() {
        let reg = Registry::new();
        let k = Symbol::variable("k", reg.int_sort());
        let body = Formula::equality(Term::var(&k), int_const(&reg, "x")).unwrap();
        let f = Formula::existential(vec![Arc::clone(&k)], body.clone()).unwrap();
        assert_eq!(f.to_smtlib(0), "(exists ((k Int))\n   (= k x)\n)");
        assert_ne!(f, Formula::universal(vec![k], body).unwrap());
        assert!(matches!(
            Formula::existential(Vec::new(), Formula::conjunction(Vec::new())),
            Err(LogicError::EmptyQuantifier)
        ));
    }

    #[test]
    fn detects_shadowed_binders() {
        let reg = Registry::new();
        let pos = Symbol::variable("pos", reg.int_sort());
        let eq = Formula::equality(Term::var(&pos), int_const(&reg, "x")).unwrap();
        let inner = Formula::universal(vec![Arc::clone(&pos)], eq.clone()).unwrap();

        let siblings = Formula::conjunction(vec![inner.clone(), inner.clone()]);
        assert!(!siblings.has_name_capture());

        let nested = Formula::universal(vec![pos], inner).unwrap();
        assert!(nested.has_name_capture());
    }

    #[test]
    fn walk_visits_every_node() {
        let reg = Registry::new();
        let eq = Formula::equality(int_const(&reg, "x"), int_const(&reg, "y")).unwrap();
        let f = Formula::implication(Formula::negation(eq.clone()), Formula::conjunction(vec![eq]));
        let mut count = 0;
        f.walk(&mut |_| count += 1);
        assert_eq!(count, 5);
    }
}
