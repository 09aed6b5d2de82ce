#![forbid(unsafe_code)]

use std::io::Write;

use tracing::debug;

use crate::error::{LogicError, Result};
use crate::formula::Formula;
use crate::registry::Registry;

/// Axioms, lemmas and the conjecture handed to the solver.
///
/// Axioms and lemmas keep insertion order; their position is the number in
/// the `axiom<i>` / `lemma<i>` assertion names that unsat cores refer to.
#[derive(Clone, Debug, Default)]
pub struct Problem {
    axioms: Vec<Formula>,
    lemmas: Vec<Formula>,
    conjecture: Option<Formula>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_axiom(&mut self, axiom: Formula) {
        self.axioms.push(axiom);
    }

    pub fn add_axioms(&mut self, axioms: impl IntoIterator<Item = Formula>) {
        self.axioms.extend(axioms);
    }

    pub fn add_lemma(&mut self, lemma: Formula) {
        self.lemmas.push(lemma);
    }

    pub fn set_conjecture(&mut self, conjecture: Formula) {
        self.conjecture = Some(conjecture);
    }

    pub fn axioms(&self) -> &[Formula] {
        &self.axioms
    }

    pub fn lemmas(&self) -> &[Formula] {
        &self.lemmas
    }

    pub fn conjecture(&self) -> Option<&Formula> {
        self.conjecture.as_ref()
    }

    /// Writes the problem as solver text.
    ///
    /// The conjecture goes out through `assert-not`, which is not part of
    /// SMT-LIB 2: it asserts the negation of its argument as the proof goal
    /// and must be understood by the receiving solver.
    pub fn write_smtlib<W: Write>(&self, registry: &Registry, out: &mut W) -> Result<()> {
        let conjecture = self.conjecture.as_ref().ok_or(LogicError::MissingConjecture)?;

        writeln!(out, "(set-option :produce-unsat-cores true)")?;

        for sort in registry.sorts() {
            out.write_all(sort.declaration().as_bytes())?;
        }
        for symbol in registry.symbols() {
            out.write_all(symbol.declaration().as_bytes())?;
        }

        for (i, axiom) in self.axioms.iter().enumerate() {
            write!(out, "\n(assert\n (!\n{}\n :named axiom{i}))\n", axiom.to_smtlib(3))?;
        }
        for (i, lemma) in self.lemmas.iter().enumerate() {
            write!(out, "\n(assert\n (!\n{}\n :named lemma{i}))\n", lemma.to_smtlib(3))?;
        }

        write!(out, "\n(assert-not\n{}\n)\n", conjecture.to_smtlib(3))?;
        writeln!(out, "(check-sat)")?;
        writeln!(out, "(get-unsat-core)")?;

        debug!(
            axioms = self.axioms.len(),
            lemmas = self.lemmas.len(),
            "serialized problem"
        );
        Ok(())
    }

    pub fn to_smtlib(&self, registry: &Registry) -> Result<String> {
        let mut buf = Vec::new();
        self.write_smtlib(registry, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
