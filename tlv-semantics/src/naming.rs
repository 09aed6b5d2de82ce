#![forbid(unsafe_code)]

//! Which program identifiers can go into the solver text unchanged.
//!
//! Program variables become free symbols with their own names, so they share
//! one namespace with the `Time` datatype, the bound variables of the
//! encoding, the generated time-point symbols and the assertion names.

use crate::encoding::{ITERATOR_PREFIX, LAST_ITERATION_PREFIX, POSITION_VAR, TRACE_VAR};

/// Why an identifier cannot be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameClash {
    /// Not of the form `[A-Za-z_][A-Za-z0-9_]*`.
    NotASymbol,
    /// Taken by the encoding; the payload names the role.
    Reserved(&'static str),
}

const SMTLIB_WORDS: &[&str] = &[
    "_", "as", "let", "exists", "forall", "match", "par", "true", "false", "not", "and", "or",
    "xor", "ite", "distinct", "div", "mod", "abs",
];

const TIME_SYMBOLS: &[&str] = &["zero", "s", "p", "Sub"];

fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_numbered(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// `l<k>`, `l<k>_left_end`, `l<k>_right_end` or `n_l<k>`.
fn is_location_name(name: &str) -> bool {
    let stem = name
        .strip_suffix("_left_end")
        .or_else(|| name.strip_suffix("_right_end"))
        .unwrap_or(name);
    is_numbered(stem, "l")
        || name
            .strip_prefix(LAST_ITERATION_PREFIX)
            .is_some_and(|loc| is_numbered(loc, "l"))
}

/// Checks a function name. Its end time-point `<name>_end` must not look
/// like a statement location.
pub fn check_function_name(name: &str) -> Result<(), NameClash> {
    if !is_symbol(name) {
        return Err(NameClash::NotASymbol);
    }
    if is_location_name(&format!("{name}_end")) {
        return Err(NameClash::Reserved("a time-point symbol"));
    }
    Ok(())
}

/// Checks a variable name against everything the encoding declares or binds
/// for a program with the given functions.
pub fn check_variable_name<'a>(
    name: &str,
    functions: impl IntoIterator<Item = &'a str>,
) -> Result<(), NameClash> {
    if !is_symbol(name) {
        return Err(NameClash::NotASymbol);
    }
    if SMTLIB_WORDS.contains(&name) {
        return Err(NameClash::Reserved("an SMT-LIB word"));
    }
    if TIME_SYMBOLS.contains(&name) {
        return Err(NameClash::Reserved("a symbol of the Time datatype"));
    }
    if name == POSITION_VAR || name == TRACE_VAR || name.starts_with(ITERATOR_PREFIX) {
        return Err(NameClash::Reserved("a bound variable"));
    }
    if is_location_name(name)
        || functions
            .into_iter()
            .any(|f| name.strip_suffix("_end") == Some(f))
    {
        return Err(NameClash::Reserved("a time-point symbol"));
    }
    if is_numbered(name, "axiom") || is_numbered(name, "lemma") {
        return Err(NameClash::Reserved("an assertion name"));
    }
    Ok(())
}
