#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{LogicError, Result};
use crate::sort::{self, Sort};
use crate::symbol::Symbol;

/// Sorts and symbols of one generation run.
///
/// Both tables are fetch-or-declare and append-only, and they remember
/// insertion order so declarations serialize reproducibly. The tables sit
/// behind mutexes so a `&Registry` can be shared across worker threads.
#[derive(Debug)]
pub struct Registry {
    sorts: Mutex<IndexMap<String, Arc<Sort>>>,
    symbols: Mutex<IndexMap<String, Arc<Symbol>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every write is a single insert, so a poisoned table is still consistent.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    pub fn new() -> Self {
        let registry = Self {
            sorts: Mutex::new(IndexMap::new()),
            symbols: Mutex::new(IndexMap::new()),
        };
        registry.fetch_or_declare_sort(sort::INT);
        registry.fetch_or_declare_sort(sort::BOOL);
        registry
    }

    pub fn fetch_or_declare_sort(&self, name: &str) -> Arc<Sort> {
        let mut sorts = lock(&self.sorts);
        if let Some(existing) = sorts.get(name) {
            return Arc::clone(existing);
        }
        trace!(sort = name, "declaring sort");
        let sort = Arc::new(Sort::new(name));
        sorts.insert(name.to_string(), Arc::clone(&sort));
        sort
    }

    pub fn int_sort(&self) -> Arc<Sort> {
        self.fetch_or_declare_sort(sort::INT)
    }

    pub fn bool_sort(&self) -> Arc<Sort> {
        self.fetch_or_declare_sort(sort::BOOL)
    }

    pub fn time_sort(&self) -> Arc<Sort> {
        self.fetch_or_declare_sort(sort::TIME)
    }

    pub fn trace_sort(&self) -> Arc<Sort> {
        self.fetch_or_declare_sort(sort::TRACE)
    }

    /// Returns the symbol registered under `name`, registering it first if
    /// needed. A second registration must agree on domain, range and the
    /// interpreted flag.
    pub fn fetch_or_declare_symbol(
        &self,
        name: &str,
        arg_sorts: Vec<Arc<Sort>>,
        range: Arc<Sort>,
        interpreted: bool,
    ) -> Result<Arc<Symbol>> {
        let requested = Symbol {
            name: name.to_string(),
            arg_sorts,
            range,
            interpreted,
        };

        let mut symbols = lock(&self.symbols);
        if let Some(existing) = symbols.get(name) {
            if existing.same_signature(&requested) {
                return Ok(Arc::clone(existing));
            }
            return Err(LogicError::SignatureConflict {
                name: name.to_string(),
                existing: existing.signature(),
                requested: requested.signature(),
            });
        }

        trace!(symbol = name, signature = %requested.signature(), "declaring symbol");
        let symbol = Arc::new(requested);
        symbols.insert(name.to_string(), Arc::clone(&symbol));
        Ok(symbol)
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<Arc<Symbol>> {
        lock(&self.symbols).get(name).cloned()
    }

    /// Snapshot of all sorts in declaration order.
    pub fn sorts(&self) -> Vec<Arc<Sort>> {
        lock(&self.sorts).values().cloned().collect()
    }

    /// Snapshot of all symbols in declaration order.
    pub fn symbols(&self) -> Vec<Arc<Symbol>> {
        lock(&self.symbols).values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_are_fetched_not_duplicated() {
        let reg = Registry::new();
        let a = reg.fetch_or_declare_sort("Trace");
        let b = reg.fetch_or_declare_sort("Trace");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.sorts().len(), 3);
    }

    #[test]
    fn builtins_are_preregistered_in_order() {
        let reg = Registry::new();
        let names: Vec<_> = reg.sorts().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Int", "Bool"]);
    }

    #[test]
    fn symbol_redeclaration_with_same_signature_is_a_fetch() {
        let reg = Registry::new();
        let time = reg.time_sort();
        let x1 = reg
            .fetch_or_declare_symbol("x", vec![Arc::clone(&time)], reg.int_sort(), false)
            .unwrap();
        let x2 = reg
            .fetch_or_declare_symbol("x", vec![time], reg.int_sort(), false)
            .unwrap();
        assert!(Arc::ptr_eq(&x1, &x2));
        assert_eq!(reg.symbols().len(), 1);
    }

    #[test]
    fn symbol_redeclaration_with_other_signature_conflicts() {
        let reg = Registry::new();
        reg.fetch_or_declare_symbol("x", vec![reg.time_sort()], reg.int_sort(), false)
            .unwrap();
        let err = reg
            .fetch_or_declare_symbol(
                "x",
                vec![reg.time_sort(), reg.int_sort()],
                reg.int_sort(),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, LogicError::SignatureConflict { ref name, .. } if name == "x"));
        // the first declaration stays in place
        assert_eq!(reg.lookup_symbol("x").unwrap().arity(), 1);
    }

    #[test]
    fn symbols_keep_insertion_order() {
        let reg = Registry::new();
        for name in ["c", "a", "b"] {
            reg.fetch_or_declare_symbol(name, Vec::new(), reg.int_sort(), false)
                .unwrap();
        }
        let names: Vec<_> = reg.symbols().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
