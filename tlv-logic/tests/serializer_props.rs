use proptest::prelude::*;
use tlv_logic::{Formula, Problem, Registry, Term, Theory};

fn problem_with(reg: &Registry, axioms: usize, lemmas: usize) -> Problem {
    let th = Theory::new(reg);
    let x = reg
        .fetch_or_declare_symbol("x", Vec::new(), reg.int_sort(), false)
        .unwrap();
    let mut problem = Problem::new();
    for i in 0..axioms {
        let lit = th.int_constant(i as i64).unwrap();
        problem.add_axiom(Formula::equality(Term::constant(&x).unwrap(), lit).unwrap());
    }
    for i in 0..lemmas {
        let lit = th.int_constant(-(i as i64)).unwrap();
        problem.add_lemma(th.int_less_eq(lit, Term::constant(&x).unwrap()).unwrap());
    }
    problem.set_conjecture(th.bool_false().unwrap());
    problem
}

proptest! {
    #[test]
    fn assertion_names_cover_exactly_the_inserted_formulas(
        axioms in 0usize..12,
        lemmas in 0usize..12,
    ) {
        let reg = Registry::new();
        let text = problem_with(&reg, axioms, lemmas).to_smtlib(&reg).unwrap();

        prop_assert_eq!(text.matches(":named axiom").count(), axioms);
        prop_assert_eq!(text.matches(":named lemma").count(), lemmas);
        for i in 0..axioms {
            let needle = format!(":named axiom{})", i);
            prop_assert!(text.contains(&needle));
        }
        for i in 0..lemmas {
            let needle = format!(":named lemma{})", i);
            prop_assert!(text.contains(&needle));
        }
        prop_assert_eq!(text.matches("(assert-not").count(), 1);
        prop_assert!(text.ends_with("(check-sat)\n(get-unsat-core)\n"));
    }

    #[test]
    fn repeated_fetches_declare_once(repeats in 1usize..20) {
        let reg = Registry::new();
        let first = reg.fetch_or_declare_sort("Trace");
        for _ in 0..repeats {
            let again = reg.fetch_or_declare_sort("Trace");
            prop_assert!(std::sync::Arc::ptr_eq(&first, &again));
            reg.fetch_or_declare_symbol("t1", Vec::new(), again, false).unwrap();
        }
        let mut problem = Problem::new();
        problem.set_conjecture(Theory::new(&reg).bool_true().unwrap());
        let text = problem.to_smtlib(&reg).unwrap();
        prop_assert_eq!(text.matches("(declare-sort Trace 0)").count(), 1);
        prop_assert_eq!(text.matches("(declare-fun t1 () Trace)").count(), 1);
    }
}
