#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, info, warn};

use tlv_logic::{Formula, Problem, Registry};
use tlv_program::Program;
use tlv_semantics::{annotate, Encoding, ProgramAnnotations, Result, Semantics};

#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub two_traces: bool,
    pub timepoints: bool,
    pub parallel: bool,
}

/// Solver text for `program`, optionally prefixed with the time-point listing.
pub fn generate(program: &Program, options: Options) -> Result<String> {
    let registry = Registry::new();
    let encoding = Encoding::new(&registry, options.two_traces);
    let annotations = annotate(program, &encoding)?;
    let problem = build_problem(program, &registry, &annotations, options)?;

    let mut out = String::new();
    if options.timepoints {
        out.push_str(&timepoint_listing(program, &annotations));
    }
    out.push_str(&problem.to_smtlib(&registry)?);
    Ok(out)
}

pub fn build_problem(
    program: &Program,
    registry: &Registry,
    annotations: &ProgramAnnotations,
    options: Options,
) -> Result<Problem> {
    let semantics = Semantics::new(program, registry, annotations, options.two_traces);
    let axioms = if options.parallel {
        semantics.generate_parallel()?
    } else {
        semantics.generate()?
    };

    let mut problem = Problem::new();
    problem.add_axioms(axioms);
    problem.set_conjecture(conjecture(program, semantics.encoding(), annotations)?);
    info!(
        functions = program.functions.len(),
        axioms = problem.axioms().len(),
        two_traces = options.two_traces,
        parallel = options.parallel,
        "generated program semantics"
    );
    Ok(problem)
}

/// Conjunction of every postcondition at its function's end, or `false`
/// when no function has one.
fn conjecture(
    program: &Program,
    encoding: &Encoding<'_>,
    annotations: &ProgramAnnotations,
) -> Result<Formula> {
    let mut parts = Vec::new();
    for function in &program.functions {
        let (Some(post), Some(end)) = (
            &function.postcondition,
            annotations.function_ends.get(&function.name),
        ) else {
            continue;
        };
        let mut formula = encoding.bool_formula(post, end)?;
        if let Some(tr) = encoding.trace_symbol() {
            formula = Formula::universal(vec![Arc::clone(tr)], formula)?;
        }
        debug!(function = %function.name, "adding postcondition");
        parts.push(formula.with_label(format!("Postcondition of function {}", function.name)));
    }

    if parts.is_empty() {
        warn!("no function has a postcondition; checking the axioms for consistency");
        return Ok(encoding.theory().bool_false()?);
    }
    Ok(Formula::conjunction(parts))
}

/// One comment line per statement with its start and end time-points.
pub fn timepoint_listing(program: &Program, annotations: &ProgramAnnotations) -> String {
    let mut out = String::from("; time-points\n");
    for function in &program.functions {
        let _ = writeln!(out, "; function {}", function.name);
        for stmt in function.all_statements() {
            let show = |tp: Option<&tlv_logic::Term>| {
                tp.map(|t| t.to_smtlib()).unwrap_or_else(|| "?".to_string())
            };
            let _ = writeln!(
                out,
                ";   {} {:<10} start {}  end {}",
                stmt.location(),
                stmt.kind_name(),
                show(annotations.start(stmt.id())),
                show(annotations.end(stmt.id())),
            );
        }
    }
    out
}
