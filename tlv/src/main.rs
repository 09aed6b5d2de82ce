#![forbid(unsafe_code)]

mod config;
mod loader;
mod pipeline;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::pipeline::Options;

#[derive(Parser, Debug)]
#[command(
    name = "tlv",
    version,
    about = "Generates trace-logic verification conditions for while-programs"
)]
struct Cli {
    /// Program description (JSON).
    program: PathBuf,

    /// Write the solver text here instead of stdout. Overrides `tlv.toml`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Relate two executions of every function (adds a `Trace` argument).
    #[arg(long, default_value_t = false)]
    two_traces: bool,

    /// Prefix the output with the time-points of every statement.
    #[arg(long, default_value_t = false)]
    timepoints: bool,

    /// Translate functions on a thread pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Configuration file. Defaults to the nearest `tlv.toml` above the program.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let resolved = config::load_config(&cli.program, cli.config.as_deref())?;
    if let Some(path) = &resolved.config_path {
        info!(config = %path.display(), "using configuration");
    }

    let options = Options {
        two_traces: cli.two_traces || resolved.two_traces,
        timepoints: cli.timepoints || resolved.timepoints,
        parallel: cli.parallel || resolved.parallel,
    };
    let output = cli.output.or(resolved.output);

    let program = loader::load_file(&cli.program)?;
    info!(
        program = %cli.program.display(),
        functions = program.functions.len(),
        "loaded program"
    );

    let text = pipeline::generate(&program, options)?;

    match output {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).into_diagnostic()?;
            }
            fs::write(&path, text).into_diagnostic()?;
            info!(output = %path.display(), "wrote verification conditions");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).into_diagnostic()?;
            stdout.flush().into_diagnostic()?;
        }
    }
    Ok(())
}
