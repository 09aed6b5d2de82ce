#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

pub const CONFIG_FILE: &str = "tlv.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(tlv::config))]
pub struct ConfigError {
    pub message: String,
}

/// Settings read from `tlv.toml`, before command-line overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config_path: Option<PathBuf>,

    /// Output file, resolved against the directory holding the config.
    pub output: Option<PathBuf>,

    pub two_traces: bool,
    pub timepoints: bool,
    pub parallel: bool,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    output: Output,

    #[serde(default)]
    semantics: SemanticsSection,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Output {
    #[serde(default)]
    file: Option<String>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SemanticsSection {
    #[serde(default)]
    two_traces: bool,

    #[serde(default)]
    timepoints: bool,

    #[serde(default)]
    parallel: bool,
}

/// Nearest `tlv.toml` in the directory of `start` or one of its ancestors.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !cur.pop() {
            return None;
        }
    }
}

/// Loads the config named by `explicit`, or the one found near `input`.
/// A missing implicit config yields defaults; a missing explicit one is an
/// error.
pub fn load_config(input: &Path, explicit: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match find_config(input) {
            Some(p) => p,
            None => return Ok(ResolvedConfig::default()),
        },
    };

    let raw = fs::read_to_string(&path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let mut resolved = parse_config(&raw, &base).map_err(|e| ConfigError {
        message: format!("failed to parse {}: {}", path.display(), e.message),
    })?;
    resolved.config_path = Some(path);
    Ok(resolved)
}

fn parse_config(raw: &str, base: &Path) -> Result<ResolvedConfig, ConfigError> {
    let parsed: ConfigFile = toml::from_str(raw).map_err(|e| ConfigError {
        message: e.to_string(),
    })?;

    Ok(ResolvedConfig {
        config_path: None,
        output: parsed.output.file.map(|f| resolve_path(base, &f)),
        two_traces: parsed.semantics.two_traces,
        timepoints: parsed.semantics.timepoints,
        parallel: parsed.semantics.parallel,
    })
}

fn resolve_path(base: &Path, p: &str) -> PathBuf {
    let pb = PathBuf::from(p);
    if pb.is_absolute() { pb } else { base.join(pb) }
}
