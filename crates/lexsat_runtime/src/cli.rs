//! Command-line options and the run loop behind the `lexsat` binary.

use std::path::PathBuf;

use lexsat_engine::{Orchestrator, RuleMode, SolveConfig};
use lexsat_language::ConstraintProblem;
use tracing::info;

use crate::error::{RuntimeError, RuntimeResult};
use crate::loader::{load_case, load_rules};
use crate::report::{Report, render_json, render_text};

/// Options parsed from the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Rule extractor output.
    pub rules: Option<PathBuf>,
    /// Case documents to solve against the rules.
    pub cases: Vec<PathBuf>,
    /// TOML solve configuration.
    pub config: Option<PathBuf>,
    /// Render reports as JSON.
    pub json: bool,
    /// Force enforce mode regardless of configuration.
    pub enforce: bool,
    /// Print SMT-LIB instead of solving.
    pub emit_smt: bool,
    /// `-v` count.
    pub verbosity: u8,
    /// Print help and exit.
    pub show_help: bool,
    /// Print version and exit.
    pub show_version: bool,
}

/// What a run asks for once options are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Print usage.
    Help,
    /// Print the version.
    Version,
    /// Solve or render the given cases.
    Run,
}

impl CliOptions {
    /// Parses arguments, excluding the program name.
    ///
    /// # Errors
    /// Returns `Usage` for unknown options or missing option values.
    pub fn parse<I, S>(args: I) -> RuntimeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => options.show_help = true,
                "-V" | "--version" => options.show_version = true,
                "-j" | "--json" => options.json = true,
                "--enforce" => options.enforce = true,
                "--emit-smt" => options.emit_smt = true,
                "-v" | "--verbose" => options.verbosity = options.verbosity.saturating_add(1),
                "-vv" => options.verbosity = options.verbosity.saturating_add(2),
                "-r" | "--rules" => options.rules = Some(required_value(&mut args, &arg)?),
                "-c" | "--config" => options.config = Some(required_value(&mut args, &arg)?),
                flag if flag.starts_with('-') => {
                    return Err(RuntimeError::Usage(format!("unknown option: {flag}")));
                }
                _ => options.cases.push(PathBuf::from(&arg)),
            }
        }

        Ok(options)
    }

    /// The action these options select.
    ///
    /// # Errors
    /// Returns `Usage` when a run is missing its rules or case files.
    pub fn action(&self) -> RuntimeResult<Action> {
        if self.show_help {
            return Ok(Action::Help);
        }
        if self.show_version {
            return Ok(Action::Version);
        }
        if self.rules.is_none() {
            return Err(RuntimeError::Usage("--rules is required".into()));
        }
        if self.cases.is_empty() {
            return Err(RuntimeError::Usage("at least one case file is required".into()));
        }
        Ok(Action::Run)
    }

    /// The solve configuration: the config file if given, then flag overrides.
    ///
    /// # Errors
    /// Returns `Config` if the file cannot be loaded.
    pub fn solve_config(&self) -> RuntimeResult<SolveConfig> {
        let mut config = match &self.config {
            Some(path) => SolveConfig::load(path)?,
            None => SolveConfig::default(),
        };
        if self.enforce {
            config = config.with_rule_mode(RuleMode::Enforce);
        }
        Ok(config)
    }
}

fn required_value(args: &mut impl Iterator<Item = String>, flag: &str) -> RuntimeResult<PathBuf> {
    args.next()
        .map(PathBuf::from)
        .ok_or_else(|| RuntimeError::Usage(format!("{flag} requires a value")))
}

/// Loads, solves and renders every case; returns the text for stdout.
///
/// # Errors
/// Returns the first load, config or compile error. Per-case compile errors
/// abort the run with the case path in the message.
pub fn run(options: &CliOptions) -> RuntimeResult<String> {
    let rules_path = options
        .rules
        .as_ref()
        .ok_or_else(|| RuntimeError::Usage("--rules is required".into()))?;
    let config = options.solve_config()?;
    let records = load_rules(rules_path)?;

    let problems = options
        .cases
        .iter()
        .map(|path| -> RuntimeResult<ConstraintProblem> {
            let case = load_case(path)?;
            ConstraintProblem::from_documents(&records, case)
                .map_err(|e| RuntimeError::from(e.in_rule(path.display().to_string())))
        })
        .collect::<RuntimeResult<Vec<_>>>()?;

    let orchestrator = Orchestrator::new(config);

    if options.emit_smt {
        let mut out = String::new();
        for (path, problem) in options.cases.iter().zip(&problems) {
            out.push_str(&format!("; {}\n", path.display()));
            out.push_str(&orchestrator.emit_smt(problem)?);
        }
        return Ok(out);
    }

    info!(cases = problems.len(), "solving cases");
    let reports = options
        .cases
        .iter()
        .zip(orchestrator.solve_batch(&problems)?)
        .map(|(path, result)| {
            result
                .map(|r| Report::new(path.display().to_string(), r))
                .map_err(|e| RuntimeError::from(e.in_rule(path.display().to_string())))
        })
        .collect::<RuntimeResult<Vec<_>>>()?;

    if options.json {
        render_json(&reports).map(|json| json + "\n")
    } else {
        Ok(render_text(&reports))
    }
}

/// Usage text.
#[must_use]
pub fn help_text() -> String {
    format!(
        "lexsat {version} - Compile legal rules to SMT and explain the verdict

USAGE:
    lexsat --rules RULES.json [OPTIONS] CASE.json...

OPTIONS:
    -r, --rules FILE     Rule extractor output (JSON array of constraint specs)
    -c, --config FILE    Solve configuration (TOML)
    -j, --json           Print reports as JSON
        --enforce        Assert that every rule holds
        --emit-smt       Print the SMT-LIB assertion set instead of solving
    -v, --verbose        More logging on stderr (repeatable)
    -h, --help           Print help information
    -V, --version        Print version information

Logging honours RUST_LOG when no -v is given.",
        version = env!("CARGO_PKG_VERSION")
    )
}
