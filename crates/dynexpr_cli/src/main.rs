//! dxc: Command-line front end for dynexpr.
//!
//! Usage:
//!   dxc [--config FILE] [--max-depth N] <command> ...
//!
//! Commands parse expressions and ordering clauses, materialize JSON
//! payloads into records, and evaluate expressions over them.

use clap::{Parser as ClapParser, Subcommand};
use dynexpr_ast::ParameterExpr;
use dynexpr_diagnostics::ParseError;
use dynexpr_engine::{Engine, EngineError};
use dynexpr_materializer::to_json;
use dynexpr_options::{EngineOptions, OptionOverrides};
use dynexpr_types::{Type, Value};
use miette::{Context, IntoDiagnostic, NamedSource, SourceSpan};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "dxc", about = "Parse and evaluate dynamic expressions")]
struct Cli {
    /// Engine options file (JSON).
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Maximum expression nesting depth.
    #[arg(long = "max-depth", global = true)]
    max_depth: Option<u32>,

    /// Maximum number of synthesized record types.
    #[arg(long = "max-record-types", global = true)]
    max_record_types: Option<usize>,

    /// Log filter, e.g. `debug` or `dynexpr_types=trace`. Defaults to RUST_LOG.
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an expression and print its typed tree.
    Parse {
        expression: String,
        /// Named parameter as NAME:TYPE, e.g. `x:Int32?`. Repeatable.
        #[arg(short = 'p', long = "param", value_name = "NAME:TYPE")]
        params: Vec<String>,
        /// Type of the implicit `it` parameter.
        #[arg(long)]
        it: Option<String>,
        /// Required result type.
        #[arg(short = 'r', long)]
        result: Option<String>,
    },
    /// Parse an ordering clause, or sort a JSON array of objects by it.
    Order {
        ordering: String,
        #[arg(short = 'p', long = "param", value_name = "NAME:TYPE")]
        params: Vec<String>,
        #[arg(long)]
        it: Option<String>,
        /// File holding a JSON array to sort. The element type is taken
        /// from the first element.
        #[arg(long)]
        payload: Option<PathBuf>,
    },
    /// Evaluate an expression, optionally over a JSON payload bound to `it`.
    Eval {
        expression: String,
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Materialize a JSON file and print the value and its record shape.
    Materialize { file: PathBuf },
}

/// A parse failure rendered against the expression text.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
struct ParseReport {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("{kind}")]
    span: SourceSpan,
    kind: String,
    #[help]
    help: Option<String>,
}

impl ParseReport {
    fn new(text: &str, err: &ParseError) -> Self {
        let range = err.span().to_byte_range(text);
        Self {
            message: err.message.clone(),
            src: NamedSource::new("expression", text.to_string()),
            span: (range.start, range.len()).into(),
            kind: err.kind.to_string(),
            help: Some(format!("error {} at character {}", err.code, err.offset)),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(report) = run(cli) {
        eprintln!("{:?}", report);
        process::exit(1);
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> miette::Result<()> {
    let options = load_options(&cli)?;
    let engine = Engine::new(options);

    match cli.command {
        Command::Parse {
            expression,
            params,
            it,
            result,
        } => {
            let scope = parameters(it.as_deref(), &params)?;
            run_parse(&engine, &expression, &scope, result.as_deref())
        }
        Command::Order {
            ordering,
            params,
            it,
            payload,
        } => match payload {
            Some(payload) => run_sort(&engine, &ordering, &payload),
            None => run_order(&engine, &ordering, &parameters(it.as_deref(), &params)?),
        },
        Command::Eval {
            expression,
            payload,
            json,
        } => run_eval(&engine, &expression, payload.as_deref(), json),
        Command::Materialize { file } => run_materialize(&engine, &file),
    }
}

fn load_options(cli: &Cli) -> miette::Result<EngineOptions> {
    let options = match &cli.config {
        Some(path) => dynexpr_options::parse_options_file(path).into_diagnostic()?,
        None => EngineOptions::default(),
    };
    let overrides = OptionOverrides {
        max_nesting_depth: cli.max_depth,
        max_record_types: cli.max_record_types,
        ..Default::default()
    };
    Ok(options.with_overrides(&overrides))
}

// ============================================================================
// Commands
// ============================================================================

fn run_parse(
    engine: &Engine,
    text: &str,
    parameters: &[Arc<ParameterExpr>],
    result: Option<&str>,
) -> miette::Result<()> {
    let result_type = result.map(type_named).transpose()?;
    let expr = engine
        .parse(result_type.as_ref(), text, parameters, &[])
        .map_err(|e| ParseReport::new(text, &e))?;
    println!("{}", expr);
    println!("type: {}", expr.ty);
    Ok(())
}

fn run_order(engine: &Engine, text: &str, parameters: &[Arc<ParameterExpr>]) -> miette::Result<()> {
    let orderings = engine
        .parse_ordering(parameters, text, &[])
        .map_err(|e| ParseReport::new(text, &e))?;
    for ordering in &orderings {
        let direction = if ordering.ascending { "asc" } else { "desc" };
        println!("{} {} : {}", ordering.selector, direction, ordering.selector.ty);
    }
    Ok(())
}

fn run_sort(engine: &Engine, text: &str, payload: &Path) -> miette::Result<()> {
    let node = read_json(payload)?;
    let rows = node
        .as_array()
        .ok_or_else(|| miette::miette!("{} does not hold a JSON array", payload.display()))?;
    let items = engine
        .materialize_batch(rows)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .into_diagnostic()?;
    let Some(first) = items.first() else {
        println!("[]");
        return Ok(());
    };

    let sorted = engine
        .order_by(first.type_of(), text, &items)
        .map_err(|e| engine_report(text, e))?;
    let out = serde_json::Value::Array(sorted.iter().map(to_json).collect());
    println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
    Ok(())
}

fn run_eval(engine: &Engine, text: &str, payload: Option<&Path>, json: bool) -> miette::Result<()> {
    let value = match payload {
        Some(path) => {
            let node = read_json(path)?;
            let it = engine.materialize(&node).into_diagnostic()?;
            engine.evaluate_over(text, &it, &[]).map_err(|e| engine_report(text, e))?
        }
        None => {
            let expr = engine
                .parse(None, text, &[], &[])
                .map_err(|e| ParseReport::new(text, &e))?;
            dynexpr_evaluator::evaluate_expr(&expr).into_diagnostic()?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&value)).into_diagnostic()?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_materialize(engine: &Engine, file: &Path) -> miette::Result<()> {
    let node = read_json(file)?;
    let value = engine.materialize(&node).into_diagnostic()?;
    println!("{}", value);
    if let Value::Record(record) = &value {
        for property in record.record_type().properties() {
            println!("  {}: {}", property.name, property.ty);
        }
    }
    tracing::debug!(record_types = engine.factory().len(), "materialized");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn engine_report(text: &str, err: EngineError) -> miette::Report {
    match err {
        EngineError::Parse(e) => ParseReport::new(text, &e).into(),
        other => miette::miette!("{}", other),
    }
}

fn read_json(path: &Path) -> miette::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("{} is not valid JSON", path.display()))
}

/// The implicit `it` parameter, if any, followed by the named ones.
fn parameters(it: Option<&str>, params: &[String]) -> miette::Result<Vec<Arc<ParameterExpr>>> {
    let mut parameters = Vec::with_capacity(params.len() + 1);
    if let Some(name) = it {
        parameters.push(ParameterExpr::unnamed(type_named(name)?));
    }
    for param in params {
        parameters.push(parse_param(param)?);
    }
    Ok(parameters)
}

fn type_named(name: &str) -> miette::Result<Type> {
    Type::parse_name(name.trim()).ok_or_else(|| miette::miette!("unknown type '{}'", name))
}

/// `NAME:TYPE` to a named parameter.
fn parse_param(arg: &str) -> miette::Result<Arc<ParameterExpr>> {
    let (name, ty) = arg
        .split_once(':')
        .ok_or_else(|| miette::miette!("parameter '{}' is not of the form NAME:TYPE", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(miette::miette!("parameter '{}' has no name", arg));
    }
    Ok(ParameterExpr::new(name, type_named(ty)?))
}
