//! POMDP Value Iteration - command-line front end
//!
//! Loads an explicit POMDP model and a solver configuration, runs point-based
//! value iteration and reports the value and best action at a belief.
//! Payloads go to stdout; logs and errors go to stderr.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use pv_common::{Error, ErrorCategory, OutputFormat, StructuredError};
use pv_config::validate::{validate_solver_config, ValidationError};
use pv_config::{load_config, ConfigError, ConfigSnapshot, ResolvedConfig, CONFIG_SCHEMA_VERSION};
use pv_core::exit_codes::ExitCode;
use pv_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use pv_core::model::{ExplicitPomdp, Pomdp};
use pv_core::solver::{PolicyGraph, Solution, Termination, ValueIteration};
use pv_math::{AlphaMatrix, AlphaVector, Belief, Direction};
use serde::Serialize;

/// POMDP Value Iteration - exact point-based backups over alpha-vectors
#[derive(Parser)]
#[command(name = "pv-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run value iteration and query the result at a belief
    Solve(SolveArgs),

    /// Validate a model and solver configuration without solving
    Check(CheckArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Model file (JSON)
    #[arg(long)]
    model: PathBuf,

    /// Solver configuration file (overrides PV_SOLVER_CONFIG and XDG lookup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Belief to query, comma separated (default: model's initial belief, else uniform)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    belief: Vec<f64>,

    /// Objective weights for multi-objective queries (default: equal weights)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    weights: Vec<f64>,

    /// Back up alpha-matrices, one column per objective
    #[arg(long)]
    multi_objective: bool,

    /// Query the minimum instead of the maximum
    #[arg(long)]
    min: bool,

    /// Override max_stages from the configuration
    #[arg(long)]
    max_stages: Option<u32>,

    /// Override tolerance from the configuration
    #[arg(long)]
    tolerance: Option<f64>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Model file (JSON)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Solver configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    let exit_code = match &cli.command {
        Commands::Solve(args) => run_solve(&cli.global, args, ctx),
        Commands::Check(args) => run_check(&cli.global, args, ctx),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Converged
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Serialize)]
struct ModelSummary {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    states: usize,
    actions: usize,
    observations: usize,
    objectives: usize,
    discount: f64,
}

impl ModelSummary {
    fn new(path: &Path, model: &ExplicitPomdp) -> Self {
        Self {
            path: path.display().to_string(),
            name: model.name().map(str::to_string),
            states: model.num_states(),
            actions: model.num_actions(),
            observations: model.num_observations(),
            objectives: model.num_objectives(),
            discount: model.discount(),
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryResult {
    belief: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weights: Option<Vec<f64>>,
    direction: Direction,
    value: f64,
    best_action: usize,
}

#[derive(Debug, Serialize)]
struct GraphSummary {
    nodes: usize,
    exact: bool,
    start_node: usize,
}

#[derive(Debug, Serialize)]
struct SolveReport {
    schema_version: &'static str,
    run_id: String,
    generated_at: String,
    status: &'static str,
    model: ModelSummary,
    config: ConfigSnapshot,
    termination: Termination,
    stages: u32,
    final_residual: Option<f64>,
    residuals: Vec<f64>,
    elapsed_ms: u64,
    value_function_size: usize,
    query: QueryResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy_graph: Option<GraphSummary>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    schema_version: &'static str,
    run_id: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelSummary>,
    config: ConfigSnapshot,
}

// ============================================================================
// Commands
// ============================================================================

fn run_solve(global: &GlobalOpts, args: &SolveArgs, ctx: LogContext) -> ExitCode {
    let ctx = ctx.with_model(args.model.display().to_string());
    pv_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "solve started");

    match solve(args, &ctx) {
        Ok(report) => {
            let code = if report.termination.is_converged() {
                ExitCode::Converged
            } else {
                ExitCode::BudgetExhausted
            };
            pv_core::log_event!(
                ctx,
                INFO,
                event_names::RUN_FINISHED,
                Stage::Converged,
                "solve finished",
                exit_code = code.as_i32()
            );
            print_solve_report(global, &report);
            code
        }
        Err(err) => output_error(global, &ctx, &err),
    }
}

fn solve(args: &SolveArgs, ctx: &LogContext) -> Result<SolveReport, Error> {
    let resolved = load_solver_config(args.config.as_deref(), args.max_stages, args.tolerance, ctx)?;
    let model = ExplicitPomdp::from_file(&args.model)?;
    pv_core::log_event!(
        ctx,
        INFO,
        event_names::MODEL_LOADED,
        Stage::Init,
        "model loaded",
        states = model.num_states(),
        actions = model.num_actions(),
        observations = model.num_observations()
    );

    let belief = query_belief(&args.belief, &model)?;
    let direction = Direction::from_is_min(args.min);

    let (outcome, query, policy_graph) = if args.multi_objective {
        if args.min {
            return Err(Error::InvalidQuery(
                "--min is not supported with --multi-objective".to_string(),
            ));
        }
        let weights = if args.weights.is_empty() {
            let k = model.num_objectives();
            vec![1.0 / k as f64; k]
        } else {
            args.weights.clone()
        };
        let vi = ValueIteration::<_, AlphaMatrix>::new(&model, resolved.solver.clone())?;
        let solution = vi.solve()?;
        let value = solution.value(&belief, &weights)?;
        let best_action = solution.best_action(&belief, &weights)?;
        let graph = if solution.policy_graph_tracked {
            let graph = PolicyGraph::from_solution(&solution)?;
            Some(GraphSummary {
                nodes: graph.len(),
                exact: graph.is_exact(),
                start_node: graph.start_node(&belief, &weights)?,
            })
        } else {
            None
        };
        let query = QueryResult {
            belief: belief.probs().to_vec(),
            weights: Some(weights),
            direction,
            value,
            best_action,
        };
        (Outcome::of(&solution), query, graph)
    } else {
        if !args.weights.is_empty() {
            return Err(Error::InvalidQuery(
                "--weights requires --multi-objective".to_string(),
            ));
        }
        let vi = ValueIteration::<_, AlphaVector>::new(&model, resolved.solver.clone())?;
        let solution = vi.solve()?;
        let value = solution.value_in(&belief, direction)?;
        let start = solution.best_index(&belief, direction)?;
        let best_action = solution.best_action_in(&belief, direction)?;
        let graph = if solution.policy_graph_tracked {
            let graph = PolicyGraph::from_solution(&solution)?;
            Some(GraphSummary {
                nodes: graph.len(),
                exact: graph.is_exact(),
                start_node: start,
            })
        } else {
            None
        };
        let query = QueryResult {
            belief: belief.probs().to_vec(),
            weights: None,
            direction,
            value,
            best_action,
        };
        (Outcome::of(&solution), query, graph)
    };

    pv_core::log_event!(
        ctx,
        INFO,
        event_names::QUERY_ANSWERED,
        Stage::Query,
        "query answered",
        value = query.value,
        best_action = query.best_action
    );

    Ok(SolveReport {
        schema_version: CONFIG_SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        status: "ok",
        model: ModelSummary::new(&args.model, &model),
        config: resolved.snapshot(),
        termination: outcome.termination,
        stages: outcome.stages,
        final_residual: outcome.residuals.last().copied(),
        residuals: outcome.residuals,
        elapsed_ms: outcome.elapsed_ms,
        value_function_size: outcome.size,
        query,
        policy_graph,
    })
}

/// Element-independent part of a solution.
struct Outcome {
    termination: Termination,
    stages: u32,
    residuals: Vec<f64>,
    elapsed_ms: u64,
    size: usize,
}

impl Outcome {
    fn of<M: Pomdp + ?Sized, E>(solution: &Solution<'_, M, E>) -> Self {
        Self {
            termination: solution.termination,
            stages: solution.stages,
            residuals: solution.residuals.clone(),
            elapsed_ms: solution.elapsed.as_millis() as u64,
            size: solution.values.len(),
        }
    }
}

fn run_check(global: &GlobalOpts, args: &CheckArgs, ctx: LogContext) -> ExitCode {
    let result = (|| -> Result<CheckReport, Error> {
        let resolved = load_solver_config(args.config.as_deref(), None, None, &ctx)?;
        let model = match &args.model {
            Some(path) => {
                let model = ExplicitPomdp::from_file(path)?;
                check_probes(&resolved, &model)?;
                Some(ModelSummary::new(path, &model))
            }
            None => None,
        };
        Ok(CheckReport {
            schema_version: CONFIG_SCHEMA_VERSION,
            run_id: ctx.run_id.clone(),
            status: "ok",
            model,
            config: resolved.snapshot(),
        })
    })();

    match result {
        Ok(report) => {
            match global.format {
                OutputFormat::Json => print_json(&report),
                OutputFormat::Summary => {
                    let model = report
                        .model
                        .as_ref()
                        .map(|m| format!("model {} ok ({} states), ", m.path, m.states))
                        .unwrap_or_default();
                    println!("[{}] {}config ok ({})", report.run_id, model, report.config.source);
                }
                OutputFormat::Md => {
                    println!("# Check Passed");
                    println!();
                    if let Some(m) = &report.model {
                        println!(
                            "- Model: `{}` ({} states, {} actions, {} observations, {} objectives)",
                            m.path, m.states, m.actions, m.observations, m.objectives
                        );
                    }
                    println!("- Config source: {}", report.config.source);
                }
            }
            ExitCode::Converged
        }
        Err(err) => output_error(global, &ctx, &err),
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": CONFIG_SCHEMA_VERSION,
        "pv_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => print_json(&version_info),
        _ => {
            println!("pv-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", CONFIG_SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Load solver.json and apply CLI overrides, re-validating the result.
fn load_solver_config(
    path: Option<&Path>,
    max_stages: Option<u32>,
    tolerance: Option<f64>,
    ctx: &LogContext,
) -> Result<ResolvedConfig, Error> {
    let mut resolved = load_config(path).map_err(config_error)?;
    match &resolved.path {
        Some(p) => pv_core::log_event!(
            ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "solver config loaded",
            path = tracing::field::display(p.display()),
            source = tracing::field::display(resolved.source)
        ),
        None => pv_core::log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "using built-in solver config"
        ),
    }

    if let Some(n) = max_stages {
        resolved.solver.max_stages = n;
    }
    if let Some(t) = tolerance {
        resolved.solver.tolerance = t;
    }
    validate_solver_config(&resolved.solver)
        .map_err(|e| config_error(ConfigError::Validation(e)))?;
    Ok(resolved)
}

fn config_error(err: ConfigError) -> Error {
    match err {
        ConfigError::Validation(ValidationError::VersionMismatch { expected, actual }) => {
            Error::SchemaVersion { expected, actual }
        }
        ConfigError::Validation(v) => Error::InvalidSolverConfig(v.to_string()),
        other => Error::Config(other.to_string()),
    }
}

fn check_probes(resolved: &ResolvedConfig, model: &ExplicitPomdp) -> Result<(), Error> {
    let ns = model.num_states();
    match resolved.solver.probe_beliefs.iter().position(|p| p.len() != ns) {
        Some(i) => Err(Error::InvalidSolverConfig(format!(
            "probe_beliefs[{}] has {} entries, model has {} states",
            i,
            resolved.solver.probe_beliefs[i].len(),
            ns
        ))),
        None => Ok(()),
    }
}

fn query_belief(raw: &[f64], model: &ExplicitPomdp) -> Result<Belief, Error> {
    let ns = model.num_states();
    if raw.is_empty() {
        return Ok(model
            .initial_belief()
            .cloned()
            .unwrap_or_else(|| Belief::uniform(ns)));
    }
    if raw.len() != ns {
        return Err(Error::InvalidQuery(format!(
            "belief has {} entries, model has {} states",
            raw.len(),
            ns
        )));
    }
    Belief::new(raw.to_vec()).map_err(|e| Error::InvalidQuery(e.to_string()))
}

fn exit_code_for(err: &Error) -> ExitCode {
    match err.category() {
        ErrorCategory::Config => ExitCode::ConfigError,
        ErrorCategory::Model => ExitCode::ModelError,
        ErrorCategory::Solver => match err {
            Error::InvalidQuery(_) | Error::NoFeasibleAction | Error::PolicyGraphUnavailable => {
                ExitCode::ArgsError
            }
            _ => ExitCode::InternalError,
        },
        ErrorCategory::Io => ExitCode::InternalError,
    }
}

fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = exit_code_for(err);
    pv_core::log_event!(
        ctx,
        ERROR,
        event_names::INTERNAL_ERROR,
        Stage::Init,
        "command failed",
        code = err.code(),
        error = tracing::field::display(err)
    );

    let structured = StructuredError::from(err).with_context("run_id", &ctx.run_id);
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": CONFIG_SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": structured,
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => {
            eprintln!("[{}] {}: {}", ctx.run_id, err.headline(), err);
        }
        OutputFormat::Md => {
            eprintln!("{}", structured.to_human(err.headline()));
        }
    }

    exit_code
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn print_solve_report(global: &GlobalOpts, report: &SolveReport) {
    match global.format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Summary => {
            println!(
                "[{}] {} after {} stages: {} value {:.6} at {:?}, action {} (|V| = {})",
                report.run_id,
                report.termination,
                report.stages,
                report.query.direction,
                report.query.value,
                report.query.belief,
                report.query.best_action,
                report.value_function_size
            );
        }
        OutputFormat::Md => {
            println!("# Value Iteration Result");
            println!();
            println!("| Field | Value |");
            println!("|---|---|");
            println!("| Model | `{}` |", report.model.path);
            println!("| Termination | {} |", report.termination);
            println!("| Stages | {} |", report.stages);
            if let Some(r) = report.final_residual {
                println!("| Final residual | {:.3e} |", r);
            }
            println!("| Value-function size | {} |", report.value_function_size);
            println!("| Belief | {:?} |", report.query.belief);
            if let Some(w) = &report.query.weights {
                println!("| Weights | {:?} |", w);
            }
            println!("| Value ({}) | {:.6} |", report.query.direction, report.query.value);
            println!("| Best action | {} |", report.query.best_action);
            if let Some(g) = &report.policy_graph {
                println!(
                    "| Policy graph | {} nodes, start {}{} |",
                    g.nodes,
                    g.start_node,
                    if g.exact { "" } else { ", approximate successors" }
                );
            }
        }
    }
}
