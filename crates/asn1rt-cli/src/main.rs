mod logging;
mod output;
mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use asn1rt_core::{Value, build_reference_graph_report};
use asn1rt_eval::{
    ConstraintViolation, collect_batch_metrics, render_report, validate, validate_all,
};
use asn1rt_generate::{GenerationError, TestCaseGenerator, TestCaseOptions, initialize};
use asn1rt_plan::{LoadedModel, PlanError, load_model_file, model_json_schema, plan_json_schema};
use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::info;

use logging::init_logging;
use output::{print_json, write_bytes_atomic, write_json_atomic};
use settings::{CliSettings, SETTINGS_FILE, load_settings};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Model(#[from] asn1rt_core::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("instance rejected: {0}")]
    Rejected(ConstraintViolation),
    #[error("{failed} of {instances} instance(s) rejected")]
    BatchRejected { failed: u64, instances: u64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "asn1rt",
    version,
    about = "Validation plans, default instances and test cases for ASN.1 type models"
)]
struct Cli {
    /// Settings file with defaults for the flags below.
    #[arg(long, global = true, default_value = SETTINGS_FILE)]
    config: PathBuf,
    /// Log filter, e.g. `debug` or `asn1rt_plan=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,
    /// Also append JSON logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a model and report structural and semantic issues.
    Check(ModelArgs),
    /// Print the validation plan of a type.
    Plan(PlanArgs),
    /// Print the default instance of a type.
    Init(TypeArgs),
    /// Validate instances of a type.
    Validate(ValidateArgs),
    /// Generate random valid instances of a type.
    Testcases(TestcasesArgs),
    /// Print a JSON Schema.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Path to a `*.model.json` file.
    model: PathBuf,
}

#[derive(Args, Debug)]
struct TypeArgs {
    /// Path to a `*.model.json` file.
    model: PathBuf,
    /// Type assignment name.
    #[arg(value_name = "TYPE")]
    type_name: String,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    target: TypeArgs,
    /// Write the plan here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    target: TypeArgs,
    /// JSON instance, or a JSON array of instances with `--batch`.
    instance: PathBuf,
    /// Treat the instance file as an array of instances.
    #[arg(long, default_value_t = false)]
    batch: bool,
    /// Report every violation instead of the first one.
    #[arg(long, default_value_t = false)]
    all: bool,
    /// Write a markdown report (batch mode).
    #[arg(long)]
    report: Option<PathBuf>,
    /// Write batch metrics JSON here instead of stdout.
    #[arg(long)]
    metrics: Option<PathBuf>,
    /// Violations listed in the report.
    #[arg(long, default_value_t = 20)]
    max_examples: usize,
}

#[derive(Args, Debug)]
struct TestcasesArgs {
    #[command(flatten)]
    target: TypeArgs,
    /// Number of cases.
    #[arg(long)]
    count: Option<u64>,
    /// Base seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Upper bound for generated lengths.
    #[arg(long)]
    max_collection_len: Option<u64>,
    /// Write the cases here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Which document to describe.
    #[arg(value_enum, default_value_t = SchemaKind::Model)]
    kind: SchemaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SchemaKind {
    Model,
    Plan,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(&cli.config)?;
    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    let log_file = cli.log_file.as_deref().or(settings.log_file.as_deref());
    init_logging(level, cli.log_json || settings.log_json, log_file)?;

    match cli.command {
        Command::Check(args) => run_check(&args),
        Command::Plan(args) => run_plan(&args),
        Command::Init(args) => run_init(&args),
        Command::Validate(args) => run_validate(&args),
        Command::Testcases(args) => run_testcases(&args, &settings),
        Command::Schema(args) => run_schema(&args),
    }
}

fn load(path: &Path) -> Result<LoadedModel, CliError> {
    load_model_file(path).map_err(|err| {
        if let PlanError::Rejected(report) = &err {
            for issue in report.errors.iter().chain(&report.warnings) {
                eprintln!("{issue}");
            }
        }
        err.into()
    })
}

fn run_check(args: &ModelArgs) -> Result<(), CliError> {
    let loaded = load(&args.model)?;
    let module = loaded.compiled.module();
    let graph = build_reference_graph_report(module);

    println!(
        "module {}: {} type(s), {} reference(s), {} warning(s)",
        module.name,
        graph.summary.nodes,
        graph.summary.edges,
        loaded.warnings.len()
    );
    // Loading rejects cycles, so the order always exists.
    let order = graph.dependency_order.unwrap_or_default();
    for type_name in &order {
        let plan = loaded.compiled.require_plan(type_name)?;
        println!(
            "  {}: {} check(s), root id {}",
            type_name,
            plan.len(),
            plan.root_id
        );
    }
    Ok(())
}

fn run_plan(args: &PlanArgs) -> Result<(), CliError> {
    let loaded = load(&args.target.model)?;
    let plan = loaded.compiled.require_plan(&args.target.type_name)?;
    match &args.out {
        Some(path) => {
            write_json_atomic(path, plan)?;
            info!(path = %path.display(), checks = plan.len(), "plan written");
        }
        None => print_json(plan)?,
    }
    Ok(())
}

fn run_init(args: &TypeArgs) -> Result<(), CliError> {
    let loaded = load(&args.model)?;
    let module = loaded.compiled.module();
    let node = loaded.compiled.type_node(&args.type_name)?;
    let value = initialize(module, node)?;
    print_json(&value.to_json(module, node)?)
}

fn run_validate(args: &ValidateArgs) -> Result<(), CliError> {
    let loaded = load(&args.target.model)?;
    let module = loaded.compiled.module();
    let node = loaded.compiled.type_node(&args.target.type_name)?;
    let plan = loaded.compiled.require_plan(&args.target.type_name)?;

    let content = std::fs::read_to_string(&args.instance)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;

    if !args.batch {
        let value = Value::from_json(module, node, &json)?;
        if args.all {
            let violations = validate_all(plan, &value);
            for violation in &violations {
                println!("{violation}");
            }
            if let Some(first) = violations.into_iter().next() {
                return Err(CliError::Rejected(first));
            }
        } else {
            validate(plan, &value).map_err(CliError::Rejected)?;
        }
        println!("valid");
        return Ok(());
    }

    let items = json.as_array().ok_or_else(|| {
        CliError::InvalidConfig("--batch expects a JSON array of instances".to_string())
    })?;
    let values = items
        .iter()
        .map(|item| Value::from_json(module, node, item))
        .collect::<Result<Vec<_>, _>>()?;

    let (metrics, violations) = collect_batch_metrics(plan, &values);
    info!(
        type_name = %plan.type_name,
        instances = metrics.instances,
        failed = metrics.failed,
        "batch validated"
    );

    match &args.metrics {
        Some(path) => write_json_atomic(path, &metrics)?,
        None => print_json(&metrics)?,
    }
    if let Some(path) = &args.report {
        let report = render_report(&metrics, &violations, args.max_examples);
        write_bytes_atomic(path, report.as_bytes())?;
        info!(path = %path.display(), "report written");
    }

    if metrics.failed > 0 {
        return Err(CliError::BatchRejected {
            failed: metrics.failed,
            instances: metrics.instances,
        });
    }
    Ok(())
}

fn run_testcases(args: &TestcasesArgs, settings: &CliSettings) -> Result<(), CliError> {
    let loaded = load(&args.target.model)?;
    let options = TestCaseOptions {
        seed: args.seed.unwrap_or(settings.testcase_seed),
        max_collection_len: args
            .max_collection_len
            .unwrap_or(settings.max_collection_len),
        ..TestCaseOptions::default()
    };
    let count = args.count.unwrap_or(settings.testcase_count);

    let generator = TestCaseGenerator::new(loaded.compiled.module(), options)?;
    let report = generator.report(&args.target.type_name, count)?;
    match &args.out {
        Some(path) => {
            write_json_atomic(path, &report)?;
            info!(path = %path.display(), count, "test cases written");
        }
        None => print_json(&report)?,
    }
    Ok(())
}

fn run_schema(args: &SchemaArgs) -> Result<(), CliError> {
    match args.kind {
        SchemaKind::Model => print_json(&model_json_schema()),
        SchemaKind::Plan => print_json(&plan_json_schema()),
    }
}
