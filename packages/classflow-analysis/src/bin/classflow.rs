/*
 * classflow CLI
 *
 * Analyzes one (method, inputs) case from a JSON bytecode fixture.
 *
 * Usage:
 *   classflow --bytecode program.json --method cases.Simple.divideByZero --inputs '[{"int": 0}]'
 *   classflow --bytecode program.json --method app.Db.lookup --mode taint --format json
 *
 * Exit code 0 on successful analysis (budget exhaustion included), 2 on
 * configuration errors or malformed input.
 */

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use classflow_analysis::{
    analyze, AnalysisConfig, AnalysisError, AnalysisMode, BytecodeStore, InputValue,
    JsonBytecodeSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "classflow", version, about = "Abstract interpreter for a class-file dialect")]
struct Cli {
    /// Bytecode fixture file (JSON)
    #[arg(long, short = 'b')]
    bytecode: PathBuf,

    /// Method to analyze: full signature or qualified `Class.name`
    #[arg(long, short = 'm')]
    method: String,

    /// Invocation inputs as a JSON array, e.g. '[{"int": 0}, {"boolean": true}]'
    #[arg(long, short = 'i', default_value = "[]")]
    inputs: String,

    /// Value domain; overrides the configuration file
    #[arg(long, value_enum)]
    mode: Option<AnalysisMode>,

    /// YAML configuration file (mode, step budget, taint policy)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Fixpoint round budget; overrides the configuration file
    #[arg(long)]
    budget: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("classflow: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> classflow_analysis::Result<String> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(budget) = cli.budget {
        config.step_budget = budget;
    }
    config.validate()?;

    let source = JsonBytecodeSource::from_file(&cli.bytecode)?;
    let method = source.resolve(&cli.method).ok_or_else(|| {
        AnalysisError::bytecode(format!("method {} not found in fixture", cli.method))
    })?;
    let inputs: Vec<InputValue> = serde_json::from_str(&cli.inputs)
        .map_err(|e| AnalysisError::Config(format!("bad --inputs value: {e}")))?;

    let store = BytecodeStore::new(Box::new(source));
    let summary = analyze(&store, &config, &method, &inputs)?;

    Ok(match cli.format {
        OutputFormat::Text => summary.text,
        OutputFormat::Json => serde_json::to_string_pretty(&summary.json)?,
    })
}
