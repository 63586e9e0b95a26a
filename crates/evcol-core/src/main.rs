//! evcol CLI: convert event dumps to columnar artifacts.

use clap::{Args, Parser, Subcommand};
use evcol_config::{
    resolve_config, validate, ConfigError, ConfigOverrides, PipelineConfig, ResolvedConfig,
    UnderflowPolicy,
};
use evcol_core::exit_codes::ExitCode;
use evcol_core::logging::{init_logging, LogFormat};
use evcol_core::pipeline::run_pipeline;
use evcol_core::triggers::extract_trigger_timestamps;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "evcol", version, about = "Pack event-camera streams into compressed columns")]
struct Cli {
    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an event stream to a columnar artifact
    Convert(ConvertArgs),
    /// Extract external trigger timestamps of one polarity
    Triggers(TriggerArgs),
    /// Print row count, row groups and per-column compression of an artifact
    Inspect {
        /// Artifact to inspect
        path: PathBuf,
    },
    /// Show, validate or describe the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug)]
struct ConfigArg {
    /// Config file (default: $EVCOL_CONFIG, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration as JSON
    Show(ConfigArg),
    /// Validate the resolved configuration
    Validate(ConfigArg),
    /// Print the JSON schema of the config file
    Schema,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input event dump (`x,y,p,t` per line)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Output artifact path
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArg,

    /// Subtracted from every x coordinate
    #[arg(long, allow_negative_numbers = true)]
    x_offset: Option<i64>,

    /// Subtracted from every y coordinate
    #[arg(long, allow_negative_numbers = true)]
    y_offset: Option<i64>,

    /// Initial buffer size and growth increment, in events
    #[arg(long)]
    capacity_hint: Option<usize>,

    /// Out-of-range coordinate handling (wrap, clamp, reject)
    #[arg(long)]
    underflow: Option<UnderflowPolicy>,

    /// First timestamp to read
    #[arg(long)]
    start_ts: Option<i64>,

    /// Window width per batch
    #[arg(long)]
    delta_t: Option<i64>,

    /// Total time span to read
    #[arg(long)]
    max_duration: Option<i64>,

    /// zstd level for column chunks
    #[arg(long)]
    compression_level: Option<i32>,
}

#[derive(Args, Debug)]
struct TriggerArgs {
    /// Trigger dump (`p,t` per line)
    #[arg(long, short)]
    input: PathBuf,

    /// Output text file, one timestamp per line
    #[arg(long, short)]
    output: PathBuf,

    /// Edge to keep: 0, 1 or all
    #[arg(long, default_value = "0", value_parser = parse_polarity)]
    polarity: PolarityFilter,
}

#[derive(Debug, Clone, Copy)]
struct PolarityFilter(Option<u8>);

fn parse_polarity(s: &str) -> Result<PolarityFilter, String> {
    match s {
        "0" => Ok(PolarityFilter(Some(0))),
        "1" => Ok(PolarityFilter(Some(1))),
        "all" => Ok(PolarityFilter(None)),
        other => Err(format!("expected 0, 1 or all, got '{other}'")),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);
    let code = run(cli);
    std::process::exit(code.as_i32());
}

fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Convert(args) => cmd_convert(args),
        Commands::Triggers(args) => cmd_triggers(args),
        Commands::Inspect { path } => match evcol_store::inspect(&path) {
            Ok(info) => print_json(&info),
            Err(err) => fail(ExitCode::IoError, &err),
        },
        Commands::Config { command } => cmd_config(command),
    }
}

fn cmd_convert(args: ConvertArgs) -> ExitCode {
    let overrides = ConfigOverrides {
        config_path: args.config.config,
        input: args.input,
        output: args.output,
        x_offset: args.x_offset,
        y_offset: args.y_offset,
        capacity_hint: args.capacity_hint,
        underflow: args.underflow,
        start_ts: args.start_ts,
        delta_t: args.delta_t,
        max_duration: args.max_duration,
        compression_level: args.compression_level,
    };
    let resolved = match resolve_config(&overrides) {
        Ok(resolved) => resolved,
        Err(err) => return fail(ExitCode::ConfigError, &err),
    };

    match run_pipeline(&resolved.config) {
        Ok(report) => print_json(&report),
        Err(err) => fail(ExitCode::from(&err), &err),
    }
}

fn cmd_triggers(args: TriggerArgs) -> ExitCode {
    match extract_trigger_timestamps(&args.input, &args.output, args.polarity.0) {
        Ok(summary) => print_json(&summary),
        Err(err) => fail(ExitCode::IoError, &err),
    }
}

fn cmd_config(command: ConfigCommands) -> ExitCode {
    match command {
        ConfigCommands::Schema => print_json(&schemars::schema_for!(PipelineConfig)),
        ConfigCommands::Show(arg) => match resolve_from(arg) {
            Ok(resolved) => print_json(&resolved),
            Err(err) => fail(ExitCode::ConfigError, &err),
        },
        ConfigCommands::Validate(arg) => {
            let resolved = match resolve_from(arg) {
                Ok(resolved) => resolved,
                Err(err) => return fail(ExitCode::ConfigError, &err),
            };
            let result = validate(&resolved.config);
            #[derive(Serialize)]
            struct Report<'a> {
                valid: bool,
                #[serde(flatten)]
                result: &'a evcol_config::ValidationResult,
            }
            let code = print_json(&Report {
                valid: result.is_ok(),
                result: &result,
            });
            if result.is_ok() {
                code
            } else {
                ExitCode::ConfigError
            }
        }
    }
}

fn resolve_from(arg: ConfigArg) -> Result<ResolvedConfig, ConfigError> {
    resolve_config(&ConfigOverrides {
        config_path: arg.config,
        ..Default::default()
    })
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::Clean
        }
        Err(err) => fail(ExitCode::InternalError, &err),
    }
}

fn fail(code: ExitCode, err: &dyn std::error::Error) -> ExitCode {
    tracing::error!(code = code.as_i32(), "{err}");
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    eprintln!("error: {message}");
    code
}
