use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use query_flags_core::{
    CheckReport, FlagRegistry, OutputFormat, format_check_report, format_registry,
    parse_query_flags,
};
use tracing::{debug, info};

const STDIN_ORIGIN: &str = "<stdin>";

#[derive(Debug, Parser)]
#[command(name = "query-flags")]
#[command(about = "Check query script directives and list recognized flags")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. debug, query_flags_core=trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a script's directives and print the resulting flags.
    Check(CheckArgs),
    /// List the flags a registry recognizes.
    Flags(FlagsArgs),
}

#[derive(Debug, Args)]
struct RegistryArgs {
    /// YAML registry file (defaults to the built-in registry).
    #[arg(long)]
    registry: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Script to check; reads stdin when omitted or `-`.
    input: Option<PathBuf>,
    #[command(flatten)]
    registry: RegistryArgs,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct FlagsArgs {
    #[command(flatten)]
    registry: RegistryArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.parse().unwrap_or_default()),
        )
        .init();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Flags(args) => run_flags(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let registry = load_registry(&args.registry)?;
    let (origin, script) = read_script(args.input.as_deref())?;
    debug!(origin = %origin, bytes = script.len(), "Checking script");

    match parse_query_flags(&script, &registry) {
        Ok(flags) => {
            info!(origin = %origin, flags = flags.len(), "Directives accepted");
            let report = CheckReport::new(&flags, &registry);
            let raw = format_check_report(&report, args.format)?;
            print!("{}", ensure_trailing_newline(raw));
            Ok(())
        }
        Err(err) => {
            eprint!("{}", err.render(&origin));
            Err(format!("'{origin}' contains an invalid query directive"))
        }
    }
}

fn run_flags(args: FlagsArgs) -> Result<(), String> {
    let registry = load_registry(&args.registry)?;
    let raw = format_registry(&registry, args.format)?;
    print!("{}", ensure_trailing_newline(raw));
    Ok(())
}

fn load_registry(args: &RegistryArgs) -> Result<FlagRegistry, String> {
    match &args.registry {
        Some(path) => {
            debug!(path = %path.display(), "Loading flag registry");
            FlagRegistry::load(path)
                .map_err(|err| format!("Failed to load registry '{}': {err}", path.display()))
        }
        None => Ok(FlagRegistry::standard().clone()),
    }
}

fn read_script(input: Option<&Path>) -> Result<(String, String), String> {
    match input {
        Some(path) if path != Path::new("-") => {
            let script = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
            Ok((path.display().to_string(), script))
        }
        _ => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok((STDIN_ORIGIN.to_string(), script))
        }
    }
}

fn ensure_trailing_newline(mut raw: String) -> String {
    if !raw.ends_with('\n') {
        raw.push('\n');
    }
    raw
}
