mod commands;
mod helpers;

use clap::Parser;
use hkldc_core::domain::{DcError, ErrorCategory};

/// Install the stderr log subscriber; `RUST_LOG` overrides the default
/// `warn` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("hkldc".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "hkldc", about = "Diffractometer configuration tooling")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Check a saved configuration for structural and semantic problems
    Validate(commands::ValidateArgs),
    /// Re-render a saved configuration in another export format
    Convert(commands::ConvertArgs),
    /// Print a human-readable overview of a saved configuration
    Summary(commands::SummaryArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Validate(args) => commands::run_validate_command(args),
        CliCommand::Convert(args) => commands::run_convert_command(args),
        CliCommand::Summary(args) => commands::run_summary_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Config(#[from] DcError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => ErrorCategory::InputValidation.exit_code(),
            Self::Config(error) => error.exit_code(),
            Self::Internal(_) => ErrorCategory::IoSystem.exit_code(),
        }
    }

    pub fn diagnostic_line(&self) -> String {
        match self {
            Self::Usage(message) => format!("ERROR: [InputValidation] {message}"),
            Self::Config(error) => error.diagnostic_line(),
            Self::Internal(error) => format!("ERROR: [IoSystem] {error:#}"),
        }
    }
}
