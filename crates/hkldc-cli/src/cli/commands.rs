use std::path::PathBuf;

use hkldc_core::config::{ExportFormat, serialize};
use tracing::debug;

use super::CliError;
use super::helpers::{read_document, render_summary, write_rendered};

#[derive(clap::Args)]
pub(super) struct ValidateArgs {
    /// Configuration file, JSON or YAML
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ConvertArgs {
    /// Configuration file, JSON or YAML
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Target export format: dict, json, or yaml
    #[arg(long, default_value = "json")]
    format: String,

    /// Output path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SummaryArgs {
    /// Configuration file, JSON or YAML
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

pub(super) fn run_validate_command(args: ValidateArgs) -> Result<i32, CliError> {
    let document = read_document(&args.path)?;
    document.validate_internal()?;
    debug!(path = %args.path.display(), "configuration passed validation");
    println!(
        "OK: {} ({} engine, {} mode), {} sample(s), {} constraint(s)",
        document.geometry,
        document.engine,
        document.mode,
        document.samples.len(),
        document.constraints.len(),
    );
    Ok(0)
}

pub(super) fn run_convert_command(args: ConvertArgs) -> Result<i32, CliError> {
    let format = ExportFormat::parse(&args.format)?;
    let document = read_document(&args.input)?;
    document.validate_internal()?;
    let rendered = serialize(&document, format)?;
    write_rendered(args.output.as_deref(), &rendered)?;
    Ok(0)
}

pub(super) fn run_summary_command(args: SummaryArgs) -> Result<i32, CliError> {
    let document = read_document(&args.path)?;
    document.validate_internal()?;
    println!("{}", render_summary(&document));
    Ok(0)
}
