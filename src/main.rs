use anyhow::Context;
use clap::Parser;
use masscan_records::cli::{Cli, Commands};
use masscan_records::output;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "parsed arguments");

    let file = match &cli.command {
        Commands::Decode(cmd) => &cmd.file,
        Commands::Summary(cmd) => &cmd.file,
    };
    match cli
        .run()
        .with_context(|| format!("failed to process {}", file.display()))
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
