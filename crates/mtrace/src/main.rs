//! mtrace CLI - memory-access trace recorder

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Initialize metrics recorder if enabled
    let metrics_handle = if cli.metrics {
        let recorder = mtrace::metrics::CliRecorder::new();
        recorder.install()
    } else {
        None
    };

    // Initialize metric descriptions
    mtrace::metrics::init();

    // Initialize tracing with appropriate level based on flags and command
    let default_level = if cli.verbose {
        "debug"
    } else if cli.silent {
        "error"
    } else {
        match &cli.command {
            Commands::Dump { .. } => "warn",
            Commands::Record { .. } => "info",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("mtrace={default_level}").parse().unwrap())
                .add_directive(format!("mtrace_core={default_level}").parse().unwrap()),
        )
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let exit_code = commands::run_command(&cli);

    // Print metrics summary if enabled
    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
