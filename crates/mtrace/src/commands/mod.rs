//! Command implementations.
//!
//! Each submodule handles a specific CLI command.

mod dump;
mod record;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Record { .. } => handle_record(cli),
        Commands::Dump { .. } => handle_dump(cli),
    }
}

fn handle_record(cli: &Cli) -> i32 {
    let Commands::Record {
        script,
        output,
        begin,
        end,
        detach,
        control,
        early_exit,
        instructions,
        compress,
        target,
    } = &cli.command
    else {
        unreachable!("record command variant mismatch");
    };

    record::cmd_record(
        script,
        output,
        *begin,
        *end,
        *detach,
        *control,
        *early_exit,
        *instructions,
        *compress,
        target,
    )
}

fn handle_dump(cli: &Cli) -> i32 {
    let Commands::Dump { trace, header_only } = &cli.command else {
        unreachable!("dump command variant mismatch");
    };

    dump::cmd_dump(trace, *header_only)
}
