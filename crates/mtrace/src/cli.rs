//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "mtrace")]
#[command(about = "Memory-access trace recorder - captures USF traces from instruction streams")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a trace from an instruction event script
    Record {
        /// Input event script
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Output trace file
        #[arg(short, long, default_value = "foo.usf")]
        output: PathBuf,

        /// Start tracing when this address executes (hex or decimal, 0 = from start)
        #[arg(short, long, default_value = "0", value_parser = parse_address)]
        begin: u64,

        /// Stop tracing when this address executes (hex or decimal, 0 = never)
        #[arg(short, long, default_value = "0", value_parser = parse_address)]
        end: u64,

        /// Stop the traced program for good on the first end match
        #[arg(short, long)]
        detach: bool,

        /// Arm the window on script control events instead of addresses
        #[arg(long, conflicts_with_all = ["begin", "end", "detach"])]
        control: bool,

        /// Terminate the traced program on a control stop
        #[arg(long, requires = "control")]
        early_exit: bool,

        /// Tick time once per instruction instead of once per access
        #[arg(short, long, requires = "control")]
        instructions: bool,

        /// Compress the trace body with BZip2
        #[arg(short, long)]
        compress: bool,

        /// Traced program's command line, recorded in the trace header
        #[arg(last = true, value_name = "CMD")]
        target: Vec<String>,
    },
    /// Print the header and events of a trace file
    Dump {
        /// Trace file to read
        #[arg(value_name = "TRACE")]
        trace: PathBuf,

        /// Print only the header
        #[arg(long)]
        header_only: bool,
    },
}

/// Parse an address argument: hex with a `0x` prefix, or decimal.
fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("invalid address: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_accepts_hex_and_decimal() {
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert_eq!(parse_address("0xdeadBEEF"), Ok(0xdead_beef));
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address("xyz").is_err());
        assert!(parse_address("0x").is_err());
        assert!(parse_address("-1").is_err());
    }
}
