//! Dump command.

use std::path::Path;

use tracing::error;

use mtrace::{TraceHeader, UsfReader};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `dump` command.
pub fn cmd_dump(trace: &Path, header_only: bool) -> i32 {
    let mut reader = match UsfReader::open(trace) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, path = %trace.display(), "failed to open trace file");
            return EXIT_FAILURE;
        }
    };

    print_header(reader.header());
    if header_only {
        return EXIT_SUCCESS;
    }

    loop {
        match reader.next_event() {
            Ok(Some(event)) => {
                println!(
                    "{:>10} {:>4} {:<2} pc={:#018x} addr={:#018x} len={}",
                    event.time, event.tid, event.kind, event.pc, event.addr, event.len
                );
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read trace event");
                return EXIT_FAILURE;
            }
        }
    }

    EXIT_SUCCESS
}

fn print_header(header: &TraceHeader) {
    let flags: Vec<&str> = header.flags.iter_names().map(|(name, _)| name).collect();
    println!("version:     {}", header.version);
    println!("compression: {}", header.compression);
    println!("flags:       {}", flags.join("|"));
    println!("time_begin:  {}", header.time_begin);
    println!("argv:        {}", header.argv.join(" "));
}
