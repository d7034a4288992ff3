//! Record command.

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use mtrace::host::ScriptHost;
use mtrace::{
    CaptureWindow, Compression, LogicalClock, Session, TimeBase, TraceHeader, Trigger, UsfWriter,
};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `record` command.
#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
pub fn cmd_record(
    script: &Path,
    output: &Path,
    begin: u64,
    end: u64,
    detach: bool,
    control: bool,
    early_exit: bool,
    instructions: bool,
    compress: bool,
    target: &[String],
) -> i32 {
    let host = match ScriptHost::load(script) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, path = %script.display(), "failed to load event script");
            return EXIT_FAILURE;
        }
    };

    let time_base = if instructions {
        TimeBase::Instructions
    } else {
        TimeBase::Accesses
    };
    let compression = if compress {
        Compression::Bzip2
    } else {
        Compression::None
    };
    let trigger = if control {
        Trigger::Control { early_exit }
    } else {
        Trigger::AddressRange {
            begin: (begin != 0).then_some(begin),
            end: (end != 0).then_some(end),
            detach_on_stop: detach,
        }
    };

    let header = TraceHeader::new(compression, time_base, wall_clock_seconds(), target.to_vec());
    let writer = match UsfWriter::create(output, &header) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, path = %output.display(), "failed to create trace file");
            return EXIT_FAILURE;
        }
    };
    info!(path = %output.display(), compression = %compression, "trace file opened");

    let mut session = Session::new(
        CaptureWindow::new(trigger),
        LogicalClock::new(time_base),
        writer,
        Box::new(host.controller()),
    );

    let start = Instant::now();
    let stats = match host.run(&mut session) {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "recording failed");
            return EXIT_FAILURE;
        }
    };
    let elapsed = start.elapsed().as_secs_f64();

    let events = session.sink().events_written();
    info!(
        events,
        instructions = stats.instructions,
        path = %output.display(),
        "trace recorded"
    );
    mtrace::metrics::record_run(events, &stats, elapsed);

    EXIT_SUCCESS
}

/// Wall-clock seconds for the trace header.
fn wall_clock_seconds() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(_) => {
            warn!("failed to get time of day, information not included in trace file");
            0
        }
    }
}
