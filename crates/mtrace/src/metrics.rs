//! Metrics collection and reporting using metrics-rs.
//!
//! Provides a unified approach to recording trace-capture metrics with
//! support for terminal output and future integration with observability
//! tools.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, gauge,
};
use parking_lot::RwLock;

use crate::host::RunStats;

// ============================================================================
// Metric descriptions
// ============================================================================

/// Initialize metric descriptions.
///
/// Call this once at startup to register metric descriptions.
pub fn init() {
    // Counters (cumulative)
    describe_counter!(
        "mtrace_accesses_recorded_total",
        Unit::Count,
        "Total memory accesses recorded"
    );
    describe_counter!(
        "mtrace_instructions_total",
        Unit::Count,
        "Total instructions observed"
    );
    describe_counter!(
        "mtrace_control_events_total",
        Unit::Count,
        "Total control events delivered"
    );

    // Gauges (point-in-time values)
    describe_gauge!(
        "mtrace_record_duration_seconds",
        Unit::Seconds,
        "Recording wall-clock time"
    );
    describe_gauge!(
        "mtrace_record_rate_eps",
        Unit::CountPerSecond,
        "Recorded accesses per second"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

/// Record metrics after a recording run.
#[allow(clippy::cast_precision_loss)]
pub fn record_run(events: u64, stats: &RunStats, elapsed_secs: f64) {
    counter!("mtrace_accesses_recorded_total").absolute(events);
    counter!("mtrace_instructions_total").absolute(stats.instructions);
    counter!("mtrace_control_events_total").absolute(stats.control_events);
    gauge!("mtrace_record_duration_seconds").set(elapsed_secs);
    if elapsed_secs > 0.0 {
        gauge!("mtrace_record_rate_eps").set(events as f64 / elapsed_secs);
    }
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

/// Storage for counter values.
#[derive(Default)]
struct CounterStorage {
    values: RwLock<HashMap<String, u64>>,
}

/// Storage for gauge values.
#[derive(Default)]
struct GaugeStorage {
    values: RwLock<HashMap<String, f64>>,
}

/// A simple counter handle for the CLI recorder.
struct CliCounter {
    key: String,
    storage: Arc<CounterStorage>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

/// A simple gauge handle for the CLI recorder.
struct CliGauge {
    key: String,
    storage: Arc<GaugeStorage>,
}

impl metrics::GaugeFn for CliGauge {
    fn increment(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        let mut values = self.storage.values.write();
        *values.entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        let mut values = self.storage.values.write();
        values.insert(self.key.clone(), value);
    }
}

/// CLI recorder that stores metrics for terminal output.
///
/// This recorder collects metrics in memory and can print them in a
/// human-readable format for CLI usage. Histograms are not kept; the
/// recorder drops them rather than buffering every sample.
pub struct CliRecorder {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
}

impl CliRecorder {
    /// Create a new CLI recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Arc::new(CounterStorage::default()),
            gauges: Arc::new(GaugeStorage::default()),
        }
    }

    /// Install this recorder as the global metrics recorder.
    ///
    /// Returns a handle that can be used to retrieve metrics later.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let counters = Arc::clone(&self.counters);
        let gauges = Arc::clone(&self.gauges);

        metrics::set_global_recorder(self).ok()?;

        Some(CliRecorderHandle { counters, gauges })
    }
}

impl Default for CliRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn key_to_string(key: &Key) -> String {
    let name = key.name();
    let labels = key.labels();
    if labels.len() == 0 {
        name.to_string()
    } else {
        let label_str: Vec<String> = labels
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        format!("{}{{{}}}", name, label_str.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            storage: Arc::clone(&self.counters),
        }))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(CliGauge {
            key: key_to_string(key),
            storage: Arc::clone(&self.gauges),
        }))
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Handle for accessing recorded metrics after installing the CLI recorder.
pub struct CliRecorderHandle {
    counters: Arc<CounterStorage>,
    gauges: Arc<GaugeStorage>,
}

impl CliRecorderHandle {
    /// Get a counter value by key.
    #[must_use]
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.counters.values.read().get(key).copied()
    }

    /// Get a gauge value by key.
    #[must_use]
    pub fn get_gauge(&self, key: &str) -> Option<f64> {
        self.gauges.values.read().get(key).copied()
    }

    /// Get all counter values.
    #[must_use]
    pub fn all_counters(&self) -> HashMap<String, u64> {
        self.counters.values.read().clone()
    }

    /// Get all gauge values.
    #[must_use]
    pub fn all_gauges(&self) -> HashMap<String, f64> {
        self.gauges.values.read().clone()
    }

    /// Print all collected metrics in a human-readable format.
    pub fn print_summary(&self) {
        let counters = self.counters.values.read();
        let gauges = self.gauges.values.read();

        if counters.is_empty() && gauges.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");
        println!();

        if !counters.is_empty() {
            println!("### Counters");
            let mut keys: Vec<_> = counters.keys().collect();
            keys.sort();
            for key in keys {
                if let Some(value) = counters.get(key) {
                    println!("  {key}: {value}");
                }
            }
            println!();
        }

        if !gauges.is_empty() {
            println!("### Gauges");
            let mut keys: Vec<_> = gauges.keys().collect();
            keys.sort();
            for key in keys {
                if let Some(value) = gauges.get(key) {
                    println!("  {key}: {value:.6}");
                }
            }
            println!();
        }
    }
}
