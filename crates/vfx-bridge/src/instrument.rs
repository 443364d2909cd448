//! Timing of decode and encode paths.
//!
//! The orchestrators time every path they attempt and hand the elapsed
//! microseconds to an [`InstrumentationSink`]. Sinks only observe: `record`
//! has no return value and cannot influence control flow.

use std::time::Instant;
use tracing::debug;

/// Label recorded for a native stack decode attempt.
pub const NATIVE_DECODE: &str = "native decode";
/// Label recorded for a generic backend decode attempt.
pub const BACKEND_DECODE: &str = "generic backend decode";
/// Label recorded for a generic backend encode.
pub const BACKEND_ENCODE: &str = "generic backend encode";

/// Receives path timings. Must not block.
pub trait InstrumentationSink: Send + Sync {
    /// Records one attempted path.
    fn record(&self, label: &str, duration_micros: u64);
}

/// Emits each timing as a `tracing` debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl InstrumentationSink for TracingSink {
    fn record(&self, label: &str, duration_micros: u64) {
        debug!(label, micros = duration_micros, "timed");
    }
}

/// Discards timings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl InstrumentationSink for NullSink {
    fn record(&self, _label: &str, _duration_micros: u64) {}
}

/// Runs `f`, records its duration under `label`, and returns its result.
pub fn timed<T>(sink: &dyn InstrumentationSink, label: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    let micros = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    sink.record(label, micros);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl InstrumentationSink for Recording {
        fn record(&self, label: &str, _duration_micros: u64) {
            self.0.lock().unwrap().push(label.to_string());
        }
    }

    #[test]
    fn timed_records_once_and_passes_result_through() {
        let sink = Recording::default();
        let value = timed(&sink, NATIVE_DECODE, || 42);
        assert_eq!(value, 42);
        assert_eq!(*sink.0.lock().unwrap(), vec![NATIVE_DECODE.to_string()]);
    }

    #[test]
    fn failures_are_still_timed() {
        let sink = Recording::default();
        let result: Result<(), &str> = timed(&sink, BACKEND_ENCODE, || Err("disk full"));
        assert!(result.is_err());
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn shipped_sinks_accept_records() {
        TracingSink.record(BACKEND_DECODE, 10);
        NullSink.record(BACKEND_DECODE, 10);
    }
}
