//! Pipeline counters.
//!
//! Lock-free `AtomicU64` counters incremented on the call path and read on
//! export. They are observability only: nothing in the pipeline branches on
//! them, so sharing one set across concurrent requests changes no behavior.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for model calls and validation outcomes.
#[derive(Debug)]
pub struct PipelineCounters {
    /// HTTP calls made to the model endpoint.
    pub model_calls: AtomicU64,
    /// Retries scheduled after a failed call.
    pub retries: AtomicU64,
    /// Replies with status 429.
    pub rate_limited: AtomicU64,
    /// 2xx replies without candidate text.
    pub malformed_replies: AtomicU64,
    /// Generations that spent the whole retry budget.
    pub exhausted: AtomicU64,
    /// First attempts that failed shape validation.
    pub validation_failures: AtomicU64,
    /// Repair round-trips issued.
    pub repairs_attempted: AtomicU64,
    /// Repair round-trips that produced a valid reply.
    pub repairs_succeeded: AtomicU64,
    /// Results returned as raw text with a warning.
    pub warned_results: AtomicU64,
}

impl PipelineCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            model_calls: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            malformed_replies: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            repairs_attempted: AtomicU64::new(0),
            repairs_succeeded: AtomicU64::new(0),
            warned_results: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            model_calls: self.model_calls.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            malformed_replies: self.malformed_replies.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            repairs_attempted: self.repairs_attempted.load(Ordering::Relaxed),
            repairs_succeeded: self.repairs_succeeded.load(Ordering::Relaxed),
            warned_results: self.warned_results.load(Ordering::Relaxed),
        }
    }
}

impl Default for PipelineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// HTTP calls made.
    pub model_calls: u64,
    /// Retries scheduled.
    pub retries: u64,
    /// 429 replies.
    pub rate_limited: u64,
    /// Malformed 2xx replies.
    pub malformed_replies: u64,
    /// Exhausted retry budgets.
    pub exhausted: u64,
    /// First-attempt validation failures.
    pub validation_failures: u64,
    /// Repairs issued.
    pub repairs_attempted: u64,
    /// Repairs that validated.
    pub repairs_succeeded: u64,
    /// Warned raw-text results.
    pub warned_results: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("model_calls_total", "Calls made to the model endpoint", self.model_calls),
            ("retries_total", "Retries scheduled after failed calls", self.retries),
            ("rate_limited_total", "Replies with HTTP 429", self.rate_limited),
            (
                "malformed_replies_total",
                "Successful replies without candidate text",
                self.malformed_replies,
            ),
            ("exhausted_total", "Generations that exhausted the retry budget", self.exhausted),
            (
                "validation_failures_total",
                "First attempts failing shape validation",
                self.validation_failures,
            ),
            ("repairs_attempted_total", "Repair round-trips issued", self.repairs_attempted),
            (
                "repairs_succeeded_total",
                "Repair round-trips that validated",
                self.repairs_succeeded,
            ),
            (
                "warned_results_total",
                "Raw-text results returned with a warning",
                self.warned_results,
            ),
        ];

        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP quizforge_{name} {help}\n# TYPE quizforge_{name} counter\nquizforge_{name} {value}\n"
            ));
        }
        out
    }
}
