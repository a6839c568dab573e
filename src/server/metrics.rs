use crate::codec;
use crate::error::UpstreamError;
use crate::registry::BitcoinMethod;
use crate::rpc::{RpcResponse, INTERNAL_ERROR};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const KIND_COUNT: usize = UpstreamError::FAILURE_KINDS.len();
const METHOD_COUNT: usize = BitcoinMethod::ALL.len();

/// How one gateway request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Body was not a single JSON-RPC request object.
    Rejected,
    /// Name not in the registry, never forwarded.
    UnknownMethod,
    /// Node result relayed to the caller.
    Relayed,
    /// Error object relayed: the node's own fault, or an arity mismatch.
    Fault,
    /// The node never answered usefully; one of [`UpstreamError::FAILURE_KINDS`].
    Failed(&'static str),
}

impl Outcome {
    /// Classifies the response produced for a registered method.
    pub fn of(resp: &RpcResponse) -> Self {
        let Some(err) = &resp.error else {
            return Outcome::Relayed;
        };
        if err.code != INTERNAL_ERROR {
            return Outcome::Fault;
        }

        let kind = err
            .data
            .as_ref()
            .and_then(|data| data.get("kind"))
            .and_then(Value::as_str);
        UpstreamError::FAILURE_KINDS
            .into_iter()
            .find(|known| Some(*known) == kind)
            .map_or(Outcome::Fault, Outcome::Failed)
    }
}

/// Gateway request counters, lock-free and shared by every connection.
#[derive(Debug)]
pub struct Metrics {
    requests: AtomicU64,
    relayed: AtomicU64,
    faults: AtomicU64,
    rejected: AtomicU64,
    unknown_methods: AtomicU64,
    /// Indexed like `UpstreamError::FAILURE_KINDS`
    failures: [AtomicU64; KIND_COUNT],
    /// Indexed like `BitcoinMethod::ALL`
    per_method: [AtomicU64; METHOD_COUNT],
    /// Moving average over dispatched requests, microseconds
    avg_round_trip_us: AtomicU64,
    max_round_trip_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            relayed: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            unknown_methods: AtomicU64::new(0),
            failures: std::array::from_fn(|_| AtomicU64::new(0)),
            per_method: std::array::from_fn(|_| AtomicU64::new(0)),
            avg_round_trip_us: AtomicU64::new(0),
            max_round_trip_us: AtomicU64::new(0),
        }
    }

    /// Count one finished request. Round-trip time is only sampled for
    /// requests that reached a registered method.
    pub fn record(&self, method: Option<BitcoinMethod>, outcome: Outcome, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            Outcome::Rejected => &self.rejected,
            Outcome::UnknownMethod => &self.unknown_methods,
            Outcome::Relayed => &self.relayed,
            Outcome::Fault => &self.faults,
            Outcome::Failed(kind) => {
                match UpstreamError::FAILURE_KINDS.iter().position(|known| *known == kind) {
                    Some(slot) => &self.failures[slot],
                    None => &self.faults,
                }
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(method) = method {
            self.per_method[method.index()].fetch_add(1, Ordering::Relaxed);
            self.sample_round_trip(elapsed);
        }
    }

    fn sample_round_trip(&self, elapsed: Duration) {
        let sample = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        let _ = self
            .avg_round_trip_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |avg| {
                Some(if avg == 0 {
                    sample
                } else {
                    avg.saturating_mul(9).saturating_add(sample) / 10
                })
            });
        self.max_round_trip_us.fetch_max(sample, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        let upstream_failures = UpstreamError::FAILURE_KINDS
            .into_iter()
            .zip(&self.failures)
            .map(|(kind, counter)| (kind, load(counter)))
            .collect();
        let method_counts = BitcoinMethod::ALL
            .into_iter()
            .zip(&self.per_method)
            .map(|(method, counter)| (method.name(), load(counter)))
            .collect();

        let avg_round_trip_us = load(&self.avg_round_trip_us);
        MetricsSnapshot {
            total_requests: load(&self.requests),
            relayed: load(&self.relayed),
            faults: load(&self.faults),
            rejected: load(&self.rejected),
            unknown_methods: load(&self.unknown_methods),
            upstream_failures,
            method_counts,
            avg_round_trip_us,
            avg_round_trip_ms: codec::micros_as_millis(avg_round_trip_us),
            max_round_trip_ms: codec::micros_as_millis(load(&self.max_round_trip_us)),
        }
    }

    pub fn log_report(&self) {
        let snapshot = self.snapshot();
        info!(
            requests = snapshot.total_requests,
            relayed = snapshot.relayed,
            faults = snapshot.faults,
            failed = snapshot.failed(),
            rejected = snapshot.rejected,
            unknown_methods = snapshot.unknown_methods,
            avg_round_trip_ms = %snapshot.avg_round_trip_ms,
            max_round_trip_ms = %snapshot.max_round_trip_ms,
            "gateway report"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Metrics`], served at `GET /metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub relayed: u64,
    pub faults: u64,
    pub rejected: u64,
    pub unknown_methods: u64,
    /// Keyed by `UpstreamError::kind()`
    pub upstream_failures: BTreeMap<&'static str, u64>,
    /// Keyed by node method name; every registered method is listed
    pub method_counts: BTreeMap<&'static str, u64>,
    pub avg_round_trip_us: u64,
    pub avg_round_trip_ms: Value,
    pub max_round_trip_ms: Value,
}

impl MetricsSnapshot {
    /// Requests the node never answered.
    pub fn failed(&self) -> u64 {
        self.upstream_failures.values().sum()
    }
}

/// Times one request and records its [`Outcome`] when finished.
pub struct RequestTimer {
    method: Option<BitcoinMethod>,
    started: Instant,
    metrics: Arc<Metrics>,
}

impl RequestTimer {
    pub fn start(metrics: Arc<Metrics>) -> Self {
        Self {
            method: None,
            started: Instant::now(),
            metrics,
        }
    }

    /// Attribute the request to `method` once the body has been parsed.
    pub fn method(&mut self, method: BitcoinMethod) {
        self.method = Some(method);
    }

    pub fn finish(self, outcome: Outcome) {
        let elapsed = self.started.elapsed();
        debug!(
            method = self.method.map_or("-", BitcoinMethod::name),
            ?outcome,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "request finished"
        );
        self.metrics.record(self.method, outcome, elapsed);
    }
}

/// Initialize logging with tracing
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btc_rpc_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
