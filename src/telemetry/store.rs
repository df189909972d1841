//! In-process metrics storage served back verbatim as the IPC
//! `metrics_response` payload — there is no exporter and no network path out
//! of this module.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Number of most-recent histogram observations kept for percentile
/// estimation. Older samples are evicted FIFO; count/sum/min/max remain
/// exact over the full history regardless of this cap.
const HISTOGRAM_SAMPLE_CAP: usize = 1024;

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub gauges: HashMap<String, f64>,
    pub histograms: HashMap<String, HistogramSummary>,
}

/// Summary statistics for a histogram. `p50`/`p99` are best-effort,
/// computed from the last `HISTOGRAM_SAMPLE_CAP` observations rather than
/// the full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p99: f64,
}

/// Internal histogram data: exact atomic running stats plus a bounded,
/// mutex-guarded sample ring buffer for percentile estimation.
struct HistogramData {
    count: AtomicU64,
    sum: AtomicU64, // f64 bits stored as u64
    min: AtomicU64, // f64 bits stored as u64
    max: AtomicU64, // f64 bits stored as u64
    samples: Mutex<VecDeque<f64>>,
}

impl HistogramData {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(f64::to_bits(0.0)),
            min: AtomicU64::new(f64::to_bits(f64::MAX)),
            max: AtomicU64::new(f64::to_bits(f64::MIN)),
            samples: Mutex::new(VecDeque::with_capacity(HISTOGRAM_SAMPLE_CAP)),
        }
    }

    fn record(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.atomic_add_f64(&self.sum, value);
        self.atomic_min_f64(&self.min, value);
        self.atomic_max_f64(&self.max, value);

        let mut samples = self.samples.lock();
        if samples.len() == HISTOGRAM_SAMPLE_CAP {
            samples.pop_front();
        }
        samples.push_back(value);
    }

    fn atomic_add_f64(&self, atomic: &AtomicU64, value: f64) {
        loop {
            let current = atomic.load(Ordering::Relaxed);
            let new = f64::from_bits(current) + value;
            if atomic.compare_exchange_weak(current, f64::to_bits(new), Ordering::Relaxed, Ordering::Relaxed).is_ok() {
                break;
            }
        }
    }

    fn atomic_min_f64(&self, atomic: &AtomicU64, value: f64) {
        loop {
            let current = atomic.load(Ordering::Relaxed);
            let current_f64 = f64::from_bits(current);
            if value >= current_f64 {
                break;
            }
            if atomic.compare_exchange_weak(current, f64::to_bits(value), Ordering::Relaxed, Ordering::Relaxed).is_ok() {
                break;
            }
        }
    }

    fn atomic_max_f64(&self, atomic: &AtomicU64, value: f64) {
        loop {
            let current = atomic.load(Ordering::Relaxed);
            let current_f64 = f64::from_bits(current);
            if value <= current_f64 {
                break;
            }
            if atomic.compare_exchange_weak(current, f64::to_bits(value), Ordering::Relaxed, Ordering::Relaxed).is_ok() {
                break;
            }
        }
    }

    /// Nearest-rank percentile over the current sample window. `p` is in
    /// `[0, 1]`; `0.0` on an empty window rather than panicking.
    fn percentile(&self, p: f64) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
        sorted[rank]
    }

    fn to_summary(&self) -> HistogramSummary {
        let count = self.count.load(Ordering::Relaxed);
        let sum = f64::from_bits(self.sum.load(Ordering::Relaxed));
        let min = f64::from_bits(self.min.load(Ordering::Relaxed));
        let max = f64::from_bits(self.max.load(Ordering::Relaxed));

        HistogramSummary {
            count,
            sum,
            min: if count == 0 { 0.0 } else { min },
            max: if count == 0 { 0.0 } else { max },
            p50: self.percentile(0.50),
            p99: self.percentile(0.99),
        }
    }
}

/// Thread-safe metrics store backing a container's `metrics_response`.
pub struct MetricsStore {
    counters: RwLock<HashMap<String, AtomicU64>>,
    gauges: RwLock<HashMap<String, AtomicU64>>,
    histograms: RwLock<HashMap<String, HistogramData>>,
}

impl MetricsStore {
    /// Create a new empty metrics store.
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
        }
    }

    /// Increment a counter by the given value.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let counters = self.counters.read().unwrap();
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
            return;
        }
        drop(counters);

        let mut counters = self.counters.write().unwrap();
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Set a gauge to the given value, e.g. the current active connection
    /// count recorded by the accept loop on every open/close.
    pub fn set_gauge(&self, name: &str, value: f64) {
        let gauges = self.gauges.read().unwrap();
        if let Some(gauge) = gauges.get(name) {
            gauge.store(f64::to_bits(value), Ordering::Relaxed);
            return;
        }
        drop(gauges);

        let mut gauges = self.gauges.write().unwrap();
        gauges
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(f64::to_bits(value), Ordering::Relaxed);
    }

    /// Record a histogram observation, e.g. one request's inference latency.
    pub fn record_histogram(&self, name: &str, value: f64) {
        let histograms = self.histograms.read().unwrap();
        if let Some(histogram) = histograms.get(name) {
            histogram.record(value);
            return;
        }
        drop(histograms);

        let mut histograms = self.histograms.write().unwrap();
        let histogram = histograms
            .entry(name.to_string())
            .or_insert_with(HistogramData::new);
        histogram.record(value);
    }

    /// Take a snapshot of all metrics, as served by the `metrics_request`
    /// IPC message.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.read().unwrap();
        let gauges = self.gauges.read().unwrap();
        let histograms = self.histograms.read().unwrap();

        MetricsSnapshot {
            counters: counters
                .iter()
                .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
                .collect(),
            gauges: gauges
                .iter()
                .map(|(k, v)| (k.clone(), f64::from_bits(v.load(Ordering::Relaxed))))
                .collect(),
            histograms: histograms
                .iter()
                .map(|(k, v)| (k.clone(), v.to_summary()))
                .collect(),
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_accumulates_across_calls() {
        let store = MetricsStore::new();
        store.increment_counter("requests_total", 1);
        store.increment_counter("requests_total", 2);
        assert_eq!(store.snapshot().counters.get("requests_total"), Some(&3));
    }

    #[test]
    fn gauge_reflects_latest_value_only() {
        let store = MetricsStore::new();
        store.set_gauge("active_connections", 3.0);
        store.set_gauge("active_connections", 7.0);
        assert_eq!(store.snapshot().gauges.get("active_connections"), Some(&7.0));
    }

    #[test]
    fn histogram_tracks_exact_count_sum_min_max() {
        let store = MetricsStore::new();
        for v in [10.0, 20.0, 30.0] {
            store.record_histogram("inference_latency_ms", v);
        }
        let summary = store.snapshot().histograms.remove("inference_latency_ms").unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.sum, 60.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);
    }

    #[test]
    fn histogram_p50_and_p99_over_uniform_samples() {
        let store = MetricsStore::new();
        for v in 1..=100 {
            store.record_histogram("latency", v as f64);
        }
        let summary = store.snapshot().histograms.remove("latency").unwrap();
        assert_eq!(summary.p50, 50.0);
        assert_eq!(summary.p99, 99.0);
    }

    #[test]
    fn histogram_percentiles_are_zero_when_empty() {
        let store = MetricsStore::new();
        store.increment_counter("unrelated", 1);
        assert!(store.snapshot().histograms.get("latency").is_none());
    }

    #[test]
    fn histogram_sample_window_is_bounded() {
        let store = MetricsStore::new();
        for v in 0..(HISTOGRAM_SAMPLE_CAP * 2) {
            store.record_histogram("latency", v as f64);
        }
        let summary = store.snapshot().histograms.remove("latency").unwrap();
        assert_eq!(summary.count, (HISTOGRAM_SAMPLE_CAP * 2) as u64);
        // Oldest half of the samples evicted: p50 reflects only the newer half.
        assert!(summary.p50 >= HISTOGRAM_SAMPLE_CAP as f64);
    }
}
