use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::info;

/// Process-wide counters for the filter pipeline and relay.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Frames the parser completed (before policy evaluation).
    pub frames_received: Arc<AtomicU64>,
    /// Frames forwarded unchanged.
    pub frames_forwarded: Arc<AtomicU64>,
    /// Frames forwarded after a geofence rewrite.
    pub frames_rewritten: Arc<AtomicU64>,
    /// Frames dropped by the policy engine.
    pub frames_dropped: Arc<AtomicU64>,
    /// Bytes written to the PX4-bound output (forwarded + rewritten).
    pub bytes_forwarded: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            frames_received: Arc::new(AtomicU64::new(0)),
            frames_forwarded: Arc::new(AtomicU64::new(0)),
            frames_rewritten: Arc::new(AtomicU64::new(0)),
            frames_dropped: Arc::new(AtomicU64::new(0)),
            bytes_forwarded: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self, bytes: usize) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_forwarded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_rewritten(&self, bytes: usize) {
        self.frames_rewritten.fetch_add(1, Ordering::Relaxed);
        self.bytes_forwarded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_forwarded: self.frames_forwarded.load(Ordering::Relaxed),
            frames_rewritten: self.frames_rewritten.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            bytes_forwarded: self.bytes_forwarded.load(Ordering::Relaxed),
            uptime: self.start_time.elapsed(),
        }
    }

    /// Start a background task that logs stats periodically.
    pub fn start_stats_logger(self, interval_secs: u64) {
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(interval_secs));
            let mut last = self.get_stats();

            loop {
                tick.tick().await;
                let current = self.get_stats();
                let delta = current.delta(&last, interval_secs);

                info!("=== Filter stats ===");
                info!(
                    "  Uptime: {}h {}m {}s",
                    current.uptime.as_secs() / 3600,
                    (current.uptime.as_secs() % 3600) / 60,
                    current.uptime.as_secs() % 60
                );
                info!(
                    "  Frames: {} received, {} forwarded, {} rewritten, {} dropped",
                    current.frames_received,
                    current.frames_forwarded,
                    current.frames_rewritten,
                    current.frames_dropped
                );
                info!(
                    "  Throughput: {:.1} frames/s, {:.1} KB/s",
                    delta.frames_per_sec, delta.kbytes_per_sec
                );

                last = current;
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_forwarded: u64,
    pub frames_rewritten: u64,
    pub frames_dropped: u64,
    pub bytes_forwarded: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    pub fn delta(&self, previous: &MetricsSnapshot, interval_secs: u64) -> MetricsDelta {
        let forwarded_diff = (self.frames_forwarded + self.frames_rewritten)
            .saturating_sub(previous.frames_forwarded + previous.frames_rewritten);
        let bytes_diff = self.bytes_forwarded.saturating_sub(previous.bytes_forwarded);

        MetricsDelta {
            frames_per_sec: forwarded_diff as f64 / interval_secs as f64,
            kbytes_per_sec: (bytes_diff as f64 / 1024.0) / interval_secs as f64,
        }
    }
}

#[derive(Debug)]
pub struct MetricsDelta {
    pub frames_per_sec: f64,
    pub kbytes_per_sec: f64,
}
