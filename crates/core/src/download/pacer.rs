//! Per-host request pacing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Spaces requests to the same host at least `interval` apart.
///
/// Each host gets its own gate, created on first use. The first request to
/// a host passes immediately; later ones wait for the next tick. Hosts never
/// wait on each other.
#[derive(Debug)]
pub struct HostPacer {
    interval: Duration,
    gates: Mutex<HashMap<String, Arc<Mutex<Interval>>>>,
}

impl HostPacer {
    /// A zero `interval` is raised to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until `host` may be contacted again. Returns the time spent
    /// waiting.
    pub async fn wait(&self, host: &str) -> Duration {
        let gate = self.gate(host).await;
        let start = Instant::now();
        gate.lock().await.tick().await;
        let waited = start.elapsed();
        debug!(host, waited_ms = waited.as_millis() as u64, "Passed pacing gate");
        waited
    }

    async fn gate(&self, host: &str) -> Arc<Mutex<Interval>> {
        let mut gates = self.gates.lock().await;
        gates
            .entry(host.to_string())
            .or_insert_with(|| {
                let mut ticker = interval(self.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Arc::new(Mutex::new(ticker))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_passes_immediately() {
        let pacer = HostPacer::new(Duration::from_secs(5));
        assert_eq!(pacer.wait("a.example").await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_host_is_spaced() {
        let pacer = HostPacer::new(Duration::from_secs(5));
        let start = Instant::now();

        pacer.wait("a.example").await;
        pacer.wait("a.example").await;
        pacer.wait("a.example").await;

        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_are_independent() {
        let pacer = HostPacer::new(Duration::from_secs(5));
        let start = Instant::now();

        pacer.wait("a.example").await;
        pacer.wait("b.example:8080").await;
        pacer.wait("c.example").await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_on_one_host() {
        let pacer = Arc::new(HostPacer::new(Duration::from_secs(5)));
        let start = Instant::now();

        let waits = futures::future::join_all((0..3).map(|_| {
            let pacer = Arc::clone(&pacer);
            async move {
                pacer.wait("a.example").await;
                start.elapsed()
            }
        }))
        .await;

        let mut passed: Vec<Duration> = waits;
        passed.sort();
        assert!(passed[1] - passed[0] >= Duration::from_secs(5));
        assert!(passed[2] - passed[1] >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_host_does_not_burst() {
        let pacer = HostPacer::new(Duration::from_secs(5));
        pacer.wait("a.example").await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        let start = Instant::now();
        pacer.wait("a.example").await;
        pacer.wait("a.example").await;

        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
