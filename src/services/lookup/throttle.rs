//! Shared request pacer for rate-limited upstreams.
//!
//! MusicBrainz allows one request per second per client, process-wide.
//! The pacer keeps the instant of the last request behind a tokio mutex;
//! callers hold the lock across the sleep, so concurrent callers queue
//! behind each other instead of racing past the limit.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct Pacer {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// One request per second, the MusicBrainz contract
    pub fn musicbrainz() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Wait for the shared interval to elapse, then claim the next slot.
    ///
    /// The slot is claimed when the lock is released, so N concurrent
    /// callers complete no faster than (N-1) intervals apart in aggregate.
    pub async fn pace(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_call_does_not_wait() {
        let pacer = Pacer::musicbrainz();
        let started = Instant::now();
        pacer.pace().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn three_sequential_calls_take_at_least_two_seconds() {
        let pacer = Pacer::musicbrainz();
        let started = Instant::now();
        for _ in 0..3 {
            pacer.pace().await;
        }
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_queue_instead_of_bypassing() {
        let pacer = Arc::new(Pacer::musicbrainz());
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let pacer = pacer.clone();
            handles.push(tokio::spawn(async move { pacer.pace().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_gap_is_credited_against_the_interval() {
        let pacer = Pacer::new(Duration::from_millis(1000));
        pacer.pace().await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        let started = Instant::now();
        pacer.pace().await;
        // Only the 400ms remainder should have been slept
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }
}
