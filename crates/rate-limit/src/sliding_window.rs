use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Per-client log of recent request timestamps, oldest first.
///
/// Unlike an interpolated window counter this keeps every timestamp inside
/// the window, so the count it reports is exact. Every recorded request is
/// kept, whether or not it was admitted.
#[derive(Debug, Default)]
pub struct SlidingWindowCounter {
    timestamps: VecDeque<Instant>,
}

impl SlidingWindowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `now`, purge everything older than `window`, and return the
    /// number of requests left in the window ending at `now`.
    ///
    /// A timestamp exactly `window` old is still counted; it is purged once
    /// its age strictly exceeds `window`.
    pub fn record(&mut self, now: Instant, window: Duration) -> usize {
        self.timestamps.push_back(now);
        self.purge(now, window);
        self.timestamps.len()
    }

    /// Drop timestamps whose age at `now` exceeds `window`.
    pub fn purge(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) > window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns `true` if no recorded request falls inside the window at `now`.
    pub fn is_idle(&self, now: Instant, window: Duration) -> bool {
        match self.timestamps.back() {
            Some(&newest) => now.saturating_duration_since(newest) > window,
            None => true,
        }
    }

    /// Number of retained timestamps. Not purged, so it may include stale entries.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn counts_requests_inside_window() {
        let start = Instant::now();
        let mut counter = SlidingWindowCounter::new();

        assert_eq!(counter.record(start, WINDOW), 1);
        assert_eq!(counter.record(start + secs(1), WINDOW), 2);
        assert_eq!(counter.record(start + secs(2), WINDOW), 3);
    }

    #[test]
    fn purges_entries_older_than_window() {
        let start = Instant::now();
        let mut counter = SlidingWindowCounter::new();

        for offset in [0, 1, 2] {
            counter.record(start + secs(offset), WINDOW);
        }

        // At t=6, t=0 is 6s old and purged, t=1 is exactly 5s old and kept.
        assert_eq!(counter.record(start + secs(6), WINDOW), 3);
        // At t=7, t=1 (6s) is purged while t=2 (5s) stays.
        assert_eq!(counter.record(start + secs(7), WINDOW), 3);
    }

    #[test]
    fn boundary_timestamp_is_retained_until_strictly_older() {
        let start = Instant::now();
        let mut counter = SlidingWindowCounter::new();
        counter.record(start, WINDOW);

        counter.purge(start + WINDOW, WINDOW);
        assert_eq!(counter.len(), 1, "exactly window-old entry must be kept");

        counter.purge(start + WINDOW + Duration::from_millis(1), WINDOW);
        assert!(counter.is_empty());
    }

    #[test]
    fn long_idle_gap_leaves_only_current_request() {
        let start = Instant::now();
        let mut counter = SlidingWindowCounter::new();

        for i in 0..10 {
            counter.record(start + Duration::from_millis(i * 100), WINDOW);
        }

        assert_eq!(counter.record(start + secs(60), WINDOW), 1);
    }

    #[test]
    fn idle_detection_uses_newest_entry() {
        let start = Instant::now();
        let mut counter = SlidingWindowCounter::new();
        assert!(counter.is_idle(start, WINDOW));

        counter.record(start, WINDOW);
        counter.record(start + secs(3), WINDOW);

        assert!(!counter.is_idle(start + secs(8), WINDOW));
        assert!(counter.is_idle(start + secs(9), WINDOW));
    }
}
