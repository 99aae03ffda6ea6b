use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::decision::{Decision, DenyReason};

/// Running totals of admission decisions.
#[derive(Debug, Default)]
pub struct AdmissionStats {
    admitted: AtomicU64,
    rate_limited: AtomicU64,
    newly_blocked: AtomicU64,
    blocked: AtomicU64,
}

/// Point-in-time copy of [`AdmissionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub admitted: u64,
    pub rate_limited: u64,
    pub newly_blocked: u64,
    pub blocked: u64,
}

impl StatsSnapshot {
    pub fn denied(&self) -> u64 {
        self.rate_limited + self.newly_blocked + self.blocked
    }

    pub fn total(&self) -> u64 {
        self.admitted + self.denied()
    }
}

impl AdmissionStats {
    pub fn observe(&self, decision: &Decision) {
        let counter = match decision.reason() {
            None => &self.admitted,
            Some(DenyReason::RateLimited) => &self.rate_limited,
            Some(DenyReason::NewlyBlocked) => &self.newly_blocked,
            Some(DenyReason::Blocked) => &self.blocked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            newly_blocked: self.newly_blocked.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn observe_counts_by_outcome() {
        let stats = AdmissionStats::default();
        stats.observe(&Decision::Admitted);
        stats.observe(&Decision::Admitted);
        stats.observe(&Decision::denied(DenyReason::RateLimited, Duration::from_secs(5)));
        stats.observe(&Decision::denied(DenyReason::Blocked, Duration::from_secs(5)));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.admitted, 2);
        assert_eq!(snapshot.rate_limited, 1);
        assert_eq!(snapshot.newly_blocked, 0);
        assert_eq!(snapshot.blocked, 1);
        assert_eq!(snapshot.denied(), 2);
        assert_eq!(snapshot.total(), 4);
    }
}
