use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use throttlegate_common::{RateLimitConfig, Result};

use crate::block_registry::{BlockRegistry, BlockStatus};
use crate::decision::{Decision, DenyReason};
use crate::escalator::ViolationEscalator;
use crate::policy::Policy;
use crate::sliding_window::SlidingWindowCounter;
use crate::stats::{AdmissionStats, StatsSnapshot};

/// Everything the controller tracks for one client key.
///
/// Kept in a single map entry so that one shard lock covers the whole
/// check for that key.
#[derive(Debug, Default)]
struct ClientState {
    window: SlidingWindowCounter,
    violations: ViolationEscalator,
    block: BlockRegistry,
}

struct ControllerInner {
    policy: Policy,
    clients: DashMap<String, ClientState>,
    stats: AdmissionStats,
}

/// Per-client admission control.
///
/// Call [`check`](AdmissionController::check) for every inbound request and
/// forward it only if the result is [`Decision::Admitted`].
///
/// The controller is cheaply cloneable (backed by `Arc`); every clone shares
/// the same per-client state. Requests for the same key are serialized by
/// the key's map entry, requests for different keys only contend when they
/// land on the same shard.
#[derive(Clone)]
pub struct AdmissionController {
    inner: Arc<ControllerInner>,
}

impl AdmissionController {
    pub fn new(policy: Policy) -> Self {
        info!(
            requests_per_window = policy.requests_per_window(),
            window_ms = policy.window().as_millis() as u64,
            consecutive_limit_for_block = policy.consecutive_limit_for_block(),
            block_duration_secs = policy.block_duration().as_secs(),
            blocking_enabled = policy.blocking_enabled(),
            "creating admission controller"
        );
        Self {
            inner: Arc::new(ControllerInner {
                policy,
                clients: DashMap::new(),
                stats: AdmissionStats::default(),
            }),
        }
    }

    /// Validate `config` and build a controller from it.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        Ok(Self::new(Policy::from_config(config)?))
    }

    pub fn policy(&self) -> &Policy {
        &self.inner.policy
    }

    /// Check a request from `key` arriving now.
    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    /// Check a request from `key` arriving at `now`.
    ///
    /// Callers must pass non-decreasing instants for a given key.
    pub fn check_at(&self, key: &str, now: Instant) -> Decision {
        let policy = &self.inner.policy;

        let decision = match self.inner.clients.get_mut(key) {
            Some(mut entry) => evaluate(policy, key, entry.value_mut(), now),
            None => {
                let mut entry = self.inner.clients.entry(key.to_string()).or_default();
                evaluate(policy, key, entry.value_mut(), now)
            }
        };

        self.inner.stats.observe(&decision);
        decision
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Number of client keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.inner.clients.len()
    }

    /// Evict clients whose state can no longer affect a decision.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    /// Remove keys with no request inside the window and no block in force
    /// at `now`.
    ///
    /// The next request from an evicted key counts 1 and is admitted, which
    /// also clears its violation streak, so eviction never changes a
    /// decision.
    pub fn cleanup_at(&self, now: Instant) {
        let window = self.inner.policy.window();

        self.inner
            .clients
            .retain(|_key, state| state.block.is_blocked_at(now) || !state.window.is_idle(now, window));

        debug!(
            remaining = self.inner.clients.len(),
            "admission state cleanup complete"
        );
    }

    /// Spawn a thread that calls [`cleanup`](Self::cleanup) every `interval`.
    ///
    /// The thread only holds a weak handle and exits on the first tick after
    /// every clone of the controller has been dropped.
    pub fn start_cleanup_task(&self, interval: Duration) -> std::io::Result<JoinHandle<()>> {
        let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);

        std::thread::Builder::new()
            .name("admission-cleanup".into())
            .spawn(move || loop {
                std::thread::sleep(interval);

                let Some(inner) = weak.upgrade() else {
                    debug!("admission controller dropped, stopping cleanup");
                    break;
                };
                AdmissionController { inner }.cleanup();

                trace!("admission cleanup tick completed");
            })
    }
}

/// Run one admission check against a client's state. The caller holds the
/// entry lock for `state`.
fn evaluate(policy: &Policy, key: &str, state: &mut ClientState, now: Instant) -> Decision {
    if policy.blocking_enabled() {
        match state.block.status(now) {
            BlockStatus::Active(until) => {
                return Decision::denied(DenyReason::Blocked, until - now);
            }
            BlockStatus::Expired => {
                debug!(client_key = %key, "block expired");
                state.violations.reset();
            }
            BlockStatus::None => {}
        }
    }

    let count = state.window.record(now, policy.window()) as u64;
    if count <= policy.requests_per_window() {
        state.violations.reset();
        return Decision::Admitted;
    }

    if policy.blocking_enabled() {
        let hits = state.violations.record_violation();
        if hits >= policy.consecutive_limit_for_block() {
            state.block.block(now, policy.block_duration());
            warn!(
                client_key = %key,
                consecutive_violations = hits,
                block_secs = policy.block_duration().as_secs(),
                "client temporarily blocked"
            );
            return Decision::denied(DenyReason::NewlyBlocked, policy.block_duration());
        }
        debug!(client_key = %key, count, consecutive_violations = hits, "request rate limited");
    } else {
        debug!(client_key = %key, count, "request rate limited");
    }

    Decision::denied(DenyReason::RateLimited, policy.window())
}
