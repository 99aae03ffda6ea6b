//! Per-client request admission control.
//!
//! Every request is checked against an exact sliding window of recent
//! request timestamps for its client key. Clients that stay over the limit
//! for several consecutive checks can optionally be blocked outright for a
//! fixed period:
//!
//! - [`Policy`] -- validated limits shared by all keys.
//! - [`SlidingWindowCounter`] -- per-key timestamp log producing the current
//!   request count.
//! - [`ViolationEscalator`] -- per-key streak of over-limit decisions.
//! - [`BlockRegistry`] -- per-key temporary block with lazy expiry.
//! - [`AdmissionController`] -- runs the three in order for each request and
//!   returns a [`Decision`].
//!
//! All per-key state lives in a [`DashMap`](dashmap::DashMap) entry, so a
//! single shard lock makes each check atomic for its key.

pub mod block_registry;
pub mod controller;
pub mod decision;
pub mod escalator;
pub mod policy;
pub mod response;
pub mod sliding_window;
pub mod stats;

pub use block_registry::{BlockRegistry, BlockStatus};
pub use controller::AdmissionController;
pub use decision::{Decision, DenyReason};
pub use escalator::ViolationEscalator;
pub use policy::Policy;
pub use response::rejection_response;
pub use sliding_window::SlidingWindowCounter;
pub use stats::{AdmissionStats, StatsSnapshot};
