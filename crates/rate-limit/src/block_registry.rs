use std::time::{Duration, Instant};

/// Outcome of looking up a client's block at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// No block was recorded.
    None,
    /// The block is still in force until the contained instant.
    Active(Instant),
    /// A block was recorded but has run out; it has now been cleared.
    Expired,
}

/// Temporary block slot for one client.
///
/// Expiry is detected lazily: the entry is cleared by the first lookup at or
/// after `blocked_until`. There is no background timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRegistry {
    blocked_until: Option<Instant>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the block expiry if the client is still blocked at `now`.
    pub fn active_block(&mut self, now: Instant) -> Option<Instant> {
        match self.status(now) {
            BlockStatus::Active(until) => Some(until),
            BlockStatus::None | BlockStatus::Expired => None,
        }
    }

    /// Like [`active_block`](Self::active_block) but also reports whether an
    /// expired entry was just removed.
    pub fn status(&mut self, now: Instant) -> BlockStatus {
        match self.blocked_until {
            Some(until) if now < until => BlockStatus::Active(until),
            Some(_) => {
                self.blocked_until = None;
                BlockStatus::Expired
            }
            None => BlockStatus::None,
        }
    }

    /// Block until `now + duration`, replacing any existing entry.
    ///
    /// A duration past the platform's `Instant` range blocks until the
    /// latest representable instant instead.
    pub fn block(&mut self, now: Instant, duration: Duration) -> Instant {
        let until = saturating_add(now, duration);
        self.blocked_until = Some(until);
        until
    }

    /// Returns `true` if a block is recorded and still in force at `now`.
    /// Does not clear expired entries.
    pub fn is_blocked_at(&self, now: Instant) -> bool {
        matches!(self.blocked_until, Some(until) if now < until)
    }
}

fn saturating_add(now: Instant, mut duration: Duration) -> Instant {
    loop {
        if let Some(until) = now.checked_add(duration) {
            return until;
        }
        duration /= 2;
    }
}
