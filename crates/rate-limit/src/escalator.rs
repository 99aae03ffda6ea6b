/// Consecutive over-limit decisions for one client.
///
/// Any admitted request, and any block expiry, sets the streak back to zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViolationEscalator {
    consecutive_hits: u64,
}

impl ViolationEscalator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more violation and return the new streak length.
    pub fn record_violation(&mut self) -> u64 {
        self.consecutive_hits = self.consecutive_hits.saturating_add(1);
        self.consecutive_hits
    }

    pub fn reset(&mut self) {
        self.consecutive_hits = 0;
    }

    pub fn consecutive_hits(&self) -> u64 {
        self.consecutive_hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_increments_and_resets() {
        let mut escalator = ViolationEscalator::new();
        assert_eq!(escalator.consecutive_hits(), 0);

        assert_eq!(escalator.record_violation(), 1);
        assert_eq!(escalator.record_violation(), 2);

        escalator.reset();
        assert_eq!(escalator.consecutive_hits(), 0);
        assert_eq!(escalator.record_violation(), 1);
    }
}
