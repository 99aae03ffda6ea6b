use serde::Serialize;
use std::time::Duration;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Over the window limit, not (yet) blocked.
    RateLimited,
    /// This request completed a violation streak and started a block.
    NewlyBlocked,
    /// The client is serving an earlier block.
    Blocked,
}

/// Result of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    Admitted,
    Denied {
        reason: DenyReason,
        retry_after_secs: u64,
    },
}

impl Decision {
    /// Build a denial, rounding the wait up to whole seconds.
    pub fn denied(reason: DenyReason, retry_after: Duration) -> Self {
        Decision::Denied {
            reason,
            retry_after_secs: ceil_secs(retry_after),
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Admitted => None,
            Decision::Denied { reason, .. } => Some(*reason),
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Decision::Admitted => None,
            Decision::Denied {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
        }
    }

    /// Human-facing text for a rejection response.
    ///
    /// Plain rate limiting states the wait in seconds; blocks state it in
    /// whole minutes, rounded up.
    pub fn rejection_message(&self) -> Option<String> {
        match *self {
            Decision::Admitted => None,
            Decision::Denied {
                reason: DenyReason::RateLimited,
                retry_after_secs,
            } => Some(format!(
                "Too many requests. Please try again in {retry_after_secs} seconds."
            )),
            Decision::Denied {
                reason: DenyReason::NewlyBlocked | DenyReason::Blocked,
                retry_after_secs,
            } => Some(format!(
                "Too many requests. You have been temporarily blocked. \
                 Please try again in {} minutes.",
                retry_after_secs.div_ceil(60)
            )),
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_rounds_up() {
        let decision = Decision::denied(DenyReason::Blocked, Duration::from_millis(1500));
        assert_eq!(decision.retry_after_secs(), Some(2));

        let decision = Decision::denied(DenyReason::RateLimited, Duration::from_secs(5));
        assert_eq!(decision.retry_after_secs(), Some(5));

        let decision = Decision::denied(DenyReason::Blocked, Duration::from_nanos(1));
        assert_eq!(decision.retry_after_secs(), Some(1));
    }

    #[test]
    fn admitted_has_no_message() {
        assert!(Decision::Admitted.is_admitted());
        assert_eq!(Decision::Admitted.rejection_message(), None);
        assert_eq!(Decision::Admitted.reason(), None);
    }

    #[test]
    fn rate_limited_message_uses_seconds() {
        let decision = Decision::denied(DenyReason::RateLimited, Duration::from_secs(5));
        assert_eq!(
            decision.rejection_message().unwrap(),
            "Too many requests. Please try again in 5 seconds."
        );
    }

    #[test]
    fn block_message_uses_minutes() {
        let decision = Decision::denied(DenyReason::NewlyBlocked, Duration::from_secs(900));
        assert!(decision.rejection_message().unwrap().ends_with("in 15 minutes."));

        let decision = Decision::denied(DenyReason::Blocked, Duration::from_secs(61));
        assert!(decision.rejection_message().unwrap().ends_with("in 2 minutes."));
    }

    #[test]
    fn serializes_with_outcome_tag() {
        let decision = Decision::denied(DenyReason::NewlyBlocked, Duration::from_secs(60));
        let json = serde_json::to_value(decision).unwrap();

        assert_eq!(json["outcome"], "denied");
        assert_eq!(json["reason"], "newly_blocked");
        assert_eq!(json["retry_after_secs"], 60);

        let json = serde_json::to_value(Decision::Admitted).unwrap();
        assert_eq!(json["outcome"], "admitted");
    }
}
