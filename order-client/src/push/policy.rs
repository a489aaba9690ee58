use std::time::Duration;

/// Delay before the next connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay every time, never gives up
    Fixed(Duration),
    /// Doubling delay capped at `max`, optionally bounded attempts
    Backoff {
        initial: Duration,
        max: Duration,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed(Duration::from_secs(3))
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), `None` to give up
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::Fixed(delay) => Some(*delay),
            Self::Backoff {
                initial,
                max,
                max_attempts,
            } => {
                if max_attempts.is_some_and(|limit| attempt > limit) {
                    return None;
                }
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                Some(initial.saturating_mul(factor).min(*max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_flat_three_seconds_forever() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_for(1_000), Some(Duration::from_secs(3)));
    }

    #[test]
    fn backoff_doubles_up_to_ceiling_then_stops() {
        let policy = ReconnectPolicy::Backoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(10),
            max_attempts: Some(6),
        };
        let delays: Vec<_> = (1..=7).map(|n| policy.delay_for(n)).collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                Some(Duration::from_secs(4)),
                Some(Duration::from_secs(8)),
                Some(Duration::from_secs(10)),
                Some(Duration::from_secs(10)),
                None,
            ]
        );
    }

    #[test]
    fn unbounded_backoff_never_overflows() {
        let policy = ReconnectPolicy::Backoff {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(60),
            max_attempts: None,
        };
        assert_eq!(policy.delay_for(200), Some(Duration::from_secs(60)));
    }
}
