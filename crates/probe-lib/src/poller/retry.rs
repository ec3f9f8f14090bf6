//! Consecutive failure tracking

/// Where the counter stands after recording a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureState {
    /// Still below the limit
    Below { consecutive: u32 },
    /// The limit was reached; the counter has been reset
    LimitReached { attempts: u32 },
}

/// Counts failed cycles since the last success or the last limit hit
#[derive(Debug, Clone)]
pub struct FailureCounter {
    consecutive: u32,
    max_attempts: u32,
}

impl FailureCounter {
    /// Create a counter that trips after `max_attempts` failures (at least 1)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            consecutive: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Record a failed cycle
    pub fn record_failure(&mut self) -> FailureState {
        let attempts = self.consecutive.saturating_add(1);

        if attempts >= self.max_attempts {
            self.consecutive = 0;
            FailureState::LimitReached { attempts }
        } else {
            self.consecutive = attempts;
            FailureState::Below {
                consecutive: attempts,
            }
        }
    }

    /// Record a successful cycle
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn count(&self) -> u32 {
        self.consecutive
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
