pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Granted,
    Denied { remaining: u32 },
    LockedOut,
}

/// Shared-secret check for one login prompt. Locks after [`MAX_ATTEMPTS`] misses.
#[derive(Debug)]
pub struct AdminGate {
    secret: String,
    failures: u32,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            failures: 0,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.failures >= MAX_ATTEMPTS
    }

    pub fn attempt(&mut self, input: &str) -> GateOutcome {
        if self.is_locked() {
            return GateOutcome::LockedOut;
        }
        if input == self.secret {
            self.failures = 0;
            return GateOutcome::Granted;
        }
        self.failures += 1;
        tracing::warn!(failures = self.failures, "admin secret mismatch");
        if self.is_locked() {
            GateOutcome::LockedOut
        } else {
            GateOutcome::Denied {
                remaining: MAX_ATTEMPTS - self.failures,
            }
        }
    }
}
