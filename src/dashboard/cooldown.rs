//! Cooldown countdown derived from the contract's next-allowed time

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
    /// `nextAllowedTxTime` from the contract
    pub target: u64,
    pub remaining_secs: u64,
    pub active: bool,
}

impl Cooldown {
    /// Take a new target from a state load
    pub fn set_target(&mut self, target: u64, now: u64) {
        self.target = target;
        self.tick(now);
    }

    /// Recompute the countdown against `now`
    pub fn tick(&mut self, now: u64) {
        if self.target > now {
            self.remaining_secs = self.target - now;
            self.active = true;
        } else {
            self.remaining_secs = 0;
            self.active = false;
        }
    }

    pub fn label(&self) -> String {
        if self.active {
            format!("{}s WAIT", self.remaining_secs)
        } else {
            "READY".to_string()
        }
    }
}
