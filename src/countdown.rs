use crate::snapshot::RoundStart;

/// Local round countdown. Remaining time is recomputed from the baseline on
/// every tick, never accumulated.
#[derive(Debug)]
pub struct CountdownTimer {
    round_ms: f64,
    baseline: RoundStart,
    remaining: Option<u32>,
}

impl CountdownTimer {
    pub fn new(round_ms: f64) -> Self {
        Self {
            round_ms,
            baseline: RoundStart::None,
            remaining: None,
        }
    }

    /// Moves the baseline. A sentinel baseline freezes the last value.
    pub fn rebase(&mut self, baseline: RoundStart) -> bool {
        let changed = self.baseline != baseline;
        self.baseline = baseline;
        changed
    }

    pub fn tick(&mut self, now_ms: f64) -> Option<u32> {
        if let RoundStart::At(start_ms) = self.baseline {
            self.remaining = Some(remaining_seconds(start_ms, self.round_ms, now_ms));
        }
        self.remaining
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    pub fn clear(&mut self) {
        self.baseline = RoundStart::None;
        self.remaining = None;
    }
}

pub fn remaining_seconds(start_ms: f64, round_ms: f64, now_ms: f64) -> u32 {
    let left = ((start_ms + round_ms - now_ms) / 1000.0).floor();
    if left.is_nan() || left <= 0.0 {
        0
    } else {
        left.min(f64::from(u32::MAX)) as u32
    }
}
