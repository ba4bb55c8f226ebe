/// Counts ticks and clamps variable frame deltas.
#[derive(Debug, Clone)]
pub struct TickClock {
    tick: u64,
    /// Upper bound on a single step, so a stalled frame cannot explode the integrator.
    max_dt: f32,
}

impl TickClock {
    pub fn new(max_dt: f32) -> Self {
        Self { tick: 0, max_dt }
    }

    /// Start the next tick. Returns the clamped dt; non-finite or negative
    /// deltas become zero.
    pub fn advance(&mut self, frame_dt: f32) -> f32 {
        self.tick += 1;
        if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.max_dt)
        } else {
            0.0
        }
    }

    /// Number of ticks started so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn reset(&mut self) {
        self.tick = 0;
    }
}

/// Runs a stage on every Nth tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval: u32,
}

impl Cadence {
    pub fn every(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    /// Whether the stage runs on this (1-based) tick.
    pub fn is_due(&self, tick: u64) -> bool {
        tick > 0 && tick % u64::from(self.interval) == 0
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }
}
