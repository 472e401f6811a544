//! Tick-based replay of a block's transaction outputs.
//!
//! Outputs of a freshly ingested block trickle in after a short delay, one
//! every few ticks, rather than all landing on the same frame. At most
//! `max_pending` outputs wait at once; the oldest go first when a batch
//! overflows, since their spheres would be evicted soonest anyway.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplaySettings {
    pub initial_delay: u64,
    pub interval: u64,
    pub max_pending: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            initial_delay: 45,
            interval: 2,
            max_pending: 250,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ScheduledOutput {
    due: u64,
    value: f64,
}

#[derive(Debug, Default)]
pub struct ReplayQueue {
    settings: ReplaySettings,
    tick: u64,
    // Sorted by `due`; equal due ticks keep insertion order.
    tasks: Vec<ScheduledOutput>,
}

impl ReplayQueue {
    pub fn new(settings: ReplaySettings) -> Self {
        Self {
            settings,
            tick: 0,
            tasks: Vec::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Queue `values` starting `initial_delay` ticks from now, `interval` apart.
    /// Returns how many pending outputs were dropped to stay within `max_pending`.
    pub fn schedule(&mut self, values: impl IntoIterator<Item = f64>) -> usize {
        let start = self.tick + self.settings.initial_delay;
        let interval = self.settings.interval.max(1);
        for (n, value) in values.into_iter().enumerate() {
            let due = start + n as u64 * interval;
            let at = self.tasks.partition_point(|t| t.due <= due);
            self.tasks.insert(at, ScheduledOutput { due, value });
        }
        let excess = self.tasks.len().saturating_sub(self.settings.max_pending);
        self.tasks.drain(..excess);
        excess
    }

    /// Advance one tick and return the outputs now due, oldest first.
    pub fn advance(&mut self) -> Vec<f64> {
        self.tick += 1;
        let ready = self.tasks.partition_point(|t| t.due <= self.tick);
        self.tasks.drain(..ready).map(|t| t.value).collect()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
