//! Engine configuration.

use std::time::Duration;

use coinline_protocol::MachineId;

/// Configuration for the queue engine.
///
/// One entry in `machines` per physical cabinet; the order given here is
/// the order machines appear in snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// The machines on the floor, in display order.
    pub machines: Vec<MachineId>,

    /// How long an offered player has to accept before being skipped.
    pub turn_timeout: Duration,

    /// How long a player who finished with an empty queue must wait
    /// before re-joining that same machine.
    pub courtesy_cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            machines: Vec::new(),
            turn_timeout: Duration::from_secs(60),
            courtesy_cooldown: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Create a config for the given machines with default timings.
    pub fn with_machines<I, M>(machines: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            machines: machines.into_iter().map(MachineId::new).collect(),
            ..Default::default()
        }
    }

    /// Fix up any unusable values so the config is safe to run with.
    ///
    /// Called automatically when the engine is built. Rules:
    /// - Duplicate machine ids are dropped (first occurrence wins).
    /// - A zero `turn_timeout` is kept but flagged — every offer would
    ///   expire on the next sweep.
    pub fn validated(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.machines.len());
        for id in std::mem::take(&mut self.machines) {
            if seen.contains(&id) {
                tracing::warn!(machine = %id, "duplicate machine id — dropping");
            } else {
                seen.push(id);
            }
        }
        self.machines = seen;

        if self.turn_timeout.is_zero() {
            tracing::warn!("turn_timeout is zero — every offer expires immediately");
        }
        self
    }
}
