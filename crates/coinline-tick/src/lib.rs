//! Interval scheduler for the expiry sweep.
//!
//! The queue engine's `expire_sweep` is idempotent and already runs on
//! every request, so correctness never depends on this crate. What the
//! scheduler adds is promptness during quiet periods: with nobody
//! polling, an overdue turn offer would otherwise sit stale until the
//! next request arrives. The server runs one [`SweepScheduler`] in a
//! background task that fires at a fixed interval.
//!
//! # Opportunistic-only mode
//!
//! When the interval is `None`, [`SweepScheduler::wait_for_sweep`] pends
//! forever — expiry then happens solely on request paths. This mirrors
//! the pure pull-based design and is the right mode for tests that
//! control time themselves.
//!
//! # Integration
//!
//! ```ignore
//! let mut scheduler = SweepScheduler::new(SweepConfig::with_interval(interval));
//! loop {
//!     let info = scheduler.wait_for_sweep().await;
//!     engine.sweep().await?;
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between sweeps. `None` = opportunistic-only (never fires).
    pub interval: Option<Duration>,
    /// Random jitter (0–max ms) added to the *first* sweep so several
    /// coordinators started at the same instant don't align their writes.
    pub initial_jitter_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_secs(1)),
            initial_jitter_ms: 200,
        }
    }
}

impl SweepConfig {
    /// Shortest allowed interval. Sub-interval deadlines are invisible to
    /// callers anyway — the engine also sweeps on every request.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(50);

    /// Create a config for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            ..Default::default()
        }
    }

    /// Create a config that never fires (opportunistic-only mode).
    pub fn opportunistic_only() -> Self {
        Self {
            interval: None,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`SweepScheduler::new`]. An interval below
    /// [`Self::MIN_INTERVAL`] is raised to it.
    pub fn validated(mut self) -> Self {
        if let Some(interval) = self.interval {
            if interval < Self::MIN_INTERVAL {
                tracing::warn!(
                    ?interval,
                    min = ?Self::MIN_INTERVAL,
                    "sweep interval below minimum — clamping"
                );
                self.interval = Some(Self::MIN_INTERVAL);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Sweep info
// ---------------------------------------------------------------------------

/// Information about a fired sweep, returned by
/// [`SweepScheduler::wait_for_sweep`].
#[derive(Debug, Clone)]
pub struct SweepInfo {
    /// Monotonically increasing sweep number (starts at 1).
    pub sweep: u64,
    /// `true` if this sweep fired noticeably late (>50% of the interval).
    pub late: bool,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fires at a fixed interval to drive the engine's expiry sweep.
pub struct SweepScheduler {
    config: SweepConfig,
    /// When the next sweep should fire.
    next_sweep: Option<TokioInstant>,
    sweep_count: u64,
    paused: bool,
}

impl SweepScheduler {
    /// Create a new scheduler from config.
    ///
    /// The first sweep is scheduled with optional jitter.
    pub fn new(config: SweepConfig) -> Self {
        let config = config.validated();

        let next_sweep = config.interval.map(|interval| {
            let jitter = if config.initial_jitter_ms > 0 {
                let ms = rand::rng().random_range(0..config.initial_jitter_ms);
                Duration::from_millis(ms)
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + interval + jitter
        });

        match config.interval {
            None => debug!("sweep scheduler created in opportunistic-only mode"),
            Some(interval) => {
                debug!(?interval, "sweep scheduler created");
            }
        }

        Self {
            config,
            next_sweep,
            sweep_count: 0,
            paused: false,
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(SweepConfig::with_interval(interval))
    }

    /// Wait until the next sweep is due.
    ///
    /// In opportunistic-only mode or while paused, this future pends
    /// forever — `tokio::select!` around it still serves other branches.
    pub async fn wait_for_sweep(&mut self) -> SweepInfo {
        let (next, interval) = match (self.next_sweep, self.config.interval) {
            (Some(next), Some(interval)) if !self.paused => (next, interval),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.sweep_count += 1;
        let late = now.saturating_duration_since(next) > interval / 2;

        // Always reschedule from now: a burst of catch-up sweeps would be
        // pure overhead, the sweep itself is idempotent.
        self.next_sweep = Some(now + interval);

        trace!(sweep = self.sweep_count, late, "sweep fired");

        SweepInfo {
            sweep: self.sweep_count,
            late,
        }
    }

    /// Pause the sweep loop. `wait_for_sweep` pends until
    /// [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(sweep = self.sweep_count, "sweep scheduler paused");
        }
    }

    /// Resume after a pause.
    ///
    /// Resets the next deadline to `now + interval` so time spent paused
    /// doesn't fire a burst of immediate sweeps.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(interval) = self.config.interval {
                self.next_sweep = Some(TokioInstant::now() + interval);
            }
            debug!(sweep = self.sweep_count, "sweep scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether this scheduler never fires (interval = `None`).
    pub fn is_opportunistic_only(&self) -> bool {
        self.config.interval.is_none()
    }

    /// Number of sweeps fired so far.
    pub fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    /// The configured interval, or `None` in opportunistic-only mode.
    pub fn interval(&self) -> Option<Duration> {
        self.config.interval
    }
}
