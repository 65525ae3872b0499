//! # Idle Scheduler Module
//!
//! Makes the eyes come alive when the Nunchuck is not being used.
//!
//! ## States
//!
//! | State | Meaning | Leaves when |
//! |-------|---------|-------------|
//! | `Active` | Recent user input | No input for `timeout_ms` → `IdleWait` |
//! | `IdleWait` | Waiting for the next idle motion | Blink or look due time elapses |
//! | `IdleLook` | Holding a random gaze point | Sequence duration elapses → `IdleWait` |
//! | `IdleBlink` | Blinking | Blink duration elapses → `IdleWait` |
//!
//! Fresh user input moves any state to `Active` on the same tick, abandoning
//! the motion in progress. Due times are drawn uniformly from their windows
//! when idling starts and redrawn at the end of the cycle that consumed them.

use rand::Rng;
use tracing::{debug, info};

use super::{Blink, Pose, CENTER, LIDS_OPEN};
use crate::config::Config;

/// Sub-state of the idle scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// Recent user input
    Active,
    /// No input, waiting for the next look or blink
    IdleWait,
    /// Executing an autonomous gaze sequence
    IdleLook,
    /// Executing a blink
    IdleBlink,
}

impl IdleState {
    /// Whether the scheduler is driving the mechanism.
    #[must_use]
    pub fn is_idle(self) -> bool {
        self != IdleState::Active
    }
}

/// Timing windows for idle animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleSettings {
    pub timeout_ms: u64,
    pub blink_min_ms: u64,
    pub blink_max_ms: u64,
    pub look_min_ms: u64,
    pub look_max_ms: u64,
    pub sequence_min_ms: u64,
    pub sequence_max_ms: u64,
    /// Fraction of the gaze range used by idle looks (0.0 to 1.0).
    pub movement_range: f32,
    pub blink_duration_ms: u64,
}

impl IdleSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout_ms: config.idle.timeout_ms,
            blink_min_ms: config.idle.blink_min_ms,
            blink_max_ms: config.idle.blink_max_ms,
            look_min_ms: config.idle.look_min_ms,
            look_max_ms: config.idle.look_max_ms,
            sequence_min_ms: config.idle.sequence_min_ms,
            sequence_max_ms: config.idle.sequence_max_ms,
            movement_range: config.idle.movement_range,
            blink_duration_ms: config.motion.blink_duration_ms,
        }
    }
}

/// Mechanism-wide idle state machine.
///
/// Owned by the control loop and mutated only from [`IdleScheduler::tick`].
#[derive(Debug)]
pub struct IdleScheduler<R> {
    settings: IdleSettings,
    rng: R,
    state: IdleState,
    last_input_ms: u64,
    next_blink_due_ms: u64,
    next_look_due_ms: u64,
    look_ends_ms: u64,
    gaze: (f32, f32),
    blink: Option<Blink>,
}

impl<R: Rng> IdleScheduler<R> {
    /// Creates a scheduler in `Active`, treating `now_ms` as the last input.
    pub fn new(settings: IdleSettings, rng: R, now_ms: u64) -> Self {
        Self {
            settings,
            rng,
            state: IdleState::Active,
            last_input_ms: now_ms,
            next_blink_due_ms: u64::MAX,
            next_look_due_ms: u64::MAX,
            look_ends_ms: 0,
            gaze: (CENTER, CENTER),
            blink: None,
        }
    }

    /// Current idle sub-state.
    #[must_use]
    pub fn state(&self) -> IdleState {
        self.state
    }

    /// Timing windows in use.
    #[must_use]
    pub fn settings(&self) -> &IdleSettings {
        &self.settings
    }

    #[must_use]
    pub fn last_input_ms(&self) -> u64 {
        self.last_input_ms
    }

    #[must_use]
    pub fn next_blink_due_ms(&self) -> u64 {
        self.next_blink_due_ms
    }

    #[must_use]
    pub fn next_look_due_ms(&self) -> u64 {
        self.next_look_due_ms
    }

    /// Advances the state machine by one control tick.
    ///
    /// # Arguments
    ///
    /// * `now_ms` - Monotonic timestamp in milliseconds
    /// * `user_input` - Whether fresh user input was sampled this tick
    ///
    /// # Returns
    ///
    /// The state after the tick.
    pub fn tick(&mut self, now_ms: u64, user_input: bool) -> IdleState {
        if user_input {
            if self.state.is_idle() {
                info!("User input detected, leaving idle animation ({:?})", self.state);
            }
            self.state = IdleState::Active;
            self.last_input_ms = now_ms;
            self.blink = None;
            return self.state;
        }

        match self.state {
            IdleState::Active => {
                if now_ms.saturating_sub(self.last_input_ms) >= self.settings.timeout_ms {
                    info!(
                        "No input for {}ms, starting idle animation",
                        now_ms.saturating_sub(self.last_input_ms)
                    );
                    self.gaze = (CENTER, CENTER);
                    self.next_blink_due_ms = now_ms + self.draw_blink_interval();
                    self.next_look_due_ms = now_ms + self.draw_look_interval();
                    self.state = IdleState::IdleWait;
                }
            }
            IdleState::IdleWait => {
                let blink_due = now_ms >= self.next_blink_due_ms;
                let look_due = now_ms >= self.next_look_due_ms;

                if blink_due && self.next_blink_due_ms <= self.next_look_due_ms {
                    self.start_blink(now_ms);
                } else if look_due {
                    self.start_look(now_ms);
                } else if blink_due {
                    self.start_blink(now_ms);
                }
            }
            IdleState::IdleLook => {
                if now_ms >= self.look_ends_ms {
                    self.next_look_due_ms = now_ms + self.draw_look_interval();
                    self.state = IdleState::IdleWait;
                }
            }
            IdleState::IdleBlink => {
                if self.blink.map_or(true, |blink| blink.is_finished(now_ms)) {
                    self.blink = None;
                    self.next_blink_due_ms = now_ms + self.draw_blink_interval();
                    self.state = IdleState::IdleWait;
                }
            }
        }

        self.state
    }

    /// Logical targets while idle, `None` while the user is in control.
    #[must_use]
    pub fn pose(&self, now_ms: u64) -> Option<Pose> {
        if !self.state.is_idle() {
            return None;
        }

        let eyelids = self.blink.map_or(LIDS_OPEN, |blink| blink.eyelids(now_ms));
        Some(Pose::new(self.gaze.0, self.gaze.1, eyelids))
    }

    fn start_blink(&mut self, now_ms: u64) {
        debug!("Idle blink ({}ms)", self.settings.blink_duration_ms);
        self.blink = Some(Blink::new(now_ms, self.settings.blink_duration_ms));
        self.state = IdleState::IdleBlink;
    }

    fn start_look(&mut self, now_ms: u64) {
        let reach = self.settings.movement_range.clamp(0.0, 1.0) / 2.0;
        let horizontal = CENTER + reach * self.rng.gen_range(-1.0f32..=1.0);
        let vertical = CENTER + reach * self.rng.gen_range(-1.0f32..=1.0);
        let duration = self.draw(self.settings.sequence_min_ms, self.settings.sequence_max_ms);

        debug!(
            "Idle look to ({:.2}, {:.2}) for {}ms",
            horizontal, vertical, duration
        );
        self.gaze = (horizontal, vertical);
        self.look_ends_ms = now_ms + duration;
        self.state = IdleState::IdleLook;
    }

    fn draw_blink_interval(&mut self) -> u64 {
        self.draw(self.settings.blink_min_ms, self.settings.blink_max_ms)
    }

    fn draw_look_interval(&mut self) -> u64 {
        self.draw(self.settings.look_min_ms, self.settings.look_max_ms)
    }

    /// Uniform draw from `[min, max]`, tolerating a reversed window.
    fn draw(&mut self, min: u64, max: u64) -> u64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(low..=high)
    }
}
