//! # Startup Sequence Module
//!
//! Boot animation played once at power-on:
//!
//! 1. `EyesClosed`: hold eyes closed, gaze centered
//! 2. `Opening`: ramp the eyelids open
//! 3. `LookAround`: one horizontal sweep across the idle movement range
//! 4. `ReturnToCenter`: settle at center with eyes open
//!
//! Like every animation it only produces logical targets; the motion
//! controller still smooths and clamps them.

use std::f32::consts::TAU;

use super::{Pose, CENTER, LIDS_CLOSED, LIDS_OPEN};
use crate::config::Config;

/// Phase of the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    EyesClosed,
    Opening,
    LookAround,
    ReturnToCenter,
    Done,
}

/// Timeline of the startup animation.
///
/// # Examples
///
/// ```
/// use animatronic_eyes::animation::{StartupPhase, StartupSequence};
/// use animatronic_eyes::config::Config;
///
/// let startup = StartupSequence::from_config(&Config::default(), 0).unwrap();
/// assert_eq!(startup.phase(0), StartupPhase::EyesClosed);
/// assert_eq!(startup.phase(1_000), StartupPhase::Opening);
/// assert_eq!(startup.phase(4_300), StartupPhase::Done);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartupSequence {
    started_ms: u64,
    eyes_closed_hold_ms: u64,
    eyes_open_ms: u64,
    look_around_ms: u64,
    return_to_center_ms: u64,
    reach: f32,
}

impl StartupSequence {
    /// Builds the sequence, or `None` when startup animation is disabled.
    #[must_use]
    pub fn from_config(config: &Config, started_ms: u64) -> Option<Self> {
        if !config.startup.enabled {
            return None;
        }

        Some(Self {
            started_ms,
            eyes_closed_hold_ms: config.startup.eyes_closed_hold_ms,
            eyes_open_ms: config.startup.eyes_open_ms,
            look_around_ms: config.startup.look_around_ms,
            return_to_center_ms: config.startup.return_to_center_ms,
            reach: config.idle.movement_range.clamp(0.0, 1.0) / 2.0,
        })
    }

    /// Total length of the sequence.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.eyes_closed_hold_ms
            + self.eyes_open_ms
            + self.look_around_ms
            + self.return_to_center_ms
    }

    /// Phase at `now_ms` and the time already spent in it.
    fn locate(&self, now_ms: u64) -> (StartupPhase, u64) {
        let mut elapsed = now_ms.saturating_sub(self.started_ms);

        for (phase, length) in [
            (StartupPhase::EyesClosed, self.eyes_closed_hold_ms),
            (StartupPhase::Opening, self.eyes_open_ms),
            (StartupPhase::LookAround, self.look_around_ms),
            (StartupPhase::ReturnToCenter, self.return_to_center_ms),
        ] {
            if elapsed < length {
                return (phase, elapsed);
            }
            elapsed -= length;
        }

        (StartupPhase::Done, elapsed)
    }

    #[must_use]
    pub fn phase(&self, now_ms: u64) -> StartupPhase {
        self.locate(now_ms).0
    }

    #[must_use]
    pub fn is_finished(&self, now_ms: u64) -> bool {
        self.phase(now_ms) == StartupPhase::Done
    }

    /// Logical targets at `now_ms`, `None` once the sequence is done.
    #[must_use]
    pub fn pose(&self, now_ms: u64) -> Option<Pose> {
        let (phase, elapsed) = self.locate(now_ms);

        match phase {
            StartupPhase::EyesClosed => Some(Pose::default().with_eyelids(LIDS_CLOSED)),
            StartupPhase::Opening => {
                let progress = elapsed as f32 / self.eyes_open_ms.max(1) as f32;
                let eyelids = LIDS_CLOSED - progress * (LIDS_CLOSED - LIDS_OPEN);
                Some(Pose::default().with_eyelids(eyelids))
            }
            StartupPhase::LookAround => {
                let progress = elapsed as f32 / self.look_around_ms.max(1) as f32;
                let horizontal = CENTER + self.reach * (TAU * progress).sin();
                Some(Pose::new(horizontal, CENTER, LIDS_OPEN))
            }
            StartupPhase::ReturnToCenter => Some(Pose::default()),
            StartupPhase::Done => None,
        }
    }
}
