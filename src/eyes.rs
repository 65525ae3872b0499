//! # Eye Mechanism Module
//!
//! One cooperative control tick for the whole mechanism.
//!
//! Each call to [`EyeMechanism::tick`]:
//!
//! 1. Samples the Nunchuck. A failed read holds every output for this tick.
//! 2. Picks the motion source: the user when input is fresh, otherwise the
//!    startup animation while it runs, otherwise the idle scheduler's pose
//!    while idling, otherwise the user's (centered) stick.
//! 3. Runs every role channel through the [`MotionController`].
//! 4. Advances the [`IdleScheduler`].
//! 5. Writes changed pulses to the servo shield. A failed write is logged and
//!    the axis is rewound to the last pulse the shield accepted.
//!
//! Hardware errors never leave this module.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::animation::{
    Blink, IdleScheduler, IdleSettings, IdleState, Pose, StartupSequence, LIDS_OPEN,
};
use crate::config::{Config, RoleConfig};
use crate::controller::{Buttons, JoystickCalibration, JoystickReading};
use crate::error::ConfigError;
use crate::hardware::{JoystickSource, ServoDriver};
use crate::limits::ChannelLimits;
use crate::motion::MotionController;

/// What drove the mechanism during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveSource {
    /// Input was unavailable; nothing moved
    Hold,
    /// Nunchuck stick and buttons
    User,
    /// Power-on animation
    Startup,
    /// Idle look and blink animation
    Idle,
}

/// Eyelid target for a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Lids {
    /// Logical position, 0.0 = open, 1.0 = closed
    Logical(f32),
    /// Each lid's calibrated half-closed pulse
    Half,
}

/// Outcome of one control tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub now_ms: u64,
    pub source: DriveSource,
    /// Idle scheduler state after the tick.
    pub state: IdleState,
    /// Pulse held by each driven channel after the tick.
    pub pulses: Vec<(u8, u16)>,
    /// Pulses accepted by the shield.
    pub writes: usize,
    /// Pulses the shield rejected.
    pub write_failures: usize,
}

impl TickReport {
    /// Pulse held by `channel` after the tick, if it was driven.
    #[must_use]
    pub fn pulse(&self, channel: u8) -> Option<u16> {
        self.pulses
            .iter()
            .find(|(driven, _)| *driven == channel)
            .map(|(_, pulse)| *pulse)
    }
}

/// The eye mechanism: input, motion, animation and output wired together.
pub struct EyeMechanism<D, J, R> {
    driver: D,
    joystick: J,
    calibration: JoystickCalibration,
    roles: RoleConfig,
    motion: MotionController,
    scheduler: IdleScheduler<R>,
    startup: Option<StartupSequence>,
    blink_duration_ms: u64,
    user_blink: Option<Blink>,
    previous_buttons: Buttons,
    /// Last pulse the shield accepted per channel
    accepted: BTreeMap<u8, u16>,
    ticks: u64,
}

impl<D: ServoDriver, J: JoystickSource, R: Rng> EyeMechanism<D, J, R> {
    /// Builds the mechanism from a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Calibration and tuning
    /// * `driver` - Servo shield backend
    /// * `joystick` - Nunchuck backend
    /// * `rng` - Randomness for idle animation
    /// * `now_ms` - Monotonic timestamp of power-on
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found.
    pub fn new(
        config: &Config,
        driver: D,
        joystick: J,
        rng: R,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let motion = MotionController::new(config.registry()?, config);
        let startup = StartupSequence::from_config(config, now_ms);

        info!(
            "Eye mechanism ready: {} channels on shield 0x{:02x}, startup animation {}",
            motion.registry().len(),
            config.hardware.servo_shield_address,
            if startup.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            driver,
            joystick,
            calibration: JoystickCalibration::from_config(&config.nunchuck, &config.motion),
            roles: config.roles.clone(),
            motion,
            scheduler: IdleScheduler::new(IdleSettings::from_config(config), rng, now_ms),
            startup,
            blink_duration_ms: config.motion.blink_duration_ms,
            user_blink: None,
            previous_buttons: Buttons::empty(),
            accepted: BTreeMap::new(),
            ticks: 0,
        })
    }

    #[must_use]
    pub fn state(&self) -> IdleState {
        self.scheduler.state()
    }

    #[must_use]
    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Whether the startup animation is still playing.
    #[must_use]
    pub fn is_starting_up(&self) -> bool {
        self.startup.is_some()
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one control tick at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        self.ticks += 1;

        let reading = match self.joystick.read_joystick() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Joystick read failed, holding outputs: {}", e);
                return TickReport {
                    now_ms,
                    source: DriveSource::Hold,
                    state: self.scheduler.state(),
                    pulses: Vec::new(),
                    writes: 0,
                    write_failures: 0,
                };
            }
        };

        let fresh = reading.is_active(&self.calibration);
        let user_eyelids = self.user_eyelids(&reading, now_ms);

        let animation = if fresh {
            if self.startup.take().is_some() {
                info!("User input, skipping startup animation");
            }
            None
        } else {
            self.startup_pose(now_ms)
                .map(|pose| (DriveSource::Startup, pose))
                .or_else(|| self.scheduler.pose(now_ms).map(|pose| (DriveSource::Idle, pose)))
        };

        let (source, mut pulses) = match animation {
            Some((source, pose)) => (source, self.drive_pose(pose, now_ms)),
            None => (DriveSource::User, self.drive_user(&reading, user_eyelids, now_ms)),
        };

        let state = self.scheduler.tick(now_ms, fresh);
        let (writes, write_failures) = self.write(&mut pulses);

        TickReport {
            now_ms,
            source,
            state,
            pulses,
            writes,
            write_failures,
        }
    }

    /// Eyelid target from the buttons: Z starts a blink, C held squints.
    fn user_eyelids(&mut self, reading: &JoystickReading, now_ms: u64) -> Lids {
        let pressed = reading.buttons & !self.previous_buttons;
        self.previous_buttons = reading.buttons;

        if pressed.contains(Buttons::Z) {
            debug!("User blink ({}ms)", self.blink_duration_ms);
            self.user_blink = Some(Blink::new(now_ms, self.blink_duration_ms));
        }

        if let Some(blink) = self.user_blink {
            if !blink.is_finished(now_ms) {
                return Lids::Logical(blink.eyelids(now_ms));
            }
            self.user_blink = None;
        }

        if reading.buttons.contains(Buttons::C) {
            Lids::Half
        } else {
            Lids::Logical(LIDS_OPEN)
        }
    }

    fn startup_pose(&mut self, now_ms: u64) -> Option<Pose> {
        let pose = self.startup?.pose(now_ms);
        if pose.is_none() {
            info!("Startup animation complete");
            self.startup = None;
        }
        pose
    }

    fn drive_user(
        &mut self,
        reading: &JoystickReading,
        eyelids: Lids,
        now_ms: u64,
    ) -> Vec<(u8, u16)> {
        let mut pulses = Vec::with_capacity(6);

        let horizontal = self.roles.horizontal;
        let vertical = self.roles.vertical;
        if let Some(pulse) = self.motion.tick(horizontal, &self.calibration.x, reading.x, now_ms) {
            pulses.push((horizontal, pulse));
        }
        if let Some(pulse) = self.motion.tick(vertical, &self.calibration.y, reading.y, now_ms) {
            pulses.push((vertical, pulse));
        }

        self.drive_eyelids(eyelids, now_ms, &mut pulses);
        pulses
    }

    fn drive_pose(&mut self, pose: Pose, now_ms: u64) -> Vec<(u8, u16)> {
        let mut pulses = Vec::with_capacity(6);

        for (channel, logical) in [
            (self.roles.horizontal, pose.horizontal),
            (self.roles.vertical, pose.vertical),
        ] {
            if let Some(pulse) = self.motion.drive_logical(channel, logical, now_ms) {
                pulses.push((channel, pulse));
            }
        }

        self.drive_eyelids(Lids::Logical(pose.eyelids), now_ms, &mut pulses);
        pulses
    }

    fn drive_eyelids(&mut self, eyelids: Lids, now_ms: u64, pulses: &mut Vec<(u8, u16)>) {
        for (_, channel) in self.roles.eyelids() {
            let pulse = match eyelids {
                Lids::Logical(logical) => self.motion.drive_logical(channel, logical, now_ms),
                Lids::Half => self
                    .motion
                    .registry()
                    .half_pulse(channel)
                    .and_then(|half| self.motion.drive_pulse(channel, half, now_ms)),
            };

            if let Some(pulse) = pulse {
                pulses.push((channel, pulse));
            }
        }
    }

    /// Sends changed pulses to the shield, rewinding axes whose write failed.
    fn write(&mut self, pulses: &mut [(u8, u16)]) -> (usize, usize) {
        let mut writes = 0;
        let mut failures = 0;

        for entry in pulses.iter_mut() {
            let (channel, pulse) = *entry;
            if self.accepted.get(&channel) == Some(&pulse) {
                continue;
            }

            match self.driver.set_pulse(channel, pulse) {
                Ok(()) => {
                    self.accepted.insert(channel, pulse);
                    writes += 1;
                }
                Err(e) => {
                    failures += 1;
                    let held = self.accepted.get(&channel).copied().or_else(|| {
                        self.motion
                            .registry()
                            .get(channel)
                            .map(ChannelLimits::rest_pulse)
                    });

                    warn!("Servo write failed, channel {} holds {:?}: {}", channel, held, e);
                    if let Some(held) = held {
                        self.motion.hold(channel, held);
                        entry.1 = held;
                    }
                }
            }
        }

        (writes, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::LIDS_CLOSED;
    use crate::config::ChannelConfig;
    use crate::error::HardwareError;
    use crate::hardware::{
        CenteredJoystick, LoggingServoDriver, MockJoystickSource, MockServoDriver,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FULL_LEFT: JoystickReading = JoystickReading {
        x: 26,
        y: 126,
        buttons: Buttons::empty(),
    };

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.startup.enabled = false;
        config
    }

    /// Idle starts after 100ms and the next look or blink is due 20ms later.
    fn fast_idle_config(look_first: bool) -> Config {
        let mut config = quiet_config();
        config.idle.timeout_ms = 100;
        let (soon, late) = (20, 60_000);
        let (blink, look) = if look_first { (late, soon) } else { (soon, late) };
        config.idle.blink_min_ms = blink;
        config.idle.blink_max_ms = blink;
        config.idle.look_min_ms = look;
        config.idle.look_max_ms = look;
        config.idle.sequence_min_ms = 5_000;
        config.idle.sequence_max_ms = 5_000;
        config
    }

    fn accepting_driver() -> MockServoDriver {
        let mut driver = MockServoDriver::new();
        driver.expect_set_pulse().returning(|_, _| Ok(()));
        driver
    }

    /// Joystick left alone for `idle_reads` reads, then pushed full left.
    fn joystick_touched_after(idle_reads: u64) -> MockJoystickSource {
        let mut joystick = MockJoystickSource::new();
        let mut reads = 0;
        joystick.expect_read_joystick().returning(move || {
            reads += 1;
            if reads <= idle_reads {
                Ok(JoystickReading::default())
            } else {
                Ok(FULL_LEFT)
            }
        });
        joystick
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = Config::default();
        config.channels[0] = ChannelConfig::movement(0, 470, 345, 220, true);

        let joystick = CenteredJoystick::default();
        let result = EyeMechanism::new(&config, accepting_driver(), joystick, rng(), 0);
        assert!(matches!(result, Err(ConfigError::InvertedBounds { channel: 0, .. })));
    }

    #[test]
    fn test_first_tick_writes_every_role() {
        let driver = LoggingServoDriver::new(0x44);
        let joystick = CenteredJoystick::default();
        let mut eyes = EyeMechanism::new(&quiet_config(), driver, joystick, rng(), 0).unwrap();

        let report = eyes.tick(0);
        assert_eq!(report.source, DriveSource::User);
        assert_eq!(report.pulses.len(), 6);
        assert_eq!(report.writes, 6);
        assert_eq!(report.pulse(0), Some(345));
        assert_eq!(eyes.driver().pulse(1), Some(342));

        // Nothing changed, nothing written
        let report = eyes.tick(20);
        assert_eq!(report.writes, 0);
        assert_eq!(eyes.ticks(), 2);
    }

    // ==================== End-to-end Tests ====================

    #[test]
    fn test_full_left_converges_to_inverted_max() {
        let driver = LoggingServoDriver::new(0x44);
        let joystick = CenteredJoystick::new(FULL_LEFT);
        let mut eyes = EyeMechanism::new(&quiet_config(), driver, joystick, rng(), 0).unwrap();

        let mut previous = 345;
        for step in 0..300u64 {
            let report = eyes.tick(step * 20);
            let pulse = report.pulse(0).unwrap();
            assert!((220..=470).contains(&pulse));
            assert!(pulse.abs_diff(previous) <= 50);
            previous = pulse;
        }

        assert_eq!(eyes.driver().pulse(0), Some(470));
        assert_eq!(eyes.state(), IdleState::Active);
    }

    #[test]
    fn test_user_blink_closes_and_reopens_within_duration() {
        let mut config = quiet_config();
        config.channels[2] = ChannelConfig::eyelid(2, 130, 610, 370, false);
        config.motion.eyelid_smoothing = 1.0;
        config.safety.max_delta_per_update = 200;
        config.safety.min_update_interval_ms = 10;
        config.hardware.update_interval_ms = 10;

        let mut joystick = MockJoystickSource::new();
        let mut reads = 0;
        joystick.expect_read_joystick().returning(move || {
            reads += 1;
            let buttons = if reads == 1 { Buttons::Z } else { Buttons::empty() };
            Ok(JoystickReading::new(126, 126, buttons))
        });

        let mut eyes = EyeMechanism::new(&config, accepting_driver(), joystick, rng(), 0).unwrap();

        let trace: Vec<(u64, u16)> = (0..=150)
            .step_by(10)
            .map(|now| (now, eyes.tick(now).pulse(2).unwrap()))
            .collect();

        let closing: Vec<u16> = trace
            .iter()
            .filter(|(now, _)| *now < 75)
            .map(|(_, p)| *p)
            .collect();
        let opening: Vec<u16> = trace
            .iter()
            .filter(|(now, _)| *now >= 75)
            .map(|(_, p)| *p)
            .collect();

        assert!(closing.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", trace);
        assert!(opening.windows(2).all(|pair| pair[0] >= pair[1]), "{:?}", trace);
        assert_eq!(closing.last(), Some(&610));
        assert_eq!(opening.last(), Some(&130));
    }

    #[test]
    fn test_c_button_squints() {
        let joystick = CenteredJoystick::new(JoystickReading::new(126, 126, Buttons::C));
        let mut eyes =
            EyeMechanism::new(&quiet_config(), accepting_driver(), joystick, rng(), 0).unwrap();

        for step in 0..100u64 {
            eyes.tick(step * 20);
        }

        // Left upper lid half reference
        assert_eq!(eyes.motion().current_pulse(2), Some(335));
        for channel in 2..=5 {
            let half = eyes.motion().registry().half_pulse(channel);
            assert_eq!(eyes.motion().current_pulse(channel), half);
        }
        assert_eq!(eyes.state(), IdleState::Active);
    }

    // ==================== Preemption Tests ====================

    #[test]
    fn test_input_preempts_idle_look() {
        let mut eyes = EyeMechanism::new(
            &fast_idle_config(true),
            accepting_driver(),
            joystick_touched_after(8),
            rng(),
            0,
        )
        .unwrap();

        for step in 0..8u64 {
            eyes.tick(step * 20);
        }
        assert_eq!(eyes.state(), IdleState::IdleLook);
        let before = eyes.motion().current_pulse(0).unwrap();

        let report = eyes.tick(160);
        assert_eq!(report.source, DriveSource::User);
        assert_eq!(report.state, IdleState::Active);
        assert_eq!(eyes.motion().axis(0).unwrap().target_pulse(), 470);
        // The written pulse already moves toward full left
        let after = report.pulse(0).unwrap();
        assert!(after > before, "{} -> {}", before, after);
        assert!(after <= 470);
    }

    #[test]
    fn test_input_preempts_idle_blink() {
        let mut eyes = EyeMechanism::new(
            &fast_idle_config(false),
            accepting_driver(),
            joystick_touched_after(8),
            rng(),
            0,
        )
        .unwrap();

        for step in 0..7u64 {
            eyes.tick(step * 20);
        }
        let report = eyes.tick(140);
        assert_eq!(report.source, DriveSource::Idle);
        assert_eq!(eyes.state(), IdleState::IdleBlink);
        assert_eq!(eyes.motion().axis(2).unwrap().target_pulse(), 410);
        let before = eyes.motion().current_pulse(2).unwrap();
        assert!(before > 300);

        let report = eyes.tick(160);
        assert_eq!(report.state, IdleState::Active);
        assert_eq!(report.source, DriveSource::User);
        // Lids head back open on the same tick
        assert_eq!(eyes.motion().axis(2).unwrap().target_pulse(), 300);
        let after = report.pulse(2).unwrap();
        assert!(after < before, "{} -> {}", before, after);
        assert!(after >= 300);
    }

    #[test]
    fn test_idle_pose_drives_all_lids() {
        let mut eyes = EyeMechanism::new(
            &fast_idle_config(false),
            accepting_driver(),
            CenteredJoystick::default(),
            rng(),
            0,
        )
        .unwrap();

        for step in 0..8u64 {
            eyes.tick(step * 20);
        }

        let registry = eyes.motion().registry().clone();
        for (_, channel) in RoleConfig::default().eyelids() {
            let closed = registry.map_logical(channel, LIDS_CLOSED).unwrap();
            assert_eq!(eyes.motion().axis(channel).unwrap().target_pulse(), closed);
        }
    }

    // ==================== Hardware Failure Tests ====================

    #[test]
    fn test_read_failure_holds_outputs() {
        let mut joystick = MockJoystickSource::new();
        joystick
            .expect_read_joystick()
            .returning(|| Err(HardwareError::Read("nunchuck did not ack".to_string())));
        let mut driver = MockServoDriver::new();
        driver.expect_set_pulse().never();

        let mut eyes = EyeMechanism::new(&quiet_config(), driver, joystick, rng(), 0).unwrap();
        let report = eyes.tick(0);

        assert_eq!(report.source, DriveSource::Hold);
        assert!(report.pulses.is_empty());
        assert_eq!(report.writes, 0);
        assert_eq!(eyes.motion().axis(0).unwrap().last_update_ms(), None);
    }

    #[test]
    fn test_write_failure_retains_last_good_pulse() {
        let mut driver = MockServoDriver::new();
        let mut horizontal_writes = 0;
        driver.expect_set_pulse().returning(move |channel, _| {
            if channel == 0 {
                horizontal_writes += 1;
                if horizontal_writes > 1 {
                    return Err(HardwareError::Write {
                        channel,
                        reason: "bus timeout".to_string(),
                    });
                }
            }
            Ok(())
        });

        let joystick = CenteredJoystick::new(FULL_LEFT);
        let mut eyes = EyeMechanism::new(&quiet_config(), driver, joystick, rng(), 0).unwrap();

        let first = eyes.tick(0);
        assert_eq!(first.pulse(0), Some(361));
        assert_eq!(first.write_failures, 0);

        for step in 1..10u64 {
            let report = eyes.tick(step * 20);
            assert_eq!(report.write_failures, 1);
            assert_eq!(report.pulse(0), Some(361));
            assert_eq!(eyes.motion().current_pulse(0), Some(361));
        }

        // The other channels keep working
        assert!(eyes.motion().current_pulse(1).is_some());
    }

    // ==================== Startup Tests ====================

    #[test]
    fn test_startup_closes_then_opens_eyes() {
        let driver = LoggingServoDriver::new(0x44);
        let joystick = CenteredJoystick::default();
        let mut eyes = EyeMechanism::new(&Config::default(), driver, joystick, rng(), 0).unwrap();
        assert!(eyes.is_starting_up());

        let mut now = 0;
        while now < 1_000 {
            assert_eq!(eyes.tick(now).source, DriveSource::Startup);
            now += 20;
        }
        assert_eq!(eyes.driver().pulse(2), Some(410));

        while now < 4_300 {
            eyes.tick(now);
            now += 20;
        }
        assert_eq!(eyes.tick(now).source, DriveSource::User);
        assert!(!eyes.is_starting_up());

        for _ in 0..100 {
            now += 20;
            eyes.tick(now);
        }
        assert_eq!(eyes.driver().pulse(2), Some(300));
        assert_eq!(eyes.driver().pulse(0), Some(345));
    }

    #[test]
    fn test_input_skips_startup() {
        let joystick = CenteredJoystick::new(FULL_LEFT);
        let mut eyes =
            EyeMechanism::new(&Config::default(), accepting_driver(), joystick, rng(), 0).unwrap();

        let report = eyes.tick(0);
        assert_eq!(report.source, DriveSource::User);
        assert!(!eyes.is_starting_up());
    }
}
