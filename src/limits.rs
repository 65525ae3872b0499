//! # Channel Limits Registry
//!
//! Holds the safe pulse range, reference points and inversion flag of every
//! servo channel, validated once when the registry is loaded.
//!
//! ## Logical Positions
//!
//! Callers address a channel with a logical value in `0.0..=1.0`:
//!
//! | Logical | Movement channel | Eyelid channel |
//! |---------|------------------|----------------|
//! | 0.0 | `min_pulse` | `open_pulse` |
//! | 0.5 | `center_pulse` | midway between open and closed |
//! | 1.0 | `max_pulse` | `closed_pulse` |
//!
//! Movement channels interpolate linearly on each side of the center, so a
//! centered stick lands on `center_pulse`. Eyelids interpolate linearly from
//! open to closed; `half_pulse` is a separate target reached through
//! [`ChannelLimits::half_pulse`]. An inverted channel swaps which end logical
//! `0.0` lands on; the stored limits are never touched.
//!
//! ## Usage
//!
//! ```
//! use animatronic_eyes::config::{ChannelConfig, SafetyConfig};
//! use animatronic_eyes::limits::Registry;
//!
//! let channels = [ChannelConfig::movement(0, 220, 345, 470, true)];
//! let registry = Registry::load(&channels, &SafetyConfig::default()).unwrap();
//!
//! assert_eq!(registry.clamp(0, 600), 470);
//! assert_eq!(registry.map_logical(0, 0.0), Some(470)); // inverted
//! assert_eq!(registry.map_logical(0, 0.5), Some(345));
//! ```

use std::collections::BTreeMap;

use crate::config::{ChannelConfig, ChannelKind, SafetyConfig, SHIELD_CHANNELS};
use crate::error::ConfigError;

/// Reference positions of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum References {
    /// Eye movement channel
    Movement { center: u16 },
    /// Eyelid channel
    Eyelid { open: u16, closed: u16, half: u16 },
}

/// Validated calibration of one servo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLimits {
    channel: u8,
    min_pulse: u16,
    max_pulse: u16,
    references: References,
    inverted: bool,
}

impl ChannelLimits {
    /// Validates a configuration entry against the absolute envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on the first violated invariant.
    pub fn from_config(config: &ChannelConfig, safety: &SafetyConfig) -> Result<Self, ConfigError> {
        let channel = config.channel;

        if channel >= SHIELD_CHANNELS {
            return Err(ConfigError::ChannelOutOfBounds {
                channel,
                max: SHIELD_CHANNELS - 1,
            });
        }

        for (name, value) in [("min_pulse", config.min_pulse), ("max_pulse", config.max_pulse)] {
            if value < safety.absolute_min_pulse || value > safety.absolute_max_pulse {
                return Err(ConfigError::OutsideAbsoluteLimits {
                    channel,
                    name,
                    value,
                    floor: safety.absolute_min_pulse,
                    ceiling: safety.absolute_max_pulse,
                });
            }
        }

        if config.min_pulse >= config.max_pulse {
            return Err(ConfigError::InvertedBounds {
                channel,
                min: config.min_pulse,
                max: config.max_pulse,
            });
        }

        let require = |name: &'static str, value: Option<u16>| -> Result<u16, ConfigError> {
            let value = value.ok_or(ConfigError::MissingReference {
                channel,
                kind: config.kind.name(),
                name,
            })?;
            if value < config.min_pulse || value > config.max_pulse {
                return Err(ConfigError::ReferenceOutOfRange {
                    channel,
                    name,
                    value,
                    min: config.min_pulse,
                    max: config.max_pulse,
                });
            }
            Ok(value)
        };

        let references = match config.kind {
            ChannelKind::Movement => References::Movement {
                center: require("center_pulse", config.center_pulse)?,
            },
            ChannelKind::Eyelid => {
                let open = require("open_pulse", config.open_pulse)?;
                let closed = require("closed_pulse", config.closed_pulse)?;
                let half = require("half_pulse", config.half_pulse)?;

                // Half must sit on the open..closed travel
                if half < open.min(closed) || half > open.max(closed) {
                    return Err(ConfigError::ReferenceOutOfRange {
                        channel,
                        name: "half_pulse",
                        value: half,
                        min: open.min(closed),
                        max: open.max(closed),
                    });
                }

                References::Eyelid { open, closed, half }
            }
        };

        Ok(Self {
            channel,
            min_pulse: config.min_pulse,
            max_pulse: config.max_pulse,
            references,
            inverted: config.inverted,
        })
    }

    /// Channel identifier on the servo shield.
    #[must_use]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Lowest safe pulse.
    #[must_use]
    pub fn min_pulse(&self) -> u16 {
        self.min_pulse
    }

    /// Highest safe pulse.
    #[must_use]
    pub fn max_pulse(&self) -> u16 {
        self.max_pulse
    }

    /// Calibrated reference positions.
    #[must_use]
    pub fn references(&self) -> References {
        self.references
    }

    /// Whether logical direction is swapped.
    #[must_use]
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Movement or eyelid, from the references carried.
    #[must_use]
    pub fn kind(&self) -> ChannelKind {
        match self.references {
            References::Movement { .. } => ChannelKind::Movement,
            References::Eyelid { .. } => ChannelKind::Eyelid,
        }
    }

    /// Half-closed eyelid pulse, `None` for movement channels.
    #[must_use]
    pub fn half_pulse(&self) -> Option<u16> {
        match self.references {
            References::Movement { .. } => None,
            References::Eyelid { half, .. } => Some(half),
        }
    }

    /// Pulse the channel holds when nothing drives it: centered or open,
    /// after inversion.
    #[must_use]
    pub fn rest_pulse(&self) -> u16 {
        match self.references {
            References::Movement { .. } => self.map_logical(0.5),
            References::Eyelid { .. } => self.map_logical(0.0),
        }
    }

    /// Clamps a pulse to this channel's safe range.
    #[inline]
    #[must_use]
    pub fn clamp(&self, pulse: u16) -> u16 {
        pulse.clamp(self.min_pulse, self.max_pulse)
    }

    /// Maps a logical position (0.0 to 1.0) to a pulse.
    ///
    /// Out of range values are clamped and NaN is treated as the middle
    /// reference.
    #[must_use]
    pub fn map_logical(&self, logical: f32) -> u16 {
        let logical = if logical.is_nan() { 0.5 } else { logical.clamp(0.0, 1.0) };
        let logical = if self.inverted { 1.0 - logical } else { logical };

        let pulse = match self.references {
            References::Movement { center } if logical <= 0.5 => {
                lerp(self.min_pulse, center, logical * 2.0)
            }
            References::Movement { center } => lerp(center, self.max_pulse, (logical - 0.5) * 2.0),
            References::Eyelid { open, closed, .. } => lerp(open, closed, logical),
        };

        self.clamp(pulse.round() as u16)
    }
}

/// Linear interpolation between two pulses.
#[inline]
fn lerp(from: u16, to: u16, t: f32) -> f32 {
    from as f32 + (to as f32 - from as f32) * t
}

/// Read-only table of channel limits keyed by channel identifier.
#[derive(Debug, Clone)]
pub struct Registry {
    channels: BTreeMap<u8, ChannelLimits>,
    absolute_min_pulse: u16,
    absolute_max_pulse: u16,
}

impl Registry {
    /// Validates every channel entry and builds the registry.
    ///
    /// # Errors
    ///
    /// - `InvertedBounds`: `min_pulse >= max_pulse`
    /// - `ReferenceOutOfRange`: a reference point outside `[min_pulse, max_pulse]`
    /// - `OutsideAbsoluteLimits`: a bound outside the absolute floor/ceiling
    /// - `DuplicateChannel`, `ChannelOutOfBounds`, `MissingReference`
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_eyes::config::{ChannelConfig, SafetyConfig};
    /// use animatronic_eyes::limits::Registry;
    ///
    /// let bad = [ChannelConfig::movement(0, 470, 345, 220, false)];
    /// assert!(Registry::load(&bad, &SafetyConfig::default()).is_err());
    /// ```
    pub fn load(channels: &[ChannelConfig], safety: &SafetyConfig) -> Result<Self, ConfigError> {
        let mut table = BTreeMap::new();

        for config in channels {
            let limits = ChannelLimits::from_config(config, safety)?;
            if table.insert(limits.channel(), limits).is_some() {
                return Err(ConfigError::DuplicateChannel(limits.channel()));
            }
        }

        Ok(Self {
            channels: table,
            absolute_min_pulse: safety.absolute_min_pulse,
            absolute_max_pulse: safety.absolute_max_pulse,
        })
    }

    /// Limits for a channel, if configured.
    #[must_use]
    pub fn get(&self, channel: u8) -> Option<&ChannelLimits> {
        self.channels.get(&channel)
    }

    /// Iterates over configured channels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelLimits> {
        self.channels.values()
    }

    /// Number of configured channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Clamps a pulse to the channel's safe range.
    ///
    /// Unknown channels clamp to the absolute envelope.
    #[must_use]
    pub fn clamp(&self, channel: u8, pulse: u16) -> u16 {
        match self.channels.get(&channel) {
            Some(limits) => limits.clamp(pulse),
            None => pulse.clamp(self.absolute_min_pulse, self.absolute_max_pulse),
        }
    }

    /// Half-closed pulse of a configured eyelid channel.
    #[must_use]
    pub fn half_pulse(&self, channel: u8) -> Option<u16> {
        self.channels.get(&channel).and_then(ChannelLimits::half_pulse)
    }

    /// Maps a logical position (0.0 to 1.0) to a pulse for a configured channel.
    #[must_use]
    pub fn map_logical(&self, channel: u8, logical: f32) -> Option<u16> {
        self.channels.get(&channel).map(|limits| limits.map_logical(logical))
    }
}
