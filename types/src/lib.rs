//! Shared configuration types for orderbell
//!
//! This crate contains serializable configuration types that are shared between
//! the native backend (orderbell-core) and any dashboard front end.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Chime Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the two-tone order notification chime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChimeSettings {
    /// Master enable for notification chimes
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// First (higher) tone in Hz. A5 by default.
    #[serde(default = "default_high_tone_hz")]
    pub high_tone_hz: f32,

    /// Second (lower) tone in Hz. E5 by default.
    #[serde(default = "default_low_tone_hz")]
    pub low_tone_hz: f32,

    /// Level of the master gain both tones are mixed into (0.0-1.0)
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,

    /// Delay between two pulses of the same chime
    #[serde(default = "default_pulse_interval_ms")]
    pub pulse_interval_ms: u64,

    /// Hard cap on how long a single chime may keep pulsing
    #[serde(default = "default_auto_stop_ms")]
    pub auto_stop_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_high_tone_hz() -> f32 {
    880.0
}

fn default_low_tone_hz() -> f32 {
    659.25
}

fn default_master_gain() -> f32 {
    0.4
}

fn default_pulse_interval_ms() -> u64 {
    1500
}

fn default_auto_stop_ms() -> u64 {
    5000
}

impl Default for ChimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            high_tone_hz: default_high_tone_hz(),
            low_tone_hz: default_low_tone_hz(),
            master_gain: default_master_gain(),
            pulse_interval_ms: default_pulse_interval_ms(),
            auto_stop_ms: default_auto_stop_ms(),
        }
    }
}

impl ChimeSettings {
    pub fn pulse_interval(&self) -> Duration {
        Duration::from_millis(self.pulse_interval_ms)
    }

    pub fn auto_stop(&self) -> Duration {
        Duration::from_millis(self.auto_stop_ms)
    }

    /// Number of pulses that fit inside the auto-stop window.
    ///
    /// Always at least one, so a chime is audible even with a cadence
    /// longer than the cap.
    pub fn max_pulses(&self) -> u32 {
        if self.pulse_interval_ms == 0 {
            return 1;
        }
        let pulses = (self.auto_stop_ms / self.pulse_interval_ms).max(1);
        u32::try_from(pulses).unwrap_or(u32::MAX)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Kitchen Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Kitchen-wide preparation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenSettings {
    /// Global preparation time budget applied to every order, in minutes
    #[serde(default = "default_prep_time_minutes")]
    pub prep_time_minutes: u32,
}

fn default_prep_time_minutes() -> u32 {
    10
}

impl Default for KitchenSettings {
    fn default() -> Self {
        Self {
            prep_time_minutes: default_prep_time_minutes(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App Config
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level application configuration
///
/// Note: Persistence methods (load/save) are provided by orderbell-core via the
/// `AppConfigExt` trait, as they require platform-specific dependencies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chime: ChimeSettings,
    #[serde(default)]
    pub kitchen: KitchenSettings,
    /// Optional TOML file with the weekly opening hours
    #[serde(default)]
    pub hours_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chime_fits_three_pulses() {
        let chime = ChimeSettings::default();
        assert_eq!(chime.pulse_interval(), Duration::from_millis(1500));
        assert_eq!(chime.auto_stop(), Duration::from_secs(5));
        assert_eq!(chime.max_pulses(), 3);
    }

    #[test]
    fn max_pulses_never_zero() {
        let chime = ChimeSettings {
            pulse_interval_ms: 10_000,
            ..Default::default()
        };
        assert_eq!(chime.max_pulses(), 1);

        let chime = ChimeSettings {
            pulse_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(chime.max_pulses(), 1);
    }
}
