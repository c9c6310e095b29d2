//! Timing profiles for the spin animation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{SpinError, SpinResult};

/// Longest duration or timeout a settings document may ask for (one day)
pub const MAX_TIMING_MS: f64 = 86_400_000.0;

/// Milliseconds as a `Duration`; negative, NaN and overflowing values are refused
pub fn duration_from_ms(ms: f64) -> SpinResult<Duration> {
    Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|e| SpinError::InvalidConfig(format!("{ms} ms is not a usable duration: {e}")))
}

/// Timing profile for spins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal presentation timing
    Normal,
    /// Fast mode
    Turbo,
    /// No visible animation (tests, simulations)
    Instant,
    /// Values supplied by the caller
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Detailed timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Length of the spin animation (ms)
    pub duration_ms: f64,

    /// Full cosmetic turns added before landing, at least 1
    pub extra_rotations: u32,

    /// Progress curve handed to the renderer
    pub easing: Easing,
}

impl TimingConfig {
    /// Normal presentation: four seconds, six extra turns
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            duration_ms: 4000.0,
            extra_rotations: 6,
            easing: Easing::wheel(),
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            duration_ms: 1500.0,
            extra_rotations: 3,
            easing: Easing::ease_out(),
        }
    }

    /// Instant mode (completion can be signalled right away)
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            duration_ms: 0.0,
            extra_rotations: 1,
            easing: Easing::Linear,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale duration by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            duration_ms: (self.duration_ms * factor).max(0.0),
            ..self.clone()
        }
    }

    /// Override the extra rotation count (clamped to at least one turn)
    pub fn with_extra_rotations(mut self, turns: u32) -> Self {
        self.profile = TimingProfile::Custom;
        self.extra_rotations = turns.max(1);
        self
    }

    /// Override the duration
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.profile = TimingProfile::Custom;
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    /// Average angular speed over the spin for a given travel (degrees per second)
    pub fn average_speed(&self, travel_deg: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return f64::INFINITY;
        }
        travel_deg / (self.duration_ms / 1000.0)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_profiles() {
        let normal = TimingConfig::normal();
        let turbo = TimingConfig::turbo();
        let instant = TimingConfig::instant();

        assert!(turbo.duration_ms < normal.duration_ms);
        assert_eq!(instant.duration_ms, 0.0);

        assert!(normal.extra_rotations >= 1);
        assert!(turbo.extra_rotations >= 1);
        assert!(instant.extra_rotations >= 1);
    }

    #[test]
    fn test_from_profile() {
        assert_eq!(TimingConfig::from_profile(TimingProfile::Turbo), TimingConfig::turbo());
        assert_eq!(
            TimingConfig::from_profile(TimingProfile::Custom).duration_ms,
            TimingConfig::normal().duration_ms
        );
    }

    #[test]
    fn test_scaled_and_overrides() {
        let half = TimingConfig::normal().scaled(0.5);
        assert_eq!(half.profile, TimingProfile::Custom);
        assert_eq!(half.duration_ms, 2000.0);

        let zero_turns = TimingConfig::normal().with_extra_rotations(0);
        assert_eq!(zero_turns.extra_rotations, 1);

        let negative = TimingConfig::normal().with_duration_ms(-10.0);
        assert_eq!(negative.duration_ms, 0.0);
    }

    #[test]
    fn test_duration_from_ms() {
        assert_eq!(duration_from_ms(1500.0).unwrap(), Duration::from_millis(1500));
        assert_eq!(duration_from_ms(0.0).unwrap(), Duration::ZERO);
        assert!(duration_from_ms(MAX_TIMING_MS).is_ok());

        for bad in [1e300, f64::INFINITY, f64::NAN, -1.0] {
            assert!(matches!(duration_from_ms(bad), Err(SpinError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_average_speed() {
        let config = TimingConfig::normal();
        assert_eq!(config.average_speed(3600.0), 900.0);
        assert!(TimingConfig::instant().average_speed(360.0).is_infinite());
    }
}
