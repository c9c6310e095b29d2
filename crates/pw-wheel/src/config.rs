//! Wheel configuration documents

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SpinError, SpinResult};
use crate::item::{WheelItem, default_prizes, validate_items};
use crate::timing::{MAX_TIMING_MS, TimingConfig, TimingProfile};

/// Default jitter half-width, as a fraction of half a segment
pub const DEFAULT_JITTER_FRACTION: f64 = 0.2;

fn default_jitter_fraction() -> f64 {
    DEFAULT_JITTER_FRACTION
}

/// How a spin is presented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinSettings {
    /// Base timing profile
    #[serde(default)]
    pub timing: TimingProfile,

    /// Override for the profile's extra rotation count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_rotations: Option<u32>,

    /// Jitter half-width as a fraction of half a segment, in `[0, 1)`
    #[serde(default = "default_jitter_fraction")]
    pub jitter_fraction: f64,

    /// Override for the profile's duration (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    /// Force-complete a spin whose animation never reports back (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stall_timeout_ms: Option<f64>,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            timing: TimingProfile::Normal,
            extra_rotations: None,
            jitter_fraction: DEFAULT_JITTER_FRACTION,
            duration_ms: None,
            stall_timeout_ms: None,
        }
    }
}

impl SpinSettings {
    /// Settings for headless use: instant timing, no jitter
    pub fn headless() -> Self {
        Self {
            timing: TimingProfile::Instant,
            jitter_fraction: 0.0,
            ..Default::default()
        }
    }

    /// Builder: set timing profile
    pub fn with_timing(mut self, timing: TimingProfile) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set extra rotations
    pub fn with_extra_rotations(mut self, turns: u32) -> Self {
        self.extra_rotations = Some(turns);
        self
    }

    /// Builder: set jitter fraction
    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    /// Builder: set duration
    pub fn with_duration_ms(mut self, ms: f64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Builder: set stall timeout
    pub fn with_stall_timeout_ms(mut self, ms: f64) -> Self {
        self.stall_timeout_ms = Some(ms);
        self
    }

    /// Check ranges
    pub fn validate(&self) -> SpinResult<()> {
        if !(0.0..1.0).contains(&self.jitter_fraction) {
            return Err(SpinError::InvalidConfig(format!(
                "jitter_fraction must be in [0, 1), got {}",
                self.jitter_fraction
            )));
        }
        if self.extra_rotations == Some(0) {
            return Err(SpinError::InvalidConfig(
                "extra_rotations must be at least 1".into(),
            ));
        }
        if let Some(ms) = self.duration_ms {
            if !(0.0..=MAX_TIMING_MS).contains(&ms) {
                return Err(SpinError::InvalidConfig(format!(
                    "duration_ms must be in [0, {MAX_TIMING_MS}], got {ms}"
                )));
            }
        }
        if let Some(ms) = self.stall_timeout_ms {
            if !(ms > 0.0 && ms <= MAX_TIMING_MS) {
                return Err(SpinError::InvalidConfig(format!(
                    "stall_timeout_ms must be in (0, {MAX_TIMING_MS}], got {ms}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve profile plus overrides
    pub fn timing_config(&self) -> TimingConfig {
        let mut config = TimingConfig::from_profile(self.timing);
        if let Some(turns) = self.extra_rotations {
            config = config.with_extra_rotations(turns);
        }
        if let Some(ms) = self.duration_ms {
            config = config.with_duration_ms(ms);
        }
        config
    }
}

/// A named wheel: its items and how it spins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Display name
    pub name: String,
    /// Segments in layout order
    pub items: Vec<WheelItem>,
    /// Presentation settings
    #[serde(default)]
    pub spin: SpinSettings,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            name: "Spin The Wheel".into(),
            items: default_prizes(),
            spin: SpinSettings::default(),
        }
    }
}

impl WheelConfig {
    /// Create with default spin settings
    pub fn new(name: impl Into<String>, items: Vec<WheelItem>) -> Self {
        Self {
            name: name.into(),
            items,
            spin: SpinSettings::default(),
        }
    }

    /// Check items and settings
    pub fn validate(&self) -> SpinResult<()> {
        validate_items(&self.items)?;
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                return Err(SpinError::InvalidConfig(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
        }
        self.spin.validate()
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> SpinResult<Self> {
        let config: WheelConfig =
            serde_json::from_str(json).map_err(|e| SpinError::Parse(format!("Invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> SpinResult<Self> {
        let config: WheelConfig =
            serde_yml::from_str(yaml).map_err(|e| SpinError::Parse(format!("Invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> SpinResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let config = match extension.as_deref() {
            Some("json") => Self::from_json_str(&text)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            other => {
                return Err(SpinError::Parse(format!(
                    "Unsupported config extension {:?} for {}",
                    other,
                    path.display()
                )));
            }
        };
        log::info!(
            "Loaded wheel '{}' with {} items from {}",
            config.name,
            config.items.len(),
            path.display()
        );
        Ok(config)
    }

    /// Export as pretty JSON
    pub fn to_json_pretty(&self) -> SpinResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpinError::Parse(e.to_string()))
    }

    /// Export as YAML
    pub fn to_yaml(&self) -> SpinResult<String> {
        serde_yml::to_string(self).map_err(|e| SpinError::Parse(e.to_string()))
    }
}
