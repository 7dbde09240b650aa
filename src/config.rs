//! Configuration for inputs, the potentiometer, and event dispatch.
//!
//! Uses `heapless::String` for labels so configs stay fixed-size and can be
//! embedded in firmware images or deserialized from JSON with the `serde`
//! feature.
//!
//! # Example
//!
//! ```rust
//! use rs_knob::config::{Config, InputConfig, PotentiometerConfig};
//! use rs_knob::DispatchPolicy;
//!
//! // Use defaults: value starts at 0.0, 32 steps across the range
//! let config = Config::default();
//! assert_eq!(config.potentiometer.step().unwrap(), 1.0 / 32.0);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_inputs(InputConfig::default().with_clk_label("GPIO6").with_dt_label("GPIO7"))
//!     .with_potentiometer(PotentiometerConfig::default().with_initial(0.5).with_steps(20.0))
//!     .with_dispatch(DispatchPolicy::Isolate);
//! ```

use heapless::String as HString;

use crate::component::DispatchPolicy;
use crate::error::ConfigError;

/// Maximum length for labels
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for label strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Default number of steps across the full potentiometer range.
pub const DEFAULT_STEPS: f32 = 32.0;

/// Create a ShortString from a &str, truncating at a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete configuration for one encoder-driven potentiometer
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Input line labels
    pub inputs: InputConfig,
    /// Potentiometer range configuration
    pub potentiometer: PotentiometerConfig,
    /// What to do when a subscriber fails
    pub dispatch: DispatchPolicy,
}

impl Config {
    /// Set input configuration
    pub fn with_inputs(mut self, inputs: InputConfig) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set potentiometer configuration
    pub fn with_potentiometer(mut self, potentiometer: PotentiometerConfig) -> Self {
        self.potentiometer = potentiometer;
        self
    }

    /// Set dispatch failure policy
    pub fn with_dispatch(mut self, dispatch: DispatchPolicy) -> Self {
        self.dispatch = dispatch;
        self
    }
}

// ============================================================================
// Input Config
// ============================================================================

/// Labels for the two encoder lines
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputConfig {
    /// Label for the clock (A) line
    pub clk_label: ShortString,
    /// Label for the data (B) line
    pub dt_label: ShortString,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            clk_label: short_string("clk"),
            dt_label: short_string("dt"),
        }
    }
}

impl InputConfig {
    /// Set the clk label
    pub fn with_clk_label(mut self, label: &str) -> Self {
        self.clk_label = short_string(label);
        self
    }

    /// Set the dt label
    pub fn with_dt_label(mut self, label: &str) -> Self {
        self.dt_label = short_string(label);
        self
    }
}

// ============================================================================
// Potentiometer Config
// ============================================================================

/// Starting value and granularity of a potentiometer
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PotentiometerConfig {
    /// Starting value; clamped into 0.0..=1.0 at construction
    pub initial: f32,
    /// Number of rotation events to sweep the full range (`step = 1 / steps`)
    pub steps: f32,
}

impl Default for PotentiometerConfig {
    fn default() -> Self {
        Self {
            initial: 0.0,
            steps: DEFAULT_STEPS,
        }
    }
}

impl PotentiometerConfig {
    /// Create a config from explicit values
    pub fn new(initial: f32, steps: f32) -> Self {
        Self { initial, steps }
    }

    /// Set the starting value
    pub fn with_initial(mut self, initial: f32) -> Self {
        self.initial = initial;
        self
    }

    /// Set the number of steps
    pub fn with_steps(mut self, steps: f32) -> Self {
        self.steps = steps;
        self
    }

    /// Checks that `steps` is finite and positive and `initial` is finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.steps.is_finite() || self.steps <= 0.0 {
            return Err(ConfigError::InvalidSteps(self.steps));
        }
        if !self.initial.is_finite() {
            return Err(ConfigError::InvalidInitial(self.initial));
        }
        Ok(())
    }

    /// Step size per rotation event.
    pub fn step(&self) -> Result<f32, ConfigError> {
        self.validate()?;
        Ok(1.0 / self.steps)
    }

    /// Starting value clamped into range.
    pub fn clamped_initial(&self) -> Result<f32, ConfigError> {
        self.validate()?;
        Ok(self.initial.clamp(0.0, 1.0))
    }
}

// ============================================================================
// Tests
// ============================================================================
