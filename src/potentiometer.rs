//! A bounded, continuous value driven by an endless rotary encoder.
//!
//! A [`Potentiometer`] owns a [`RotaryEncoder`] and turns its rotation events
//! into a value in `0.0..=1.0`. Each `RotateRight` adds `step = 1 / steps`,
//! each `RotateLeft` subtracts it, and the result saturates at the bounds.
//!
//! # At-the-limit Silence
//!
//! [`PotentiometerEvent::ValueChanged`] fires only when the stored value
//! actually changes. Turning further past either bound produces no events,
//! so consumers never see repeated `0.0` or `1.0` updates.
//!
//! # Dispatch
//!
//! The value is stored under a lock and published after the lock is
//! released. A subscriber that calls [`Potentiometer::update_value`], or a
//! second thread turning the same knob, can therefore make payloads arrive
//! out of order: the last payload a subscriber saw is not necessarily the
//! current value. Read [`Potentiometer::value`] when the latest value
//! matters.
//!
//! # Example
//!
//! ```rust
//! use rs_knob::{Potentiometer, PotentiometerEvent};
//! use rs_knob::config::PotentiometerConfig;
//! use rs_knob::hal::MockEncoderPins;
//!
//! let pins = MockEncoderPins::new();
//! let config = PotentiometerConfig::new(0.0, 4.0);
//! let pot = Potentiometer::new(pins.clk(), pins.dt(), config).unwrap();
//!
//! pot.subscribe(PotentiometerEvent::ValueChanged, |e| {
//!     println!("value = {:.2}", e.value);
//!     Ok(())
//! });
//!
//! pins.turn_right(2).unwrap();
//! assert_eq!(pot.value(), 0.5);
//!
//! pins.turn_right(10).unwrap(); // saturates at 1.0
//! assert_eq!(pot.value(), 1.0);
//! ```

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::component::{Component, DispatchPolicy, Event, EventKind, SubscriptionId};
use crate::config::{Config, PotentiometerConfig};
use crate::encoder::{EncoderEvent, RotaryEncoder};
use crate::error::{ConfigError, DispatchError};
use crate::traits::Input;

/// Events published by a [`Potentiometer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PotentiometerEvent {
    /// The value changed; the payload is the new value in `0.0..=1.0`.
    ValueChanged,
}

impl EventKind for PotentiometerEvent {
    fn as_str(&self) -> &'static str {
        match self {
            PotentiometerEvent::ValueChanged => "VALUE_CHANGED",
        }
    }
}

struct Accumulator {
    bus: Component<PotentiometerEvent, f32>,
    value: Mutex<f32>,
    step: f32,
}

impl Accumulator {
    fn value(&self) -> MutexGuard<'_, f32> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Computes, clamps and stores the next value in one critical section,
    /// then publishes outside the lock.
    fn update_with<F>(&self, next: F) -> Result<bool, DispatchError>
    where
        F: FnOnce(f32) -> f32,
    {
        let updated = {
            let mut value = self.value();
            let proposed = next(*value);
            if proposed.is_nan() {
                tracing::trace!("NaN proposed; value unchanged");
                return Ok(false);
            }
            let clamped = proposed.clamp(0.0, 1.0);
            if clamped == *value {
                return Ok(false);
            }
            *value = clamped;
            clamped
        };

        tracing::debug!(value = updated, "potentiometer value changed");
        self.bus.publish(PotentiometerEvent::ValueChanged, updated)?;
        Ok(true)
    }

    fn on_rotate(&self, event: EncoderEvent) -> Result<bool, DispatchError> {
        let step = self.step;
        match event {
            EncoderEvent::RotateLeft => self.update_with(|value| value - step),
            EncoderEvent::RotateRight => self.update_with(|value| value + step),
        }
    }
}

/// Virtual potentiometer over a quadrature encoder.
pub struct Potentiometer {
    accumulator: Arc<Accumulator>,
    encoder: RotaryEncoder,
}

impl Potentiometer {
    /// Builds a potentiometer (and its encoder) on `clk` and `dt`.
    ///
    /// `config.initial` is clamped into range; invalid `steps` or a
    /// non-finite `initial` are rejected.
    pub fn new<C, D>(
        clk: Arc<C>,
        dt: Arc<D>,
        config: PotentiometerConfig,
    ) -> Result<Self, ConfigError>
    where
        C: Input + 'static,
        D: Input + 'static,
    {
        Self::with_policy(clk, dt, config, DispatchPolicy::FailFast)
    }

    /// Like [`new`](Self::new) with an explicit dispatch policy for both the
    /// encoder and the potentiometer.
    pub fn with_policy<C, D>(
        clk: Arc<C>,
        dt: Arc<D>,
        config: PotentiometerConfig,
        policy: DispatchPolicy,
    ) -> Result<Self, ConfigError>
    where
        C: Input + 'static,
        D: Input + 'static,
    {
        let step = config.step()?;
        let initial = config.clamped_initial()?;
        if initial != config.initial {
            tracing::warn!(
                requested = config.initial,
                initial,
                "initial potentiometer value out of range; clamped"
            );
        }

        let accumulator = Arc::new(Accumulator {
            bus: Component::with_policy(policy),
            value: Mutex::new(initial),
            step,
        });

        let encoder = RotaryEncoder::with_policy(clk, dt, policy);
        for kind in [EncoderEvent::RotateLeft, EncoderEvent::RotateRight] {
            let accumulator = Arc::clone(&accumulator);
            encoder.subscribe(kind, move |event| {
                accumulator.on_rotate(event.kind)?;
                Ok(())
            });
        }

        Ok(Self {
            accumulator,
            encoder,
        })
    }

    /// Builds a potentiometer from the aggregate [`Config`], using its
    /// potentiometer settings and dispatch policy.
    pub fn from_config<C, D>(clk: Arc<C>, dt: Arc<D>, config: &Config) -> Result<Self, ConfigError>
    where
        C: Input + 'static,
        D: Input + 'static,
    {
        Self::with_policy(clk, dt, config.potentiometer, config.dispatch)
    }

    /// Registers `callback` for value changes.
    pub fn subscribe<F>(&self, kind: PotentiometerEvent, callback: F) -> SubscriptionId
    where
        F: Fn(&Event<PotentiometerEvent, f32>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.accumulator.bus.subscribe(kind, callback)
    }

    /// Removes a value-change subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.accumulator.bus.unsubscribe(id)
    }

    /// Sets the value directly, with the same clamping and change rules as
    /// rotation.
    ///
    /// Returns `true` if the value changed (and an event was published). A
    /// NaN proposal is ignored.
    pub fn update_value(&self, value: f32) -> Result<bool, DispatchError> {
        self.accumulator.update_with(|_| value)
    }

    /// Current value in `0.0..=1.0`.
    pub fn value(&self) -> f32 {
        *self.accumulator.value()
    }

    /// Current value on a 0–100 scale, rounded to the nearest integer.
    pub fn percent(&self) -> u8 {
        (self.value() * 100.0).round() as u8
    }

    /// Amount added or removed per rotation event.
    pub fn step(&self) -> f32 {
        self.accumulator.step
    }

    /// The owned encoder, for subscribing to raw rotation events.
    pub fn encoder(&self) -> &RotaryEncoder {
        &self.encoder
    }
}

impl fmt::Debug for Potentiometer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Potentiometer")
            .field("value", &self.value())
            .field("step", &self.step())
            .field("encoder", &self.encoder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockInput;

    fn pot(initial: f32, steps: f32) -> Potentiometer {
        let clk = MockInput::shared("clk", false);
        let dt = MockInput::shared("dt", false);
        Potentiometer::new(clk, dt, PotentiometerConfig::new(initial, steps)).unwrap()
    }

    fn record(pot: &Potentiometer) -> Arc<Mutex<Vec<f32>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        pot.subscribe(PotentiometerEvent::ValueChanged, move |e| {
            sink.lock().unwrap().push(e.value);
            Ok(())
        });
        seen
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn defaults() {
        let pot = pot(0.0, crate::config::DEFAULT_STEPS);
        assert_eq!(pot.value(), 0.0);
        assert_eq!(pot.step(), 1.0 / 32.0);
    }

    #[test]
    fn zero_steps_rejected() {
        let clk = MockInput::shared("clk", false);
        let dt = MockInput::shared("dt", false);
        let result =
            Potentiometer::new(clk.clone(), dt.clone(), PotentiometerConfig::new(0.0, 0.0));
        assert_eq!(result.unwrap_err(), ConfigError::InvalidSteps(0.0));

        // Nothing stays subscribed after a rejected construction.
        assert_eq!(clk.subscriber_count(), 0);
        assert_eq!(dt.subscriber_count(), 0);
    }

    #[test]
    fn initial_clamped_at_construction() {
        assert_eq!(pot(2.0, 4.0).value(), 1.0);
        assert_eq!(pot(-1.0, 4.0).value(), 0.0);
    }

    #[test]
    fn from_config_applies_settings_and_policy() {
        let clk = MockInput::shared("clk", false);
        let dt = MockInput::shared("dt", false);
        let config = Config::default()
            .with_potentiometer(PotentiometerConfig::new(0.5, 8.0))
            .with_dispatch(DispatchPolicy::Isolate);

        let pot = Potentiometer::from_config(clk.clone(), dt, &config).unwrap();
        assert_eq!(pot.value(), 0.5);
        assert_eq!(pot.step(), 0.125);
        assert_eq!(pot.encoder().policy(), DispatchPolicy::Isolate);

        // Isolate reaches the value bus too: a failing listener does not
        // stop the next one.
        let seen = Arc::new(Mutex::new(Vec::new()));
        pot.subscribe(PotentiometerEvent::ValueChanged, |_| anyhow::bail!("offline"));
        let sink = Arc::clone(&seen);
        pot.subscribe(PotentiometerEvent::ValueChanged, move |e| {
            sink.lock().unwrap().push(e.value);
            Ok(())
        });
        clk.set(true).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0.625]);
    }

    #[test]
    fn from_config_rejects_invalid_steps() {
        let clk = MockInput::shared("clk", false);
        let dt = MockInput::shared("dt", false);
        let config = Config::default().with_potentiometer(PotentiometerConfig::new(0.0, -1.0));

        let err = Potentiometer::from_config(clk, dt, &config).unwrap_err();
        assert_eq!(err, ConfigError::InvalidSteps(-1.0));
    }

    #[test]
    fn event_name() {
        assert_eq!(PotentiometerEvent::ValueChanged.as_str(), "VALUE_CHANGED");
    }

    // =========================================================================
    // update_value Tests
    // =========================================================================

    #[test]
    fn update_value_publishes_on_change() {
        let pot = pot(0.0, 4.0);
        let seen = record(&pot);

        assert!(pot.update_value(0.6).unwrap());
        assert_eq!(pot.value(), 0.6);
        assert_eq!(*seen.lock().unwrap(), vec![0.6]);
    }

    #[test]
    fn update_value_silent_when_unchanged() {
        let pot = pot(0.5, 4.0);
        let seen = record(&pot);

        assert!(!pot.update_value(0.5).unwrap());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn update_value_saturates() {
        let pot = pot(0.5, 4.0);
        let seen = record(&pot);

        assert!(pot.update_value(7.0).unwrap());
        assert!(!pot.update_value(1.5).unwrap());
        assert!(pot.update_value(f32::NEG_INFINITY).unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn update_value_ignores_nan() {
        let pot = pot(0.25, 4.0);
        assert!(!pot.update_value(f32::NAN).unwrap());
        assert_eq!(pot.value(), 0.25);
    }

    // =========================================================================
    // Rotation Tests
    // =========================================================================

    #[test]
    fn rotation_moves_value_by_step() {
        let pot = pot(0.5, 4.0);
        let seen = record(&pot);

        pot.encoder().rotate(true, false).unwrap(); // right
        pot.encoder().rotate(false, false).unwrap(); // left
        pot.encoder().rotate(true, true).unwrap(); // left
        assert_eq!(*seen.lock().unwrap(), vec![0.75, 0.5, 0.25]);
    }

    #[test]
    fn percent_scale() {
        let pot = pot(0.0, 3.0);
        assert_eq!(pot.percent(), 0);
        pot.encoder().rotate(true, false).unwrap();
        assert_eq!(pot.percent(), 33);
        pot.update_value(1.0).unwrap();
        assert_eq!(pot.percent(), 100);
    }

    #[test]
    fn subscriber_failure_propagates_after_store() {
        let pot = pot(0.0, 4.0);
        pot.subscribe(PotentiometerEvent::ValueChanged, |_| {
            anyhow::bail!("display offline")
        });

        let err = pot.update_value(0.5).unwrap_err();
        assert_eq!(err.event, "VALUE_CHANGED");
        assert_eq!(pot.value(), 0.5);
    }

    #[test]
    fn unsubscribe_value_listener() {
        let pot = pot(0.0, 4.0);
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = pot.subscribe(PotentiometerEvent::ValueChanged, move |_| {
            *sink.lock().unwrap() += 1;
            Ok(())
        });
        assert!(pot.unsubscribe(id));
        pot.update_value(1.0).unwrap();
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
