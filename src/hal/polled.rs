//! Polling adapter from `embedded-hal` GPIO pins to [`Input`].
//!
//! [`PolledInput`] caches the last sampled level of a pin and publishes
//! `ValueChanged` when a poll observes a different level. Call
//! [`poll_pair`] from your main loop (or a timer task) at least every few
//! milliseconds; it samples both encoder lines *before* notifying either, so
//! a handler reading the other line always sees the same sampling instant.
//!
//! # Example
//!
//! ```ignore
//! use rs_knob::hal::{poll_pair, PolledInput};
//! use rs_knob::{Potentiometer, config::PotentiometerConfig};
//! use std::sync::Arc;
//!
//! let clk = Arc::new(PolledInput::new("GPIO6", clk_pin)?);
//! let dt = Arc::new(PolledInput::new("GPIO7", dt_pin)?);
//! let pot = Potentiometer::new(clk.clone(), dt.clone(), PotentiometerConfig::default())?;
//!
//! loop {
//!     poll_pair(&clk, &dt)?;
//!     delay.delay_ms(1);
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use embedded_hal::digital::InputPin;
use thiserror::Error;

use crate::component::{Component, SubscriptionId};
use crate::config::{short_string, ShortString};
use crate::error::DispatchError;
use crate::traits::{Input, InputEvent, InputHandler};

/// Failure while polling a pin.
#[derive(Debug, Error)]
pub enum PollError<E: core::fmt::Debug> {
    /// The pin could not be read.
    #[error("pin read failed: {0:?}")]
    Pin(E),
    /// A subscriber failed while handling the change.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A GPIO pin exposed as an [`Input`] by polling.
pub struct PolledInput<P> {
    label: ShortString,
    pin: Mutex<P>,
    value: AtomicBool,
    bus: Component<InputEvent, bool>,
}

impl<P> PolledInput<P>
where
    P: InputPin + Send,
{
    /// Wraps `pin`, taking its current level as the initial value.
    pub fn new(label: &str, mut pin: P) -> Result<Self, P::Error> {
        let initial = pin.is_high()?;
        Ok(Self {
            label: short_string(label),
            pin: Mutex::new(pin),
            value: AtomicBool::new(initial),
            bus: Component::new(),
        })
    }

    /// Reads the pin into the cache without notifying.
    ///
    /// Returns `Some(level)` if the level differs from the cached one.
    pub fn sample(&self) -> Result<Option<bool>, P::Error> {
        let level = self
            .pin
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_high()?;
        let previous = self.value.swap(level, Ordering::AcqRel);
        Ok((previous != level).then_some(level))
    }

    /// Samples the pin and notifies subscribers if it changed.
    pub fn poll(&self) -> Result<bool, PollError<P::Error>> {
        match self.sample().map_err(PollError::Pin)? {
            Some(level) => {
                self.notify(level)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn notify(&self, level: bool) -> Result<usize, DispatchError> {
        tracing::trace!(pin = self.label.as_str(), level, "input changed");
        self.bus.publish(InputEvent::ValueChanged, level)
    }
}

impl<P> Input for PolledInput<P>
where
    P: InputPin + Send,
{
    fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    fn subscribe(&self, handler: InputHandler) -> SubscriptionId {
        self.bus.subscribe_handler(InputEvent::ValueChanged, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn label(&self) -> &str {
        self.label.as_str()
    }
}

/// Samples `clk` and `dt` together, then notifies clk before dt.
///
/// Returns `true` if either line changed.
pub fn poll_pair<C, D, E>(clk: &PolledInput<C>, dt: &PolledInput<D>) -> Result<bool, PollError<E>>
where
    C: InputPin<Error = E> + Send,
    D: InputPin<Error = E> + Send,
    E: core::fmt::Debug,
{
    let clk_change = clk.sample().map_err(PollError::Pin)?;
    let dt_change = dt.sample().map_err(PollError::Pin)?;

    if let Some(level) = clk_change {
        clk.notify(level)?;
    }
    if let Some(level) = dt_change {
        dt.notify(level)?;
    }
    Ok(clk_change.is_some() || dt_change.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{EncoderEvent, RotaryEncoder};
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct FakePin(Arc<AtomicBool>);

    impl FakePin {
        fn set(&self, level: bool) {
            self.0.store(level, Ordering::SeqCst);
        }
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.load(Ordering::SeqCst))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.load(Ordering::SeqCst))
        }
    }

    fn record(encoder: &RotaryEncoder) -> Arc<Mutex<Vec<EncoderEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [EncoderEvent::RotateLeft, EncoderEvent::RotateRight] {
            let sink = Arc::clone(&seen);
            encoder.subscribe(kind, move |e| {
                sink.lock().unwrap().push(e.kind);
                Ok(())
            });
        }
        seen
    }

    #[test]
    fn initial_level_read_from_pin() {
        let pin = FakePin::default();
        pin.set(true);
        let input = PolledInput::new("GPIO6", pin).unwrap();
        assert!(input.get());
        assert_eq!(input.label(), "GPIO6");
    }

    #[test]
    fn poll_reports_only_changes() {
        let pin = FakePin::default();
        let input = PolledInput::new("GPIO6", pin.clone()).unwrap();

        assert!(!input.poll().unwrap());
        pin.set(true);
        assert!(input.poll().unwrap());
        assert!(!input.poll().unwrap());
    }

    #[test]
    fn poll_pair_decodes_clockwise_cycle() {
        let clk_pin = FakePin::default();
        let dt_pin = FakePin::default();
        let clk = Arc::new(PolledInput::new("clk", clk_pin.clone()).unwrap());
        let dt = Arc::new(PolledInput::new("dt", dt_pin.clone()).unwrap());
        let encoder = RotaryEncoder::new(clk.clone(), dt.clone());
        let seen = record(&encoder);

        for (c, d) in [(true, false), (true, true), (false, true), (false, false)] {
            clk_pin.set(c);
            dt_pin.set(d);
            assert!(poll_pair(clk.as_ref(), dt.as_ref()).unwrap());
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec![EncoderEvent::RotateRight, EncoderEvent::RotateRight]
        );
    }

    #[test]
    fn poll_pair_samples_both_lines_first() {
        let clk_pin = FakePin::default();
        let dt_pin = FakePin::default();
        let clk = Arc::new(PolledInput::new("clk", clk_pin.clone()).unwrap());
        let dt = Arc::new(PolledInput::new("dt", dt_pin.clone()).unwrap());
        let encoder = RotaryEncoder::new(clk.clone(), dt.clone());
        let seen = record(&encoder);

        // Both lines moved between polls. The clk handler must see the new dt.
        clk_pin.set(true);
        dt_pin.set(true);
        poll_pair(clk.as_ref(), dt.as_ref()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![EncoderEvent::RotateLeft]);
    }

    #[test]
    fn poll_pair_without_change() {
        let clk = PolledInput::new("clk", FakePin::default()).unwrap();
        let dt = PolledInput::new("dt", FakePin::default()).unwrap();
        assert!(!poll_pair(&clk, &dt).unwrap());
    }
}
