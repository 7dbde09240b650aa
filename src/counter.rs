//! Polling view over an encoder's event stream.
//!
//! Some consumers (a main loop ticking every 20ms, a display refresh) would
//! rather ask "how far did the knob move since I last looked?" than react to
//! every event. [`RotationCounter`] subscribes to a [`RotaryEncoder`] and
//! accumulates signed rotation events for them.
//!
//! Counts are in rotation events, one per clk edge. A full four-state
//! Gray-code cycle of the lines therefore counts 2.
//!
//! Dropping the counter unsubscribes it from the encoder.
//!
//! ```rust
//! use rs_knob::{RotaryEncoder, RotationCounter};
//! use rs_knob::hal::MockEncoderPins;
//!
//! let pins = MockEncoderPins::new();
//! let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
//! let counter = RotationCounter::attach(&encoder);
//!
//! pins.turn_right(5).unwrap();
//! pins.turn_left(2).unwrap();
//!
//! assert_eq!(counter.read_delta(), 3);
//! assert_eq!(counter.read_delta(), 0); // reset by the read
//! assert_eq!(counter.position(), 3);
//! ```

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crate::component::SubscriptionId;
use crate::encoder::{EncoderEvent, EncoderHandle, RotaryEncoder};

#[derive(Debug, Default)]
struct Counts {
    position: AtomicI32,
    last_read: AtomicI32,
}

/// Accumulated rotation of one encoder.
#[derive(Debug)]
pub struct RotationCounter {
    counts: Arc<Counts>,
    encoder: EncoderHandle,
    subscriptions: [SubscriptionId; 2],
}

impl RotationCounter {
    /// Starts counting rotation events from `encoder`.
    pub fn attach(encoder: &RotaryEncoder) -> Self {
        let counts = Arc::new(Counts::default());
        let subscriptions = [EncoderEvent::RotateLeft, EncoderEvent::RotateRight].map(|kind| {
            let counts = Arc::clone(&counts);
            encoder.subscribe(kind, move |event| {
                counts.position.fetch_add(event.kind.delta(), Ordering::AcqRel);
                Ok(())
            })
        });
        Self {
            counts,
            encoder: encoder.handle(),
            subscriptions,
        }
    }

    /// Stops counting. Returns `false` if `encoder` is not the one this
    /// counter was attached to; the counter is detached from its own
    /// encoder either way.
    pub fn detach(self, encoder: &RotaryEncoder) -> bool {
        self.encoder.refers_to(encoder)
    }

    /// Rotation events since the previous call (positive = clockwise).
    pub fn read_delta(&self) -> i32 {
        let position = self.counts.position.load(Ordering::Acquire);
        let last = self.counts.last_read.swap(position, Ordering::AcqRel);
        position.wrapping_sub(last)
    }

    /// Net rotation events since attaching.
    pub fn position(&self) -> i32 {
        self.counts.position.load(Ordering::Acquire)
    }

    /// Resets both the position and the delta baseline to zero.
    pub fn reset(&self) {
        self.counts.position.store(0, Ordering::Release);
        self.counts.last_read.store(0, Ordering::Release);
    }
}

impl Drop for RotationCounter {
    fn drop(&mut self) {
        for id in self.subscriptions {
            self.encoder.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockEncoderPins;

    #[test]
    fn counts_both_directions() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let counter = RotationCounter::attach(&encoder);

        pins.turn_left(4).unwrap();
        assert_eq!(counter.position(), -4);
        pins.turn_right(1).unwrap();
        assert_eq!(counter.position(), -3);
    }

    #[test]
    fn read_delta_resets_baseline() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let counter = RotationCounter::attach(&encoder);

        pins.turn_right(2).unwrap();
        assert_eq!(counter.read_delta(), 2);
        pins.turn_right(1).unwrap();
        assert_eq!(counter.read_delta(), 1);
        assert_eq!(counter.read_delta(), 0);
        assert_eq!(counter.position(), 3);
    }

    #[test]
    fn reset_zeroes_everything() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let counter = RotationCounter::attach(&encoder);

        pins.turn_right(3).unwrap();
        counter.reset();
        assert_eq!(counter.position(), 0);
        assert_eq!(counter.read_delta(), 0);
    }

    #[test]
    fn detach_stops_counting() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let counter = RotationCounter::attach(&encoder);
        assert_eq!(encoder.subscriber_count(EncoderEvent::RotateRight), 1);

        assert!(counter.detach(&encoder));
        assert_eq!(encoder.subscriber_count(EncoderEvent::RotateRight), 0);
        assert_eq!(encoder.subscriber_count(EncoderEvent::RotateLeft), 0);
    }

    #[test]
    fn detach_from_wrong_encoder() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let other_pins = MockEncoderPins::new();
        let other = RotaryEncoder::new(other_pins.clk(), other_pins.dt());

        let counter = RotationCounter::attach(&encoder);
        assert!(!counter.detach(&other));
        assert_eq!(encoder.subscriber_count(EncoderEvent::RotateRight), 0);
    }

    #[test]
    fn drop_unsubscribes_from_encoder() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());

        for _ in 0..100 {
            drop(RotationCounter::attach(&encoder));
        }
        assert_eq!(encoder.subscriber_count(EncoderEvent::RotateRight), 0);
        assert_eq!(encoder.subscriber_count(EncoderEvent::RotateLeft), 0);
    }

    #[test]
    fn counter_may_outlive_encoder() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let counter = RotationCounter::attach(&encoder);

        pins.turn_right(2).unwrap();
        drop(encoder);
        assert_eq!(counter.position(), 2);
        drop(counter);
    }

    #[test]
    fn full_gray_cycle_counts_two() {
        let pins = MockEncoderPins::new();
        let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
        let counter = RotationCounter::attach(&encoder);

        for _ in 0..4 {
            pins.quarter_right().unwrap();
        }
        assert_eq!(counter.read_delta(), 2);
    }
}
