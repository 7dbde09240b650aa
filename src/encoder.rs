//! Quadrature decoding of a two-line rotary encoder.
//!
//! [`RotaryEncoder`] listens to the clk (A) and dt (B) lines of an encoder
//! and turns their transitions into [`EncoderEvent::RotateLeft`] /
//! [`EncoderEvent::RotateRight`] events.
//!
//! # Decoding
//!
//! The only state is the clk level as of the last committed edge. On every
//! notification from either line the decoder looks at the current
//! `(clk, dt)` pair:
//!
//! | clk vs. last clk | clk vs. dt | Result |
//! |------------------|------------|--------|
//! | same | any | ignored, state untouched |
//! | different | equal | commit edge, `RotateLeft` |
//! | different | different | commit edge, `RotateRight` |
//!
//! dt-only transitions and duplicate clk notifications fall into the first
//! row, which is the decoder's only noise rejection. Timing-based debouncing
//! belongs to the [`Input`] implementation.
//!
//! # Example
//!
//! ```rust
//! use rs_knob::{EncoderEvent, RotaryEncoder};
//! use rs_knob::hal::MockInput;
//!
//! let clk = MockInput::shared("clk", false);
//! let dt = MockInput::shared("dt", false);
//! let encoder = RotaryEncoder::new(clk.clone(), dt.clone());
//!
//! encoder.subscribe(EncoderEvent::RotateRight, |_| {
//!     println!("clockwise");
//!     Ok(())
//! });
//!
//! clk.set(true).unwrap(); // clk rises while dt is low: clockwise
//! dt.set(true).unwrap(); // dt-only change: ignored
//! assert!(encoder.last_clk_state());
//! ```

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::component::{Component, DispatchPolicy, Event, EventKind, SubscriptionId};
use crate::error::DispatchError;
use crate::traits::{Input, InputEvent};

/// Events published by a [`RotaryEncoder`]. Neither carries a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EncoderEvent {
    /// Counter-clockwise step.
    RotateLeft,
    /// Clockwise step.
    RotateRight,
}

impl EncoderEvent {
    /// Signed count for this event (`-1` left, `+1` right).
    #[inline]
    pub const fn delta(&self) -> i32 {
        match self {
            EncoderEvent::RotateLeft => -1,
            EncoderEvent::RotateRight => 1,
        }
    }
}

impl EventKind for EncoderEvent {
    fn as_str(&self) -> &'static str {
        match self {
            EncoderEvent::RotateLeft => "ROTATE_LEFT",
            EncoderEvent::RotateRight => "ROTATE_RIGHT",
        }
    }
}

struct Decoder {
    bus: Component<EncoderEvent, ()>,
    last_clk_state: AtomicBool,
}

impl Decoder {
    fn rotate(&self, clk: bool, dt: bool) -> Result<Option<EncoderEvent>, DispatchError> {
        // Commit the edge only if clk actually moved; a failed exchange means
        // this is a dt-only change or a duplicate.
        if self
            .last_clk_state
            .compare_exchange(!clk, clk, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!(clk, dt, "no clk edge; notification ignored");
            return Ok(None);
        }

        let event = if clk == dt {
            EncoderEvent::RotateLeft
        } else {
            EncoderEvent::RotateRight
        };
        tracing::trace!(clk, dt, event = event.as_str(), "clk edge decoded");
        self.bus.publish(event, ())?;
        Ok(Some(event))
    }
}

/// Non-owning handle to an encoder's rotation bus, for subscribers that may
/// outlive it.
#[derive(Clone, Debug)]
pub(crate) struct EncoderHandle(Weak<Decoder>);

impl EncoderHandle {
    /// Removes a rotation subscriber if the encoder still exists.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.0.upgrade().is_some_and(|decoder| decoder.bus.unsubscribe(id))
    }

    /// Whether this handle was taken from `encoder`.
    pub(crate) fn refers_to(&self, encoder: &RotaryEncoder) -> bool {
        core::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&encoder.decoder))
    }
}

/// Two-line quadrature decoder.
///
/// Holds shared handles to both inputs and subscribes to their
/// value-changed events for as long as it lives; dropping the encoder
/// unsubscribes it again.
pub struct RotaryEncoder {
    decoder: Arc<Decoder>,
    clk: Arc<dyn Input>,
    dt: Arc<dyn Input>,
    clk_subscription: SubscriptionId,
    dt_subscription: SubscriptionId,
}

impl RotaryEncoder {
    /// Wires a decoder to `clk` and `dt`, failing fast on subscriber errors.
    ///
    /// The current clk level becomes the initial edge memory.
    pub fn new<C, D>(clk: Arc<C>, dt: Arc<D>) -> Self
    where
        C: Input + 'static,
        D: Input + 'static,
    {
        Self::with_policy(clk, dt, DispatchPolicy::FailFast)
    }

    /// Wires a decoder to `clk` and `dt` with an explicit dispatch policy.
    pub fn with_policy<C, D>(clk: Arc<C>, dt: Arc<D>, policy: DispatchPolicy) -> Self
    where
        C: Input + 'static,
        D: Input + 'static,
    {
        let clk: Arc<dyn Input> = clk;
        let dt: Arc<dyn Input> = dt;

        let decoder = Arc::new(Decoder {
            bus: Component::with_policy(policy),
            last_clk_state: AtomicBool::new(clk.get()),
        });

        // Each handler reads the *other* line live. Those handles are weak so
        // the two inputs never keep each other alive through their tables.
        let clk_subscription = {
            let decoder = Arc::clone(&decoder);
            let dt = Arc::downgrade(&dt);
            clk.subscribe(Arc::new(
                move |event: &Event<InputEvent, bool>| -> anyhow::Result<()> {
                    if let Some(dt) = dt.upgrade() {
                        decoder.rotate(event.value, dt.get())?;
                    }
                    Ok(())
                },
            ))
        };
        let dt_subscription = {
            let decoder = Arc::clone(&decoder);
            let clk = Arc::downgrade(&clk);
            dt.subscribe(Arc::new(
                move |event: &Event<InputEvent, bool>| -> anyhow::Result<()> {
                    if let Some(clk) = clk.upgrade() {
                        decoder.rotate(clk.get(), event.value)?;
                    }
                    Ok(())
                },
            ))
        };

        tracing::debug!(
            clk = clk.label(),
            dt = dt.label(),
            initial_clk = decoder.last_clk_state.load(Ordering::Acquire),
            "rotary encoder attached"
        );

        Self {
            decoder,
            clk,
            dt,
            clk_subscription,
            dt_subscription,
        }
    }

    /// Registers `callback` for a rotation event.
    pub fn subscribe<F>(&self, kind: EncoderEvent, callback: F) -> SubscriptionId
    where
        F: Fn(&Event<EncoderEvent, ()>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.decoder.bus.subscribe(kind, callback)
    }

    /// Removes a rotation subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.decoder.bus.unsubscribe(id)
    }

    /// Number of subscribers for `kind`.
    pub fn subscriber_count(&self, kind: EncoderEvent) -> usize {
        self.decoder.bus.subscriber_count(kind)
    }

    /// Runs the decoder on an explicit `(clk, dt)` observation.
    ///
    /// This is what the input handlers call; it is public so callers that
    /// sample both lines themselves can feed the decoder directly. Returns
    /// the event published, if any.
    pub fn rotate(&self, clk: bool, dt: bool) -> Result<Option<EncoderEvent>, DispatchError> {
        self.decoder.rotate(clk, dt)
    }

    /// clk level as of the last committed edge.
    pub fn last_clk_state(&self) -> bool {
        self.decoder.last_clk_state.load(Ordering::Acquire)
    }

    /// The clk (A) input.
    pub fn clk(&self) -> &dyn Input {
        self.clk.as_ref()
    }

    /// The dt (B) input.
    pub fn dt(&self) -> &dyn Input {
        self.dt.as_ref()
    }

    /// Failure policy for rotation subscribers.
    pub fn policy(&self) -> DispatchPolicy {
        self.decoder.bus.policy()
    }

    pub(crate) fn handle(&self) -> EncoderHandle {
        EncoderHandle(Arc::downgrade(&self.decoder))
    }
}

impl Drop for RotaryEncoder {
    fn drop(&mut self) {
        self.clk.unsubscribe(self.clk_subscription);
        self.dt.unsubscribe(self.dt_subscription);
    }
}

impl fmt::Debug for RotaryEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotaryEncoder")
            .field("clk", &self.clk.label())
            .field("dt", &self.dt.label())
            .field("last_clk_state", &self.last_clk_state())
            .finish()
    }
}
