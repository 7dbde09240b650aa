//! The digital input capability consumed by the encoder.
//!
//! An [`Input`] is a boolean line (a GPIO pin, a simulated signal, a test
//! double) that can be read at any time and that notifies subscribers with
//! [`InputEvent::ValueChanged`] when its observed value changes. How the line
//! is sampled or debounced is entirely up to the implementation.
//!
//! # Implementations
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MockInput`] | Manually driven line for tests and simulation |
//! | [`PolledInput`] | Wraps an `embedded-hal` pin (requires `hal` feature) |
//!
//! [`MockInput`]: crate::hal::MockInput
//! [`PolledInput`]: crate::hal::PolledInput

use crate::component::{EventKind, Handler, SubscriptionId};

/// Events published by an [`Input`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// The line changed; the payload is the new value.
    ValueChanged,
}

impl EventKind for InputEvent {
    fn as_str(&self) -> &'static str {
        match self {
            InputEvent::ValueChanged => "VALUE_CHANGED",
        }
    }
}

/// Handler type accepted by [`Input::subscribe`].
pub type InputHandler = Handler<InputEvent, bool>;

/// A boolean signal source.
///
/// # Implementation Notes
///
/// - `get()` must be non-blocking and callable from inside a subscriber.
/// - Notifications are delivered synchronously on whichever thread observed
///   the transition.
/// - When two lines are sampled together (as a quadrature pair), update both
///   cached values before notifying either, so a subscriber reading the other
///   line sees the same sampling instant.
pub trait Input: Send + Sync {
    /// Current value of the line.
    fn get(&self) -> bool;

    /// Registers `handler` for [`InputEvent::ValueChanged`].
    fn subscribe(&self, handler: InputHandler) -> SubscriptionId;

    /// Removes a handler registered with [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Human-readable pin or channel label, used in log output.
    fn label(&self) -> &str {
        "input"
    }
}
