//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the [`Input`] capability so the
//! decoder and potentiometer can be exercised on a desktop.
//!
//! # Available Mocks
//!
//! | Mock | Purpose |
//! |------|---------|
//! | [`MockInput`] | A single line you set, toggle, or re-notify by hand |
//! | [`MockEncoderPins`] | A clk/dt pair walked through the quadrature Gray code |
//!
//! # Example
//!
//! ```rust
//! use rs_knob::{EncoderEvent, RotaryEncoder};
//! use rs_knob::hal::MockEncoderPins;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pins = MockEncoderPins::new();
//! let encoder = RotaryEncoder::new(pins.clk(), pins.dt());
//!
//! let rights = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&rights);
//! encoder.subscribe(EncoderEvent::RotateRight, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! // One full Gray-code cycle crosses two clk edges.
//! pins.turn_right(2).unwrap();
//! assert_eq!(rights.load(Ordering::SeqCst), 2);
//! ```
//!
//! [`Input`]: crate::traits::Input

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::component::{Component, SubscriptionId};
use crate::config::{short_string, ShortString};
use crate::error::DispatchError;
use crate::traits::{Input, InputEvent, InputHandler};

// ============================================================================
// Single Line
// ============================================================================

/// Manually driven input line.
///
/// # Example
///
/// ```rust
/// use rs_knob::hal::MockInput;
/// use rs_knob::traits::Input;
///
/// let line = MockInput::new("clk", false);
/// assert!(!line.get());
///
/// // No subscribers yet, so nobody is notified.
/// assert_eq!(line.set(true).unwrap(), 0);
/// assert!(line.get());
/// ```
#[derive(Debug)]
pub struct MockInput {
    label: ShortString,
    value: AtomicBool,
    bus: Component<InputEvent, bool>,
}

impl MockInput {
    /// Creates a line with the given label and starting value.
    pub fn new(label: &str, initial: bool) -> Self {
        Self {
            label: short_string(label),
            value: AtomicBool::new(initial),
            bus: Component::new(),
        }
    }

    /// Creates a line already wrapped in an `Arc`, ready to hand to an encoder.
    pub fn shared(label: &str, initial: bool) -> Arc<Self> {
        Arc::new(Self::new(label, initial))
    }

    /// Drives the line to `value`, notifying subscribers only on a change.
    ///
    /// Returns the number of subscribers notified.
    pub fn set(&self, value: bool) -> Result<usize, DispatchError> {
        if self.value.swap(value, Ordering::SeqCst) == value {
            return Ok(0);
        }
        self.bus.publish(InputEvent::ValueChanged, value)
    }

    /// Inverts the line and notifies subscribers.
    pub fn toggle(&self) -> Result<usize, DispatchError> {
        let value = !self.value.fetch_xor(true, Ordering::SeqCst);
        self.bus.publish(InputEvent::ValueChanged, value)
    }

    /// Stores `value` and notifies subscribers even if nothing changed.
    ///
    /// Simulates duplicate or bouncing notifications from a noisy line.
    pub fn notify(&self, value: bool) -> Result<usize, DispatchError> {
        self.value.store(value, Ordering::SeqCst);
        self.bus.publish(InputEvent::ValueChanged, value)
    }

    /// Changes the stored value without notifying anyone.
    ///
    /// Useful for simulating a line whose notification is still in flight.
    pub fn set_silently(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Number of registered value-changed subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count(InputEvent::ValueChanged)
    }
}

impl Input for MockInput {
    fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
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

// ============================================================================
// Quadrature Pair
// ============================================================================

/// Gray-code phases as `(clk, dt)`, in clockwise order.
const PHASES: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

/// A clk/dt pair that moves through the quadrature sequence one quarter
/// step at a time, changing exactly one line per step.
///
/// Clockwise is `(0,0) → (1,0) → (1,1) → (0,1) → (0,0)`; every clk change
/// along the way decodes as a right rotation.
#[derive(Debug)]
pub struct MockEncoderPins {
    clk: Arc<MockInput>,
    dt: Arc<MockInput>,
    phase: AtomicUsize,
}

impl Default for MockEncoderPins {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoderPins {
    /// Creates a pair resting at `(0, 0)` labelled `clk` and `dt`.
    pub fn new() -> Self {
        Self::with_labels("clk", "dt")
    }

    /// Creates a pair resting at `(0, 0)` with custom labels.
    pub fn with_labels(clk: &str, dt: &str) -> Self {
        Self {
            clk: MockInput::shared(clk, false),
            dt: MockInput::shared(dt, false),
            phase: AtomicUsize::new(0),
        }
    }

    /// Handle to the clk line.
    pub fn clk(&self) -> Arc<MockInput> {
        Arc::clone(&self.clk)
    }

    /// Handle to the dt line.
    pub fn dt(&self) -> Arc<MockInput> {
        Arc::clone(&self.dt)
    }

    /// Current `(clk, dt)` levels.
    pub fn levels(&self) -> (bool, bool) {
        (self.clk.get(), self.dt.get())
    }

    /// Advances one quarter step clockwise.
    pub fn quarter_right(&self) -> Result<(), DispatchError> {
        self.advance(1)
    }

    /// Advances one quarter step counter-clockwise.
    pub fn quarter_left(&self) -> Result<(), DispatchError> {
        self.advance(PHASES.len() - 1)
    }

    /// Turns clockwise until `edges` clk transitions have occurred.
    pub fn turn_right(&self, edges: usize) -> Result<(), DispatchError> {
        self.turn(edges, 1)
    }

    /// Turns counter-clockwise until `edges` clk transitions have occurred.
    pub fn turn_left(&self, edges: usize) -> Result<(), DispatchError> {
        self.turn(edges, PHASES.len() - 1)
    }

    fn turn(&self, edges: usize, offset: usize) -> Result<(), DispatchError> {
        for _ in 0..edges {
            let clk_before = self.clk.get();
            while self.clk.get() == clk_before {
                self.advance(offset)?;
            }
        }
        Ok(())
    }

    fn advance(&self, offset: usize) -> Result<(), DispatchError> {
        let next = (self.phase.load(Ordering::SeqCst) + offset) % PHASES.len();
        self.phase.store(next, Ordering::SeqCst);
        let (clk, dt) = PHASES[next];
        self.clk.set(clk)?;
        self.dt.set(dt)?;
        Ok(())
    }
}
