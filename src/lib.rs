//! # rs-knob
//!
//! Turns the two raw lines of a mechanical rotary encoder into rotation
//! events, and rotation events into a bounded value you can use like a
//! potentiometer.
//!
//! ## Features
//!
//! - **Typed event bus**: [`Component`] dispatches closed event enums
//!   synchronously, in subscription order, with a configurable failure policy
//! - **Quadrature decoding**: [`RotaryEncoder`] gates on clk edges and uses dt
//!   to pick the direction; dt-only changes and duplicates are ignored
//! - **Virtual potentiometer**: [`Potentiometer`] accumulates steps into a
//!   value clamped to `0.0..=1.0` and stays silent at the limits
//! - **Hardware optional**: inputs are a trait; mocks ship for tests and an
//!   `embedded-hal` polling adapter is available behind the `hal` feature
//!
//! ## Architecture
//!
//! - `component` - Generic publish/subscribe primitive
//! - `traits` - The [`Input`] capability
//! - `encoder` - Quadrature decode state machine
//! - `potentiometer` - Bounded accumulator over rotation events
//! - `counter` - Polling view over rotation events
//! - `config` - Builder-style configuration
//! - `hal` - Input implementations (mock, polled GPIO)
//!
//! ## Example
//!
//! ```rust
//! use rs_knob::{Potentiometer, PotentiometerEvent};
//! use rs_knob::config::PotentiometerConfig;
//! use rs_knob::hal::MockEncoderPins;
//!
//! let pins = MockEncoderPins::new();
//! let config = PotentiometerConfig::new(0.0, 4.0);
//! let volume = Potentiometer::new(pins.clk(), pins.dt(), config).unwrap();
//!
//! volume.subscribe(PotentiometerEvent::ValueChanged, |e| {
//!     println!("volume: {:.0}%", e.value * 100.0);
//!     Ok(())
//! });
//!
//! pins.turn_right(4).unwrap();
//! assert_eq!(volume.value(), 1.0);
//!
//! pins.turn_left(1).unwrap();
//! assert_eq!(volume.value(), 0.75);
//! ```

#![warn(missing_docs)]

/// Generic synchronous publish/subscribe primitive.
pub mod component;
/// Builder-style configuration for inputs and the potentiometer.
pub mod config;
/// Polling view that accumulates rotation events.
pub mod counter;
/// Quadrature decoder for two-line rotary encoders.
pub mod encoder;
/// Configuration and dispatch error types.
pub mod error;
/// Input implementations (mock lines, polled GPIO).
pub mod hal;
/// Bounded value driven by a rotary encoder.
pub mod potentiometer;
/// Capabilities consumed from the environment.
pub mod traits;

// Re-exports for convenience
pub use component::{Component, DispatchPolicy, Event, EventKind, Handler, SubscriptionId};
pub use config::{Config, InputConfig, PotentiometerConfig};
pub use counter::RotationCounter;
pub use encoder::{EncoderEvent, RotaryEncoder};
pub use error::{ConfigError, DispatchError};
pub use potentiometer::{Potentiometer, PotentiometerEvent};
pub use traits::{Input, InputEvent, InputHandler};
