//! Capabilities the decoder consumes from its environment.
//!
//! The encoder never touches hardware directly. It depends on the
//! [`Input`] trait: something that can report a boolean level and notify
//! subscribers when that level changes. Concrete implementations live in
//! [`crate::hal`].

pub mod input;

pub use input::*;
