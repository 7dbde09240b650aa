//! Concrete [`Input`] implementations.
//!
//! # Available Implementations
//!
//! - `mock`: Manually driven lines for tests and simulation
//! - `polled`: `embedded-hal` GPIO pins sampled by polling (requires `hal` feature)
//!
//! [`Input`]: crate::traits::Input

pub mod mock;

#[cfg(feature = "hal")]
pub mod polled;

pub use mock::*;

#[cfg(feature = "hal")]
pub use polled::*;
