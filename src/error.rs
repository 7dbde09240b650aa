//! Error types for configuration and event dispatch.
//!
//! Subscribers report failures as [`anyhow::Error`]; the bus wraps them in a
//! [`DispatchError`] that names the event and the failing subscriber so the
//! failure can travel back to whoever triggered the input transition.

use thiserror::Error;

/// Boxed error carried inside a [`DispatchError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid potentiometer configuration, rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// `steps` must be finite and strictly positive, otherwise the step size
    /// `1 / steps` is undefined.
    #[error("steps must be a finite value greater than zero (got {0})")]
    InvalidSteps(f32),

    /// `initial` must be a finite number. Out-of-range finite values are
    /// clamped instead of rejected.
    #[error("initial value must be finite (got {0})")]
    InvalidInitial(f32),
}

/// A subscriber failed while an event was being dispatched.
///
/// Only produced under [`DispatchPolicy::FailFast`]; the remaining
/// subscribers for that event are not invoked.
///
/// [`DispatchPolicy::FailFast`]: crate::DispatchPolicy::FailFast
#[derive(Debug, Error)]
#[error("subscriber #{index} for {event} failed: {source}")]
pub struct DispatchError {
    /// Name of the event being dispatched (e.g. `"ROTATE_LEFT"`).
    pub event: &'static str,
    /// Position of the failing subscriber in subscription order.
    pub index: usize,
    /// The subscriber's error.
    #[source]
    pub source: BoxError,
}

impl DispatchError {
    pub(crate) fn new(event: &'static str, index: usize, source: anyhow::Error) -> Self {
        Self {
            event,
            index,
            source: source.into(),
        }
    }

    /// Walks the source chain looking for an error of type `E`.
    ///
    /// Nested dispatches (input → encoder → potentiometer) wrap errors once
    /// per hop, so the original subscriber error may sit several levels down.
    pub fn find_cause<E: std::error::Error + 'static>(&self) -> Option<&E> {
        let first: &(dyn std::error::Error + 'static) = &*self.source;
        let mut current = Some(first);
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::InvalidSteps(0.0).to_string(),
            "steps must be a finite value greater than zero (got 0)"
        );
        assert_eq!(
            ConfigError::InvalidInitial(f32::NAN).to_string(),
            "initial value must be finite (got NaN)"
        );
    }

    #[test]
    fn dispatch_error_display_includes_event_and_cause() {
        let err = DispatchError::new("ROTATE_LEFT", 1, anyhow::Error::new(Boom));
        assert_eq!(err.to_string(), "subscriber #1 for ROTATE_LEFT failed: boom");
    }

    #[test]
    fn find_cause_walks_nested_dispatch_errors() {
        let inner = DispatchError::new("VALUE_CHANGED", 0, anyhow::Error::new(Boom));
        let outer = DispatchError::new("ROTATE_RIGHT", 0, anyhow::Error::new(inner));
        assert_eq!(outer.find_cause::<Boom>(), Some(&Boom));
        assert!(outer.find_cause::<ConfigError>().is_none());
    }
}
