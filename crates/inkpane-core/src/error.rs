//! Error types for scene mutations.

use crate::clock::ElementId;
use thiserror::Error;

/// Errors raised by scene and index operations.
///
/// Vetoed mutations are not errors: they report `false` and leave the scene
/// untouched. These variants cover invalid arguments and bookkeeping faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("{what} must not be negative (got {value})")]
    NegativeLength { what: &'static str, value: f64 },
    #[error("{what} is out of range (got {value})")]
    OutOfRange { what: &'static str, value: f64 },
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("Index slot {slot} is still occupied by {id}")]
    SlotOccupied { slot: usize, id: ElementId },
    #[error("Chaining these event hubs would create a cycle")]
    HubCycle,
    #[error("Element {0} is not a group")]
    NotAGroup(ElementId),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject negative lengths before any state changes.
pub(crate) fn ensure_non_negative(what: &'static str, value: f64) -> Result<()> {
    if value < 0.0 || value.is_nan() {
        return Err(Error::NegativeLength { what, value });
    }
    Ok(())
}
