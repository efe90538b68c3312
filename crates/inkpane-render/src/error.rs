//! Render layer errors.

use crate::interaction::StateId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No interaction state registered for {0:?}")]
    UnregisteredState(StateId),
    #[error("Illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: StateId, to: StateId },
    #[error("Unknown pane: {0}")]
    UnknownPane(String),
    #[error("Invalid stage configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] inkpane_core::Error),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
