//! Error types for the engine surface.

use crate::transport::TransportError;
use platter_normal::NormalizeError;

/// Errors surfaced by registry building, actions, and selectors.
///
/// `Configuration` and `Argument` are always returned synchronously,
/// before any store mutation or transport call. `Transport` failures are
/// recorded in the store (ERROR status + null result) and then returned
/// to the direct caller; selectors swallow them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid descriptor shape, unknown operation key, or key collision.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller supplied too few or wrong-shaped arguments for the
    /// configured mapping.
    #[error("argument error: {0}")]
    Argument(String),

    /// The transport rejected the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A success payload did not match the operation's response shape.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }
}
