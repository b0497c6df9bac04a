//! Error type for operations that can genuinely fail.
//!
//! Recoverable conditions (missing geometry, dangling edge endpoints,
//! rejected gesture transitions) are not errors; they are result variants
//! on the operations themselves.

use crate::id::Guid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("id {0} is already live in the diagram")]
    DuplicateId(Guid),

    #[error("no live node with id {0}")]
    UnknownNode(Guid),

    #[error("render surface rejected a new binding: {reason}")]
    SurfaceRejected { reason: String },

    #[error("malformed id {0:?}")]
    InvalidGuid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
