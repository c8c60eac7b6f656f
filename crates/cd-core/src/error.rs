//! Error types for the two fallible boundaries: connect gestures and
//! diagram persistence. Everything else in the engine is infallible.

use crate::id::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Why a connection between two nodes was refused.
///
/// `Display` is the human-readable reason shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("a factor cannot be connected to itself")]
    SelfLoop,
    #[error("these factors are already connected")]
    DuplicateEdge,
    #[error("factor {0:?} is not part of the diagram")]
    MissingNode(NodeId),
}

/// Failure at the persistence boundary. The in-memory diagram is never
/// touched when one of these is returned.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed diagram file: {0}")]
    Format(#[from] serde_json::Error),
}
