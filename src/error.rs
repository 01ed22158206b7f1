use std::{fmt, io};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;

use crate::event::GraphEvent;

/// Errors raised by the relationship graph.
///
/// Everything except `Io`, `Serialization` and `Config` is a caller precondition violation or a
/// schema that cannot explain a field: the graph refuses the call and leaves its state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum GraphError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Graph has been destroyed")]
    Destroyed,
    #[error("Cannot {action} the implicit relationship '{kind}.{field}'")]
    ImplicitRelationship {
        action: String,
        kind: String,
        field: String,
    },
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Cannot remove {0} while a removal is already in progress")]
    ReentrantRemove(String),
    #[error("'{op}' is a remote-only operation and cannot be applied as a local mutation")]
    RemoteOnly { op: String },
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error(
        "'{kind}.{field}' expects records of type '{expected}' but was given '{found}'; \
         declare the relationship polymorphic or register the types as equivalent"
    )]
    TypeMismatch {
        kind: String,
        field: String,
        expected: String,
        found: String,
    },
    #[error("No relationship schema was found for '{kind}.{field}'")]
    UnknownRelationship { kind: String, field: String },
}

impl GraphError {
    /// True for errors that indicate caller misuse rather than an environmental failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GraphError::Destroyed
                | GraphError::ImplicitRelationship { .. }
                | GraphError::InvalidOperation(_)
                | GraphError::ReentrantRemove(_)
                | GraphError::RemoteOnly { .. }
                | GraphError::TypeMismatch { .. }
        )
    }
}

impl From<toml::de::Error> for GraphError {
    fn from(src: toml::de::Error) -> GraphError {
        GraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for GraphError {
    fn from(src: toml::ser::Error) -> GraphError {
        GraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for GraphError {
    fn from(src: JsonError) -> GraphError {
        GraphError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for GraphError {
    fn from(x: io::Error) -> Self {
        GraphError::Io(format!("IOError: {}: {x}", x.kind()))
    }
}

impl From<fmt::Error> for GraphError {
    fn from(x: fmt::Error) -> Self {
        GraphError::Serialization(format!("{x}"))
    }
}

impl From<TokioSendError<GraphEvent>> for GraphError {
    fn from(x: TokioSendError<GraphEvent>) -> Self {
        GraphError::Io(format!(
            "Channel update send Error, could not transmit relationship event {:?}",
            x.0
        ))
    }
}
