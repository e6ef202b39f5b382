//! Error types for the editing core.

use thiserror::Error;

/// Errors raised by the editing core.
///
/// Geometric move conflicts are not errors; they are reported through
/// [`MovedElementsSelector::has_conflict`](crate::selector::MovedElementsSelector::has_conflict).
#[derive(Debug, Error)]
pub enum EditError {
    /// A content references an id that does not exist in the diagram.
    #[error("Content {from} references missing content {to}")]
    DanglingReference { from: String, to: String },
    /// The dependency relation contains a cycle through this content.
    #[error("Dependency cycle through {0}")]
    DependencyCycle(String),
    #[error("Unknown content: {0}")]
    UnknownContent(String),
    #[error("Unknown canvas: {0}")]
    UnknownCanvas(String),
    /// The content exists but cannot take part in the requested operation.
    #[error("Content {id} does not support {operation}")]
    UnsupportedContent { id: String, operation: &'static str },
    #[error("Layout error: {0}")]
    Layout(String),
    /// The operation is not provided by this core (e.g. undo/redo).
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for editing operations.
pub type EditResult<T> = Result<T, EditError>;
