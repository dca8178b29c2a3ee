//! Error types for scene operations.

use thiserror::Error;

/// Reasons a scene request was not carried out.
///
/// None of these reach the user: the session logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Text content is empty")]
    EmptyContent,
    #[error("No eligible active object")]
    NoActiveTarget,
}

/// Image load failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
