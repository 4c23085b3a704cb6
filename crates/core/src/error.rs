//! Error types for core domain invariants

use thiserror::Error;

/// Result type for core domain operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Violations of the domain invariants enforced by core types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A book key was empty or whitespace
    #[error("Book key must not be empty")]
    EmptyKey,

    /// Neither a natural identifier nor title/author were available
    #[error("Cannot synthesize a book key without a title or author")]
    NoKeyMaterial,

    /// The same key appeared twice within one book set
    #[error("Duplicate book key in set: {0}")]
    DuplicateKey(String),

    /// Unknown platform name
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}
