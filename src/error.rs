//! Error types for the formcast library.
//!
//! All failures are represented by the [`FormcastError`] enum, which uses
//! the `thiserror` crate for automatic `Error` trait implementation and
//! provides convenient constructor methods for the common cases.
//!
//! # Examples
//!
//! ```
//! use formcast::error::{FormcastError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(FormcastError::train("no training examples"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for formcast operations.
#[derive(Error, Debug)]
pub enum FormcastError {
    /// I/O errors (model file reads/writes).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Vectorization errors (pipeline/output kind mismatches, bad config).
    #[error("Vectorize error: {0}")]
    Vectorize(String),

    /// Training errors (empty corpus, inconsistent labels).
    #[error("Train error: {0}")]
    Train(String),

    /// Model errors (uninitialized runtime, dimension mismatches at load).
    #[error("Model error: {0}")]
    Model(String),

    /// Model file discovery errors.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for operations that may fail with FormcastError.
pub type Result<T> = std::result::Result<T, FormcastError>;

impl FormcastError {
    /// Create a new vectorize error.
    pub fn vectorize<S: Into<String>>(msg: S) -> Self {
        FormcastError::Vectorize(msg.into())
    }

    /// Create a new training error.
    pub fn train<S: Into<String>>(msg: S) -> Self {
        FormcastError::Train(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        FormcastError::Model(msg.into())
    }

    /// Create a new not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        FormcastError::NotFound(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = FormcastError::train("empty corpus");
        assert_eq!(error.to_string(), "Train error: empty corpus");

        let error = FormcastError::model("coef width mismatch");
        assert_eq!(error.to_string(), "Model error: coef width mismatch");

        let error = FormcastError::vectorize("dict pipeline got text output");
        assert_eq!(
            error.to_string(),
            "Vectorize error: dict pipeline got text output"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "model.json not found");
        let error = FormcastError::from(io_error);

        match error {
            FormcastError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
