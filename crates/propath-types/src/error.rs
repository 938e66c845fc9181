//! Type descriptor errors

use thiserror::Error;

/// Errors that can occur while building or resolving type descriptors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A parameterized type was given the wrong number of arguments
    #[error("Invalid type argument count for {class}: expected {expected}, got {actual}")]
    InvalidTypeArgCount {
        /// Raw class being parameterized
        class: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// A type variable is not declared by its claimed owner
    #[error("Undeclared type parameter {name} on {class}")]
    UndeclaredParameter {
        /// Parameter name
        name: String,
        /// Owning class
        class: String,
    },
}
