//! Error types for tensor operations

use thiserror::Error;

/// Result type for tensor operations
pub type TensorResult<T> = std::result::Result<T, TensorError>;

/// Errors raised by tensor construction and operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// Input could not be turned into a rectangular f32 array.
    #[error("Type error: {0}")]
    Type(String),

    /// Operand shapes conflict (broadcast, matmul, reshape).
    #[error("Shape error: {0}")]
    Shape(String),

    /// Index or axis outside the tensor's bounds.
    #[error("Index error: {0}")]
    Index(String),
}

impl TensorError {
    pub fn is_shape(&self) -> bool {
        matches!(self, TensorError::Shape(_))
    }

    pub fn is_type(&self) -> bool {
        matches!(self, TensorError::Type(_))
    }

    pub fn is_index(&self) -> bool {
        matches!(self, TensorError::Index(_))
    }
}
