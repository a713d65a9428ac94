//! Minimal N-dimensional `f32` tensor on top of `ndarray`.
//!
//! ```
//! use tinytorch::Tensor;
//!
//! let a = Tensor::new([[1, 2], [3, 4]]).unwrap();
//! let b = Tensor::new([[5, 6], [7, 8]]).unwrap();
//! let c = a.matmul(&b).unwrap();
//! assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
//! assert_eq!(c.memory_footprint(), 16);
//! ```

pub mod error;
pub mod index;
pub mod matmul;
pub mod operation;
pub mod ops;
pub mod reduce;
pub mod reshape;
pub mod tensor;

pub use error::{TensorError, TensorResult};
pub use index::TensorIndex;
pub use operation::{broadcast_shape, Operand};
pub use reduce::Axes;
pub use tensor::{DType, Nested, Tensor};
