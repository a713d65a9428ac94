use std::fmt;

use log::trace;
use ndarray::{ArrayD, IxDyn};

use crate::error::{TensorError, TensorResult};

/// Element type of a tensor. Every tensor stores `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DType {
    #[default]
    F32,
}

impl DType {
    /// Bytes per element.
    pub fn size_of(&self) -> usize {
        match self {
            DType::F32 => std::mem::size_of::<f32>(),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "float32"),
        }
    }
}

/// Nested-sequence input accepted by [`Tensor::new`].
///
/// Rectangularity is only checked when the tensor is built, so a `Nested`
/// value may be ragged.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    Scalar(f32),
    List(Vec<Nested>),
}

impl Nested {
    /// Dimensions implied by following the first element at every level.
    fn leading_shape(&self) -> Vec<usize> {
        let mut shape = Vec::new();
        let mut node = self;
        while let Nested::List(items) = node {
            shape.push(items.len());
            match items.first() {
                Some(first) => node = first,
                None => break,
            }
        }
        shape
    }

    fn flatten_into(&self, dims: &[usize], depth: usize, out: &mut Vec<f32>) -> TensorResult<()> {
        match (self, dims.split_first()) {
            (Nested::Scalar(v), None) => {
                out.push(*v);
                Ok(())
            }
            (Nested::List(items), Some((&len, rest))) if items.len() == len => {
                for item in items {
                    item.flatten_into(rest, depth + 1, out)?;
                }
                Ok(())
            }
            (Nested::List(items), Some((&len, _))) => Err(TensorError::Type(format!(
                "ragged nested sequence at depth {}: expected {} elements, found {}",
                depth,
                len,
                items.len()
            ))),
            (Nested::Scalar(_), Some(_)) => Err(TensorError::Type(format!(
                "ragged nested sequence at depth {}: expected a list, found a scalar",
                depth
            ))),
            (Nested::List(_), None) => Err(TensorError::Type(format!(
                "ragged nested sequence at depth {}: expected a scalar, found a list",
                depth
            ))),
        }
    }
}

macro_rules! nested_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Nested {
                fn from(value: $t) -> Self {
                    Nested::Scalar(value as f32)
                }
            }
        )*
    };
}

nested_from_number!(f32, f64, i32, i64, u8, u32, usize);

impl<T: Into<Nested>> From<Vec<T>> for Nested {
    fn from(items: Vec<T>) -> Self {
        Nested::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Nested>, const N: usize> From<[T; N]> for Nested {
    fn from(items: [T; N]) -> Self {
        Nested::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Nested> + Clone> From<&[T]> for Nested {
    fn from(items: &[T]) -> Self {
        Nested::List(items.iter().cloned().map(Into::into).collect())
    }
}

/// Dense N-dimensional array of `f32` values.
///
/// A tensor owns its buffer outright and is never modified after it is
/// built: every operation returns a new tensor backed by a new buffer.
#[derive(Clone)]
pub struct Tensor {
    data: ArrayD<f32>, // Multi-dimensional array, standard layout
    shape: Vec<usize>,
    size: usize,
    dtype: DType,
}

impl Tensor {
    /// Build a tensor from nested numeric data.
    ///
    /// ```
    /// use tinytorch::Tensor;
    ///
    /// let t = Tensor::new([[1, 2, 3], [4, 5, 6]]).unwrap();
    /// assert_eq!(t.shape(), &[2, 3]);
    /// ```
    ///
    /// Fails with [`TensorError::Type`] when the input is not rectangular.
    pub fn new(data: impl Into<Nested>) -> TensorResult<Self> {
        let nested = data.into();
        let shape = nested.leading_shape();
        let mut values = Vec::with_capacity(shape.iter().product());
        nested.flatten_into(&shape, 0, &mut values)?;
        trace!("Tensor::new shape={:?}", shape);
        Self::from_shape_vec(&shape, values)
    }

    /// Wrap a backend array, taking ownership of its buffer.
    pub fn from_array(data: ArrayD<f32>) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        let shape = data.shape().to_vec();
        let size = data.len();
        Tensor {
            data,
            shape,
            size,
            dtype: DType::F32,
        }
    }

    /// Build a tensor from row-major values and an explicit shape.
    pub fn from_shape_vec(shape: &[usize], values: Vec<f32>) -> TensorResult<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(TensorError::Shape(format!(
                "{} values cannot fill shape {:?} ({} elements)",
                values.len(),
                shape,
                expected
            )));
        }
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(Self::from_array)
            .map_err(|e| TensorError::Shape(e.to_string()))
    }

    /// Rank-0 tensor holding one value.
    pub fn scalar(value: f32) -> Self {
        Self::from_array(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_array(ArrayD::<f32>::zeros(IxDyn(shape)))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Raw backend array.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<f32> {
        self.data
    }

    /// Row-major copy of the values.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// Exact number of bytes held by the element buffer.
    pub fn memory_footprint(&self) -> usize {
        self.size * self.dtype.size_of()
    }

    /// True when both tensors share a shape and every pair of elements lies
    /// within `tol` of each other.
    pub fn allclose(&self, other: &Tensor, tol: f32) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b || (a - b).abs() <= tol)
    }
}

impl From<ArrayD<f32>> for Tensor {
    fn from(data: ArrayD<f32>) -> Self {
        Tensor::from_array(data)
    }
}

impl From<Tensor> for ArrayD<f32> {
    fn from(tensor: Tensor) -> Self {
        tensor.into_data()
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({})", self.data)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(data={}, shape={:?})", self.data, self.shape)
    }
}
