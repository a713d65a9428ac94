use log::trace;
use ndarray::{ArrayD, IxDyn, Zip};

use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

/// Right-hand side of an element-wise operation.
#[derive(Debug, Clone)]
pub enum Operand<'a> {
    Tensor(&'a Tensor),
    Scalar(f32),
    Array(ArrayD<f32>),
}

impl<'a> From<&'a Tensor> for Operand<'a> {
    fn from(tensor: &'a Tensor) -> Self {
        Operand::Tensor(tensor)
    }
}

impl From<f32> for Operand<'_> {
    fn from(value: f32) -> Self {
        Operand::Scalar(value)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value as f32)
    }
}

impl From<ArrayD<f32>> for Operand<'_> {
    fn from(array: ArrayD<f32>) -> Self {
        Operand::Array(array)
    }
}

/// Shape two operands broadcast to: dimensions are aligned from the trailing
/// axis and each pair must be equal or contain a 1.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> TensorResult<Vec<usize>> {
    let ndim = lhs.len().max(rhs.len());
    let mut shape = Vec::with_capacity(ndim);
    for i in 0..ndim {
        let a = if i < lhs.len() { lhs[lhs.len() - 1 - i] } else { 1 };
        let b = if i < rhs.len() { rhs[rhs.len() - 1 - i] } else { 1 };
        let dim = match (a, b) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(TensorError::Shape(format!(
                    "Shapes {:?} and {:?} are not broadcastable ({} ≠ {})",
                    lhs, rhs, a, b
                )))
            }
        };
        shape.push(dim);
    }
    shape.reverse();
    Ok(shape)
}

fn zip_broadcast(
    lhs: &ArrayD<f32>,
    rhs: &ArrayD<f32>,
    op: impl Fn(f32, f32) -> f32,
) -> TensorResult<Tensor> {
    let shape = broadcast_shape(lhs.shape(), rhs.shape())?;
    trace!("broadcast {:?} with {:?} -> {:?}", lhs.shape(), rhs.shape(), shape);
    let dim = IxDyn(&shape);
    let (a, b) = match (lhs.broadcast(dim.clone()), rhs.broadcast(dim)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(TensorError::Shape(format!(
                "Shapes {:?} and {:?} are not broadcastable",
                lhs.shape(),
                rhs.shape()
            )))
        }
    };
    let data = Zip::from(&a).and(&b).map_collect(|&x, &y| op(x, y));
    Ok(Tensor::from_array(data))
}

impl Tensor {
    fn elementwise<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        op: impl Fn(f32, f32) -> f32,
    ) -> TensorResult<Tensor> {
        match other.into() {
            Operand::Tensor(rhs) => zip_broadcast(self.data(), rhs.data(), op),
            Operand::Array(rhs) => zip_broadcast(self.data(), &rhs, op),
            Operand::Scalar(rhs) => Ok(Tensor::from_array(self.data().mapv(|x| op(x, rhs)))),
        }
    }

    pub fn add<'a>(&self, other: impl Into<Operand<'a>>) -> TensorResult<Tensor> {
        self.elementwise(other, |a, b| a + b) // Element-wise addition
    }

    pub fn sub<'a>(&self, other: impl Into<Operand<'a>>) -> TensorResult<Tensor> {
        self.elementwise(other, |a, b| a - b)
    }

    /// Element-wise product. This is not matrix multiplication; see
    /// [`Tensor::matmul`].
    pub fn mul<'a>(&self, other: impl Into<Operand<'a>>) -> TensorResult<Tensor> {
        self.elementwise(other, |a, b| a * b)
    }

    /// Element-wise quotient. Division by zero yields `inf` or `NaN`.
    pub fn div<'a>(&self, other: impl Into<Operand<'a>>) -> TensorResult<Tensor> {
        self.elementwise(other, |a, b| a / b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_tensor_addition() {
        let a = Tensor::zeros(&[2, 2]);
        let b = Tensor::zeros(&[2, 2]);
        let c = a.add(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
    }

    #[test]
    fn test_broadcast_shape_rules() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shape(&[4, 1, 5], &[3, 1]).unwrap(), vec![4, 3, 5]);
        assert_eq!(broadcast_shape(&[], &[2, 2]).unwrap(), vec![2, 2]);
        assert!(broadcast_shape(&[2, 3], &[2]).unwrap_err().is_shape());
    }

    #[test]
    fn test_row_broadcast() {
        let m = Tensor::new([[1, 2, 3], [4, 5, 6]]).unwrap();
        let row = Tensor::new([10, 20, 30]).unwrap();
        let out = m.add(&row).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(out.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_column_broadcast_both_sides() {
        let col = Tensor::new([[1], [2]]).unwrap();
        let row = Tensor::new([10, 20, 30]).unwrap();
        let out = col.mul(&row).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(out.to_vec(), vec![10.0, 20.0, 30.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_scalar_and_array_operands() {
        let t = Tensor::new([2, 4, 6]).unwrap();
        assert_eq!(t.sub(1.0).unwrap().to_vec(), vec![1.0, 3.0, 5.0]);
        assert_eq!(t.div(2.0).unwrap().to_vec(), vec![1.0, 2.0, 3.0]);

        let arr = arr1(&[1.0_f32, 2.0, 3.0]).into_dyn();
        assert_eq!(t.div(arr).unwrap().to_vec(), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_incompatible_shapes() {
        let a = Tensor::new([1, 2, 3]).unwrap();
        let b = Tensor::new([1, 2]).unwrap();
        let err = a.add(&b).unwrap_err();
        assert!(err.is_shape());
        assert!(err.to_string().contains("3 ≠ 2"));
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        let t = Tensor::new([1.0, -1.0, 0.0]).unwrap();
        let out = t.div(0.0).unwrap().to_vec();
        assert_eq!(out[0], f32::INFINITY);
        assert_eq!(out[1], f32::NEG_INFINITY);
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_operands_are_not_modified() {
        let a = Tensor::new([1, 2]).unwrap();
        let b = Tensor::new([3, 4]).unwrap();
        let _ = a.add(&b).unwrap();
        assert_eq!(a.to_vec(), vec![1.0, 2.0]);
        assert_eq!(b.to_vec(), vec![3.0, 4.0]);
    }
}
