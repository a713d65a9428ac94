//! Operator sugar over the named element-wise methods.
//!
//! Each operator returns the same `TensorResult` as the method it wraps, so
//! shape errors still reach the caller. Operators are only implemented on
//! `&Tensor`; a by-value impl would shadow the inherent `add`/`mul`/... when
//! the trait is in scope.

use std::ops::{Add, Div, Mul, Sub};

use crate::error::TensorResult;
use crate::tensor::Tensor;

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident) => {
        impl $trait<&Tensor> for &Tensor {
            type Output = TensorResult<Tensor>;

            fn $method(self, rhs: &Tensor) -> TensorResult<Tensor> {
                Tensor::$method(self, rhs)
            }
        }

        impl $trait<f32> for &Tensor {
            type Output = TensorResult<Tensor>;

            fn $method(self, rhs: f32) -> TensorResult<Tensor> {
                Tensor::$method(self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_match_methods() {
        let a = Tensor::new([1, 2, 3]).unwrap();
        let b = Tensor::new([2, 2, 2]).unwrap();

        assert_eq!((&a + &b).unwrap(), a.add(&b).unwrap());
        assert_eq!((&a - &b).unwrap(), a.sub(&b).unwrap());
        assert_eq!((&a * &b).unwrap().to_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!((&a / 2.0).unwrap().to_vec(), vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_operator_reports_shape_error() {
        let a = Tensor::new([1, 2, 3]).unwrap();
        let b = Tensor::new([1, 2]).unwrap();
        assert!((&a + &b).unwrap_err().is_shape());
    }
}
