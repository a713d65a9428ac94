use log::debug;
use ndarray::IxDyn;

use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

/// Normalize a possibly negative axis against `ndim`.
pub(crate) fn normalize_axis(axis: isize, ndim: usize) -> TensorResult<usize> {
    let resolved = if axis < 0 { axis + ndim as isize } else { axis };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(TensorError::Index(format!(
            "axis {} is out of bounds for tensor of dimension {}",
            axis, ndim
        )));
    }
    Ok(resolved as usize)
}

/// Resolve a target shape that may hold one `-1` against `size` elements.
fn resolve_shape(size: usize, target: &[isize]) -> TensorResult<Vec<usize>> {
    let overflow = || {
        TensorError::Shape(format!(
            "Total elements must match. {} ≠ product of {:?} (overflows usize)",
            size, target
        ))
    };
    let mut wildcard = None;
    let mut known: usize = 1;
    for (i, &dim) in target.iter().enumerate() {
        match dim {
            -1 if wildcard.is_some() => {
                return Err(TensorError::Shape(format!(
                    "can only specify one unknown dimension, got {:?}",
                    target
                )))
            }
            -1 => wildcard = Some(i),
            d if d < 0 => {
                return Err(TensorError::Shape(format!(
                    "negative dimension {} in {:?}",
                    d, target
                )))
            }
            d => known = known.checked_mul(d as usize).ok_or_else(overflow)?,
        }
    }

    let mut shape: Vec<usize> = target.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = wildcard {
        if known == 0 || size % known != 0 {
            return Err(TensorError::Shape(format!(
                "cannot infer unknown dimension: {} elements do not divide into {:?}",
                size, target
            )));
        }
        shape[i] = size / known;
        debug!("reshape wildcard at axis {} resolved to {}", i, shape[i]);
    }

    let total = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(overflow)?;
    if total != size {
        return Err(TensorError::Shape(format!(
            "Total elements must match. {} ≠ {}",
            size, total
        )));
    }
    Ok(shape)
}

impl Tensor {
    /// Reshape to `shape`, keeping row-major element order. One dimension may
    /// be `-1` and is inferred from the others.
    ///
    /// ```
    /// use tinytorch::Tensor;
    ///
    /// let t = Tensor::new([0, 1, 2, 3, 4, 5]).unwrap();
    /// assert_eq!(t.reshape(&[-1, 3]).unwrap().shape(), &[2, 3]);
    /// ```
    pub fn reshape(&self, shape: &[isize]) -> TensorResult<Tensor> {
        let shape = resolve_shape(self.size(), shape)?;
        let data = self
            .data()
            .view()
            .into_shape(IxDyn(&shape))
            .map_err(|e| TensorError::Shape(e.to_string()))?
            .to_owned();
        Ok(Tensor::from_array(data))
    }

    /// Swap the last two axes. Tensors of rank 0 or 1 come back unchanged.
    pub fn transpose(&self) -> Tensor {
        let ndim = self.ndim();
        if ndim < 2 {
            return self.clone();
        }
        self.swapped(ndim - 2, ndim - 1)
    }

    /// Swap axes `dim0` and `dim1`, leaving the others in place. Negative
    /// axes count from the end.
    pub fn transpose_axes(&self, dim0: isize, dim1: isize) -> TensorResult<Tensor> {
        let ndim = self.ndim();
        let a = normalize_axis(dim0, ndim)?;
        let b = normalize_axis(dim1, ndim)?;
        if ndim < 2 {
            return Ok(self.clone());
        }
        Ok(self.swapped(a, b))
    }

    fn swapped(&self, a: usize, b: usize) -> Tensor {
        let mut view = self.data().view();
        view.swap_axes(a, b);
        Tensor::from_array(view.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(n: usize) -> Tensor {
        Tensor::new((0..n).map(|x| x as f32).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_wildcard_in_any_position() {
        let t = range(24);
        assert_eq!(t.reshape(&[2, -1, 4]).unwrap().shape(), &[2, 3, 4]);
        assert_eq!(t.reshape(&[-1, 2, 3]).unwrap().shape(), &[4, 2, 3]);
        assert_eq!(t.reshape(&[-1]).unwrap().shape(), &[24]);
    }

    #[test]
    fn test_inexact_wildcard() {
        let err = range(7).reshape(&[2, -1]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_two_wildcards() {
        assert!(range(6).reshape(&[-1, -1]).unwrap_err().is_shape());
    }

    #[test]
    fn test_wildcard_next_to_zero_dim() {
        assert!(range(6).reshape(&[0, -1]).unwrap_err().is_shape());
    }

    #[test]
    fn test_oversized_target_is_shape_error() {
        assert!(range(6).reshape(&[isize::MAX, 4]).unwrap_err().is_shape());
        assert!(range(6).reshape(&[isize::MAX, 4, -1]).unwrap_err().is_shape());
    }

    #[test]
    fn test_element_count_mismatch() {
        let err = range(6).reshape(&[4, 2]).unwrap_err();
        assert!(err.is_shape());
        assert!(err.to_string().contains("6 ≠ 8"));
    }

    #[test]
    fn test_row_major_order() {
        let t = range(6).reshape(&[2, 3]).unwrap();
        assert_eq!(t.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let col = t.transpose().reshape(&[6]).unwrap();
        assert_eq!(col.to_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_transpose_vector_is_noop() {
        let t = range(3);
        assert_eq!(t.transpose(), t);
    }

    #[test]
    fn test_transpose_scalar_is_noop() {
        let s = Tensor::scalar(5.0);
        assert_eq!(s.transpose(), s);
    }

    #[test]
    fn test_transpose_axes_on_vector() {
        let t = range(3);
        assert_eq!(t.transpose_axes(0, -1).unwrap(), t);
        assert!(t.transpose_axes(0, 1).unwrap_err().is_index());
    }

    #[test]
    fn test_transpose_axes() {
        let t = range(24).reshape(&[2, 3, 4]).unwrap();
        assert_eq!(t.transpose().shape(), &[2, 4, 3]);
        assert_eq!(t.transpose_axes(0, 2).unwrap().shape(), &[4, 3, 2]);
        assert_eq!(t.transpose_axes(0, -1).unwrap().shape(), &[4, 3, 2]);

        let back = t.transpose_axes(0, 2).unwrap().transpose_axes(0, 2).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_transpose_axis_out_of_range() {
        let t = range(6).reshape(&[2, 3]).unwrap();
        assert!(t.transpose_axes(0, 2).unwrap_err().is_index());
    }
}
