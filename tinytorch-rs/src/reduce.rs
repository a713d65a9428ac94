use log::trace;
use ndarray::{ArrayD, Axis};

use crate::error::{TensorError, TensorResult};
use crate::reshape::normalize_axis;
use crate::tensor::Tensor;

/// Axes a reduction collapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Axes {
    All,
    One(isize),
    Many(Vec<isize>),
}

impl From<isize> for Axes {
    fn from(axis: isize) -> Self {
        Axes::One(axis)
    }
}

impl From<i32> for Axes {
    fn from(axis: i32) -> Self {
        Axes::One(axis as isize)
    }
}

impl<const N: usize> From<[i32; N]> for Axes {
    fn from(axes: [i32; N]) -> Self {
        Axes::Many(axes.iter().map(|&a| a as isize).collect())
    }
}

impl From<Option<isize>> for Axes {
    fn from(axis: Option<isize>) -> Self {
        axis.map_or(Axes::All, Axes::One)
    }
}

impl From<Vec<isize>> for Axes {
    fn from(axes: Vec<isize>) -> Self {
        Axes::Many(axes)
    }
}

impl From<&[isize]> for Axes {
    fn from(axes: &[isize]) -> Self {
        Axes::Many(axes.to_vec())
    }
}

impl<const N: usize> From<[isize; N]> for Axes {
    fn from(axes: [isize; N]) -> Self {
        Axes::Many(axes.to_vec())
    }
}

impl Axes {
    /// Sorted, de-duplicated axis positions for a tensor of rank `ndim`.
    fn resolve(&self, ndim: usize) -> TensorResult<Vec<usize>> {
        let requested = match self {
            Axes::All => return Ok((0..ndim).collect()),
            Axes::One(axis) => vec![*axis],
            Axes::Many(axes) => axes.clone(),
        };
        let mut resolved = Vec::with_capacity(requested.len());
        for axis in requested {
            let axis = normalize_axis(axis, ndim)?;
            if resolved.contains(&axis) {
                return Err(TensorError::Index(format!("duplicate value in axes: {}", axis)));
            }
            resolved.push(axis);
        }
        resolved.sort_unstable();
        Ok(resolved)
    }
}

fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.max(b)
    }
}

impl Tensor {
    /// Collapse `axes` with `fold`, highest axis first so the remaining
    /// positions stay valid. Reduced axes are re-inserted with length 1 when
    /// `keepdims` is set.
    fn reduce(
        &self,
        axes: &Axes,
        keepdims: bool,
        fold: impl Fn(&ArrayD<f32>, Axis) -> ArrayD<f32>,
    ) -> TensorResult<(ArrayD<f32>, usize)> {
        let axes = axes.resolve(self.ndim())?;
        let count: usize = axes.iter().map(|&a| self.shape()[a]).product();

        let mut data = self.data().clone();
        for &axis in axes.iter().rev() {
            data = fold(&data, Axis(axis));
        }
        if keepdims {
            for &axis in &axes {
                data = data.insert_axis(Axis(axis));
            }
        }
        trace!(
            "reduce {:?} over {:?} (keepdims={}) -> {:?}",
            self.shape(),
            axes,
            keepdims,
            data.shape()
        );
        Ok((data, count))
    }

    /// Sum over `axes`.
    ///
    /// ```
    /// use tinytorch::Tensor;
    ///
    /// let t = Tensor::new([[1, 2], [3, 4]]).unwrap();
    /// assert_eq!(t.sum(0, false).unwrap().to_vec(), vec![4.0, 6.0]);
    /// ```
    pub fn sum(&self, axes: impl Into<Axes>, keepdims: bool) -> TensorResult<Tensor> {
        let (data, _) = self.reduce(&axes.into(), keepdims, |a, axis| a.sum_axis(axis))?;
        Ok(Tensor::from_array(data))
    }

    /// Arithmetic mean over `axes`. An empty reduction yields NaN.
    pub fn mean(&self, axes: impl Into<Axes>, keepdims: bool) -> TensorResult<Tensor> {
        let (data, count) = self.reduce(&axes.into(), keepdims, |a, axis| a.sum_axis(axis))?;
        let count = count as f32;
        Ok(Tensor::from_array(data.mapv(|x| x / count)))
    }

    /// Largest value over `axes`. NaN propagates.
    pub fn max(&self, axes: impl Into<Axes>, keepdims: bool) -> TensorResult<Tensor> {
        let axes = axes.into();
        let resolved = axes.resolve(self.ndim())?;
        if resolved.iter().any(|&a| self.shape()[a] == 0) {
            return Err(TensorError::Shape(format!(
                "max of an empty axis in shape {:?} has no identity",
                self.shape()
            )));
        }
        let (data, _) = self.reduce(&axes, keepdims, |a, axis| {
            a.fold_axis(axis, f32::NEG_INFINITY, |&acc, &x| nan_max(acc, x))
        })?;
        Ok(Tensor::from_array(data))
    }
}
