use log::debug;
use ndarray::{Array3, ArrayD, ArrayViewD, Axis, Ix1, Ix2, IxDyn};

use crate::error::{TensorError, TensorResult};
use crate::operation::broadcast_shape;
use crate::tensor::Tensor;

fn inner_mismatch(a: usize, b: usize) -> TensorError {
    TensorError::Shape(format!("Inner dimensions must match. {} ≠ {}", a, b))
}

fn backend_shape_error(e: ndarray::ShapeError) -> TensorError {
    TensorError::Shape(e.to_string())
}

/// Copy `view` into a contiguous `(batch, rows, cols)` stack of matrices.
fn stack_matrices(
    view: ArrayViewD<'_, f32>,
    batch: usize,
    rows: usize,
    cols: usize,
) -> TensorResult<Array3<f32>> {
    view.as_standard_layout()
        .into_owned()
        .into_shape((batch, rows, cols))
        .map_err(backend_shape_error)
}

/// Batched product of `lhs (..., n, k)` and `rhs (..., k, m)`; the leading
/// axes broadcast against each other.
fn batched(lhs: ArrayViewD<'_, f32>, rhs: ArrayViewD<'_, f32>) -> TensorResult<ArrayD<f32>> {
    let (ls, rs) = (lhs.shape(), rhs.shape());
    let (n, k) = (ls[ls.len() - 2], ls[ls.len() - 1]);
    let m = rs[rs.len() - 1];
    let batch = broadcast_shape(&ls[..ls.len() - 2], &rs[..rs.len() - 2])?;
    let count: usize = batch.iter().product();

    let full_lhs: Vec<usize> = batch.iter().copied().chain([n, k]).collect();
    let full_rhs: Vec<usize> = batch.iter().copied().chain([k, m]).collect();
    let (a, b) = match (lhs.broadcast(IxDyn(&full_lhs)), rhs.broadcast(IxDyn(&full_rhs))) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(TensorError::Shape(format!(
                "cannot broadcast batch dimensions of {:?} and {:?}",
                ls, rs
            )))
        }
    };
    let a = stack_matrices(a, count, n, k)?;
    let b = stack_matrices(b, count, k, m)?;

    let mut out = Array3::<f32>::zeros((count, n, m));
    for (mut dst, (x, y)) in out
        .outer_iter_mut()
        .zip(a.outer_iter().zip(b.outer_iter()))
    {
        dst.assign(&x.dot(&y));
    }

    let out_shape: Vec<usize> = batch.into_iter().chain([n, m]).collect();
    out.into_shape(IxDyn(&out_shape)).map_err(backend_shape_error)
}

impl Tensor {
    /// Matrix product of `self` and `other`.
    ///
    /// * a rank-0 `other` scales `self`;
    /// * a rank-1 `other` is contracted against the last axis of `self`;
    /// * otherwise the last two axes of each operand are matrices and the
    ///   leading axes broadcast.
    ///
    /// Two 2×2 operands go through [`Tensor::matmul_2x2`]. A 2×2 `self`
    /// against any other shape takes the general path, since the cell-by-cell
    /// routine only produces a 2×2 result.
    pub fn matmul(&self, other: &Tensor) -> TensorResult<Tensor> {
        if self.ndim() == 0 {
            return Err(TensorError::Shape(
                "matmul needs at least one dimension, got a scalar".to_string(),
            ));
        }

        match other.ndim() {
            0 => {
                let factor = other.data().iter().copied().next().ok_or_else(|| {
                    TensorError::Shape("scalar operand holds no value".to_string())
                })?;
                debug!("matmul {:?} @ scalar: scaling by {}", self.shape(), factor);
                Ok(Tensor::from_array(self.data().mapv(|x| x * factor)))
            }
            1 => self.matmul_vector(other),
            _ => {
                let a = self.shape()[self.ndim() - 1];
                let b = other.shape()[other.ndim() - 2];
                if a != b {
                    return Err(inner_mismatch(a, b));
                }
                if self.shape() == [2, 2] && other.shape() == [2, 2] {
                    debug!("matmul 2x2 @ 2x2: dot-product path");
                    return self.matmul_2x2(other);
                }
                self.matmul_batched(other)
            }
        }
    }

    /// 2×2 product computed one cell at a time, each cell being the dot
    /// product of a row of `self` with a column of `other`.
    pub fn matmul_2x2(&self, other: &Tensor) -> TensorResult<Tensor> {
        if self.shape() != [2, 2] || other.shape() != [2, 2] {
            return Err(TensorError::Shape(format!(
                "matmul_2x2 expects two 2x2 matrices, got {:?} and {:?}",
                self.shape(),
                other.shape()
            )));
        }
        let a = self.data().view().into_dimensionality::<Ix2>().map_err(backend_shape_error)?;
        let b = other.data().view().into_dimensionality::<Ix2>().map_err(backend_shape_error)?;

        let mut cells = Vec::with_capacity(4);
        for i in 0..2 {
            for j in 0..2 {
                cells.push(a.row(i).dot(&b.column(j)));
            }
        }
        Tensor::from_shape_vec(&[2, 2], cells)
    }

    /// General batched matrix product for operands of rank ≥ 1 and ≥ 2.
    ///
    /// A rank-1 `self` is treated as a single row and that row axis is
    /// dropped from the result.
    pub fn matmul_batched(&self, other: &Tensor) -> TensorResult<Tensor> {
        if self.ndim() == 0 || other.ndim() < 2 {
            return Err(TensorError::Shape(format!(
                "batched matmul needs ranks >= 1 and >= 2, got {:?} and {:?}",
                self.shape(),
                other.shape()
            )));
        }
        let a = self.shape()[self.ndim() - 1];
        let b = other.shape()[other.ndim() - 2];
        if a != b {
            return Err(inner_mismatch(a, b));
        }
        debug!("matmul {:?} @ {:?}: batched path", self.shape(), other.shape());

        if self.ndim() == 1 {
            let row = self.data().view().insert_axis(Axis(0));
            let out = batched(row, other.data().view())?;
            let row_axis = out.ndim() - 2;
            return Ok(Tensor::from_array(out.index_axis_move(Axis(row_axis), 0)));
        }
        batched(self.data().view(), other.data().view()).map(Tensor::from_array)
    }

    fn matmul_vector(&self, other: &Tensor) -> TensorResult<Tensor> {
        let k = other.size();
        let last = self.shape()[self.ndim() - 1];
        if last != k {
            return Err(inner_mismatch(last, k));
        }
        debug!("matmul {:?} @ vector[{}]", self.shape(), k);

        let v = other.data().view().into_dimensionality::<Ix1>().map_err(backend_shape_error)?;
        if self.ndim() == 1 {
            let u = self.data().view().into_dimensionality::<Ix1>().map_err(backend_shape_error)?;
            return Ok(Tensor::scalar(u.dot(&v)));
        }

        let lead = &self.shape()[..self.ndim() - 1];
        let rows: usize = lead.iter().product();
        let m = self.data().view().into_shape((rows, k)).map_err(backend_shape_error)?;
        let out = m.dot(&v).into_shape(IxDyn(lead)).map_err(backend_shape_error)?;
        Ok(Tensor::from_array(out))
    }
}
