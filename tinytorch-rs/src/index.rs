use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use log::trace;
use ndarray::{Axis, Slice};

use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

/// One element of an index expression, following numpy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorIndex {
    /// Select one position and drop the axis. Negative values count from
    /// the end.
    Index(isize),
    /// `start..end` with `step`; bounds are clamped to the axis.
    Slice {
        start: Option<isize>,
        end: Option<isize>,
        step: isize,
    },
    /// The whole axis (`:`).
    Full,
    /// Insert a new axis of length 1.
    NewAxis,
}

impl TensorIndex {
    pub fn range(start: isize, end: isize) -> Self {
        TensorIndex::Slice {
            start: Some(start),
            end: Some(end),
            step: 1,
        }
    }

    pub fn step_by(step: isize) -> Self {
        TensorIndex::Slice {
            start: None,
            end: None,
            step,
        }
    }
}

impl From<isize> for TensorIndex {
    fn from(i: isize) -> Self {
        TensorIndex::Index(i)
    }
}

impl From<i32> for TensorIndex {
    fn from(i: i32) -> Self {
        TensorIndex::Index(i as isize)
    }
}

impl From<usize> for TensorIndex {
    fn from(i: usize) -> Self {
        TensorIndex::Index(i as isize)
    }
}

impl From<Range<isize>> for TensorIndex {
    fn from(r: Range<isize>) -> Self {
        TensorIndex::range(r.start, r.end)
    }
}

impl From<RangeFrom<isize>> for TensorIndex {
    fn from(r: RangeFrom<isize>) -> Self {
        TensorIndex::Slice {
            start: Some(r.start),
            end: None,
            step: 1,
        }
    }
}

impl From<RangeTo<isize>> for TensorIndex {
    fn from(r: RangeTo<isize>) -> Self {
        TensorIndex::Slice {
            start: None,
            end: Some(r.end),
            step: 1,
        }
    }
}

impl From<RangeFull> for TensorIndex {
    fn from(_: RangeFull) -> Self {
        TensorIndex::Full
    }
}

/// Clamp a numpy-style slice to an axis of length `dim` and express it as a
/// backend `Slice` that selects the same elements in the same order.
fn resolve_slice(start: Option<isize>, end: Option<isize>, step: isize, dim: usize) -> Slice {
    let dim = dim as isize;
    let wrap = |v: isize| if v < 0 { v + dim } else { v };

    let count = if step > 0 {
        let s = start.map_or(0, |v| wrap(v).clamp(0, dim));
        let e = end.map_or(dim, |v| wrap(v).clamp(0, dim));
        let n = if e > s { (e - s - 1) / step + 1 } else { 0 };
        (s, n)
    } else {
        let s = start.map_or(dim - 1, |v| wrap(v).clamp(-1, dim - 1));
        let e = end.map_or(-1, |v| wrap(v).clamp(-1, dim - 1));
        let n = if s > e {
            ((s - e - 1) as usize / step.unsigned_abs()) as isize + 1
        } else {
            0
        };
        (s, n)
    };

    match count {
        (_, 0) => Slice::new(0, Some(0), 1),
        (s, 1) => Slice::new(s, Some(s + 1), 1),
        (s, n) if step > 0 => Slice::new(s, Some(s + (n - 1) * step + 1), step),
        (s, n) => Slice::new(s + (n - 1) * step, Some(s + 1), step),
    }
}

impl Tensor {
    /// Index or slice the tensor. Axes not covered by `index` are taken
    /// whole. The result never shares storage with `self`.
    pub fn get_item(&self, index: &[TensorIndex]) -> TensorResult<Tensor> {
        let consumed = index
            .iter()
            .filter(|i| !matches!(i, TensorIndex::NewAxis))
            .count();
        if consumed > self.ndim() {
            return Err(TensorError::Index(format!(
                "too many indices: tensor is {}-dimensional, but {} were indexed",
                self.ndim(),
                consumed
            )));
        }

        let mut view = self.data().view();
        let mut axis = 0;
        for (source_axis, item) in index.iter().enumerate() {
            match *item {
                TensorIndex::Index(i) => {
                    let dim = view.shape()[axis];
                    let resolved = if i < 0 { i + dim as isize } else { i };
                    if resolved < 0 || resolved as usize >= dim {
                        return Err(TensorError::Index(format!(
                            "index {} is out of bounds for axis {} with size {}",
                            i, source_axis, dim
                        )));
                    }
                    view = view.index_axis_move(Axis(axis), resolved as usize);
                }
                TensorIndex::Slice { start, end, step } => {
                    if step == 0 {
                        return Err(TensorError::Index("slice step cannot be zero".to_string()));
                    }
                    let slice = resolve_slice(start, end, step, view.shape()[axis]);
                    view.slice_axis_inplace(Axis(axis), slice);
                    axis += 1;
                }
                TensorIndex::Full => axis += 1,
                TensorIndex::NewAxis => {
                    view = view.insert_axis(Axis(axis));
                    axis += 1;
                }
            }
        }
        trace!("get_item {:?} -> {:?}", self.shape(), view.shape());
        Ok(Tensor::from_array(view.to_owned()))
    }

    /// Select position `i` along the first axis.
    pub fn get(&self, i: isize) -> TensorResult<Tensor> {
        self.get_item(&[TensorIndex::Index(i)])
    }
}
