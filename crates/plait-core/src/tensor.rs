//! Dense row-major numeric blocks.
//!
//! A [`Tensor`] of rank 0 is a scalar. A tensor of rank `n >= 1` is a
//! sequence of `shape[0]` slices of rank `n - 1`. Traversal code never
//! indexes a tensor directly; it calls [`TensorView::node`], which
//! returns either the scalar value or an iterator over slices. A rank-0
//! tensor therefore cannot be iterated as if it had elements.

use smallvec::SmallVec;

use crate::error::RecordError;

/// Inline storage for tensor shapes. Rank 4 covers images with a batch axis.
pub type Shape = SmallVec<[usize; 4]>;

/// An owned multi-dimensional numeric block.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    /// Create a tensor from a shape and row-major data.
    ///
    /// Fails if `data.len()` differs from the product of `shape`, or if
    /// that product overflows `usize`.
    pub fn new(shape: impl Into<Shape>, data: Vec<f64>) -> Result<Self, RecordError> {
        let shape = shape.into();
        let expected = element_count(&shape).ok_or_else(|| RecordError::TensorShape {
            shape: shape.to_vec(),
            len: data.len(),
        })?;
        if expected != data.len() {
            return Err(RecordError::TensorShape {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// A rank-0 tensor holding one value.
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Shape::new(),
            data: vec![value],
        }
    }

    /// A rank-1 tensor over `data`.
    pub fn from_vec(data: Vec<f64>) -> Self {
        let mut shape = Shape::new();
        shape.push(data.len());
        Self { shape, data }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Extent of each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major element data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Borrow the whole tensor as a view.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            data: &self.data,
        }
    }
}

/// Product of all extents, `None` on overflow. The empty product is 1.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// A borrowed slice of a [`Tensor`] along its leading axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TensorView<'a> {
    shape: &'a [usize],
    data: &'a [f64],
}

/// What a tensor view is, structurally.
#[derive(Debug)]
pub enum TensorNode<'a> {
    /// Rank 0: a single value.
    Scalar(f64),
    /// Rank >= 1: the slices along the first axis.
    Slices(Slices<'a>),
}

impl<'a> TensorView<'a> {
    /// Number of axes in this view.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Extent of each axis in this view.
    pub fn shape(&self) -> &'a [usize] {
        self.shape
    }

    /// Row-major element data covered by this view.
    pub fn data(&self) -> &'a [f64] {
        self.data
    }

    /// Decompose into a scalar or a slice iterator.
    pub fn node(&self) -> TensorNode<'a> {
        match self.shape.split_first() {
            None => TensorNode::Scalar(self.data[0]),
            Some((&extent, rest)) => TensorNode::Slices(Slices {
                inner_shape: rest,
                data: self.data,
                stride: element_count(rest).unwrap_or(0),
                next: 0,
                extent,
            }),
        }
    }

    /// The `index`-th slice along the first axis.
    ///
    /// Returns `None` for rank-0 views and out-of-range indices.
    pub fn slice(&self, index: usize) -> Option<TensorView<'a>> {
        match self.node() {
            TensorNode::Scalar(_) => None,
            TensorNode::Slices(mut slices) => slices.nth(index),
        }
    }

    /// Copy this view into an owned tensor.
    pub fn to_tensor(&self) -> Tensor {
        Tensor {
            shape: Shape::from_slice(self.shape),
            data: self.data.to_vec(),
        }
    }
}

/// Iterator over the first-axis slices of a rank >= 1 view.
#[derive(Debug)]
pub struct Slices<'a> {
    inner_shape: &'a [usize],
    data: &'a [f64],
    stride: usize,
    next: usize,
    extent: usize,
}

impl<'a> Iterator for Slices<'a> {
    type Item = TensorView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.extent {
            return None;
        }
        let start = self.next * self.stride;
        self.next += 1;
        Some(TensorView {
            shape: self.inner_shape,
            data: &self.data[start..start + self.stride],
        })
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.next = self.next.saturating_add(n);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.extent.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Slices<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::smallvec;

    #[test]
    fn new_rejects_wrong_length() {
        let err = Tensor::new(smallvec![2, 3], vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            RecordError::TensorShape {
                shape: vec![2, 3],
                len: 5
            }
        );
    }

    #[test]
    fn rank_zero_is_scalar_node() {
        let t = Tensor::scalar(4.5);
        assert_eq!(t.rank(), 0);
        assert!(matches!(t.view().node(), TensorNode::Scalar(v) if v == 4.5));
        assert!(t.view().slice(0).is_none());
    }

    #[test]
    fn slices_walk_first_axis() {
        let t = Tensor::new(smallvec![2, 3], (0..6).map(f64::from).collect()).unwrap();
        let TensorNode::Slices(slices) = t.view().node() else {
            panic!("rank-2 tensor must decompose into slices");
        };
        assert_eq!(slices.len(), 2);
        let rows: Vec<Vec<f64>> = slices.map(|s| s.data().to_vec()).collect();
        assert_eq!(rows, vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]);
    }

    #[test]
    fn slice_by_index() {
        let t = Tensor::new(smallvec![3, 2], (0..6).map(f64::from).collect()).unwrap();
        let row = t.view().slice(2).unwrap();
        assert_eq!(row.shape(), &[2]);
        assert_eq!(row.data(), &[4.0, 5.0]);
        assert!(t.view().slice(3).is_none());
    }

    #[test]
    fn zero_extent_axis_keeps_inner_shape() {
        let t = Tensor::new(smallvec![0, 3], vec![]).unwrap();
        let TensorNode::Slices(slices) = t.view().node() else {
            panic!("rank-2 tensor must decompose into slices");
        };
        assert_eq!(slices.len(), 0);
        assert_eq!(t.shape(), &[0, 3]);
    }

    #[test]
    fn element_count_overflow_is_none() {
        assert_eq!(element_count(&[usize::MAX, 2]), None);
        assert_eq!(element_count(&[]), Some(1));
    }

    fn arb_shape_and_data() -> impl Strategy<Value = (Vec<usize>, Vec<f64>)> {
        prop::collection::vec(0usize..4, 0..4).prop_flat_map(|shape| {
            let len: usize = shape.iter().product();
            (Just(shape), prop::collection::vec(-1.0e3..1.0e3f64, len))
        })
    }

    proptest! {
        #[test]
        fn slices_partition_data((shape, data) in arb_shape_and_data()) {
            let t = Tensor::new(shape.as_slice(), data).unwrap();
            match t.view().node() {
                TensorNode::Scalar(v) => prop_assert_eq!(v, t.data()[0]),
                TensorNode::Slices(slices) => {
                    prop_assert_eq!(slices.len(), shape[0]);
                    let joined: Vec<f64> = slices.flat_map(|s| s.data().iter().copied()).collect();
                    prop_assert_eq!(joined.as_slice(), t.data());
                }
            }
        }

        #[test]
        fn slice_matches_iteration((shape, data) in arb_shape_and_data(), i in 0usize..4) {
            let t = Tensor::new(shape.as_slice(), data).unwrap();
            let by_index = t.view().slice(i);
            let by_iter = match t.view().node() {
                TensorNode::Scalar(_) => None,
                TensorNode::Slices(mut slices) => slices.nth(i),
            };
            prop_assert_eq!(by_index, by_iter);
        }
    }
}
