use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{IndexError, Result};
use crate::shape::Shape;
use crate::shape_strider::{IndexIterator, ShapeStrider};

/// Backing storage of a `CpuArray`.
#[derive(Debug)]
struct Buffer<T> {
    data: Vec<T>,
}

/// An n-dimensional array stored in a buffer on the CPU.
///
/// Views (slicing, fixing an index, permuting, broadcasting) never copy the buffer:
/// buffers are read-only and reference counted, and each array carries its own strider.
/// Cloning a `CpuArray` is cheap.
/// Only gathers, which is what outer and vectorized indexing boil down to, allocate.
#[derive(Clone)]
pub struct CpuArray<T> {
    buffer: Arc<Buffer<T>>,
    strider: ShapeStrider,
}

impl<T: Debug> Debug for CpuArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CpuArray({:?}, {:?})", self.buffer, self.strider)
    }
}

impl<T: Copy> CpuArray<T> {
    /// Return a new array with the given shape and data.
    /// Assumes the data is laid out contiguously, in row-major order.
    ///
    /// # Errors
    /// If the number of elements in data does not match the shape.
    pub fn new(shape: &[usize], data: Vec<T>) -> Result<Self> {
        if shape.size() != data.len() {
            return Err(IndexError::DataLength {
                expected: shape.size(),
                actual: data.len(),
            });
        }
        Ok(Self::new_into(shape, data))
    }

    /// Return a new array with no dimensions holding a single value.
    pub fn scalar(value: T) -> Self {
        Self::new_into(&[], vec![value])
    }

    /// Like `new`, for callers that already guarantee shape and data agree.
    pub(crate) fn new_into(shape: &[usize], data: Vec<T>) -> Self {
        assert!(
            shape.size() == data.len(),
            "Shape size {} and data len {} must match.",
            shape.size(),
            data.len()
        );
        Self {
            buffer: Arc::new(Buffer { data }),
            strider: ShapeStrider::contiguous(shape),
        }
    }

    /// Return a new array with the same buffer as this one, but
    /// with a different strider. Assumes the new strider stays within the buffer.
    fn with_strider(&self, strider: ShapeStrider) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            strider,
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.strider.shape()
    }

    pub fn ndim(&self) -> usize {
        self.strider.ndims()
    }

    pub fn size(&self) -> usize {
        self.strider.size()
    }

    #[cfg(test)]
    pub(crate) fn strides(&self) -> &[isize] {
        self.strider.strides()
    }

    /// True if both arrays read from the same buffer.
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// The element at the given position.
    /// Panics if the index is out of bounds.
    pub fn get(&self, index: &[usize]) -> T {
        assert!(
            index.len() == self.ndim() && index.iter().zip(self.shape()).all(|(i, s)| i < s),
            "index {index:?} out of bounds for shape {:?}",
            self.shape()
        );
        self.buffer.data[self.strider.buffer_index(index)]
    }

    /// The elements in row-major order, copied out of the buffer.
    #[must_use]
    pub fn ravel(&self) -> Vec<T> {
        self.into_iter().collect()
    }

    /// Changes axes around according to the given permutation.
    /// Compare to numpy's `transpose`.
    #[must_use]
    pub fn permute(&self, permutation: &[usize]) -> Self {
        if let Err(msg) = self.strider.validate_can_permute(permutation) {
            panic!("{msg}");
        }
        self.with_strider(self.strider.permute(permutation))
    }

    pub(crate) fn slice_axis(&self, axis: usize, start: usize, step: isize, len: usize) -> Self {
        self.with_strider(self.strider.slice(axis, start, step, len))
    }

    pub(crate) fn index_axis(&self, axis: usize, i: usize) -> Self {
        self.with_strider(self.strider.index(axis, i))
    }

    /// A zero-copy view of self stretched to `shape`; see `ShapeStrider::broadcast`.
    /// Panics if an axis can't be stretched to its new length.
    pub(crate) fn broadcast(&self, map: &[Option<usize>], shape: &[usize]) -> Self {
        if let Err(msg) = self.strider.validate_can_broadcast(map, shape) {
            panic!("{msg}");
        }
        self.with_strider(self.strider.broadcast(map, shape))
    }

    /// Gather the Cartesian product of per-axis selections.
    /// `tables[axis]` lists the positions to take along that axis, or `None` to take the whole axis.
    /// Allocates only the result.
    pub(crate) fn take_outer(&self, tables: &[Option<&[usize]>]) -> Self {
        debug_assert_eq!(tables.len(), self.ndim());
        let shape: Vec<usize> = tables
            .iter()
            .zip(self.shape())
            .map(|(table, &size)| table.map_or(size, <[usize]>::len))
            .collect();
        let mut data = Vec::with_capacity(shape.size());
        let mut source = vec![0; shape.len()];
        for index in IndexIterator::new(&shape) {
            for (axis, &i) in index.iter().enumerate() {
                source[axis] = tables[axis].map_or(i, |t| t[i]);
            }
            data.push(self.buffer.data[self.strider.buffer_index(&source)]);
        }
        Self::new_into(&shape, data)
    }

    /// Gather element-by-element: result element `k` (in row-major order of `shape`)
    /// is self at position `[grids[0][k], grids[1][k], ...]`.
    pub(crate) fn take_pointwise(&self, grids: &[Vec<usize>], shape: &[usize]) -> Self {
        debug_assert_eq!(grids.len(), self.ndim());
        let size = shape.size();
        let mut data = Vec::with_capacity(size);
        let mut source = vec![0; grids.len()];
        for k in 0..size {
            for (axis, grid) in grids.iter().enumerate() {
                source[axis] = grid[k];
            }
            data.push(self.buffer.data[self.strider.buffer_index(&source)]);
        }
        Self::new_into(shape, data)
    }
}

impl<T: Copy + PartialEq> PartialEq for CpuArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.into_iter().eq(other.into_iter())
    }
}

pub struct CpuArrayIterator<'a, T> {
    array: &'a CpuArray<T>,
    index_iter: IndexIterator,
}

impl<'a, T: Copy> Iterator for CpuArrayIterator<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.index_iter
            .next()
            .map(|index| self.array.buffer.data[self.array.strider.buffer_index(&index)])
    }
}

impl<'a, T: Copy> IntoIterator for &'a CpuArray<T> {
    type Item = T;
    type IntoIter = CpuArrayIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        CpuArrayIterator {
            array: self,
            index_iter: self.strider.iter_index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vec(len: u16) -> Vec<f32> {
        (0..len).map(f32::from).collect()
    }

    #[test]
    fn test_new_checks_length() {
        assert!(CpuArray::new(&[2, 3], make_vec(6)).is_ok());
        assert_eq!(
            CpuArray::new(&[2, 3], make_vec(5)).unwrap_err(),
            IndexError::DataLength {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_ravel() {
        let t = CpuArray::new_into(&[2, 3, 4], make_vec(24));
        assert_eq!(t.ravel(), make_vec(24));
        assert_eq!(CpuArray::scalar(7).ravel(), vec![7]);
    }

    #[test]
    fn test_permute() {
        let t = CpuArray::new_into(&[2, 3], make_vec(6));
        let p = t.permute(&[1, 0]);
        assert_eq!(p.shape(), &[3, 2]);
        assert_eq!(p.strides(), &[1, 3]);
        assert_eq!(p.ravel(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        assert!(p.shares_buffer_with(&t));
        assert_eq!(p.permute(&[1, 0]).ravel(), t.ravel());
    }

    #[test]
    fn test_views_do_not_copy() {
        let t = CpuArray::new_into(&[4, 5], make_vec(20));
        let s = t.slice_axis(1, 4, -2, 3).index_axis(0, 2);
        assert!(s.shares_buffer_with(&t));
        assert_eq!(s.shape(), &[3]);
        assert_eq!(s.ravel(), vec![14.0, 12.0, 10.0]);
    }

    #[test]
    fn test_broadcast_view() {
        let t = CpuArray::new_into(&[1, 3], vec![1, 2, 3]);
        let b = t.broadcast(&[Some(0), Some(1)], &[2, 3]);
        assert_eq!(b.ravel(), vec![1, 2, 3, 1, 2, 3]);
        assert_eq!(b.strides(), &[0, 1]);
        assert!(b.shares_buffer_with(&t));
    }

    #[test]
    #[should_panic(expected = "Cannot broadcast")]
    fn test_broadcast_rejects_mismatch() {
        let t = CpuArray::new_into(&[2], vec![1, 2]);
        let _ = t.broadcast(&[Some(0)], &[3]);
    }

    #[test]
    fn test_take_outer() {
        let t = CpuArray::new_into(&[3, 4], (0..12).collect());
        let rows = [2, 0];
        let cols = [3, 3, 1];
        let r = t.take_outer(&[Some(&rows[..]), Some(&cols[..])]);
        assert_eq!(r.shape(), &[2, 3]);
        assert_eq!(r.ravel(), vec![11, 11, 9, 3, 3, 1]);

        let r = t.take_outer(&[Some(&rows[..]), None]);
        assert_eq!(r.ravel(), vec![8, 9, 10, 11, 0, 1, 2, 3]);
    }

    #[test]
    fn test_take_pointwise() {
        let t = CpuArray::new_into(&[3, 4], (0..12).collect());
        let r = t.take_pointwise(&[vec![0, 1, 2], vec![3, 2, 1]], &[3]);
        assert_eq!(r.ravel(), vec![3, 6, 9]);
    }

    #[test]
    fn test_eq_compares_elements() {
        let t = CpuArray::new_into(&[2, 2], vec![1, 2, 3, 4]);
        let p = CpuArray::new_into(&[2, 2], vec![1, 3, 2, 4]);
        assert_eq!(p, t.permute(&[1, 0]));
        assert!(!p.shares_buffer_with(&t));
        assert_ne!(t, p);
        assert_ne!(t, CpuArray::new_into(&[4], vec![1, 2, 3, 4]));
    }
}
