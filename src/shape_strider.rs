use crate::shape::Shape;

impl Shape for ShapeStrider {
    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

/// A struct that encapsulates how array indexes map to buffer offsets.
/// To figure out the mapping, it uses a shape and a set of strides.
/// The strides indicate how many elements to skip in the buffer to reach the next element along each dimension.
/// Strides may be negative (a reversed view) or zero (a broadcast view).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeStrider {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
}

#[allow(clippy::cast_possible_wrap)]
fn signed(x: usize) -> isize {
    x as isize
}

impl ShapeStrider {
    /// Create a new strider with no dimensions, i.e. for a scalar.
    pub(crate) fn empty() -> Self {
        Self {
            shape: vec![],
            strides: vec![],
            offset: 0,
        }
    }

    /// Create a new strider with the given shape,
    /// striding through a contiguous buffer in row-major order.
    pub(crate) fn contiguous(shape: &[usize]) -> Self {
        if shape.is_empty() {
            return Self::empty();
        }
        let shape = shape.to_vec();
        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len() - 1).rev() {
            strides[i] = strides[i + 1] * signed(shape[i + 1].max(1));
        }
        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Precondition: every component of index is within the shape.
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn buffer_index(&self, index: &[usize]) -> usize {
        let delta = index
            .iter()
            .zip(self.strides.iter())
            .map(|(&i, &st)| signed(i) * st)
            .sum::<isize>();
        (signed(self.offset) + delta) as usize
    }

    /// Iterate over array indexes, in increasing row-major order.
    pub(crate) fn iter_index(&self) -> IndexIterator {
        IndexIterator::new(&self.shape)
    }

    pub(crate) fn validate_can_permute(&self, permutation: &[usize]) -> Result<(), String> {
        if permutation.len() != self.shape.ndims() {
            return Err(format!(
                "Invalid permutation {permutation:?}: expected {} axes.",
                self.shape.ndims()
            ));
        }
        let mut seen = vec![false; permutation.len()];
        for &axis in permutation {
            if axis >= seen.len() || seen[axis] {
                return Err(format!(
                    "Invalid permutation {permutation:?}: all axes must be specified exactly once."
                ));
            }
            seen[axis] = true;
        }
        Ok(())
    }

    /// Apply the given axis permutation: axis `i` of the result is axis `permutation[i]` of self.
    pub(crate) fn permute(&self, permutation: &[usize]) -> Self {
        let mut shape = Vec::with_capacity(self.shape.ndims());
        let mut strides = Vec::with_capacity(self.shape.ndims());
        for &i in permutation {
            shape.push(self.shape[i]);
            strides.push(self.strides[i]);
        }
        Self {
            shape,
            strides,
            offset: self.offset,
        }
    }

    pub(crate) fn validate_can_broadcast(
        &self,
        map: &[Option<usize>],
        shape: &[usize],
    ) -> Result<(), String> {
        if map.len() != shape.len() {
            return Err(format!(
                "Cannot broadcast shape {:?} with axis map {map:?} to shape {shape:?}",
                self.shape
            ));
        }
        for (&from, &to_size) in map.iter().zip(shape) {
            if let Some(axis) = from {
                if axis >= self.shape.len() {
                    return Err(format!(
                        "Cannot broadcast from axis {axis} of shape {:?}",
                        self.shape
                    ));
                }
                if self.shape[axis] != to_size && self.shape[axis] != 1 {
                    return Err(format!(
                        "Cannot broadcast axis {axis} of length {} to length {to_size}",
                        self.shape[axis]
                    ));
                }
            }
        }
        Ok(())
    }

    /// Broadcast to `shape`. Axis `k` of the result reads from axis `map[k]` of self,
    /// or is a stretched axis with stride zero when `map[k]` is `None` or self has length 1 there.
    pub(crate) fn broadcast(&self, map: &[Option<usize>], shape: &[usize]) -> Self {
        let strides = map
            .iter()
            .zip(shape)
            .map(|(&from, &to_size)| match from {
                Some(axis) if self.shape[axis] == to_size => self.strides[axis],
                _ => 0,
            })
            .collect();
        Self {
            shape: shape.to_vec(),
            strides,
            offset: self.offset,
        }
    }

    /// Select every `step`-th element along `axis`, starting at `start`, keeping `len` of them.
    /// Precondition: all selected positions are within the axis.
    pub(crate) fn slice(&self, axis: usize, start: usize, step: isize, len: usize) -> Self {
        let mut result = self.clone();
        if len > 0 {
            result.offset = self.offset_along(axis, start);
        }
        result.strides[axis] = self.strides[axis] * step;
        result.shape[axis] = len;
        result
    }

    /// Fix `axis` at position `i`, removing it.
    pub(crate) fn index(&self, axis: usize, i: usize) -> Self {
        let offset = self.offset_along(axis, i);
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.remove(axis);
        strides.remove(axis);
        Self {
            shape,
            strides,
            offset,
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn offset_along(&self, axis: usize, i: usize) -> usize {
        (signed(self.offset) + signed(i) * self.strides[axis]) as usize
    }
}

/// Iterates over all indexes of a shape in row-major order.
/// A shape without dimensions has exactly one (empty) index, a shape with a zero-length axis has none.
pub(crate) struct IndexIterator {
    shape: Vec<usize>,
    index: Vec<usize>,
    exhausted: bool,
}

impl IndexIterator {
    pub(crate) fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            index: vec![0; shape.len()],
            exhausted: shape.iter().any(|&s| s == 0),
        }
    }
}

impl Iterator for IndexIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let result = self.index.clone();
        // odometer increment; running off the front means we're done
        let mut carry = true;
        for i in (0..self.shape.len()).rev() {
            self.index[i] += 1;
            if self.index[i] < self.shape[i] {
                carry = false;
                break;
            }
            self.index[i] = 0;
        }
        self.exhausted = carry;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous() {
        let s = ShapeStrider::contiguous(&[2, 3, 4]);
        assert_eq!(s.strides(), &[12, 4, 1]);
        assert_eq!(s.buffer_index(&[1, 2, 3]), 23);
    }

    #[test]
    fn test_iter_index() {
        let all: Vec<_> = ShapeStrider::contiguous(&[2, 2]).iter_index().collect();
        assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);

        let scalar: Vec<_> = ShapeStrider::empty().iter_index().collect();
        assert_eq!(scalar, vec![Vec::<usize>::new()]);

        assert_eq!(ShapeStrider::contiguous(&[3, 0]).iter_index().count(), 0);
    }

    #[test]
    fn test_slice_with_negative_step() {
        // [0 1 2 3 4 5], take 5, 3, 1
        let s = ShapeStrider::contiguous(&[6]).slice(0, 5, -2, 3);
        let offsets: Vec<_> = s.iter_index().map(|i| s.buffer_index(&i)).collect();
        assert_eq!(offsets, vec![5, 3, 1]);
        assert_eq!(s.strides(), &[-2]);
    }

    #[test]
    fn test_index_removes_axis() {
        let s = ShapeStrider::contiguous(&[2, 3, 4]).index(1, 2);
        assert_eq!(s.shape(), &[2, 4]);
        assert_eq!(s.buffer_index(&[0, 0]), 8);
        assert_eq!(s.buffer_index(&[1, 3]), 23);
    }

    #[test]
    fn test_permute() {
        let s = ShapeStrider::contiguous(&[2, 3, 4]);
        assert!(s.validate_can_permute(&[2, 0, 1]).is_ok());
        assert!(s.validate_can_permute(&[0, 0, 1]).is_err());
        assert!(s.validate_can_permute(&[0, 1]).is_err());
        let p = s.permute(&[2, 0, 1]);
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
    }

    #[test]
    fn test_broadcast() {
        let s = ShapeStrider::contiguous(&[1, 3]);
        assert!(s.validate_can_broadcast(&[Some(0), None, Some(1)], &[4, 2, 3]).is_ok());
        let b = s.broadcast(&[Some(0), None, Some(1)], &[4, 2, 3]);
        assert_eq!(b.shape(), &[4, 2, 3]);
        assert_eq!(b.strides(), &[0, 0, 1]);
        assert!(s.validate_can_broadcast(&[Some(1)], &[5]).is_err());
        assert!(s.validate_can_broadcast(&[Some(0)], &[5, 1]).is_err());
        assert!(s.validate_can_broadcast(&[Some(2)], &[1]).is_err());
    }
}
