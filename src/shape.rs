/// A trait for types that can be used as shapes for arrays,
/// with some convenience methods for working with shapes.
pub trait Shape {
    /// Returns the shape as a slice.
    fn shape(&self) -> &[usize];

    /// Returns the number of dimensions.
    fn ndims(&self) -> usize {
        self.shape().len()
    }

    /// Returns the total number of elements.
    /// A shape without dimensions describes a single scalar element.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }
}

impl Shape for &[usize] {
    fn shape(&self) -> &[usize] {
        self
    }
}

impl Shape for Vec<usize> {
    fn shape(&self) -> &[usize] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(vec![2, 3, 4].size(), 24);
        assert_eq!(vec![5, 0].size(), 0);
        assert_eq!(Vec::<usize>::new().size(), 1);
        assert_eq!((&[1usize, 7][..]).ndims(), 2);
    }
}
