use crate::classify::{classify, Classified, IndexOptions};
use crate::cpu_array::CpuArray;
use crate::error::{IndexError, Result};
use crate::indexing::{IndexKey, Key, SliceSpec};

/// An n-dimensional array with a name for each dimension.
///
/// Dimension names are unique within a variable. They are how `isel` addresses axes,
/// and when a `Variable<i64>` is itself used as an index, its names become the
/// dimensions of the result.
#[derive(Debug, Clone)]
#[must_use]
pub struct Variable<T> {
    dims: Vec<String>,
    data: CpuArray<T>,
}

impl<T: Copy> Variable<T> {
    /// Create a new variable with the given dimension names, shape and elements.
    /// The order of the elements is in increasing order of the last axis, then the second last, etc.
    ///
    /// # Errors
    /// If the number of names or elements doesn't fit the shape, or a name repeats.
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        shape: &[usize],
        data: Vec<T>,
    ) -> Result<Self> {
        Self::from_array(dims, CpuArray::new(shape, data)?)
    }

    /// Name the axes of an existing array.
    ///
    /// # Errors
    /// If the number of names doesn't match the array's dimensions, or a name repeats.
    pub fn from_array<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        data: CpuArray<T>,
    ) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(IndexError::DimsMismatch {
                dims: dims.len(),
                ndim: data.ndim(),
            });
        }
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].contains(dim) {
                return Err(IndexError::DuplicateDim(dim.clone()));
            }
        }
        Ok(Self { dims, data })
    }

    /// A variable without dimensions.
    pub fn scalar(value: T) -> Self {
        Self {
            dims: vec![],
            data: CpuArray::scalar(value),
        }
    }

    #[must_use]
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// Each dimension name with its length.
    #[must_use]
    pub fn sizes(&self) -> Vec<(&str, usize)> {
        self.dims
            .iter()
            .map(String::as_str)
            .zip(self.shape().iter().copied())
            .collect()
    }

    /// Position of the named dimension.
    #[must_use]
    pub fn axis_num(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    #[must_use]
    pub fn data(&self) -> &CpuArray<T> {
        &self.data
    }

    /// Return the elements as a Vec.
    /// The order of the elements is in increasing order of the last axis, then the second last, etc.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.data.ravel()
    }

    /// Work out how `key` would be applied: the result's dimensions, the indexer,
    /// and the axis permutation to apply after it, if any.
    ///
    /// # Errors
    /// See [`classify`].
    pub fn broadcast_indexes(&self, key: &Key) -> Result<Classified> {
        self.broadcast_indexes_with(key, &IndexOptions::default())
    }

    /// Like [`Variable::broadcast_indexes`], with explicit options.
    ///
    /// # Errors
    /// See [`classify`].
    pub fn broadcast_indexes_with(&self, key: &Key, options: &IndexOptions) -> Result<Classified> {
        classify(key, &self.dims, self.shape(), options)
    }

    /// Select by position, one key entry per dimension in order.
    /// Missing trailing entries select the whole dimension.
    /// Positions and slices alone give a view on the same buffer.
    ///
    /// # Errors
    /// See [`classify`].
    pub fn at(&self, key: &Key) -> Result<Self> {
        self.at_with(key, &IndexOptions::default())
    }

    /// Like [`Variable::at`], with explicit options.
    ///
    /// # Errors
    /// See [`classify`].
    pub fn at_with(&self, key: &Key, options: &IndexOptions) -> Result<Self> {
        let Classified {
            dims,
            indexer,
            permutation,
        } = self.broadcast_indexes_with(key, options)?;
        let mut data = indexer.apply(&self.data);
        if let Some(permutation) = permutation {
            data = data.permute(&permutation);
        }
        Ok(Self { dims, data })
    }

    /// Select by position along named dimensions. Unnamed dimensions are kept whole.
    ///
    /// # Errors
    /// [`IndexError::MissingDims`] for names that aren't dimensions of self, otherwise see [`classify`].
    pub fn isel<S: AsRef<str>>(&self, selection: impl IntoIterator<Item = (S, IndexKey)>) -> Result<Self> {
        self.isel_with(selection, &IndexOptions::default())
    }

    /// Like [`Variable::isel`], with explicit options.
    ///
    /// # Errors
    /// [`IndexError::MissingDims`] for names that aren't dimensions of self, otherwise see [`classify`].
    pub fn isel_with<S: AsRef<str>>(
        &self,
        selection: impl IntoIterator<Item = (S, IndexKey)>,
        options: &IndexOptions,
    ) -> Result<Self> {
        let mut entries = vec![IndexKey::Slice(SliceSpec::full()); self.ndim()];
        let mut missing = Vec::new();
        for (dim, index) in selection {
            match self.axis_num(dim.as_ref()) {
                Some(axis) => entries[axis] = index,
                None => missing.push(dim.as_ref().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(IndexError::MissingDims(missing));
        }
        self.at_with(&Key::from(entries), options)
    }

    /// Select by position along a single named dimension.
    ///
    /// # Errors
    /// See [`Variable::isel`].
    pub fn isel1(&self, dim: &str, index: impl Into<IndexKey>) -> Result<Self> {
        self.isel([(dim, index.into())])
    }
}

impl<T: Copy + PartialEq> PartialEq for Variable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.data == other.data
    }
}
