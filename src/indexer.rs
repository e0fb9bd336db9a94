//! The three ways of reading a selection out of an array.
//!
//! Each indexer has one entry per axis of the array it was built for, already resolved
//! against that array's shape: every position is in bounds and every slice is concrete.
//! They differ in what they cost to apply:
//!
//! - [`BasicIndexer`] only fixes positions and slices, and is applied as a view without copying.
//! - [`OuterIndexer`] selects a list of positions independently along each axis.
//!   The result is the Cartesian product, gathered directly into the output buffer.
//! - [`VectorizedIndexer`] moves several axes together through broadcast index arrays.
//!   Those arrays are materialized at the full broadcast shape, and applying the indexer
//!   builds one index grid per axis over the whole result.

use crate::cpu_array::CpuArray;
use crate::indexing::SliceRange;
use crate::shape::Shape;
use crate::shape_strider::IndexIterator;

/// Which of the three indexing strategies an [`Indexer`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexerKind {
    Basic,
    Outer,
    Vectorized,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BasicEntry {
    Int(usize),
    Slice(SliceRange),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicIndexer {
    pub entries: Vec<BasicEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OuterEntry {
    Int(usize),
    Slice(SliceRange),
    Array(Vec<usize>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OuterIndexer {
    pub entries: Vec<OuterEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VectorizedEntry {
    Slice(SliceRange),
    /// Reads positions from the operand with this number.
    Array(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorizedIndexer {
    pub entries: Vec<VectorizedEntry>,
    /// Dimension names of the broadcast operands.
    pub dims: Vec<String>,
    /// Broadcast shape of the operands.
    pub shape: Vec<usize>,
    /// Each operand expanded to `shape`, in row-major order.
    pub operands: Vec<Vec<usize>>,
}

/// A fully resolved selection, ready to be applied to an array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Indexer {
    Basic(BasicIndexer),
    Outer(OuterIndexer),
    Vectorized(VectorizedIndexer),
}

/// Apply the single positions and slices of an indexer as a view.
/// Returns the view and, for each axis it keeps, whether that axis still needs a gather.
fn apply_views<'a, T: Copy>(
    array: &CpuArray<T>,
    entries: impl Iterator<Item = (Option<usize>, Option<SliceRange>, Option<&'a [usize]>)>,
) -> (CpuArray<T>, Vec<Option<&'a [usize]>>) {
    let mut view = array.clone();
    let mut tables = Vec::new();
    let entries: Vec<_> = entries.collect();
    // back to front, so that dropping an axis doesn't shift the ones still to visit
    for (axis, (int, slice, table)) in entries.into_iter().enumerate().rev() {
        if let Some(i) = int {
            view = view.index_axis(axis, i);
            continue;
        }
        if let Some(r) = slice {
            if r != SliceRange::full(view.shape()[axis]) {
                view = view.slice_axis(axis, r.start, r.step, r.len);
            }
        }
        tables.push(table);
    }
    tables.reverse();
    (view, tables)
}

impl BasicIndexer {
    /// Applied as a view on the array's buffer.
    #[must_use]
    pub fn apply<T: Copy>(&self, array: &CpuArray<T>) -> CpuArray<T> {
        let (view, _) = apply_views(
            array,
            self.entries.iter().map(|e| match e {
                BasicEntry::Int(i) => (Some(*i), None, None),
                BasicEntry::Slice(r) => (None, Some(*r), None),
            }),
        );
        view
    }
}

impl OuterIndexer {
    /// Positions and slices are applied as views, then the arrays are gathered in one pass.
    #[must_use]
    pub fn apply<T: Copy>(&self, array: &CpuArray<T>) -> CpuArray<T> {
        let (view, tables) = apply_views(
            array,
            self.entries.iter().map(|e| match e {
                OuterEntry::Int(i) => (Some(*i), None, None),
                OuterEntry::Slice(r) => (None, Some(*r), None),
                OuterEntry::Array(positions) => (None, None, Some(positions.as_slice())),
            }),
        );
        if tables.iter().all(Option::is_none) {
            return view;
        }
        view.take_outer(&tables)
    }
}

impl VectorizedIndexer {
    /// Shape of the result before any permutation: the broadcast axes first,
    /// then the sliced axes in their original order.
    #[must_use]
    pub fn result_shape(&self) -> Vec<usize> {
        let mut shape = self.shape.clone();
        shape.extend(self.entries.iter().filter_map(|e| match e {
            VectorizedEntry::Slice(r) => Some(r.len),
            VectorizedEntry::Array(_) => None,
        }));
        shape
    }

    /// Arrayize every entry to a grid over the whole result, then gather point by point.
    #[must_use]
    pub fn apply<T: Copy>(&self, array: &CpuArray<T>) -> CpuArray<T> {
        let shape = self.result_shape();
        let size = shape.size();
        let nbroadcast = self.shape.len();
        let sliced_size: usize = shape[nbroadcast..].iter().product();
        let mut grids: Vec<Vec<usize>> = (0..self.entries.len())
            .map(|_| Vec::with_capacity(size))
            .collect();
        for (k, index) in IndexIterator::new(&shape).enumerate() {
            let operand_k = k / sliced_size.max(1);
            let mut sliced = index[nbroadcast..].iter();
            for (grid, entry) in grids.iter_mut().zip(&self.entries) {
                grid.push(match entry {
                    VectorizedEntry::Array(o) => self.operands[*o][operand_k],
                    VectorizedEntry::Slice(r) => r.position(*sliced.next().unwrap_or(&0)),
                });
            }
        }
        log::trace!(
            "vectorized gather of {size} elements through {} index grids",
            grids.len()
        );
        array.take_pointwise(&grids, &shape)
    }
}

impl Indexer {
    #[must_use]
    pub fn kind(&self) -> IndexerKind {
        match self {
            Indexer::Basic(_) => IndexerKind::Basic,
            Indexer::Outer(_) => IndexerKind::Outer,
            Indexer::Vectorized(_) => IndexerKind::Vectorized,
        }
    }

    /// Read the selection out of `array`. Basic indexers return a view; the others copy.
    /// Vectorized results come in their natural layout; see [`VectorizedIndexer::result_shape`].
    #[must_use]
    pub fn apply<T: Copy>(&self, array: &CpuArray<T>) -> CpuArray<T> {
        match self {
            Indexer::Basic(b) => b.apply(array),
            Indexer::Outer(o) => o.apply(array),
            Indexer::Vectorized(v) => v.apply(array),
        }
    }

    /// Number of index positions this indexer holds or builds while being applied.
    /// This is the memory that indexing needs on top of the result itself.
    #[must_use]
    pub fn index_footprint(&self) -> usize {
        match self {
            Indexer::Basic(_) => 0,
            Indexer::Outer(o) => o
                .entries
                .iter()
                .map(|e| match e {
                    OuterEntry::Array(positions) => positions.len(),
                    OuterEntry::Int(_) | OuterEntry::Slice(_) => 0,
                })
                .sum(),
            Indexer::Vectorized(v) => {
                v.operands.iter().map(Vec::len).sum::<usize>()
                    + v.result_shape().size() * v.entries.len()
            }
        }
    }
}
