//! Deciding how to read a selection: basic, outer or vectorized indexing.
//!
//! A key is first resolved against the target's shape (negative positions, slice bounds,
//! boolean masks), then classified. Only positions and slices give a basic indexer.
//! Unlabeled arrays and one-dimensional labeled arrays that each introduce a distinct
//! dimension give an outer indexer. Everything else broadcasts the array operands
//! against each other and gives a vectorized indexer.
//!
//! Labeled operands whose leading axis has length 1 get that axis dropped before
//! classification. That axis selects nothing, but left in place it turns an orthogonal
//! selection into a vectorized one whose index grids span the whole result.

use crate::broadcast::{broadcast_dims, Broadcast};
use crate::cpu_array::CpuArray;
use crate::error::{IndexError, Result};
use crate::indexer::{
    BasicEntry, BasicIndexer, Indexer, IndexerKind, OuterEntry, OuterIndexer, VectorizedEntry,
    VectorizedIndexer,
};
use crate::indexing::{IndexKey, Key, SliceRange, SliceSpec};

/// Knobs for indexer classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexOptions {
    /// Drop a length-1 leading axis from multidimensional labeled indexers, so that
    /// they can be applied as outer indexers. Turn off to always index such keys
    /// with a vectorized indexer.
    pub collapse_leading_singleton: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            collapse_leading_singleton: true,
        }
    }
}

/// The outcome of classifying a key against an array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified {
    /// Dimension names of the result.
    pub dims: Vec<String>,
    pub indexer: Indexer,
    /// Axis permutation to apply to the indexer's output to get `dims` order.
    /// `None` if the output is already in that order.
    pub permutation: Option<Vec<usize>>,
}

/// A key entry checked and normalized against its axis.
#[derive(Clone, Debug)]
enum Resolved {
    Int(usize),
    Slice(SliceRange),
    /// An unlabeled array; keeps the name of the axis it indexes.
    Positional(Vec<usize>),
    Labeled {
        dims: Vec<String>,
        data: CpuArray<usize>,
    },
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn normalize(index: i64, size: usize, dim: &str) -> Result<usize> {
    let size_i = size as i64;
    let i = if index < 0 { index + size_i } else { index };
    if i < 0 || i >= size_i {
        return Err(IndexError::OutOfBounds {
            dim: dim.to_string(),
            index,
            size,
        });
    }
    Ok(i as usize)
}

fn resolve(entry: &IndexKey, dim: &str, size: usize) -> Result<Resolved> {
    Ok(match entry {
        IndexKey::Int(i) => Resolved::Int(normalize(*i, size, dim)?),
        IndexKey::Slice(s) => Resolved::Slice(s.resolve(size).ok_or_else(|| {
            IndexError::ZeroStep {
                dim: dim.to_string(),
            }
        })?),
        IndexKey::Ints(v) => Resolved::Positional(
            v.iter()
                .map(|&i| normalize(i, size, dim))
                .collect::<Result<_>>()?,
        ),
        IndexKey::Bools(mask) => {
            if mask.len() != size {
                return Err(IndexError::BooleanLength {
                    dim: dim.to_string(),
                    len: mask.len(),
                    size,
                });
            }
            Resolved::Positional(
                mask.iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect(),
            )
        }
        IndexKey::Labeled(var) if var.ndim() == 0 => {
            Resolved::Int(normalize(var.data().get(&[]), size, dim)?)
        }
        IndexKey::Labeled(var) => {
            let positions = var
                .data()
                .into_iter()
                .map(|i| normalize(i, size, dim))
                .collect::<Result<Vec<_>>>()?;
            Resolved::Labeled {
                dims: var.dims().to_vec(),
                data: CpuArray::new_into(var.shape(), positions),
            }
        }
    })
}

/// A labeled indexer may not name a dimension that the target keeps as a slice.
fn check_ambiguity<S: AsRef<str>>(resolved: &[Resolved], target_dims: &[S]) -> Result<()> {
    for (axis, entry) in resolved.iter().enumerate() {
        let Resolved::Labeled { dims, .. } = entry else {
            continue;
        };
        for dim in dims {
            let kept_elsewhere = target_dims
                .iter()
                .zip(resolved)
                .enumerate()
                .any(|(other, (name, r))| {
                    other != axis && name.as_ref() == dim.as_str() && matches!(r, Resolved::Slice(_))
                });
            if kept_elsewhere {
                return Err(IndexError::DimensionAmbiguity {
                    dim: dim.clone(),
                    indexed: target_dims[axis].as_ref().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Drop leading length-1 axes from the labeled operands, as long as they all share
/// the same dimensions and stay at least one-dimensional.
fn collapse_leading_singletons(resolved: &mut [Resolved]) {
    loop {
        let mut labeled = resolved.iter().filter_map(|r| match r {
            Resolved::Labeled { dims, data } => Some((dims, data)),
            _ => None,
        });
        let Some((first_dims, _)) = labeled.next() else {
            return;
        };
        let first_dims = first_dims.clone();
        let collapsible = first_dims.len() > 1
            && resolved.iter().all(|r| match r {
                Resolved::Labeled { dims, data } => *dims == first_dims && data.shape()[0] == 1,
                _ => true,
            });
        if !collapsible {
            return;
        }
        log::debug!(
            "dropping length-1 leading dimension {:?} from labeled indexer with dims {first_dims:?}",
            first_dims[0]
        );
        for r in resolved.iter_mut() {
            if let Resolved::Labeled { dims, data } = r {
                dims.remove(0);
                *data = data.index_axis(0, 0);
            }
        }
    }
}

/// `None` if any entry needs more than a view.
fn classify_basic<S: AsRef<str>>(resolved: &[Resolved], target_dims: &[S]) -> Option<Classified> {
    let mut dims = Vec::new();
    let mut entries = Vec::with_capacity(resolved.len());
    for (entry, name) in resolved.iter().zip(target_dims) {
        match entry {
            Resolved::Int(i) => entries.push(BasicEntry::Int(*i)),
            Resolved::Slice(r) => {
                dims.push(name.as_ref().to_string());
                entries.push(BasicEntry::Slice(*r));
            }
            Resolved::Positional(_) | Resolved::Labeled { .. } => return None,
        }
    }
    Some(Classified {
        dims,
        indexer: Indexer::Basic(BasicIndexer { entries }),
        permutation: None,
    })
}

/// The dimensions an outer indexer would produce, or `None` if the key can't be
/// applied orthogonally: a labeled operand is multidimensional, or two entries would
/// produce the same dimension and so have to move together.
fn outer_dims<S: AsRef<str>>(resolved: &[Resolved], target_dims: &[S]) -> Option<Vec<String>> {
    let mut dims: Vec<String> = Vec::new();
    for (entry, name) in resolved.iter().zip(target_dims) {
        let dim = match entry {
            Resolved::Int(_) => continue,
            Resolved::Slice(_) | Resolved::Positional(_) => name.as_ref(),
            Resolved::Labeled { dims: names, .. } if names.len() == 1 => names[0].as_str(),
            Resolved::Labeled { .. } => return None,
        };
        if dims.iter().any(|d| d == dim) {
            return None;
        }
        dims.push(dim.to_string());
    }
    Some(dims)
}

fn classify_outer(resolved: Vec<Resolved>, dims: Vec<String>) -> Classified {
    let entries = resolved
        .into_iter()
        .map(|entry| match entry {
            Resolved::Int(i) => OuterEntry::Int(i),
            Resolved::Slice(r) => OuterEntry::Slice(r),
            Resolved::Positional(positions) => OuterEntry::Array(positions),
            Resolved::Labeled { data, .. } => OuterEntry::Array(data.ravel()),
        })
        .collect();
    Classified {
        dims,
        indexer: Indexer::Outer(OuterIndexer { entries }),
        permutation: None,
    }
}

/// Expand an operand to the broadcast shape, materializing it.
/// `map` comes from `broadcast_dims`, which has already checked every length.
fn expand(data: &CpuArray<usize>, map: &[Option<usize>], b: &Broadcast) -> Vec<usize> {
    data.broadcast(map, &b.shape).ravel()
}

fn classify_vectorized<S: AsRef<str>>(
    resolved: Vec<Resolved>,
    target_dims: &[S],
) -> Result<Classified> {
    let mut operands: Vec<(Vec<String>, CpuArray<usize>)> = Vec::new();
    let mut entries = Vec::with_capacity(resolved.len());
    let mut out_dims: Vec<String> = Vec::new();
    let mut sliced_dims: Vec<String> = Vec::new();
    for (entry, name) in resolved.into_iter().zip(target_dims) {
        let name = name.as_ref().to_string();
        let (dims, data) = match entry {
            Resolved::Slice(r) => {
                entries.push(VectorizedEntry::Slice(r));
                out_dims.push(name.clone());
                sliced_dims.push(name);
                continue;
            }
            Resolved::Int(i) => (vec![], CpuArray::scalar(i)),
            Resolved::Positional(positions) => {
                let len = positions.len();
                (vec![name], CpuArray::new_into(&[len], positions))
            }
            Resolved::Labeled { dims, data } => (dims, data),
        };
        for d in &dims {
            if !out_dims.contains(d) {
                out_dims.push(d.clone());
            }
        }
        entries.push(VectorizedEntry::Array(operands.len()));
        operands.push((dims, data));
    }

    let shapes: Vec<(&[String], &[usize])> = operands
        .iter()
        .map(|(dims, data)| (dims.as_slice(), data.shape()))
        .collect();
    let b = broadcast_dims(&shapes)?;
    let expanded: Vec<Vec<usize>> = operands
        .iter()
        .zip(&b.maps)
        .map(|((_, data), map)| expand(data, map, &b))
        .collect();

    // the gather lays out broadcast dims first, then the sliced dims
    let natural: Vec<&String> = b.dims.iter().chain(&sliced_dims).collect();
    // out_dims and natural name the same dims: operand dims were unioned into both,
    // and check_ambiguity keeps them apart from the sliced dims
    let permutation: Vec<usize> = out_dims
        .iter()
        .filter_map(|d| natural.iter().position(|n| *n == d))
        .collect();
    debug_assert_eq!(permutation.len(), natural.len());
    let is_identity = permutation.iter().enumerate().all(|(i, &p)| i == p);

    Ok(Classified {
        dims: out_dims,
        indexer: Indexer::Vectorized(VectorizedIndexer {
            entries,
            dims: b.dims,
            shape: b.shape,
            operands: expanded,
        }),
        permutation: (!is_identity).then_some(permutation),
    })
}

/// Classify `key` against an array with the given dimension names and shape.
///
/// Returns the result's dimension names, the indexer that reads the selection,
/// and the permutation (if any) that puts the indexer's output into result order.
///
/// An axis indexed by a labeled array is replaced by that array's dimensions, under
/// the array's names. So a `["window", "x"]` indexer on axis `x` gives a result that
/// has an `x` dimension again, of the indexer's length, and no `window` once the
/// length-1 `window` axis is collapsed.
///
/// # Errors
/// - [`IndexError::KeyLength`] if the key has more entries than the array has dimensions.
/// - [`IndexError::OutOfBounds`], [`IndexError::BooleanLength`], [`IndexError::ZeroStep`]
///   if an entry doesn't fit its axis.
/// - [`IndexError::DimensionAmbiguity`] if a labeled indexer names a dimension that is kept unindexed.
/// - [`IndexError::BroadcastShape`] if array operands can't be broadcast together.
pub fn classify<S: AsRef<str>>(
    key: &Key,
    target_dims: &[S],
    target_shape: &[usize],
    options: &IndexOptions,
) -> Result<Classified> {
    debug_assert_eq!(target_dims.len(), target_shape.len());
    let ndim = target_dims.len();
    if key.len() > ndim {
        return Err(IndexError::KeyLength {
            ndim,
            len: key.len(),
        });
    }
    let full = IndexKey::Slice(SliceSpec::full());
    let mut resolved = key
        .entries()
        .iter()
        .chain(std::iter::repeat(&full))
        .zip(target_dims.iter().zip(target_shape))
        .map(|(entry, (dim, &size))| resolve(entry, dim.as_ref(), size))
        .collect::<Result<Vec<_>>>()?;
    check_ambiguity(&resolved, target_dims)?;

    let classified = if let Some(basic) = classify_basic(&resolved, target_dims) {
        basic
    } else {
        if options.collapse_leading_singleton {
            collapse_leading_singletons(&mut resolved);
        }
        match outer_dims(&resolved, target_dims) {
            Some(dims) => classify_outer(resolved, dims),
            None => classify_vectorized(resolved, target_dims)?,
        }
    };
    log::debug!(
        "{:?} indexer for dims {:?}, result dims {:?}",
        classified.indexer.kind(),
        target_dims.iter().map(|d| d.as_ref()).collect::<Vec<&str>>(),
        classified.dims
    );
    if classified.indexer.kind() == IndexerKind::Vectorized {
        log::trace!(
            "vectorized index footprint: {} positions",
            classified.indexer.index_footprint()
        );
    }
    Ok(classified)
}
