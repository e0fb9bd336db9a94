use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::variable::Variable;

/// A slice along one axis, with the same conventions as Python's `start:stop:step`:
/// negative positions count from the end, out-of-range bounds are clamped,
/// a negative step walks backwards and `None` means "from the natural end".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

/// A slice resolved against a concrete axis length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceRange {
    pub start: usize,
    pub step: isize,
    pub len: usize,
}

impl SliceRange {
    /// The full axis, in order.
    #[must_use]
    pub const fn full(len: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            len,
        }
    }

    /// Position along the original axis of the `i`th selected element.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    #[must_use]
    pub fn position(&self, i: usize) -> usize {
        (self.start as isize + self.step * i as isize) as usize
    }
}

impl SliceSpec {
    /// Everything along the axis, i.e. `:`.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            start: None,
            stop: None,
            step: None,
        }
    }

    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    #[must_use]
    pub const fn with_step(self, step: i64) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }

    /// Resolve against an axis of length `size`. Returns `None` if the step is zero.
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn resolve(&self, size: usize) -> Option<SliceRange> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return None;
        }
        let size = size as i64;
        let (lower, upper) = if step > 0 { (0, size) } else { (-1, size - 1) };
        let clamp = |bound: Option<i64>, default: i64| match bound {
            None => default,
            Some(b) => {
                let b = if b < 0 { b + size } else { b };
                b.clamp(lower, upper)
            }
        };
        let (start, stop) = if step > 0 {
            (clamp(self.start, lower), clamp(self.stop, upper))
        } else {
            (clamp(self.start, upper), clamp(self.stop, lower))
        };
        // the span is at most the axis length, so none of this can overflow
        let span = if step > 0 { stop - start } else { start - stop };
        let len = if span > 0 {
            (span.unsigned_abs() - 1) / step.unsigned_abs() + 1
        } else {
            0
        };
        Some(SliceRange {
            // an empty selection may have start just outside the axis; it is never read
            start: if len == 0 { 0 } else { start as usize },
            // with at most one element the step is never taken, and a step longer
            // than the axis would overflow once multiplied into a stride
            step: if len <= 1 { step.signum() as isize } else { step as isize },
            len: len as usize,
        })
    }
}

impl From<Range<i64>> for SliceSpec {
    fn from(r: Range<i64>) -> Self {
        Self::new(Some(r.start), Some(r.end), None)
    }
}

impl From<RangeFrom<i64>> for SliceSpec {
    fn from(r: RangeFrom<i64>) -> Self {
        Self::new(Some(r.start), None, None)
    }
}

impl From<RangeTo<i64>> for SliceSpec {
    fn from(r: RangeTo<i64>) -> Self {
        Self::new(None, Some(r.end), None)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// What to select along one axis of the indexed array.
#[derive(Clone, Debug)]
pub enum IndexKey {
    /// A single position; the axis is dropped from the result.
    Int(i64),
    /// A regular slice; the axis is kept.
    Slice(SliceSpec),
    /// An unlabeled list of positions; the axis is kept with a new length.
    Ints(Vec<i64>),
    /// An unlabeled mask with one flag per position of the axis.
    Bools(Vec<bool>),
    /// An integer array carrying its own dimension names, which replace the indexed axis.
    Labeled(Variable<i64>),
}

impl From<i64> for IndexKey {
    fn from(i: i64) -> Self {
        IndexKey::Int(i)
    }
}

impl From<SliceSpec> for IndexKey {
    fn from(s: SliceSpec) -> Self {
        IndexKey::Slice(s)
    }
}

impl From<Range<i64>> for IndexKey {
    fn from(r: Range<i64>) -> Self {
        IndexKey::Slice(r.into())
    }
}

impl From<RangeFrom<i64>> for IndexKey {
    fn from(r: RangeFrom<i64>) -> Self {
        IndexKey::Slice(r.into())
    }
}

impl From<RangeTo<i64>> for IndexKey {
    fn from(r: RangeTo<i64>) -> Self {
        IndexKey::Slice(r.into())
    }
}

impl From<RangeFull> for IndexKey {
    fn from(r: RangeFull) -> Self {
        IndexKey::Slice(r.into())
    }
}

impl From<Vec<i64>> for IndexKey {
    fn from(v: Vec<i64>) -> Self {
        IndexKey::Ints(v)
    }
}

impl From<Vec<bool>> for IndexKey {
    fn from(v: Vec<bool>) -> Self {
        IndexKey::Bools(v)
    }
}

impl From<Variable<i64>> for IndexKey {
    fn from(v: Variable<i64>) -> Self {
        IndexKey::Labeled(v)
    }
}

/// Specifies what to select along each axis, in axis order.
/// Axes past the end of the key are kept whole.
#[derive(Clone, Debug, Default)]
pub struct Key {
    entries: Vec<IndexKey>,
}

impl Key {
    #[must_use]
    pub fn entries(&self) -> &[IndexKey] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<IndexKey>> for Key {
    fn from(entries: Vec<IndexKey>) -> Self {
        Self { entries }
    }
}

impl FromIterator<IndexKey> for Key {
    fn from_iter<I: IntoIterator<Item = IndexKey>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Build a [`Key`] by chaining calls to [`KeyBuilder::idx`].
pub trait KeyBuilder<Idx> {
    #[must_use]
    fn idx(self, index: Idx) -> Self;
}

impl KeyBuilder<IndexKey> for Key {
    fn idx(mut self, index: IndexKey) -> Self {
        self.entries.push(index);
        self
    }
}

impl KeyBuilder<i64> for Key {
    fn idx(self, index: i64) -> Self {
        self.idx(IndexKey::Int(index))
    }
}

impl KeyBuilder<SliceSpec> for Key {
    fn idx(self, index: SliceSpec) -> Self {
        self.idx(IndexKey::Slice(index))
    }
}

impl KeyBuilder<Range<i64>> for Key {
    fn idx(self, index: Range<i64>) -> Self {
        self.idx(IndexKey::from(index))
    }
}

impl KeyBuilder<RangeFrom<i64>> for Key {
    fn idx(self, index: RangeFrom<i64>) -> Self {
        self.idx(IndexKey::from(index))
    }
}

impl KeyBuilder<RangeTo<i64>> for Key {
    fn idx(self, index: RangeTo<i64>) -> Self {
        self.idx(IndexKey::from(index))
    }
}

impl KeyBuilder<RangeFull> for Key {
    fn idx(self, index: RangeFull) -> Self {
        self.idx(IndexKey::from(index))
    }
}

impl KeyBuilder<Vec<i64>> for Key {
    fn idx(self, index: Vec<i64>) -> Self {
        self.idx(IndexKey::Ints(index))
    }
}

impl KeyBuilder<Vec<bool>> for Key {
    fn idx(self, index: Vec<bool>) -> Self {
        self.idx(IndexKey::Bools(index))
    }
}

impl KeyBuilder<Variable<i64>> for Key {
    fn idx(self, index: Variable<i64>) -> Self {
        self.idx(IndexKey::Labeled(index))
    }
}
