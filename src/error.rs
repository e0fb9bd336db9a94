/// Errors raised while building or applying an indexer.
///
/// Classification fails atomically: when any of these is returned no data has been read
/// and the indexed array is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A labeled indexer introduces a dimension that is also kept, unindexed, on the target.
    #[error(
        "dimension {dim:?} of the indexer for {indexed:?} collides with an existing dimension that it does not replace"
    )]
    DimensionAmbiguity { dim: String, indexed: String },

    /// Indexers that share a dimension name disagree on its length.
    #[error("dimensions of indexers mismatch: {dim:?} has lengths {left} and {right}")]
    BroadcastShape {
        dim: String,
        left: usize,
        right: usize,
    },

    #[error("too many indices: array has {ndim} dimensions but the key has {len} entries")]
    KeyLength { ndim: usize, len: usize },

    #[error("index {index} is out of bounds for dimension {dim:?} with size {size}")]
    OutOfBounds { dim: String, index: i64, size: usize },

    #[error("boolean indexer for {dim:?} has length {len} but the dimension has size {size}")]
    BooleanLength { dim: String, len: usize, size: usize },

    #[error("slice step for {dim:?} cannot be zero")]
    ZeroStep { dim: String },

    /// `isel` was asked for dimensions the array does not have.
    #[error("dimensions {0:?} do not exist")]
    MissingDims(Vec<String>),

    #[error("{dims} dimension names given for data with {ndim} dimensions")]
    DimsMismatch { dims: usize, ndim: usize },

    #[error("dimension name {0:?} is used more than once")]
    DuplicateDim(String),

    #[error("shape requires {expected} elements but {actual} were given")]
    DataLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, IndexError>;
