#![warn(clippy::pedantic)]

mod broadcast;
mod classify;
mod cpu_array;
mod error;
mod indexer;
mod indexing;
mod shape;
mod shape_strider;
mod variable;
mod variable_display;

pub use broadcast::{broadcast_dims, Broadcast};
pub use classify::{classify, Classified, IndexOptions};
pub use cpu_array::CpuArray;
pub use error::{IndexError, Result};
pub use indexer::{
    BasicEntry, BasicIndexer, Indexer, IndexerKind, OuterEntry, OuterIndexer, VectorizedEntry,
    VectorizedIndexer,
};
pub use indexing::{IndexKey, Key, KeyBuilder, SliceRange, SliceSpec};
pub use shape::Shape;
pub use variable::Variable;

