//! Chunked storage for values larger than a single cache value may hold

mod codec;
mod store;

pub use codec::{combine, split};
pub use store::{ChunkMeta, ChunkedStore};
