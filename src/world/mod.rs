//! World-facing types: the block value object, the materialised chunk,
//! floored coordinate math, the region-file I/O layer, and the
//! coordinate-to-region-file chunk cache built on top of it.

pub mod block;
pub mod chunk;
pub mod coord;
pub mod io;
pub mod registry;

pub use block::Block;
pub use chunk::Chunk;
pub use registry::{ChunkRegistry, ChunkRegistryBuilder};
