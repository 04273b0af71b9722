//! The `.mca` region container: header tables, per-chunk compression
//! metadata, the high-level [`reader::RegionReader`], and the
//! palette-index bit-packing math it relies on.

pub mod compressionscheme;
pub mod coord;
pub mod header;
pub mod palette;
pub mod reader;
pub mod sector;
pub mod timestamp;

pub use compressionscheme::CompressionScheme;
pub use coord::RegionCoord;
pub use header::RegionHeader;
pub use reader::RegionReader;
