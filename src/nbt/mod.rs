//! The self-describing tag format used by chunk payloads: thirteen tag
//! kinds, a recursive parser, and a cursor over an in-memory byte buffer.

pub mod stream;
pub mod tag;
pub mod parser;

pub use stream::ByteStream;
pub use tag::{NamedTag, Tag, TagId};
pub use parser::parse_root;
