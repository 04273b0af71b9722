pub mod error;
pub mod ioext;
pub mod macros;
pub mod nbt;
pub mod world;

pub use error::McError;
pub use error::McResult;
pub use flate2;
