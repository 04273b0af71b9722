use crate::{ioext::*, McError, McResult};
use std::io::Read;

/// Per-chunk compression type byte that follows the 4-byte length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionScheme {
	/// Unsupported by this reader; decoding such a chunk fails fatally.
	GZip,
	ZLib,
}

impl Readable for CompressionScheme {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		match reader.read_value::<u8>()? {
			1 => Ok(Self::GZip),
			2 => Ok(Self::ZLib),
			other => Err(McError::UnsupportedCompression(other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn zlib_code_is_supported() {
		let mut cursor = Cursor::new(vec![2u8]);
		assert_eq!(CompressionScheme::read_from(&mut cursor).unwrap(), CompressionScheme::ZLib);
	}

	#[test]
	fn gzip_code_parses_but_is_unsupported_by_the_reader() {
		let mut cursor = Cursor::new(vec![1u8]);
		assert_eq!(CompressionScheme::read_from(&mut cursor).unwrap(), CompressionScheme::GZip);
	}

	#[test]
	fn unknown_code_fails() {
		let mut cursor = Cursor::new(vec![9u8]);
		assert!(matches!(
			CompressionScheme::read_from(&mut cursor),
			Err(McError::UnsupportedCompression(9))
		));
	}
}
