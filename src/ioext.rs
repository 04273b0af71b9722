use std::io::{Read, Seek, SeekFrom};

use crate::for_each_int_type;

/// For types that can be read from a reader in this crate's on-disk,
/// big-endian byte order.
pub trait Readable: Sized {
	fn read_from<R: Read>(reader: &mut R) -> Result<Self, crate::McError>;
}

/// For types that represent a seekable file offset.
pub trait Seekable: Sized {
	fn seek_to<S: Seek>(&self, seeker: &mut S) -> Result<u64, crate::McError> {
		Ok(seeker.seek(self.seeker())?)
	}

	fn seeker(&self) -> SeekFrom;
}

pub trait ReadExt: Read + Sized {
	fn read_value<T: Readable>(&mut self) -> Result<T, crate::McError>;
}

impl<R: Read + Sized> ReadExt for R {
	fn read_value<T: Readable>(&mut self) -> Result<T, crate::McError> {
		T::read_from(self)
	}
}

pub trait SeekExt: Seek + Sized {
	fn seek_to<S: Seekable>(&mut self, seek_offset: &S) -> Result<u64, crate::McError>;

	fn seek_return(&mut self) -> Result<SeekFrom, crate::McError>;
}

impl<T: Seek + Sized> SeekExt for T {
	fn seek_to<S: Seekable>(&mut self, seek_offset: &S) -> Result<u64, crate::McError> {
		seek_offset.seek_to(self)
	}

	fn seek_return(&mut self) -> Result<SeekFrom, crate::McError> {
		Ok(SeekFrom::Start(self.stream_position()?))
	}
}

macro_rules! __readable_primitive_impl {
	($type:ty) => {
		impl Readable for $type {
			fn read_from<R: Read>(reader: &mut R) -> Result<Self, crate::McError> {
				let mut buf = [0u8; std::mem::size_of::<$type>()];
				reader.read_exact(&mut buf)?;
				Ok(<$type>::from_be_bytes(buf))
			}
		}
	};
}

for_each_int_type!(__readable_primitive_impl);

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn reads_big_endian_u32() {
		let mut cursor = Cursor::new(vec![0x00, 0x00, 0x02, 0x02]);
		let value: u32 = cursor.read_value().unwrap();
		assert_eq!(value, 0x0202);
	}
}
