//! A cursor over an immutable, in-memory byte buffer.
//!
//! The on-disk tag format is always big-endian; [`ByteStream`] assembles
//! multi-byte values MSB-first whenever its swap flag is set. There is
//! no panicking over-read: every fixed-width read either succeeds or
//! returns [`McError::Truncated`].

use crate::McError;

/// A cursor over an owned byte buffer with endian-aware fixed-width
/// reads. `swap` selects big-endian assembly (the on-disk format used
/// throughout this crate); when unset, reads assemble bytes in the
/// host's native order instead. The flag is a constructor parameter
/// rather than hard-coded so the type isn't tied to one wire format.
pub struct ByteStream {
	buf: Vec<u8>,
	pos: usize,
	swap: bool,
}

impl ByteStream {
	/// A stream over `buf` in this crate's on-disk big-endian order.
	pub fn new(buf: Vec<u8>) -> Self {
		Self::with_endian(buf, true)
	}

	/// A stream over `buf` with an explicit endianness: `swap = true`
	/// assembles multi-byte reads big-endian (MSB-first); `swap = false`
	/// assembles them in the host's native order.
	pub fn with_endian(buf: Vec<u8>, swap: bool) -> Self {
		Self { buf, pos: 0, swap }
	}

	/// Number of unread bytes remaining.
	pub fn available(&self) -> usize {
		self.buf.len() - self.pos
	}

	pub fn position(&self) -> usize {
		self.pos
	}

	pub fn seek(&mut self, pos: usize) {
		self.pos = pos;
	}

	pub fn reset(&mut self) {
		self.pos = 0;
	}

	fn take(&mut self, len: usize) -> Result<&[u8], McError> {
		if self.available() < len {
			return Err(McError::Truncated);
		}
		let slice = &self.buf[self.pos..self.pos + len];
		self.pos += len;
		Ok(slice)
	}

	pub fn read_u8(&mut self) -> Result<u8, McError> {
		Ok(self.take(1)?[0])
	}

	pub fn read_i8(&mut self) -> Result<i8, McError> {
		Ok(self.read_u8()? as i8)
	}

	pub fn read_u16(&mut self) -> Result<u16, McError> {
		let b = self.take(2)?;
		let arr = [b[0], b[1]];
		Ok(if self.swap { u16::from_be_bytes(arr) } else { u16::from_ne_bytes(arr) })
	}

	pub fn read_i16(&mut self) -> Result<i16, McError> {
		Ok(self.read_u16()? as i16)
	}

	pub fn read_u32(&mut self) -> Result<u32, McError> {
		let b = self.take(4)?;
		let arr = [b[0], b[1], b[2], b[3]];
		Ok(if self.swap { u32::from_be_bytes(arr) } else { u32::from_ne_bytes(arr) })
	}

	pub fn read_i32(&mut self) -> Result<i32, McError> {
		Ok(self.read_u32()? as i32)
	}

	pub fn read_u64(&mut self) -> Result<u64, McError> {
		let b = self.take(8)?;
		let arr = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
		Ok(if self.swap { u64::from_be_bytes(arr) } else { u64::from_ne_bytes(arr) })
	}

	pub fn read_i64(&mut self) -> Result<i64, McError> {
		Ok(self.read_u64()? as i64)
	}

	pub fn read_f32(&mut self) -> Result<f32, McError> {
		Ok(f32::from_bits(self.read_u32()?))
	}

	pub fn read_f64(&mut self) -> Result<f64, McError> {
		Ok(f64::from_bits(self.read_u64()?))
	}

	/// Reads a raw byte array of the given length.
	pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, McError> {
		Ok(self.take(len)?.to_vec())
	}

	/// Reads `len` bytes and interprets them as UTF-8.
	pub fn read_string(&mut self, len: usize) -> Result<String, McError> {
		let bytes = self.read_bytes(len)?;
		String::from_utf8(bytes).map_err(McError::from)
	}

	pub fn read_i32_array(&mut self, len: usize) -> Result<Vec<i32>, McError> {
		(0..len).map(|_| self.read_i32()).collect()
	}

	pub fn read_i64_array(&mut self, len: usize) -> Result<Vec<i64>, McError> {
		(0..len).map(|_| self.read_i64()).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_big_endian_fixed_width() {
		let mut stream = ByteStream::new(vec![0x00, 0x00, 0x01, 0x02]);
		assert_eq!(stream.read_i32().unwrap(), 0x0102);
	}

	#[test]
	fn over_read_is_truncated_not_panic() {
		let mut stream = ByteStream::new(vec![0x01]);
		assert!(matches!(stream.read_i32(), Err(McError::Truncated)));
	}

	#[test]
	fn seek_and_reset_move_the_cursor() {
		let mut stream = ByteStream::new(vec![1, 2, 3, 4]);
		stream.read_u8().unwrap();
		stream.seek(0);
		assert_eq!(stream.position(), 0);
		stream.read_u8().unwrap();
		stream.reset();
		assert_eq!(stream.position(), 0);
	}

	#[test]
	fn zero_length_string_is_permitted() {
		let mut stream = ByteStream::new(vec![]);
		assert_eq!(stream.read_string(0).unwrap(), "");
	}

	#[test]
	fn with_endian_false_assembles_native_order_not_big_endian() {
		let mut be = ByteStream::with_endian(vec![0x00, 0x00, 0x01, 0x02], true);
		let mut native = ByteStream::with_endian(vec![0x00, 0x00, 0x01, 0x02], false);
		assert_eq!(be.read_u32().unwrap(), 0x0000_0102);
		assert_eq!(native.read_u32().unwrap(), u32::from_ne_bytes([0x00, 0x00, 0x01, 0x02]));
	}
}
