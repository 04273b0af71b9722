//! Recursive descent over a [`ByteStream`] producing a [`Tag`] tree.
//!
//! Stateless beyond the stream: every tag is parsed by a pure function
//! of (stream, expected context). "Inside a list" and "named, outside a
//! list" are the two contexts the wire format distinguishes (§4.2 of the
//! design): list elements are nameless and share a pre-declared type, so
//! they skip straight to payload dispatch.

use crate::nbt::stream::ByteStream;
use crate::nbt::tag::{NamedTag, Tag, TagId};
use crate::McError;

/// Parses one named tag from `stream`, or `None` if the next byte is an
/// `End` marker (the sentinel that terminates a `Compound`).
///
/// The name is read even when the type byte does not decode to a known
/// [`TagId`] — the wire layout puts the name immediately after a
/// non-`End` type byte regardless of whether the reader recognizes it,
/// so consuming it first keeps the stream aligned before surfacing the
/// `UnknownTagKind` error.
pub fn parse_named_tag(stream: &mut ByteStream) -> Result<Option<NamedTag>, McError> {
	let raw_id = stream.read_u8()?;
	if raw_id == 0 {
		return Ok(None);
	}
	let name_len = stream.read_u16()?;
	let name = stream.read_string(name_len as usize)?;
	let id = TagId::try_from(raw_id)?;
	let tag = parse_payload(stream, id)?;
	Ok(Some(NamedTag { name, tag }))
}

/// Parses the outermost tag of a chunk payload: a single named Compound.
pub fn parse_root(stream: &mut ByteStream) -> Result<NamedTag, McError> {
	parse_named_tag(stream)?.ok_or(McError::Truncated)
}

/// Parses a nameless list element of the declared `id`, recursing as needed.
fn parse_list_element(stream: &mut ByteStream, id: TagId) -> Result<Tag, McError> {
	parse_payload(stream, id)
}

/// Dispatches on `id` to parse one tag's payload (no type byte, no name).
fn parse_payload(stream: &mut ByteStream, id: TagId) -> Result<Tag, McError> {
	Ok(match id {
		TagId::End => Tag::End,
		TagId::Byte => Tag::Byte(stream.read_i8()?),
		TagId::Short => Tag::Short(stream.read_i16()?),
		TagId::Int => Tag::Int(stream.read_i32()?),
		TagId::Long => Tag::Long(stream.read_i64()?),
		TagId::Float => Tag::Float(stream.read_f32()?),
		TagId::Double => Tag::Double(stream.read_f64()?),
		TagId::ByteArray => {
			let len = stream.read_i32()?;
			if len < 0 {
				return Err(McError::Truncated);
			}
			let bytes = stream.read_bytes(len as usize)?;
			Tag::ByteArray(bytes.into_iter().map(|b| b as i8).collect())
		}
		TagId::String => {
			let len = stream.read_u16()?;
			Tag::String(stream.read_string(len as usize)?)
		}
		TagId::List => {
			let element_raw = stream.read_u8()?;
			let element_id = TagId::try_from(element_raw)?;
			let count = stream.read_i32()?;
			if count < 0 {
				return Err(McError::Truncated);
			}
			let mut children = Vec::with_capacity(count as usize);
			for _ in 0..count {
				children.push(parse_list_element(stream, element_id)?);
			}
			Tag::List(element_id, children)
		}
		TagId::Compound => {
			let mut children = Vec::new();
			while let Some(named) = parse_named_tag(stream)? {
				children.push((named.name, named.tag));
			}
			Tag::Compound(children)
		}
		TagId::IntArray => {
			let len = stream.read_i32()?;
			if len < 0 {
				return Err(McError::Truncated);
			}
			Tag::IntArray(stream.read_i32_array(len as usize)?)
		}
		TagId::LongArray => {
			let len = stream.read_i32()?;
			if len < 0 {
				return Err(McError::Truncated);
			}
			Tag::LongArray(stream.read_i64_array(len as usize)?)
		}
	})
}
