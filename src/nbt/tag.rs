//! The tag tree: a thirteen-kind tagged variant plus the lookup
//! operations used by palette decoding and the supplemental query
//! surface (biomes, heightmaps).

use std::io::{self, Write};

use crate::McError;

/// Single-byte type code identifying a tag's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TagId {
	End = 0,
	Byte = 1,
	Short = 2,
	Int = 3,
	Long = 4,
	Float = 5,
	Double = 6,
	ByteArray = 7,
	String = 8,
	List = 9,
	Compound = 10,
	IntArray = 11,
	LongArray = 12,
}

impl TryFrom<u8> for TagId {
	type Error = McError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Ok(match value {
			0 => TagId::End,
			1 => TagId::Byte,
			2 => TagId::Short,
			3 => TagId::Int,
			4 => TagId::Long,
			5 => TagId::Float,
			6 => TagId::Double,
			7 => TagId::ByteArray,
			8 => TagId::String,
			9 => TagId::List,
			10 => TagId::Compound,
			11 => TagId::IntArray,
			12 => TagId::LongArray,
			other => return Err(McError::UnknownTagKind(other)),
		})
	}
}

/// A parsed tag. `Compound` preserves insertion order as a `Vec` of
/// named children rather than a hash map, since lookups here are by
/// name against small per-chunk compounds, not large unordered sets.
#[derive(Debug, Clone)]
pub enum Tag {
	End,
	Byte(i8),
	Short(i16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	ByteArray(Vec<i8>),
	String(String),
	/// Declared element type plus the homogeneous child list.
	List(TagId, Vec<Tag>),
	/// Named children; never contains an `End` tag (it only terminates).
	Compound(Vec<(String, Tag)>),
	IntArray(Vec<i32>),
	LongArray(Vec<i64>),
}

/// A named tag, used for the outer Compound at the root of a chunk payload.
#[derive(Debug, Clone)]
pub struct NamedTag {
	pub name: String,
	pub tag: Tag,
}

impl Tag {
	pub fn id(&self) -> TagId {
		match self {
			Tag::End => TagId::End,
			Tag::Byte(_) => TagId::Byte,
			Tag::Short(_) => TagId::Short,
			Tag::Int(_) => TagId::Int,
			Tag::Long(_) => TagId::Long,
			Tag::Float(_) => TagId::Float,
			Tag::Double(_) => TagId::Double,
			Tag::ByteArray(_) => TagId::ByteArray,
			Tag::String(_) => TagId::String,
			Tag::List(_, _) => TagId::List,
			Tag::Compound(_) => TagId::Compound,
			Tag::IntArray(_) => TagId::IntArray,
			Tag::LongArray(_) => TagId::LongArray,
		}
	}

	/// Direct child of a `Compound` with the given name, or `None`.
	pub fn get_subtag(&self, name: &str) -> Option<&Tag> {
		match self {
			Tag::Compound(children) => children
				.iter()
				.find(|(child_name, _)| child_name == name)
				.map(|(_, tag)| tag),
			_ => None,
		}
	}

	/// All children (at any depth) of a `Compound` whose name matches,
	/// depth-first: a direct Compound child is matched itself and then
	/// recursed into.
	pub fn get_sub_tag_by_name(&self, name: &str) -> Vec<&Tag> {
		let mut results = Vec::new();
		if let Tag::Compound(children) = self {
			for (child_name, child) in children {
				if child_name == name {
					results.push(child);
				}
				if matches!(child, Tag::Compound(_)) {
					results.extend(child.get_sub_tag_by_name(name));
				}
			}
		}
		results
	}

	/// The `i`-th child of a `List`, or `None`.
	pub fn at(&self, i: usize) -> Option<&Tag> {
		match self {
			Tag::List(_, children) => children.get(i),
			_ => None,
		}
	}

	pub fn as_i8(&self) -> Option<i8> {
		match self {
			Tag::Byte(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_i32(&self) -> Option<i32> {
		match self {
			Tag::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Tag::String(v) => Some(v.as_str()),
			_ => None,
		}
	}

	pub fn as_long_array(&self) -> Option<&[i64]> {
		match self {
			Tag::LongArray(v) => Some(v.as_slice()),
			_ => None,
		}
	}

	pub fn as_int_array(&self) -> Option<&[i32]> {
		match self {
			Tag::IntArray(v) => Some(v.as_slice()),
			_ => None,
		}
	}

	/// The children of a `List(Compound, _)`, or an empty slice otherwise.
	pub fn as_compound_list(&self) -> &[Tag] {
		match self {
			Tag::List(TagId::Compound, children) => children.as_slice(),
			_ => &[],
		}
	}

	/// Serializes this tag's payload (without a type byte or name) to
	/// `writer`, in the same big-endian wire format it was parsed from.
	/// Used by round-trip tests, not by any production code path (region
	/// writing is out of scope for this crate).
	pub fn encode_payload<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		match self {
			Tag::End => Ok(()),
			Tag::Byte(v) => writer.write_all(&v.to_be_bytes()),
			Tag::Short(v) => writer.write_all(&v.to_be_bytes()),
			Tag::Int(v) => writer.write_all(&v.to_be_bytes()),
			Tag::Long(v) => writer.write_all(&v.to_be_bytes()),
			Tag::Float(v) => writer.write_all(&v.to_be_bytes()),
			Tag::Double(v) => writer.write_all(&v.to_be_bytes()),
			Tag::ByteArray(bytes) => {
				writer.write_all(&(bytes.len() as u32).to_be_bytes())?;
				for b in bytes {
					writer.write_all(&b.to_be_bytes())?;
				}
				Ok(())
			}
			Tag::String(s) => {
				writer.write_all(&(s.len() as u16).to_be_bytes())?;
				writer.write_all(s.as_bytes())
			}
			Tag::List(element_id, children) => {
				writer.write_all(&[*element_id as u8])?;
				writer.write_all(&(children.len() as u32).to_be_bytes())?;
				for child in children {
					child.encode_payload(writer)?;
				}
				Ok(())
			}
			Tag::Compound(children) => {
				for (name, child) in children {
					encode_named(writer, name, child)?;
				}
				writer.write_all(&[TagId::End as u8])
			}
			Tag::IntArray(values) => {
				writer.write_all(&(values.len() as u32).to_be_bytes())?;
				for v in values {
					writer.write_all(&v.to_be_bytes())?;
				}
				Ok(())
			}
			Tag::LongArray(values) => {
				writer.write_all(&(values.len() as u32).to_be_bytes())?;
				for v in values {
					writer.write_all(&v.to_be_bytes())?;
				}
				Ok(())
			}
		}
	}
}

/// Writes a type byte, a 16-bit name length, the name, then the payload.
pub fn encode_named<W: Write>(writer: &mut W, name: &str, tag: &Tag) -> io::Result<()> {
	writer.write_all(&[tag.id() as u8])?;
	writer.write_all(&(name.len() as u16).to_be_bytes())?;
	writer.write_all(name.as_bytes())?;
	tag.encode_payload(writer)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_compound() -> Tag {
		Tag::Compound(vec![
			("xPos".to_owned(), Tag::Int(4)),
			(
				"Nested".to_owned(),
				Tag::Compound(vec![("xPos".to_owned(), Tag::Int(7))]),
			),
		])
	}

	#[test]
	fn get_subtag_returns_direct_child_only() {
		let tag = sample_compound();
		assert_eq!(tag.get_subtag("xPos").unwrap().as_i32(), Some(4));
		assert!(tag.get_subtag("Nested").is_some());
	}

	#[test]
	fn get_sub_tag_by_name_recurses_depth_first() {
		let tag = sample_compound();
		let matches = tag.get_sub_tag_by_name("xPos");
		assert_eq!(matches.len(), 2);
		assert_eq!(matches[0].as_i32(), Some(4));
		assert_eq!(matches[1].as_i32(), Some(7));
	}

	#[test]
	fn list_at_indexes_children() {
		let tag = Tag::List(TagId::Int, vec![Tag::Int(1), Tag::Int(2)]);
		assert_eq!(tag.at(1).unwrap().as_i32(), Some(2));
		assert!(tag.at(5).is_none());
	}
}
