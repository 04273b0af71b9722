//! The materialised chunk: a chunk coordinate, every block decoded for
//! it keyed by absolute world position, and the raw tag tree it was
//! decoded from, so biome/heightmap data can be queried without a
//! second decompress/parse pass.

use std::collections::HashMap;

use crate::world::block::Block;
use crate::world::coord::rem_floor;
use crate::world::io::region::palette;
use crate::nbt::Tag;
use crate::{McError, McResult};

/// A 16x16 (in x/z) column of decoded blocks. Vertical extent is
/// data-driven (however many sections the source chunk declared), not
/// assumed to be a fixed height.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
	cx: i32,
	cz: i32,
	blocks: HashMap<(i32, i32, i32), Block>,
	tag: Option<Tag>,
}

impl Chunk {
	pub fn new(cx: i32, cz: i32) -> Self {
		Self {
			cx,
			cz,
			blocks: HashMap::new(),
			tag: None,
		}
	}

	pub fn coord(&self) -> (i32, i32) {
		(self.cx, self.cz)
	}

	/// Inserts a block at its own absolute position. A later insert at
	/// the same `(x, y, z)` overwrites an earlier one, matching the
	/// undefined-ordering behaviour of duplicate sub-chunk `Y` values.
	pub fn insert(&mut self, block: Block) {
		self.blocks.insert(block.pos(), block);
	}

	pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
		self.blocks.get(&(x, y, z))
	}

	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Block> {
		self.blocks.values()
	}

	/// Attaches the raw tag tree this chunk was decoded from. Called
	/// once by the region reader right after block decode.
	pub fn set_tag(&mut self, tag: Tag) {
		self.tag = Some(tag);
	}

	/// The chunk's raw tag tree, if it was decoded through the region
	/// reader rather than constructed directly (e.g. in tests).
	pub fn tag(&self) -> Option<&Tag> {
		self.tag.as_ref()
	}

	/// Every biome id in this chunk's flat `Biomes` array.
	pub fn biomes(&self) -> McResult<&[i32]> {
		biomes_from_tag(self.tag.as_ref().ok_or(McError::MissingField("Biomes"))?)
	}

	/// The biome id at absolute block coordinate `(x, z)`.
	pub fn biome_at(&self, x: i32, z: i32) -> McResult<i32> {
		let biomes = self.biomes()?;
		let index = column_index(x, z);
		biomes.get(index).copied().ok_or(McError::OutOfRange)
	}

	/// The full 16x16 heightmap named `heightmap_name` (e.g.
	/// `"WORLD_SURFACE"`), decoded from this chunk's `Heightmaps` compound.
	pub fn heightmap(&self, heightmap_name: &str) -> McResult<Vec<i64>> {
		heightmap_from_tag(self.tag.as_ref().ok_or(McError::MissingField("Heightmaps"))?, heightmap_name)
	}

	/// The `heightmap_name` height at absolute block coordinate `(x, z)`.
	pub fn height_at(&self, x: i32, z: i32, heightmap_name: &str) -> McResult<i64> {
		let heights = self.heightmap(heightmap_name)?;
		let index = column_index(x, z);
		heights.get(index).copied().ok_or(McError::OutOfRange)
	}
}

fn column_index(x: i32, z: i32) -> usize {
	(rem_floor(z, 16) * 16 + rem_floor(x, 16)) as usize
}

/// Reads a chunk tag tree's flat `Biomes` int array.
pub(crate) fn biomes_from_tag(tag: &Tag) -> McResult<&[i32]> {
	tag.get_subtag("Biomes").and_then(Tag::as_int_array).ok_or(McError::MissingField("Biomes"))
}

/// Reads and unpacks `heightmap_name` out of a chunk tag tree's
/// `Heightmaps` compound: a fixed 9-bit-per-column, 256-element packed
/// long array in the same non-straddling bit-packing as block states.
pub(crate) fn heightmap_from_tag(tag: &Tag, heightmap_name: &str) -> McResult<Vec<i64>> {
	let heightmaps = tag.get_subtag("Heightmaps").ok_or(McError::MissingField("Heightmaps"))?;
	let packed = heightmaps
		.get_subtag(heightmap_name)
		.and_then(Tag::as_long_array)
		.ok_or(McError::MissingField("Heightmaps"))?;
	(0..256)
		.map(|n| palette::unpack_non_straddling(packed, 9, n).map(|v| v as i64).ok_or(McError::OutOfRange))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn later_insert_overwrites_same_position() {
		let mut chunk = Chunk::new(0, 0);
		chunk.insert(Block::new("air", 1, 2, 3));
		chunk.insert(Block::new("stone", 1, 2, 3));
        assert_eq!(chunk.len(), 1);
		assert_eq!(chunk.get(1, 2, 3).unwrap().name(), "stone");
	}

	#[test]
	fn every_stored_block_keeps_its_own_position() {
		let mut chunk = Chunk::new(-1, 2);
		chunk.insert(Block::new("stone", 5, 10, 15));
		let block = chunk.get(5, 10, 15).unwrap();
		assert_eq!(block.pos(), (5, 10, 15));
	}

	#[test]
	fn without_a_tag_biome_and_height_queries_report_missing_field() {
		let chunk = Chunk::new(0, 0);
		assert!(matches!(chunk.biomes(), Err(McError::MissingField("Biomes"))));
		assert!(matches!(chunk.heightmap("WORLD_SURFACE"), Err(McError::MissingField("Heightmaps"))));
	}

	#[test]
	fn biome_and_heightmap_queries_read_through_the_attached_tag() {
		let mut chunk = Chunk::new(0, 0);
		let mut biomes = vec![0i32; 16 * 16];
		biomes[16 + 1] = 7; // (x=1, z=1)
		let heights = vec![5i64; 256]; // bpi=9 all-5s pattern built below
		let packed_heights = pack_constant_9bit(&heights);
		chunk.set_tag(Tag::Compound(vec![
			("Biomes".to_owned(), Tag::IntArray(biomes)),
			(
				"Heightmaps".to_owned(),
				Tag::Compound(vec![("WORLD_SURFACE".to_owned(), Tag::LongArray(packed_heights))]),
			),
		]));
		assert_eq!(chunk.biome_at(1, 1).unwrap(), 7);
		assert_eq!(chunk.height_at(0, 0, "WORLD_SURFACE").unwrap(), 5);
	}

	fn pack_constant_9bit(values: &[i64]) -> Vec<i64> {
		let indices_per_word = 64 / 9;
		let words = (values.len() + indices_per_word - 1) / indices_per_word;
		let mut packed = vec![0i64; words];
		for (n, &v) in values.iter().enumerate() {
			let word = n / indices_per_word;
			let bit_offset = (n % indices_per_word) * 9;
			packed[word] |= ((v as u64) << bit_offset) as i64;
		}
		packed
	}
}
