//! Maps absolute chunk coordinates to materialised [`Chunk`]s, dispatching
//! cache misses to the right region file and memoising the result.

use std::{collections::HashMap, path::PathBuf, rc::Rc};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::{
	world::{
		chunk::Chunk,
		coord::div_floor,
		io::region::reader::RegionReader,
		Block,
	},
	McResult,
};

/// Builds a [`ChunkRegistry`]: the region-folder path, and an optional
/// bounded cache capacity (unbounded by default).
pub struct ChunkRegistryBuilder {
	region_dir: PathBuf,
	capacity: Option<usize>,
}

impl ChunkRegistryBuilder {
	pub fn new(region_dir: impl Into<PathBuf>) -> Self {
		Self { region_dir: region_dir.into(), capacity: None }
	}

	/// Bounds the chunk cache to `capacity` entries, evicting the
	/// least-recently-touched chunk on overflow.
	pub fn with_capacity(mut self, capacity: usize) -> Self {
		self.capacity = Some(capacity);
		self
	}

	pub fn build(self) -> ChunkRegistry {
		ChunkRegistry {
			region_dir: self.region_dir,
			capacity: self.capacity,
			chunks: IndexMap::new(),
			readers: HashMap::new(),
		}
	}
}

/// A process-level cache from absolute chunk coordinate to a
/// reference-counted, materialised [`Chunk`], backed by the region
/// files under a configured directory.
pub struct ChunkRegistry {
	region_dir: PathBuf,
	capacity: Option<usize>,
	chunks: IndexMap<(i32, i32), Rc<Chunk>>,
	readers: HashMap<(i32, i32), RegionReader>,
}

impl ChunkRegistry {
	/// An unbounded registry rooted at `region_dir`.
	pub fn new(region_dir: impl Into<PathBuf>) -> Self {
		ChunkRegistryBuilder::new(region_dir).build()
	}

	/// Returns the chunk at absolute chunk coordinate `(cx, cz)`,
	/// fetching and decoding it from disk on a cache miss.
	pub fn get_chunk(&mut self, cx: i32, cz: i32) -> McResult<Rc<Chunk>> {
		if self.chunks.contains_key(&(cx, cz)) {
			self.touch((cx, cz));
			trace!("chunk ({cx}, {cz}) cache hit");
			return Ok(self.chunks.get(&(cx, cz)).unwrap().clone());
		}

		let rx = div_floor(cx, 32);
		let rz = div_floor(cz, 32);
		let lx = cx - rx * 32;
		let lz = cz - rz * 32;

		let reader = self.reader_for(rx, rz)?;
		let chunk = Rc::new(reader.get_chunk_at(lx, lz)?);
		self.insert_cached(cx, cz, chunk.clone());
		Ok(chunk)
	}

	/// Returns the chunk containing absolute block coordinate `(bx, bz)`.
	pub fn get_chunk_by_block_coord(&mut self, bx: i32, bz: i32) -> McResult<Rc<Chunk>> {
		self.get_chunk(div_floor(bx, 16), div_floor(bz, 16))
	}

	/// Returns the block at absolute position `(bx, by, bz)`, or `None`
	/// if its chunk has no block at that exact position.
	pub fn get_block(&mut self, bx: i32, by: i32, bz: i32) -> McResult<Option<Block>> {
		let chunk = self.get_chunk_by_block_coord(bx, bz)?;
		Ok(chunk.get(bx, by, bz).cloned())
	}

	/// Whether `(cx, cz)` is already memoised, without triggering a fetch.
	pub fn is_chunk_loaded(&self, cx: i32, cz: i32) -> bool {
		self.chunks.contains_key(&(cx, cz))
	}

	/// Returns the biome id at absolute block coordinate `(bx, by, bz)`,
	/// fetching and decoding the owning chunk on a cache miss. `by` is
	/// ignored, matching the legacy 2D biome layout this crate targets.
	pub fn get_biome_at(&mut self, bx: i32, by: i32, bz: i32) -> McResult<i32> {
		let _ = by;
		let chunk = self.get_chunk_by_block_coord(bx, bz)?;
		chunk.biome_at(bx, bz)
	}

	/// Returns every biome id in the chunk containing `(bx, bz)`.
	pub fn get_biomes_at(&mut self, bx: i32, bz: i32) -> McResult<Vec<i32>> {
		let chunk = self.get_chunk_by_block_coord(bx, bz)?;
		Ok(chunk.biomes()?.to_vec())
	}

	/// Returns the `heightmap_name` height at absolute block coordinate
	/// `(bx, bz)`.
	pub fn get_height_at(&mut self, bx: i32, bz: i32, heightmap_name: &str) -> McResult<i64> {
		let chunk = self.get_chunk_by_block_coord(bx, bz)?;
		chunk.height_at(bx, bz, heightmap_name)
	}

	/// Decodes the full 16x16 `heightmap_name` heightmap for the chunk
	/// containing `(bx, bz)`.
	pub fn get_heightmap_at(&mut self, bx: i32, bz: i32, heightmap_name: &str) -> McResult<Vec<i64>> {
		let chunk = self.get_chunk_by_block_coord(bx, bz)?;
		chunk.heightmap(heightmap_name)
	}

	/// Looks up a batch of absolute block coordinates, fetching only the
	/// chunks that contain them and reusing a chunk's cache entry across
	/// every requested position within it. Positions whose chunk fails to
	/// decode are skipped with a logged warning rather than failing the
	/// whole batch, mirroring `RegionReader::get_blocks_at`'s semantics.
	pub fn get_blocks_at(&mut self, positions: &[(i32, i32, i32)]) -> Vec<Block> {
		let mut out = Vec::new();
		for &(bx, by, bz) in positions {
			match self.get_chunk_by_block_coord(bx, bz) {
				Ok(chunk) => {
					if let Some(block) = chunk.get(bx, by, bz) {
						out.push(block.clone());
					} else {
						warn!("no block decoded at ({bx}, {by}, {bz}); skipping");
					}
				}
				Err(err) => warn!("chunk for block ({bx}, {by}, {bz}) failed to decode: {err}; skipping"),
			}
		}
		out
	}

	/// Looks up every block in the inclusive box `min..=max`, with the
	/// same skip-on-error semantics as [`ChunkRegistry::get_blocks_at`].
	pub fn get_blocks_in_range(&mut self, min: (i32, i32, i32), max: (i32, i32, i32)) -> Vec<Block> {
		let (min_x, min_y, min_z) = min;
		let (max_x, max_y, max_z) = max;
		let mut positions = Vec::new();
		for x in min_x..=max_x {
			for y in min_y..=max_y {
				for z in min_z..=max_z {
					positions.push((x, y, z));
				}
			}
		}
		self.get_blocks_at(&positions)
	}

	fn reader_for(&mut self, rx: i32, rz: i32) -> McResult<&mut RegionReader> {
		if !self.readers.contains_key(&(rx, rz)) {
			let path = self.region_dir.join(format!("r.{rx}.{rz}.mca"));
			debug!("opening region file {} for chunk registry", path.display());
			let mut reader = RegionReader::open(path)?;
			reader.read(true)?;
			self.readers.insert((rx, rz), reader);
		}
		Ok(self.readers.get_mut(&(rx, rz)).unwrap())
	}

	fn touch(&mut self, key: (i32, i32)) {
		if let Some(value) = self.chunks.shift_remove(&key) {
			self.chunks.insert(key, value);
		}
	}

	fn insert_cached(&mut self, cx: i32, cz: i32, chunk: Rc<Chunk>) {
		self.chunks.insert((cx, cz), chunk);
		if let Some(capacity) = self.capacity {
			while self.chunks.len() > capacity {
				if let Some((evicted, _)) = self.chunks.shift_remove_index(0) {
					trace!("evicted least-recently-touched chunk ({}, {})", evicted.0, evicted.1);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unbounded_registry_starts_with_nothing_loaded() {
		let registry = ChunkRegistry::new("/nonexistent");
		assert!(!registry.is_chunk_loaded(0, 0));
	}

	#[test]
	fn bounded_builder_tracks_capacity() {
		let mut registry = ChunkRegistryBuilder::new("/nonexistent").with_capacity(2).build();
		registry.insert_cached(0, 0, Rc::new(Chunk::new(0, 0)));
		registry.insert_cached(1, 0, Rc::new(Chunk::new(1, 0)));
		registry.insert_cached(2, 0, Rc::new(Chunk::new(2, 0)));
		assert_eq!(registry.chunks.len(), 2);
		assert!(!registry.is_chunk_loaded(0, 0));
		assert!(registry.is_chunk_loaded(1, 0));
		assert!(registry.is_chunk_loaded(2, 0));
	}

	#[test]
	fn blocks_at_skips_positions_whose_region_file_is_missing() {
		let mut registry = ChunkRegistry::new("/nonexistent");
		let blocks = registry.get_blocks_at(&[(0, 0, 0), (1, 1, 1)]);
		assert!(blocks.is_empty());
	}

	#[test]
	fn touching_a_chunk_protects_it_from_eviction() {
		let mut registry = ChunkRegistryBuilder::new("/nonexistent").with_capacity(2).build();
		registry.insert_cached(0, 0, Rc::new(Chunk::new(0, 0)));
		registry.insert_cached(1, 0, Rc::new(Chunk::new(1, 0)));
		registry.touch((0, 0));
		registry.insert_cached(2, 0, Rc::new(Chunk::new(2, 0)));
		assert!(registry.is_chunk_loaded(0, 0));
		assert!(!registry.is_chunk_loaded(1, 0));
	}
}
