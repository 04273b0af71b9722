//! High-level reader for a single `.mca` region file: header parsing,
//! lazy per-chunk decompression and NBT parsing, and the palette decode
//! that turns a chunk's tag tree into a block-addressable [`Chunk`].

use std::{
	fs::File,
	io::Read,
	path::{Path, PathBuf},
};

use flate2::read::{GzDecoder, ZlibDecoder};
use tracing::{debug, trace, warn};

use crate::{
	ioext::*,
	nbt::{parse_root, ByteStream, Tag},
	world::{
		block::Block,
		chunk::Chunk,
		coord::{div_floor, rem_floor},
		io::region::{
			compressionscheme::CompressionScheme, coord::RegionCoord, header::RegionHeader,
			palette, timestamp::Timestamp,
		},
	},
	McError, McResult,
};

/// A region file's lazily-resolved per-chunk slot: its header entry plus,
/// once fetched, its cached tag tree.
#[derive(Debug, Default)]
struct ChunkSlot {
	#[allow(dead_code)]
	timestamp: Timestamp,
	offset: u64,
	is_present: bool,
	tag: Option<Tag>,
}

/// `Unopened` until [`RegionReader::read`] parses the header; afterwards
/// every one of the 1024 potential chunk slots is known to be present or
/// absent, though its tag tree may still be unfetched.
enum ReaderState {
	Unopened,
	HeaderParsed { slots: Box<[ChunkSlot; 1024]> },
}

/// Reads a single `r.<rx>.<rz>.mca` region file: its header, and on
/// demand, the NBT tag tree and decoded blocks of each of its 1024
/// potential chunks.
pub struct RegionReader {
	path: PathBuf,
	rx: i32,
	rz: i32,
	state: ReaderState,
}

impl RegionReader {
	/// Parses `rx`/`rz` out of `path`'s filename without touching the
	/// file itself. The reader starts in the `Unopened` state; call
	/// [`RegionReader::read`] to parse the header.
	pub fn open(path: impl Into<PathBuf>) -> McResult<Self> {
		let path = path.into();
		let (rx, rz) = parse_region_filename(&path)?;
		Ok(Self { path, rx, rz, state: ReaderState::Unopened })
	}

	pub fn region_coords(&self) -> (i32, i32) {
		(self.rx, self.rz)
	}

	/// Parses the 8 KiB header. When `lazy` is `false`, also eagerly
	/// decompresses and parses the tag tree of every present chunk using
	/// a single open file handle; otherwise each chunk's tag tree is
	/// fetched (and the file reopened) the first time it's requested.
	pub fn read(&mut self, lazy: bool) -> McResult<()> {
		let mut file = File::open(&self.path)?;
		if file.metadata()?.len() < 8192 {
			return Err(McError::HeaderTruncated);
		}
		let header = RegionHeader::read_from(&mut file)?;
		debug!("parsed region header for r.{}.{}.mca at {}", self.rx, self.rz, self.path.display());

		let slots: Vec<ChunkSlot> = header
			.sectors
			.iter()
			.zip(header.timestamps.iter())
			.map(|(sector, timestamp)| ChunkSlot {
				timestamp: *timestamp,
				offset: sector.offset(),
				is_present: !sector.is_empty(),
				tag: None,
			})
			.collect();
		let slots: Box<[ChunkSlot; 1024]> = slots.into_boxed_slice().try_into().unwrap();
		self.state = ReaderState::HeaderParsed { slots };

		if !lazy {
			for index in 0..1024 {
				let is_present = match &self.state {
					ReaderState::HeaderParsed { slots } => slots[index].is_present,
					ReaderState::Unopened => unreachable!(),
				};
				if !is_present {
					continue;
				}
				let tag = fetch_chunk_tag(&mut file, &self.state, index)?;
				if let ReaderState::HeaderParsed { slots } = &mut self.state {
					slots[index].tag = Some(tag);
				}
			}
		}
		Ok(())
	}

	/// Whether the chunk at local coordinate `(x, z)` (each in `0..32`)
	/// has a populated slot in this region file.
	pub fn is_filled(&self, x: i32, z: i32) -> McResult<bool> {
		let slots = self.header_parsed_slots()?;
		let index = local_index(x, z)?;
		Ok(slots[index].is_present)
	}

	/// Returns the tag tree of the chunk at local coordinate `(x, z)`,
	/// fetching and decompressing it from disk on first access.
	pub fn get_chunk_tag(&mut self, x: i32, z: i32) -> McResult<&Tag> {
		if matches!(self.state, ReaderState::Unopened) {
			self.read(true)?;
		}
		let index = local_index(x, z)?;
		let already_fetched = match &self.state {
			ReaderState::HeaderParsed { slots } => slots[index].tag.is_some(),
			ReaderState::Unopened => unreachable!(),
		};
		if !already_fetched {
			if !self.is_filled(x, z)? {
				return Err(McError::ChunkEmpty(x as u8, z as u8));
			}
			let mut file = File::open(&self.path)?;
			let tag = fetch_chunk_tag(&mut file, &self.state, index)?;
			if let ReaderState::HeaderParsed { slots } = &mut self.state {
				slots[index].tag = Some(tag);
			}
		}
		match &self.state {
			ReaderState::HeaderParsed { slots } => Ok(slots[index].tag.as_ref().unwrap()),
			ReaderState::Unopened => unreachable!(),
		}
	}

	/// Decodes the chunk at local coordinate `(x, z)` into a fully
	/// materialised, block-addressable [`Chunk`]. Fails on any malformed
	/// or out-of-range data encountered (strict mode).
	pub fn get_chunk_at(&mut self, x: i32, z: i32) -> McResult<Chunk> {
		self.decode_chunk(x, z, true)
	}

	/// Returns the biome id at absolute-in-region block coordinate
	/// `(x, y, z)`, reading the chunk's flat `Biomes` int array. The
	/// per-column `(x, z)` index ignores `y`, matching the legacy 2D
	/// biome layout this crate targets.
	pub fn get_biome_at(&mut self, x: i32, y: i32, z: i32) -> McResult<i32> {
		let _ = y;
		let (cx, cz, lx, lz) = split_block_coord(x, z);
		let tag = self.get_chunk_tag(cx, cz)?;
		let biomes = crate::world::chunk::biomes_from_tag(tag)?;
		let index = (lz * 16 + lx) as usize;
		biomes.get(index).copied().ok_or(McError::OutOfRange)
	}

	/// Returns every biome id in the chunk containing `(x, z)`.
	pub fn get_biomes_at(&mut self, x: i32, z: i32) -> McResult<Vec<i32>> {
		let (cx, cz, _, _) = split_block_coord(x, z);
		let tag = self.get_chunk_tag(cx, cz)?;
		Ok(crate::world::chunk::biomes_from_tag(tag)?.to_vec())
	}

	/// Returns the `heightmap_name` (e.g. `"WORLD_SURFACE"`) height at
	/// column `(x, z)`, decoding the 9-bit-packed `Heightmaps` long array.
	pub fn get_height_at(&mut self, x: i32, z: i32, heightmap_name: &str) -> McResult<i64> {
		let heights = self.get_heightmap_at(x, z, heightmap_name)?;
		let (_, _, lx, lz) = split_block_coord(x, z);
		let index = (lz * 16 + lx) as usize;
		heights.get(index).copied().ok_or(McError::OutOfRange)
	}

	/// Decodes a full 16x16 heightmap named `heightmap_name` for the
	/// chunk containing `(x, z)`.
	pub fn get_heightmap_at(&mut self, x: i32, z: i32, heightmap_name: &str) -> McResult<Vec<i64>> {
		let (cx, cz, _, _) = split_block_coord(x, z);
		let tag = self.get_chunk_tag(cx, cz)?;
		crate::world::chunk::heightmap_from_tag(tag, heightmap_name)
	}

	/// Looks up a batch of absolute block coordinates, decoding only the
	/// chunks that contain them and reusing a chunk's decode across every
	/// requested position within it. Positions outside this region, or
	/// whose chunk fails to decode, are skipped with a logged warning
	/// rather than failing the whole batch.
	pub fn get_blocks_at(&mut self, positions: &[(i32, i32, i32)]) -> Vec<Block> {
		let mut out = Vec::new();
		let mut cache: std::collections::HashMap<(i32, i32), Option<Chunk>> = std::collections::HashMap::new();
		for &(bx, by, bz) in positions {
			let Some((lx, lz)) = self.local_chunk_coord(bx, bz) else {
				warn!("block coordinate ({bx}, {bz}) outside this region; skipping");
				continue;
			};
			let chunk = cache
				.entry((lx, lz))
				.or_insert_with(|| self.decode_chunk(lx, lz, false).ok());
			match chunk.as_ref().and_then(|c| c.get(bx, by, bz)) {
				Some(block) => out.push(block.clone()),
				None => warn!("no block decoded at ({bx}, {by}, {bz}); skipping"),
			}
		}
		out
	}

	/// Looks up every block in the inclusive box `min..=max`, with the
	/// same skip-on-error semantics as [`RegionReader::get_blocks_at`].
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

	fn header_parsed_slots(&self) -> McResult<&[ChunkSlot; 1024]> {
		match &self.state {
			ReaderState::HeaderParsed { slots } => Ok(slots),
			ReaderState::Unopened => Err(McError::Custom("region header has not been read yet".to_owned())),
		}
	}

	fn decode_chunk(&mut self, x: i32, z: i32, strict: bool) -> McResult<Chunk> {
		let global_cx = self.rx * 32 + x;
		let global_cz = self.rz * 32 + z;
		let tag = self.get_chunk_tag(x, z)?;
		decode_chunk_tag(tag, global_cx, global_cz, strict)
	}

	/// Maps an absolute block coordinate to this region's local chunk
	/// coordinate, or `None` if it falls outside this region's 32x32
	/// chunk span.
	fn local_chunk_coord(&self, bx: i32, bz: i32) -> Option<(i32, i32)> {
		let lx = div_floor(bx, 16) - self.rx * 32;
		let lz = div_floor(bz, 16) - self.rz * 32;
		if (0..32).contains(&lx) && (0..32).contains(&lz) {
			Some((lx, lz))
		} else {
			None
		}
	}
}

fn split_block_coord(x: i32, z: i32) -> (i32, i32, i32, i32) {
	(div_floor(x, 16), div_floor(z, 16), rem_floor(x, 16), rem_floor(z, 16))
}

fn local_index(x: i32, z: i32) -> McResult<usize> {
	if !(0..32).contains(&x) || !(0..32).contains(&z) {
		return Err(McError::OutOfRange);
	}
	Ok(RegionCoord::new(x as u16, z as u16).index())
}

/// Parses `r.<rx>.<rz>.mca` out of `path`'s filename.
fn parse_region_filename(path: &Path) -> McResult<(i32, i32)> {
	let name = path
		.file_name()
		.and_then(|n| n.to_str())
		.ok_or_else(|| McError::MalformedFilename(path.to_path_buf()))?;
	let stripped = name
		.strip_prefix("r.")
		.and_then(|rest| rest.strip_suffix(".mca"))
		.ok_or_else(|| McError::MalformedFilename(path.to_path_buf()))?;
	let mut parts = stripped.split('.');
	let rx = parts.next().and_then(|s| s.parse::<i32>().ok());
	let rz = parts.next().and_then(|s| s.parse::<i32>().ok());
	if parts.next().is_some() {
		return Err(McError::MalformedFilename(path.to_path_buf()));
	}
	match (rx, rz) {
		(Some(rx), Some(rz)) => Ok((rx, rz)),
		_ => Err(McError::MalformedFilename(path.to_path_buf())),
	}
}

/// Seeks to `slots[index]`'s offset, reads the length-prefixed,
/// compressed chunk payload, decompresses it, and parses its tag tree.
fn fetch_chunk_tag(file: &mut File, state: &ReaderState, index: usize) -> McResult<Tag> {
	let slots = match state {
		ReaderState::HeaderParsed { slots } => slots,
		ReaderState::Unopened => unreachable!(),
	};
	let slot = &slots[index];
	if !slot.is_present {
		return Err(McError::ChunkEmpty((index % 32) as u8, (index / 32) as u8));
	}
	use std::io::{Seek, SeekFrom};
	file.seek(SeekFrom::Start(slot.offset))?;
	let length: u32 = file.read_value()?;
	if length == 0 {
		return Err(McError::ChunkEmpty((index % 32) as u8, (index / 32) as u8));
	}
	let compression = CompressionScheme::read_from(file)?;
	let mut compressed = vec![0u8; length as usize - 1];
	file.read_exact(&mut compressed)?;

	trace!("chunk {index}: decompressing payload ({length} bytes, {compression:?})");
	let raw = match compression {
		CompressionScheme::ZLib => {
			let mut dec = ZlibDecoder::new(compressed.as_slice());
			let mut out = Vec::new();
			dec.read_to_end(&mut out).map_err(|e| McError::Decompression(e.to_string()))?;
			out
		}
		CompressionScheme::GZip => {
			// Parses but is not supported by this reader (§7 error taxonomy).
			let _ = GzDecoder::new(compressed.as_slice());
			return Err(McError::UnsupportedCompression(1));
		}
	};

	let mut stream = ByteStream::new(raw);
	let named = parse_root(&mut stream)?;
	Ok(named.tag)
}

fn decode_chunk_tag(tag: &Tag, cx: i32, cz: i32, strict: bool) -> McResult<Chunk> {
	let x_pos = tag.get_subtag("xPos").and_then(Tag::as_i32).ok_or(McError::MissingField("xPos"))?;
	let z_pos = tag.get_subtag("zPos").and_then(Tag::as_i32).ok_or(McError::MissingField("zPos"))?;
	let origin_x = x_pos * 16;
	let origin_z = z_pos * 16;

	let sections = tag.get_subtag("Sections").ok_or(McError::MissingField("Sections"))?;
	let mut chunk = Chunk::new(cx, cz);

	for section in sections.as_compound_list() {
		let section_y = section.get_subtag("Y").and_then(Tag::as_i8).ok_or(McError::MissingField("Y"))?;

		let Some(block_states) = section.get_subtag("BlockStates") else {
			// Sub-chunks with no block storage contribute no blocks.
			continue;
		};
		let words = block_states.as_long_array().ok_or(McError::MissingField("BlockStates"))?;
		let palette_tag = section.get_subtag("Palette").ok_or(McError::MissingField("Palette"))?;
		let entries = palette_tag.as_compound_list();
		let bpi = palette::bits_per_index(entries.len());

		for layer in 0..16i32 {
			for local_z in 0..16i32 {
				for local_x in 0..16i32 {
					let n = (256 * layer + 16 * local_z + local_x) as usize;
					let raw_index = palette::unpack_non_straddling(words, bpi, n);
					let entry = match raw_index.and_then(|idx| entries.get(idx as usize)) {
						Some(entry) => entry,
						None => {
							if strict {
								return Err(McError::OutOfRange);
							}
							warn!("palette index out of range at block {n} (bpi {bpi}); skipping block");
							continue;
						}
					};
					let name = entry.get_subtag("Name").and_then(Tag::as_str).ok_or(McError::MissingField("Name"))?;
					let abs_y = section_y as i32 * 16 + layer;
					chunk.insert(Block::from_palette_name(name, origin_x + local_x, abs_y, origin_z + local_z));
				}
			}
		}
	}

	chunk.set_tag(tag.clone());
	Ok(chunk)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_region_filename() {
		let (rx, rz) = parse_region_filename(Path::new("r.-1.2.mca")).unwrap();
		assert_eq!((rx, rz), (-1, 2));
	}

	#[test]
	fn rejects_malformed_filename() {
		assert!(parse_region_filename(Path::new("region.-1.2.mca")).is_err());
		assert!(parse_region_filename(Path::new("r.1.mca")).is_err());
		assert!(parse_region_filename(Path::new("r.1.2.3.mca")).is_err());
	}

	fn sample_section(y: i8) -> Tag {
		Tag::Compound(vec![
			("Y".to_owned(), Tag::Byte(y)),
			(
				"Palette".to_owned(),
				Tag::List(
					crate::nbt::TagId::Compound,
					vec![
						Tag::Compound(vec![("Name".to_owned(), Tag::String("minecraft:air".to_owned()))]),
						Tag::Compound(vec![("Name".to_owned(), Tag::String("minecraft:stone".to_owned()))]),
					],
				),
			),
			(
				"BlockStates".to_owned(),
				// bpi=4 (clamped minimum), every index 1 ("stone") except n=0.
				Tag::LongArray(vec![0x1111_1111_1111_1110u64 as i64; 256]),
			),
		])
	}

	#[test]
	fn decodes_a_single_section_chunk() {
		let tag = Tag::Compound(vec![
			("xPos".to_owned(), Tag::Int(2)),
			("zPos".to_owned(), Tag::Int(-1)),
			("Sections".to_owned(), Tag::List(crate::nbt::TagId::Compound, vec![sample_section(0)])),
		]);
		let chunk = decode_chunk_tag(&tag, 2, -1, true).unwrap();
		assert_eq!(chunk.get(32, 0, -16).unwrap().name(), "air");
		assert_eq!(chunk.get(33, 0, -16).unwrap().name(), "stone");
		assert_eq!(chunk.len(), 16 * 16 * 16);
	}

	#[test]
	fn missing_block_states_skips_the_section_without_error() {
		let section = Tag::Compound(vec![("Y".to_owned(), Tag::Byte(0))]);
		let tag = Tag::Compound(vec![
			("xPos".to_owned(), Tag::Int(0)),
			("zPos".to_owned(), Tag::Int(0)),
			("Sections".to_owned(), Tag::List(crate::nbt::TagId::Compound, vec![section])),
		]);
		let chunk = decode_chunk_tag(&tag, 0, 0, true).unwrap();
		assert!(chunk.is_empty());
	}

	#[test]
	fn missing_structural_field_is_fatal() {
		let tag = Tag::Compound(vec![("zPos".to_owned(), Tag::Int(0))]);
		assert!(matches!(decode_chunk_tag(&tag, 0, 0, true), Err(McError::MissingField("xPos"))));
	}

	/// Builds a full `.mca` byte buffer by hand (sector table, timestamp
	/// table, length/compression-type prefix, zlib-compressed NBT payload)
	/// and drives it through the real `RegionReader::open`/`read`/
	/// `get_chunk_at` path, rather than calling `decode_chunk_tag` directly
	/// on an already-built `Tag`.
	#[test]
	fn reads_a_synthetic_region_file_end_to_end() {
		use std::io::Write;

		let _ = tracing_subscriber::fmt().try_init();

		let chunk_tag = Tag::Compound(vec![
			("xPos".to_owned(), Tag::Int(0)),
			("zPos".to_owned(), Tag::Int(0)),
			("Sections".to_owned(), Tag::List(crate::nbt::TagId::Compound, vec![sample_section(0)])),
		]);
		let mut nbt_bytes = Vec::new();
		crate::nbt::tag::encode_named(&mut nbt_bytes, "", &chunk_tag).unwrap();

		let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
		encoder.write_all(&nbt_bytes).unwrap();
		let compressed = encoder.finish().unwrap();

		let mut payload = Vec::new();
		payload.extend_from_slice(&(compressed.len() as u32 + 1).to_be_bytes());
		payload.push(2u8); // ZLIB
		payload.extend_from_slice(&compressed);

		let mut region_bytes = vec![0u8; 8192];
		region_bytes[0..4].copy_from_slice(&0x0000_0201u32.to_be_bytes()); // sector 2, chunk (0,0)
		region_bytes[4096..4100].copy_from_slice(&1_700_000_000u32.to_be_bytes());
		region_bytes.extend_from_slice(&payload);

		let dir = std::env::temp_dir().join(format!("anvilcodec_e2e_test_{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("r.0.0.mca");
		std::fs::write(&path, &region_bytes).unwrap();

		let mut reader = RegionReader::open(&path).unwrap();
		reader.read(true).unwrap();
		let chunk = reader.get_chunk_at(0, 0).unwrap();
		assert_eq!(chunk.get(0, 0, 0).unwrap().name(), "air");
		assert_eq!(chunk.get(1, 0, 0).unwrap().name(), "stone");
		assert_eq!(chunk.len(), 16 * 16 * 16);

		let _ = std::fs::remove_dir_all(&dir);
	}
}
