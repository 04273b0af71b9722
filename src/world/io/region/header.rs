use crate::{ioext::*, McResult};

use super::coord::*;
use super::sector::*;
use super::timestamp::*;

use std::{
	fmt::Debug,
	io::Read,
	ops::Index,
};

/// Defines the byte offset in a region file where a table of this
/// item's type begins. Implemented for [`RegionSector`] (offset 0) and
/// [`Timestamp`] (offset 4096).
pub trait RegionTableItem {
	const OFFSET: u64;
}

impl RegionTableItem for RegionSector {
	const OFFSET: u64 = 0;
}

impl RegionTableItem for Timestamp {
	const OFFSET: u64 = 4096;
}

/// A table of 1024 elements, one per potential chunk in a 32x32 region.
#[derive(Debug, Clone)]
pub struct RegionTable<T: RegionTableItem>(Box<[T; 1024]>);

/// The 1024 [`RegionSector`] entries at the start of a region file.
pub type SectorTable = RegionTable<RegionSector>;

/// The 1024 [`Timestamp`] entries following the sector table.
pub type TimestampTable = RegionTable<Timestamp>;

/// The 8 KiB header at the start of every region file: a sector table
/// and a timestamp table, each with one entry per potential chunk.
#[derive(Debug, Clone, Default)]
pub struct RegionHeader {
	pub sectors: SectorTable,
	pub timestamps: TimestampTable,
}

impl<T: RegionTableItem> RegionTable<T> {
	pub fn iter(&self) -> std::slice::Iter<'_, T> {
		self.0.iter()
	}
}

impl<T: RegionTableItem> IntoIterator for RegionTable<T> {
	type Item = T;
	type IntoIter = std::array::IntoIter<T, 1024>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<T: Default + Copy + RegionTableItem> Default for RegionTable<T> {
	fn default() -> Self {
		Self(Box::new([T::default(); 1024]))
	}
}

impl<C: Into<RegionCoord>, T: RegionTableItem> Index<C> for RegionTable<T> {
	type Output = T;

	fn index(&self, index: C) -> &Self::Output {
		let coord: RegionCoord = index.into();
		&self.0[coord.index()]
	}
}

impl<T: Readable + Debug + RegionTableItem> Readable for RegionTable<T> {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		let table: Box<[T; 1024]> = (0..1024)
			.map(|_| T::read_from(reader))
			.collect::<McResult<Box<[T]>>>()?
			.try_into()
			.unwrap();
		Ok(Self(table))
	}
}

impl Readable for RegionHeader {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		Ok(Self {
			sectors: SectorTable::read_from(reader)?,
			timestamps: TimestampTable::read_from(reader)?,
		})
	}
}
