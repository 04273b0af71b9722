use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use crate::{ioext::*, McResult};
use std::io::Read;

/// A 32-bit Unix timestamp — a region file's per-chunk last-modified time.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Timestamp(u32);

impl Timestamp {
	pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
		DateTime::<Utc>::try_from(*self).ok()
	}

	pub fn unix_seconds(&self) -> u32 {
		self.0
	}
}

impl From<u32> for Timestamp {
	fn from(value: u32) -> Self {
		Self(value)
	}
}

impl Readable for Timestamp {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		Ok(Self(reader.read_value()?))
	}
}

impl TryFrom<Timestamp> for DateTime<Utc> {
	type Error = ();

	fn try_from(value: Timestamp) -> Result<Self, Self::Error> {
		let naive = NaiveDateTime::from_timestamp_opt(value.0 as i64, 0);
		match naive {
			Some(naive) => Ok(Utc.from_utc_datetime(&naive)),
			None => Err(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn converts_to_utc_datetime() {
		let ts = Timestamp::from(0u32);
		assert!(ts.to_datetime().is_some());
	}
}
