use thiserror::Error;

/// The master error type for region-file and tag parsing failures.
#[derive(Debug, Error)]
pub enum McError {
	#[error("{0}")]
	Custom(String),
	#[error("IO Error: {0}")]
	IoError(#[from] std::io::Error),
	#[error("region filename {0:?} does not match r.<x>.<z>.mca")]
	MalformedFilename(std::path::PathBuf),
	#[error("region file is shorter than the 8KiB header")]
	HeaderTruncated,
	#[error("chunk ({0}, {1}) is empty")]
	ChunkEmpty(u8, u8),
	#[error("unsupported compression type: {0}")]
	UnsupportedCompression(u8),
	#[error("zlib decompression failed: {0}")]
	Decompression(String),
	#[error("tag stream truncated while parsing")]
	Truncated,
	#[error("unknown tag kind: {0}")]
	UnknownTagKind(u8),
	#[error("value out of range")]
	OutOfRange,
	#[error("missing required field {0:?}")]
	MissingField(&'static str),
	#[error("failed to convert to UTF-8 string")]
	FromUtf8Error(#[from] std::string::FromUtf8Error),
	#[error("encountered the End tag ID marker")]
	EndTagMarker,
	#[error("expected tag kind {expected:?}, found {found:?}")]
	WrongTagKind { expected: &'static str, found: &'static str },
}

impl McError {
	pub fn range_check<T, R>(value: T, range: R) -> Result<(), McError>
	where
		T: PartialOrd + Sized,
		R: std::ops::RangeBounds<T>,
	{
		if range.contains(&value) {
			Ok(())
		} else {
			Err(McError::OutOfRange)
		}
	}

	#[inline(always)]
	pub fn custom<T, S: AsRef<str>>(msg: S) -> Result<T, Self> {
		Err(McError::Custom(msg.as_ref().to_owned()))
	}
}

pub type McResult<T> = Result<T, McError>;
