//! The content store is supplied by the host platform. We only ever talk to it through these
//! traits, so resolution can run against a real provider bridge or an in-memory fixture.

use crate::{error::StoreError, uri::ContentReference};

use std::{fmt, io::Read};

pub mod memory;

pub use memory::MemoryStore;

/// Human readable name the provider declares for a piece of content.
pub const DISPLAY_NAME_COLUMN: &str = "_display_name";
/// Absolute filesystem path some providers still keep for their rows.
pub const DATA_COLUMN: &str = "_data";
pub const ID_COLUMN: &str = "_id";
/// Inline photo bytes of a contact.
pub const PHOTO_COLUMN: &str = "data15";

/// Parameters of a single store query.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<'a> {
	/// Columns to return, `None` means every column the provider has.
	pub projection: Option<&'a [&'a str]>,
	/// Filter with `?` placeholders, like `_id=?`.
	pub selection: Option<&'a str>,
	pub selection_args: &'a [&'a str],
}

impl<'a> Query<'a> {
	#[must_use]
	pub const fn all() -> Self {
		Self {
			projection: None,
			selection: None,
			selection_args: &[],
		}
	}

	#[must_use]
	pub const fn columns(projection: &'a [&'a str]) -> Self {
		Self {
			projection: Some(projection),
			selection: None,
			selection_args: &[],
		}
	}

	#[must_use]
	pub fn filtered(mut self, selection: &'a str, selection_args: &'a [&'a str]) -> Self {
		self.selection = Some(selection);
		self.selection_args = selection_args;
		self
	}
}

/// A positioned view over the rows of a query.
///
/// Implementations release their underlying handle on drop, so every early return in the
/// resolution code closes the cursor.
pub trait Cursor {
	/// Moves to the first row, returning `false` if there are no rows.
	fn move_to_first(&mut self) -> bool;

	fn column_index(&self, name: &str) -> Option<usize>;

	fn get_string(&self, index: usize) -> Result<Option<String>, StoreError>;

	fn get_blob(&self, index: usize) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Byte stream behind a reference, with the byte count the provider reports as readable
/// without blocking.
pub struct ContentStream {
	reader: Box<dyn Read + Send>,
	available: Option<u64>,
}

impl ContentStream {
	pub fn new(reader: impl Read + Send + 'static, available: Option<u64>) -> Self {
		Self {
			reader: Box::new(reader),
			available,
		}
	}

	#[must_use]
	pub const fn available(&self) -> Option<u64> {
		self.available
	}
}

impl Read for ContentStream {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.reader.read(buf)
	}
}

impl fmt::Debug for ContentStream {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContentStream")
			.field("available", &self.available)
			.finish_non_exhaustive()
	}
}

/// Queryable store of content references, owned by the host platform.
pub trait ContentStore: Send + Sync {
	/// Returns `Ok(None)` when the provider hands back no cursor at all.
	fn query(
		&self,
		reference: &ContentReference,
		query: Query<'_>,
	) -> Result<Option<Box<dyn Cursor + '_>>, StoreError>;

	fn open_stream(&self, reference: &ContentReference) -> Result<ContentStream, StoreError>;
}
