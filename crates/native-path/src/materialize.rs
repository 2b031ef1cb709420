use crate::{
	error::{Error, FileIOError},
	store::{ContentStore, Cursor, Query, DISPLAY_NAME_COLUMN, PHOTO_COLUMN},
	uri::ContentReference,
};

use std::{
	ffi::OsStr,
	fs,
	io::{self, Read, Write},
	path::{Path, PathBuf},
};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

pub const MAX_COPY_BUFFER: usize = 1024 * 1024; // 1MiB ceiling for a single read
pub const FALLBACK_COPY_BUFFER: usize = 8192; // when the provider can't tell us how much is available

const FALLBACK_NAME_PREFIX: &str = "tempFile";

/// Copies the bytes behind a reference into the application cache directory, to get a real
/// filesystem path out of references that don't have one.
///
/// Bytes are written to a temporary file inside the cache directory which is only renamed to its
/// final name once the copy completed, so a failed copy never leaves a half written cache file
/// behind under the expected name. Cache files are never deleted here, eviction belongs to whoever
/// owns the cache directory.
#[derive(Debug, Clone)]
pub struct Materializer {
	cache_dir: PathBuf,
	max_buffer: usize,
	fallback_buffer: usize,
}

impl Materializer {
	pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
		Self::with_buffers(cache_dir, MAX_COPY_BUFFER, FALLBACK_COPY_BUFFER)
	}

	pub fn with_buffers(
		cache_dir: impl Into<PathBuf>,
		max_buffer: usize,
		fallback_buffer: usize,
	) -> Self {
		Self {
			cache_dir: cache_dir.into(),
			max_buffer: max_buffer.max(1),
			fallback_buffer: fallback_buffer.max(1),
		}
	}

	#[must_use]
	pub fn cache_dir(&self) -> &Path {
		&self.cache_dir
	}

	/// General copy: names the cache file after the provider's display name and copies the
	/// reference's byte stream into it.
	#[instrument(skip_all, fields(%reference), err)]
	pub fn materialize(
		&self,
		store: &(impl ContentStore + ?Sized),
		reference: &ContentReference,
	) -> Result<PathBuf, Error> {
		let display_name = match store.query(reference, Query::all()) {
			Ok(Some(mut cursor)) => {
				if cursor.move_to_first() {
					display_name(&*cursor)
				} else {
					None
				}
			}
			Ok(None) => None,
			Err(e) => {
				warn!(?e, "Failed to query display name, falling back to a generated name;");
				None
			}
		};

		let mut stream = store.open_stream(reference)?;
		let buffer_size = self.buffer_size(stream.available());

		self.write_cache_file(display_name, &mut stream, buffer_size)
	}

	/// Contact photos expose their bytes inline in a blob column instead of through a stream.
	#[instrument(skip_all, fields(%reference), err)]
	pub fn materialize_contact_photo(
		&self,
		store: &(impl ContentStore + ?Sized),
		reference: &ContentReference,
	) -> Result<PathBuf, Error> {
		let (display_name, photo) = {
			let mut cursor = store
				.query(reference, Query::columns(&[PHOTO_COLUMN]))?
				.ok_or_else(|| Error::NoRow(reference.to_string()))?;

			if !cursor.move_to_first() {
				return Err(Error::NoRow(reference.to_string()));
			}

			let photo = cursor
				.column_index(PHOTO_COLUMN)
				.map(|index| cursor.get_blob(index))
				.transpose()?
				.flatten()
				.ok_or_else(|| Error::MissingColumn {
					uri: reference.to_string(),
					column: PHOTO_COLUMN,
				})?;

			(display_name(&*cursor), photo)
		};

		let buffer_size = self.buffer_size(Some(photo.len() as u64));

		self.write_cache_file(display_name, &mut photo.as_slice(), buffer_size)
	}

	/// `min(available, max)`, or the fallback size when the provider reports nothing available.
	fn buffer_size(&self, available: Option<u64>) -> usize {
		available
			.filter(|&available| available > 0)
			.map_or(self.fallback_buffer, |available| {
				usize::try_from(available)
					.unwrap_or(usize::MAX)
					.min(self.max_buffer)
			})
	}

	fn write_cache_file(
		&self,
		display_name: Option<String>,
		source: &mut impl Read,
		buffer_size: usize,
	) -> Result<PathBuf, Error> {
		let target = self.cache_dir.join(cache_file_name(display_name));

		fs::create_dir_all(&self.cache_dir)
			.map_err(|e| FileIOError::from((&self.cache_dir, e, "creating cache directory")))?;

		let mut temp_file = NamedTempFile::new_in(&self.cache_dir)
			.map_err(|e| FileIOError::from((&self.cache_dir, e, "creating temporary cache file")))?;

		let bytes_copied = copy_with_buffer(source, temp_file.as_file_mut(), buffer_size)
			.map_err(|e| FileIOError::from((temp_file.path(), e, "copying content")))?;

		temp_file
			.as_file()
			.sync_all()
			.map_err(|e| FileIOError::from((temp_file.path(), e, "syncing cache file")))?;

		// Renaming over an existing cache file with the same name replaces it
		temp_file
			.persist(&target)
			.map_err(|e| FileIOError::from((&target, e.error, "persisting cache file")))?;

		debug!(
			path = %target.display(),
			bytes_copied,
			buffer_size,
			"Materialized content into cache file"
		);

		Ok(target)
	}
}

fn display_name(cursor: &dyn Cursor) -> Option<String> {
	let index = cursor.column_index(DISPLAY_NAME_COLUMN)?;

	match cursor.get_string(index) {
		Ok(name) => name,
		Err(e) => {
			warn!(?e, "Failed to read display name;");
			None
		}
	}
}

/// The display name's final component, so a provider can't point us outside the cache
/// directory. Falls back to `tempFile<millis>`.
fn cache_file_name(display_name: Option<String>) -> String {
	display_name
		.as_deref()
		.map(Path::new)
		.and_then(Path::file_name)
		.and_then(OsStr::to_str)
		.filter(|name| !name.is_empty())
		.map_or_else(fallback_file_name, ToOwned::to_owned)
}

fn fallback_file_name() -> String {
	format!("{FALLBACK_NAME_PREFIX}{}", Utc::now().timestamp_millis())
}

fn copy_with_buffer(
	source: &mut impl Read,
	target: &mut impl Write,
	buffer_size: usize,
) -> io::Result<u64> {
	let mut buffer = vec![0; buffer_size];
	let mut bytes_copied = 0;

	loop {
		let n = match source.read(&mut buffer) {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(e),
		};

		target.write_all(&buffer[..n])?;
		bytes_copied += n as u64;
	}

	target.flush()?;

	Ok(bytes_copied)
}
