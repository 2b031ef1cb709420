use std::{fmt, path::Path};

use thiserror::Error;

/// Failure reported back to whoever asked for a native path.
///
/// This is the only error kind that crosses [`PathResolver::resolve`](crate::PathResolver::resolve);
/// every internal failure is logged and collapsed into [`ResolveFailure::NotResolvable`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveFailure {
	#[error("Unable to resolve filesystem path.")]
	NotResolvable,
	/// Never emitted by the current resolution strategies, kept so callers can match on it once a
	/// provider check for cloud-backed documents exists.
	#[error("Files from cloud cannot be resolved to filesystem, download is required.")]
	CloudOnly,
}

impl ResolveFailure {
	#[must_use]
	pub const fn code(self) -> i32 {
		match self {
			Self::NotResolvable => 0,
			Self::CloudOnly => 1,
		}
	}
}

/// Errors a [`ContentStore`](crate::store::ContentStore) implementation can report.
#[derive(Error, Debug)]
pub enum StoreError {
	#[error("content query failed: <uri='{uri}'>: {reason}")]
	Query { uri: String, reason: String },
	#[error("unable to open content stream: <uri='{uri}'>")]
	Open {
		uri: String,
		#[source]
		source: std::io::Error,
	},
	#[error("column <index={0}> does not hold the requested type")]
	ColumnType(usize),
	#[error("column <index={0}> is out of range")]
	ColumnOutOfRange(usize),
}

/// File I/O error that remembers which cache path it happened on.
#[derive(Error, Debug)]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: std::io::Error,
	pub context: &'static str,
}

impl fmt::Display for FileIOError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"file I/O error ({}): {}; path: '{}'",
			self.context,
			self.source,
			self.path.display()
		)
	}
}

impl<P: AsRef<Path>> From<(P, std::io::Error, &'static str)> for FileIOError {
	fn from((path, source, context): (P, std::io::Error, &'static str)) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			context,
		}
	}
}

/// Internal failures of the resolution strategies.
#[derive(Error, Debug)]
pub enum Error {
	#[error("received an unparseable content reference: {0}")]
	InvalidReference(#[from] url::ParseError),
	#[error("malformed document id: <document_id='{document_id}'>: {reason}")]
	InvalidDocumentId {
		document_id: String,
		reason: &'static str,
	},
	#[error("content store returned no row for <uri='{0}'>")]
	NoRow(String),
	#[error("content store row has no '{column}' column: <uri='{uri}'>")]
	MissingColumn { uri: String, column: &'static str },
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn failure_codes_are_stable() {
		assert_eq!(ResolveFailure::NotResolvable.code(), 0);
		assert_eq!(ResolveFailure::CloudOnly.code(), 1);
		assert_eq!(
			ResolveFailure::NotResolvable.to_string(),
			"Unable to resolve filesystem path."
		);
	}

	#[test]
	fn file_io_error_mentions_context_and_path() {
		let err = FileIOError::from((
			"/cache/report.pdf",
			std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
			"persisting cache file",
		));

		assert_eq!(
			err.to_string(),
			"file I/O error (persisting cache file): disk full; path: '/cache/report.pdf'"
		);
	}
}
