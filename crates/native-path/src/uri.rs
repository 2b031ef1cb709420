use crate::error::Error;

use std::{borrow::Cow, fmt};

use percent_encoding::percent_decode_str;
use url::Url;

const DOCUMENT_SEGMENT: &str = "document";
const TREE_SEGMENT: &str = "tree";

/// An opaque, platform issued reference to some content, like
/// `content://com.android.providers.downloads.documents/document/42`.
///
/// Immutable once parsed. We keep the string we were given around, because some heuristics
/// (contact photos) look at the reference exactly as the platform handed it to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
	raw: String,
	url: Url,
}

impl ContentReference {
	pub fn parse(raw: impl Into<String>) -> Result<Self, Error> {
		let raw = raw.into();
		let url = Url::parse(&raw)?;

		Ok(Self { raw, url })
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Always lowercase.
	#[must_use]
	pub fn scheme(&self) -> &str {
		self.url.scheme()
	}

	#[must_use]
	pub fn authority(&self) -> Option<&str> {
		Some(self.url.authority()).filter(|authority| !authority.is_empty())
	}

	/// Percent-decoded path component.
	#[must_use]
	pub fn path(&self) -> Cow<'_, str> {
		percent_decode_str(self.url.path()).decode_utf8_lossy()
	}

	/// Percent-decoded path segments, without the empty segment produced by a leading `/`.
	#[must_use]
	pub fn path_segments(&self) -> Vec<Cow<'_, str>> {
		self.url
			.path_segments()
			.map(|segments| {
				segments
					.filter(|segment| !segment.is_empty())
					.map(|segment| percent_decode_str(segment).decode_utf8_lossy())
					.collect()
			})
			.unwrap_or_default()
	}

	#[must_use]
	pub fn query(&self) -> Option<&str> {
		self.url.query()
	}

	#[must_use]
	pub fn fragment(&self) -> Option<&str> {
		self.url.fragment()
	}

	/// The provider defined document id, if this reference has the shape of a document
	/// reference: `/document/<id>` or `/tree/<tree id>/document/<id>`.
	///
	/// Ids are supposed to arrive as a single encoded segment, but references built by hand often
	/// leave the `/` of the id unencoded, so everything after `document` makes up the id.
	#[must_use]
	pub fn document_id(&self) -> Option<String> {
		let segments = self.path_segments();

		let id = match segments.as_slice() {
			[document, id @ ..] if document == DOCUMENT_SEGMENT => id,
			[tree, _, document, id @ ..] if tree == TREE_SEGMENT && document == DOCUMENT_SEGMENT => {
				id
			}
			_ => return None,
		};

		(!id.is_empty()).then(|| id.join("/"))
	}

	#[must_use]
	pub fn is_document(&self) -> bool {
		self.document_id().is_some()
	}

	/// Builds a new reference with `id` appended as a trailing path segment.
	pub fn with_appended_id(&self, id: u64) -> Result<Self, Error> {
		let mut url = self.url.clone();
		url.path_segments_mut()
			.map_err(|()| Error::InvalidReference(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
			.pop_if_empty()
			.push(&id.to_string());

		Ok(Self {
			raw: url.to_string(),
			url,
		})
	}
}

impl fmt::Display for ContentReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl std::str::FromStr for ContentReference {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
