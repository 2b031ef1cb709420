use crate::uri::ContentReference;

use std::fmt;

pub const EXTERNAL_STORAGE_AUTHORITY: &str = "com.android.externalstorage.documents";
pub const DOWNLOADS_AUTHORITY: &str = "com.android.providers.downloads.documents";
pub const MEDIA_AUTHORITY: &str = "com.android.providers.media.documents";

const CONTENT_SCHEME: &str = "content";
const FILE_SCHEME: &str = "file";

/// Which system service owns a [`ContentReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
	ExternalStorageDocument,
	DownloadsDocument,
	MediaDocument,
	/// Document shaped reference served by some other documents provider.
	GenericDocument,
	ContentGeneral,
	ContactPhoto,
	LocalFile,
	Unknown,
}

/// The media collections a media document id can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
	Image,
	Video,
	Audio,
}

impl MediaKind {
	#[must_use]
	pub fn from_type(media_type: &str) -> Option<Self> {
		match media_type {
			"image" => Some(Self::Image),
			"video" => Some(Self::Video),
			"audio" => Some(Self::Audio),
			_ => None,
		}
	}

	/// Media store collection holding rows of this kind on external storage.
	#[must_use]
	pub const fn collection_uri(self) -> &'static str {
		match self {
			Self::Image => "content://media/external/images/media",
			Self::Video => "content://media/external/video/media",
			Self::Audio => "content://media/external/audio/media",
		}
	}
}

impl fmt::Display for MediaKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Image => "image",
			Self::Video => "video",
			Self::Audio => "audio",
		})
	}
}

/// Loose heuristic: anything mentioning "contact" and ending in "photo" is treated as a contact
/// photo, which exposes its bytes inline instead of through a stream.
#[must_use]
pub fn looks_like_contact_photo(reference: &ContentReference) -> bool {
	let raw = reference.as_str();
	raw.contains("contact") && raw.ends_with("photo")
}

/// Categorizes a reference by its scheme and authority. Pure, never touches the store or disk.
///
/// Only `content` references can be documents, a `file` path that happens to contain a
/// `document` segment is still a plain file.
#[must_use]
pub fn classify(reference: &ContentReference) -> ProviderKind {
	match reference.scheme() {
		CONTENT_SCHEME if reference.is_document() => match reference.authority() {
			Some(EXTERNAL_STORAGE_AUTHORITY) => ProviderKind::ExternalStorageDocument,
			Some(DOWNLOADS_AUTHORITY) => ProviderKind::DownloadsDocument,
			Some(MEDIA_AUTHORITY) => ProviderKind::MediaDocument,
			_ => ProviderKind::GenericDocument,
		},
		CONTENT_SCHEME if looks_like_contact_photo(reference) => ProviderKind::ContactPhoto,
		CONTENT_SCHEME => ProviderKind::ContentGeneral,
		FILE_SCHEME => ProviderKind::LocalFile,
		_ => ProviderKind::Unknown,
	}
}
