use crate::{
	column::query_column,
	config::ResolverConfig,
	error::{Error, ResolveFailure},
	kind::{classify, MediaKind, ProviderKind},
	materialize::Materializer,
	probe::{find_existing_root, Probe},
	store::{ContentStore, DATA_COLUMN},
	uri::ContentReference,
};

use std::path::PathBuf;

use tracing::{debug, instrument, warn};

/// Either a concrete filesystem path, or the reason there isn't one.
pub type ResolvedPath = Result<PathBuf, ResolveFailure>;

const MEDIA_ROW_SELECTION: &str = "_id=?";

/// Turns content references into filesystem paths.
///
/// Every call is independent: it only touches its own reference and, when it has to copy
/// content, a freshly created cache file. Calls block on store queries and file I/O, so run
/// them off any thread that must stay responsive.
#[derive(Debug)]
pub struct PathResolver<S> {
	store: S,
	config: ResolverConfig,
	materializer: Materializer,
	downloads_base: ContentReference,
}

impl<S: ContentStore> PathResolver<S> {
	pub fn new(store: S, config: ResolverConfig) -> Result<Self, Error> {
		let downloads_base = ContentReference::parse(config.downloads_base_uri.as_str())?;
		let materializer = Materializer::with_buffers(
			&config.cache_dir,
			config.max_copy_buffer,
			config.fallback_copy_buffer,
		);

		Ok(Self {
			store,
			config,
			materializer,
			downloads_base,
		})
	}

	#[must_use]
	pub const fn store(&self) -> &S {
		&self.store
	}

	#[must_use]
	pub const fn config(&self) -> &ResolverConfig {
		&self.config
	}

	/// Parses `raw` and resolves it. Unparseable references are [`ResolveFailure::NotResolvable`].
	pub fn resolve(&self, raw: &str) -> ResolvedPath {
		match ContentReference::parse(raw) {
			Ok(reference) => self.resolve_reference(&reference),
			Err(e) => {
				warn!(raw, ?e, "Unable to parse content reference;");
				Err(ResolveFailure::NotResolvable)
			}
		}
	}

	/// Total: every reference ends up as a path or a failure, nothing here panics or propagates
	/// store and I/O errors.
	#[instrument(skip_all, fields(%reference))]
	pub fn resolve_reference(&self, reference: &ContentReference) -> ResolvedPath {
		debug!(
			authority = ?reference.authority(),
			scheme = reference.scheme(),
			segments = ?reference.path_segments(),
			query = ?reference.query(),
			fragment = ?reference.fragment(),
			"Resolving content reference",
		);

		let kind = classify(reference);
		debug!(?kind, "Classified content reference");

		let res = match kind {
			ProviderKind::ExternalStorageDocument => {
				self.resolve_document(reference, |id| self.external_storage_path(id))
			}
			ProviderKind::DownloadsDocument => {
				self.resolve_document(reference, |id| self.downloads_path(id))
			}
			ProviderKind::MediaDocument => {
				self.resolve_document(reference, |id| self.media_path(id))
			}
			ProviderKind::GenericDocument => self.resolve_document(reference, |_| Ok(None)),
			ProviderKind::ContactPhoto => self
				.materializer
				.materialize_contact_photo(&self.store, reference)
				.map(Some),
			ProviderKind::ContentGeneral => self
				.materializer
				.materialize(&self.store, reference)
				.map(Some),
			ProviderKind::LocalFile => Ok(Some(PathBuf::from(reference.path().into_owned()))),
			ProviderKind::Unknown => Ok(None),
		};

		match res {
			Ok(Some(path)) => {
				debug!(path = %path.display(), "Resolved content reference");
				Ok(path)
			}
			Ok(None) => {
				warn!(?kind, "No strategy produced a path for content reference");
				Err(ResolveFailure::NotResolvable)
			}
			Err(e) => {
				warn!(?kind, ?e, "Failed to resolve content reference;");
				Err(ResolveFailure::NotResolvable)
			}
		}
	}

	/// Document references first get a generic copy into the cache, the provider specific
	/// strategy only runs when that copy fails.
	// FIXME: this means the provider strategies below are shadowed whenever the provider can
	// stream the document, confirm with product whether direct paths should win instead.
	fn resolve_document(
		&self,
		reference: &ContentReference,
		provider_strategy: impl FnOnce(&str) -> Result<Option<PathBuf>, Error>,
	) -> Result<Option<PathBuf>, Error> {
		let Some(document_id) = reference.document_id() else {
			return Ok(None);
		};
		debug!(%document_id, "Document reference");

		match self.materializer.materialize(&self.store, reference) {
			Ok(path) => return Ok(Some(path)),
			Err(e) => debug!(?e, "Generic copy of document failed, trying provider strategy;"),
		}

		provider_strategy(&document_id)
	}

	fn external_storage_path(&self, document_id: &str) -> Result<Option<PathBuf>, Error> {
		let (volume_type, relative_path) = split_document_id(document_id)?;
		if relative_path.is_empty() {
			return Err(Error::InvalidDocumentId {
				document_id: document_id.to_string(),
				reason: "empty relative path",
			});
		}

		let candidates = self.config.storage_roots.candidates(volume_type);

		Ok(
			match find_existing_root(relative_path, candidates.iter().copied()) {
				Some(Probe::Exists(path)) => Some(path),
				Some(Probe::BestGuess(path)) => {
					debug!(
						path = %path.display(),
						"External storage document doesn't exist under any storage root",
					);
					None
				}
				None => None,
			},
		)
	}

	fn downloads_path(&self, document_id: &str) -> Result<Option<PathBuf>, Error> {
		let id = document_id
			.parse::<u64>()
			.map_err(|_| Error::InvalidDocumentId {
				document_id: document_id.to_string(),
				reason: "downloads document ids are numeric",
			})?;

		let lookup = self.downloads_base.with_appended_id(id)?;
		debug!(%lookup, "Looking up download data path");

		Ok(query_column(&self.store, &lookup, DATA_COLUMN, None, &[]).map(PathBuf::from))
	}

	fn media_path(&self, document_id: &str) -> Result<Option<PathBuf>, Error> {
		let (media_type, row_id) = split_document_id(document_id)?;

		let Some(media_kind) = MediaKind::from_type(media_type) else {
			debug!(media_type, "Unsupported media type");
			return Ok(None);
		};

		let collection = ContentReference::parse(media_kind.collection_uri())?;

		Ok(query_column(
			&self.store,
			&collection,
			DATA_COLUMN,
			Some(MEDIA_ROW_SELECTION),
			&[row_id],
		)
		.map(PathBuf::from))
	}
}

/// Splits `type:rest` document ids, only on the first `:`.
fn split_document_id(document_id: &str) -> Result<(&str, &str), Error> {
	document_id
		.split_once(':')
		.ok_or_else(|| Error::InvalidDocumentId {
			document_id: document_id.to_string(),
			reason: "missing ':' separator",
		})
}
