use crate::{
	materialize::{FALLBACK_COPY_BUFFER, MAX_COPY_BUFFER},
	probe::StorageRoots,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DOWNLOADS_BASE_URI: &str = "content://downloads/public_downloads";

/// Everything the resolver needs to know about the host it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
	/// Application private directory materialized files are written to.
	pub cache_dir: PathBuf,
	#[serde(default)]
	pub storage_roots: StorageRoots,
	#[serde(default = "default_downloads_base_uri")]
	pub downloads_base_uri: String,
	#[serde(default = "default_max_copy_buffer")]
	pub max_copy_buffer: usize,
	#[serde(default = "default_fallback_copy_buffer")]
	pub fallback_copy_buffer: usize,
}

fn default_downloads_base_uri() -> String {
	DEFAULT_DOWNLOADS_BASE_URI.to_string()
}

const fn default_max_copy_buffer() -> usize {
	MAX_COPY_BUFFER
}

const fn default_fallback_copy_buffer() -> usize {
	FALLBACK_COPY_BUFFER
}

impl ResolverConfig {
	/// Config with default storage roots, see [`ResolverConfig::from_env`] to pick them up from
	/// the environment instead.
	pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
		Self {
			cache_dir: cache_dir.into(),
			storage_roots: StorageRoots::default(),
			downloads_base_uri: default_downloads_base_uri(),
			max_copy_buffer: MAX_COPY_BUFFER,
			fallback_copy_buffer: FALLBACK_COPY_BUFFER,
		}
	}

	pub fn from_env(cache_dir: impl Into<PathBuf>) -> Self {
		Self::new(cache_dir).with_storage_roots(StorageRoots::from_env())
	}

	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	#[must_use]
	pub fn with_storage_roots(mut self, storage_roots: StorageRoots) -> Self {
		self.storage_roots = storage_roots;
		self
	}
}
