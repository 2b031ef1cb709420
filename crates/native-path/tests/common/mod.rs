#![allow(dead_code)] // not every test binary uses every helper

use sd_native_path::{MemoryStore, PathResolver, ResolverConfig, StorageRoots};

use std::{
	fs,
	path::{Path, PathBuf},
};

use tempfile::{tempdir, TempDir};

pub const EXTERNAL_STORAGE: &str = "content://com.android.externalstorage.documents/document";
pub const DOWNLOADS: &str = "content://com.android.providers.downloads.documents/document";
pub const MEDIA: &str = "content://com.android.providers.media.documents/document";

/// A cache directory plus fake primary and secondary storage roots, all temporary.
pub struct Device {
	pub cache: TempDir,
	pub primary: TempDir,
	pub secondary: TempDir,
}

impl Device {
	pub fn new() -> Self {
		Self {
			cache: tempdir().unwrap(),
			primary: tempdir().unwrap(),
			secondary: tempdir().unwrap(),
		}
	}

	pub fn config(&self) -> ResolverConfig {
		ResolverConfig::new(self.cache.path()).with_storage_roots(StorageRoots {
			primary: Some(self.primary.path().to_path_buf()),
			secondary: Some(self.secondary.path().to_path_buf()),
			external: None,
		})
	}

	pub fn resolver(&self, store: MemoryStore) -> PathResolver<MemoryStore> {
		PathResolver::new(store, self.config()).unwrap()
	}

	pub fn cache_files(&self) -> Vec<PathBuf> {
		let mut files = fs::read_dir(self.cache.path())
			.unwrap()
			.map(|entry| entry.unwrap().path())
			.collect::<Vec<_>>();
		files.sort();
		files
	}
}

/// Creates `root/relative` with some content, returning its full path.
pub fn touch(root: &Path, relative: &str) -> PathBuf {
	let path = root.join(relative);
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(&path, b"content").unwrap();
	path
}
