use std::{
	env,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const DEFAULT_PRIMARY_ROOT: &str = "/storage/emulated/0";

const PRIMARY_STORAGE_ENV: &str = "PRIMARY_STORAGE";
const SECONDARY_STORAGE_ENV: &str = "SECONDARY_STORAGE";
const EXTERNAL_STORAGE_ENV: &str = "EXTERNAL_STORAGE";

const PRIMARY_VOLUME: &str = "primary";

/// Filesystem roots an external storage document can live under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRoots {
	#[serde(default = "default_primary")]
	pub primary: Option<PathBuf>,
	/// Usually a physically removable sd card.
	#[serde(default)]
	pub secondary: Option<PathBuf>,
	#[serde(default)]
	pub external: Option<PathBuf>,
}

#[allow(clippy::unnecessary_wraps)] // serde default needs the exact field type
fn default_primary() -> Option<PathBuf> {
	Some(PathBuf::from(DEFAULT_PRIMARY_ROOT))
}

impl Default for StorageRoots {
	fn default() -> Self {
		Self {
			primary: default_primary(),
			secondary: None,
			external: None,
		}
	}
}

impl StorageRoots {
	/// Reads `SECONDARY_STORAGE` and `EXTERNAL_STORAGE`, and `PRIMARY_STORAGE` to override the
	/// default primary root. Empty variables count as unset.
	#[must_use]
	pub fn from_env() -> Self {
		fn var(name: &str) -> Option<PathBuf> {
			env::var_os(name)
				.filter(|value| !value.is_empty())
				.map(PathBuf::from)
		}

		Self {
			primary: var(PRIMARY_STORAGE_ENV).or_else(default_primary),
			secondary: var(SECONDARY_STORAGE_ENV),
			external: var(EXTERNAL_STORAGE_ENV),
		}
	}

	/// Roots to try for a volume, in priority order. The primary root only applies to the
	/// `primary` volume, other volumes are opaque ids (like `71F8-2C0A`) we can't map to a root,
	/// so they go straight to the environment provided ones.
	#[must_use]
	pub fn candidates(&self, volume_type: &str) -> Vec<&Path> {
		let primary = self
			.primary
			.as_deref()
			.filter(|_| volume_type.eq_ignore_ascii_case(PRIMARY_VOLUME));

		[primary, self.secondary.as_deref(), self.external.as_deref()]
			.into_iter()
			.flatten()
			.collect()
	}
}

/// Outcome of probing candidate roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
	Exists(PathBuf),
	/// Nothing existed, this is the last candidate we computed. Kept because callers historically
	/// got this path back, it may well not exist.
	BestGuess(PathBuf),
}

impl Probe {
	#[must_use]
	pub fn path(&self) -> &Path {
		match self {
			Self::Exists(path) | Self::BestGuess(path) => path,
		}
	}

	#[must_use]
	pub fn into_existing(self) -> Option<PathBuf> {
		match self {
			Self::Exists(path) => Some(path),
			Self::BestGuess(_) => None,
		}
	}
}

/// Returns the first `root/relative` that exists on disk, or the last one tried.
/// `None` only when there were no candidates at all.
pub fn find_existing_root<'a>(
	relative: &str,
	candidates: impl IntoIterator<Item = &'a Path>,
) -> Option<Probe> {
	find_existing_root_with(relative, candidates, Path::exists)
}

pub(crate) fn find_existing_root_with<'a>(
	relative: &str,
	candidates: impl IntoIterator<Item = &'a Path>,
	mut exists: impl FnMut(&Path) -> bool,
) -> Option<Probe> {
	let relative = relative.trim_start_matches('/');
	let mut last = None;

	for root in candidates {
		let full_path = root.join(relative);
		if exists(&full_path) {
			debug!(path = %full_path.display(), "Found existing path under storage root");
			return Some(Probe::Exists(full_path));
		}

		trace!(path = %full_path.display(), "Candidate path does not exist");
		last = Some(full_path);
	}

	last.map(Probe::BestGuess)
}
