//! Resolves platform content references (`content://...`, `file://...`) into real filesystem
//! paths, copying the content into a cache directory when no direct path exists.

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod bridge;
pub mod column;
pub mod config;
pub mod error;
pub mod kind;
pub mod materialize;
pub mod probe;
pub mod resolver;
pub mod store;
pub mod uri;

pub use bridge::{Dispatch, NativePathBridge, PermissionGate, PluginError, Request};
pub use config::ResolverConfig;
pub use error::{Error, FileIOError, ResolveFailure, StoreError};
pub use kind::{classify, MediaKind, ProviderKind};
pub use materialize::Materializer;
pub use probe::{find_existing_root, Probe, StorageRoots};
pub use resolver::{PathResolver, ResolvedPath};
pub use store::{ContentStore, ContentStream, Cursor, MemoryStore, Query};
pub use uri::ContentReference;
