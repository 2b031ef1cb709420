//! Glue between a host plugin runtime and the resolver.
//!
//! Each call carries its own [`Request`], so several resolutions can be in flight at once
//! without a shared "pending callback" slot. Asking the user for permissions is up to the host:
//! we only tell it when it has to, and pick the request back up once it knows the answer.

use crate::{
	error::ResolveFailure,
	resolver::PathResolver,
	store::ContentStore,
};

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument};

pub const RESOLVE_NATIVE_PATH_ACTION: &str = "resolveNativePath";

const FILE_URI_PREFIX: &str = "file://";

pub const INVALID_ACTION_CODE: i32 = -1;
pub const PERMISSION_DENIED_CODE: i32 = 3;

/// Error as reported to the host, `{ "code": .., "message": .. }` once serialized.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} <code={code}>")]
pub struct PluginError {
	pub code: i32,
	pub message: String,
}

impl PluginError {
	#[must_use]
	pub fn invalid_action() -> Self {
		Self {
			code: INVALID_ACTION_CODE,
			message: "Invalid action.".to_string(),
		}
	}

	#[must_use]
	pub fn missing_reference() -> Self {
		Self {
			code: INVALID_ACTION_CODE,
			message: "Expected a content reference string as first argument.".to_string(),
		}
	}

	#[must_use]
	pub fn permission_denied() -> Self {
		Self {
			code: PERMISSION_DENIED_CODE,
			message: "Filesystem permission was denied.".to_string(),
		}
	}
}

impl From<ResolveFailure> for PluginError {
	fn from(failure: ResolveFailure) -> Self {
		Self {
			code: failure.code(),
			message: failure.to_string(),
		}
	}
}

/// Actions the host can dispatch to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	ResolveNativePath,
}

impl Action {
	pub fn parse(name: &str) -> Result<Self, PluginError> {
		match name {
			RESOLVE_NATIVE_PATH_ACTION => Ok(Self::ResolveNativePath),
			_ => Err(PluginError::invalid_action()),
		}
	}
}

/// A single in-flight call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	action: Action,
	reference: String,
}

impl Request {
	pub fn from_call(action: &str, args: &[Value]) -> Result<Self, PluginError> {
		let action = Action::parse(action)?;
		let reference = args
			.first()
			.and_then(Value::as_str)
			.ok_or_else(PluginError::missing_reference)?
			.to_string();

		Ok(Self { action, reference })
	}

	#[must_use]
	pub const fn action(&self) -> Action {
		self.action
	}

	#[must_use]
	pub fn reference(&self) -> &str {
		&self.reference
	}
}

/// Whether the host already holds read access to external storage.
pub trait PermissionGate: Send + Sync {
	fn has_read_permission(&self) -> bool;
}

impl<F: Fn() -> bool + Send + Sync> PermissionGate for F {
	fn has_read_permission(&self) -> bool {
		self()
	}
}

/// What the host has to do with the outcome of [`NativePathBridge::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
	/// Reply to the caller with a `file://` uri or an error.
	Reply(Result<String, PluginError>),
	/// Request read permission, then hand the request back through
	/// [`NativePathBridge::on_permission_result`].
	NeedsPermission(Request),
}

pub struct NativePathBridge<S, G> {
	resolver: Arc<PathResolver<S>>,
	gate: G,
}

impl<S, G> fmt::Debug for NativePathBridge<S, G> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NativePathBridge").finish_non_exhaustive()
	}
}

impl<S, G> NativePathBridge<S, G>
where
	S: ContentStore + 'static,
	G: PermissionGate,
{
	pub fn new(resolver: PathResolver<S>, gate: G) -> Self {
		Self {
			resolver: Arc::new(resolver),
			gate,
		}
	}

	#[instrument(skip(self, args))]
	pub async fn execute(&self, action: &str, args: &[Value]) -> Dispatch {
		let request = match Request::from_call(action, args) {
			Ok(request) => request,
			Err(e) => return Dispatch::Reply(Err(e)),
		};

		if !self.gate.has_read_permission() {
			debug!("Read permission missing, deferring to host");
			return Dispatch::NeedsPermission(request);
		}

		Dispatch::Reply(self.run(request).await)
	}

	/// Resumes a request after the host asked for permissions. Any denied grant fails it.
	pub async fn on_permission_result(
		&self,
		request: Request,
		grants: &[bool],
	) -> Result<String, PluginError> {
		if grants.iter().any(|granted| !granted) {
			return Err(PluginError::permission_denied());
		}

		self.run(request).await
	}

	async fn run(&self, request: Request) -> Result<String, PluginError> {
		match request.action {
			Action::ResolveNativePath => self.resolve_native_path(request.reference).await,
		}
	}

	/// Resolution blocks on store queries and file copies, so it runs on the blocking pool.
	pub async fn resolve_native_path(&self, reference: String) -> Result<String, PluginError> {
		let resolver = Arc::clone(&self.resolver);

		match tokio::task::spawn_blocking(move || resolver.resolve(&reference)).await {
			Ok(Ok(path)) => Ok(format!("{FILE_URI_PREFIX}{}", path.display())),
			Ok(Err(failure)) => Err(failure.into()),
			Err(e) => {
				error!(?e, "Resolution task failed to complete;");
				Err(ResolveFailure::NotResolvable.into())
			}
		}
	}
}
