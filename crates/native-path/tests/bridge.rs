use sd_native_path::{
	bridge::RESOLVE_NATIVE_PATH_ACTION,
	store::{
		memory::{MemoryStore, Row},
		DISPLAY_NAME_COLUMN,
	},
	Dispatch, NativePathBridge, PluginError,
};

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use tracing_test::traced_test;

mod common;

use common::Device;

const FIRST: &str = "content://com.example.provider/files/1";
const SECOND: &str = "content://com.example.provider/files/2";

fn store() -> MemoryStore {
	MemoryStore::new()
		.with_row(FIRST, Row::new().text(DISPLAY_NAME_COLUMN, "first.txt"))
		.with_stream(FIRST, b"first".to_vec())
		.with_row(SECOND, Row::new().text(DISPLAY_NAME_COLUMN, "second.txt"))
		.with_stream(SECOND, b"second".to_vec())
}

#[tokio::test]
#[traced_test]
async fn replies_with_file_uri() {
	let device = Device::new();
	let bridge = NativePathBridge::new(device.resolver(store()), || true);

	let dispatch = bridge
		.execute(RESOLVE_NATIVE_PATH_ACTION, &[json!(FIRST)])
		.await;

	assert_eq!(
		dispatch,
		Dispatch::Reply(Ok(format!(
			"file://{}",
			device.cache.path().join("first.txt").display()
		)))
	);
}

#[tokio::test]
#[traced_test]
async fn unresolvable_reference_replies_with_code_zero() {
	let device = Device::new();
	let bridge = NativePathBridge::new(device.resolver(MemoryStore::new()), || true);

	let Dispatch::Reply(Err(e)) = bridge
		.execute(RESOLVE_NATIVE_PATH_ACTION, &[json!("ftp://example.com/a")])
		.await
	else {
		panic!("expected an error reply");
	};

	assert_eq!(e.code, 0);
	assert_eq!(e.message, "Unable to resolve filesystem path.");
}

#[tokio::test]
#[traced_test]
async fn invalid_action_replies_with_minus_one() {
	let device = Device::new();
	let bridge = NativePathBridge::new(device.resolver(store()), || true);

	assert_eq!(
		bridge.execute("resolveEverything", &[json!(FIRST)]).await,
		Dispatch::Reply(Err(PluginError::invalid_action()))
	);
}

#[tokio::test]
#[traced_test]
async fn missing_permission_defers_to_host() {
	let device = Device::new();
	let granted = AtomicBool::new(false);
	let bridge = NativePathBridge::new(device.resolver(store()), || {
		granted.load(Ordering::Acquire)
	});

	let Dispatch::NeedsPermission(request) = bridge
		.execute(RESOLVE_NATIVE_PATH_ACTION, &[json!(FIRST)])
		.await
	else {
		panic!("expected the bridge to ask for permission");
	};
	assert_eq!(request.reference(), FIRST);
	assert!(device.cache_files().is_empty());

	assert_eq!(
		bridge
			.on_permission_result(request.clone(), &[true, false])
			.await,
		Err(PluginError::permission_denied())
	);

	granted.store(true, Ordering::Release);
	assert_eq!(
		bridge.on_permission_result(request, &[true]).await,
		Ok(format!(
			"file://{}",
			device.cache.path().join("first.txt").display()
		))
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[traced_test]
async fn concurrent_requests_keep_their_own_reference() {
	let device = Device::new();
	let bridge = NativePathBridge::new(device.resolver(store()), || false);
	let first_args = [json!(FIRST)];
	let second_args = [json!(SECOND)];

	let (Dispatch::NeedsPermission(first), Dispatch::NeedsPermission(second)) = tokio::join!(
		bridge.execute(RESOLVE_NATIVE_PATH_ACTION, &first_args),
		bridge.execute(RESOLVE_NATIVE_PATH_ACTION, &second_args),
	) else {
		panic!("expected both requests to wait for permission");
	};

	let (second, first) = tokio::join!(
		bridge.on_permission_result(second, &[true]),
		bridge.on_permission_result(first, &[true]),
	);

	assert_eq!(
		first,
		Ok(format!(
			"file://{}",
			device.cache.path().join("first.txt").display()
		))
	);
	assert_eq!(
		second,
		Ok(format!(
			"file://{}",
			device.cache.path().join("second.txt").display()
		))
	);
}
