//! End-to-end tests of the bridge lifecycle against the demo native module.
//!
//! The demo cdylib (`host-bridge-demo-lib`) is built alongside the workspace;
//! these tests locate its artifact in the cargo target directory. The demo
//! module's stored context is shared process-wide and it refuses conflicting
//! re-initialization, so every test that expects a successful push uses the
//! same context values.

use std::path::PathBuf;

use host_bridge::loader::library_filename;
use host_bridge::{
    Bridge, BridgeConfig, BridgeError, BridgeState, LibraryLoader, NativeContext,
};

const DEMO_LIB: &str = "host_bridge_demo_lib";

/// Locate the demo cdylib in the cargo target directory.
///
/// Returns the logical name to load plus the search path to use. Cargo puts
/// workspace-member artifacts in `target/debug` and dependency artifacts,
/// with a metadata hash in the filename, in `target/debug/deps`.
fn find_demo_lib() -> Option<(String, PathBuf)> {
    let exe = std::env::current_exe().ok()?;
    let deps_dir = exe.parent()?.to_path_buf();
    let debug_dir = deps_dir.parent()?.to_path_buf();

    let plain = library_filename(DEMO_LIB);
    for dir in [&debug_dir, &deps_dir] {
        if dir.join(&plain).exists() {
            return Some((DEMO_LIB.to_string(), dir.clone()));
        }
    }

    // Fall back to the hashed artifact in deps/
    let hashed_prefix = {
        let mut p = plain.clone();
        // strip the extension, keep "libhost_bridge_demo_lib" / "host_bridge_demo_lib"
        if let Some(dot) = p.rfind('.') {
            p.truncate(dot);
        }
        p
    };
    let extension = plain.rsplit('.').next()?.to_string();

    for entry in std::fs::read_dir(&deps_dir).ok()?.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&hashed_prefix) && name.ends_with(&extension) {
            return Some((entry.path().to_string_lossy().into_owned(), deps_dir));
        }
    }

    None
}

fn demo_config(method: &str) -> Option<BridgeConfig> {
    let (name, dir) = find_demo_lib()?;
    Some(BridgeConfig::new(name, "com.example.DemoHost", method).add_search_path(dir))
}

/// The one context every test pushes across the boundary.
fn host_context() -> NativeContext {
    NativeContext::new("bridge-host-app", "/tmp/bridge-host")
        .with_property("locale", "en-US")
        .with_property("channel", "stable")
}

macro_rules! require_demo_lib {
    ($method:expr) => {
        match demo_config($method) {
            Some(config) => config,
            None => {
                eprintln!("demo library not found in target directory, skipping test");
                return;
            }
        }
    };
}

#[test]
fn test_full_startup_sequence_reaches_context_bound() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    assert_eq!(bridge.state(), BridgeState::Unloaded);

    bridge.load().expect("load should succeed");
    assert_eq!(bridge.state(), BridgeState::Loaded);

    bridge
        .init_application_context(host_context())
        .expect("staging the context should succeed");
    assert_eq!(bridge.state(), BridgeState::ContextStaged);

    bridge
        .init_for_native()
        .expect("pushing the context should succeed");
    assert_eq!(bridge.state(), BridgeState::ContextBound);
    assert!(bridge.is_ready());

    let greeting = bridge.invoke().expect("invoke should succeed");
    assert_eq!(greeting, "Hello from native code");
    assert_eq!(bridge.state(), BridgeState::ContextBound);
}

#[test]
fn test_repeated_invokes_are_independent() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();
    bridge.init_application_context(host_context()).unwrap();
    bridge.init_for_native().unwrap();

    for _ in 0..5 {
        let result = bridge.invoke().unwrap();
        assert_eq!(result, "Hello from native code");
        assert_eq!(bridge.state(), BridgeState::ContextBound);
    }
}

#[test]
fn test_invoke_while_only_loaded_fails() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();

    let err = bridge.invoke().unwrap_err();
    assert!(matches!(
        err,
        BridgeError::BridgeNotReady {
            state: BridgeState::Loaded
        }
    ));
    // The failed call left the bridge where it was
    assert_eq!(bridge.state(), BridgeState::Loaded);
}

#[test]
fn test_init_for_native_without_staged_context_fails() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();

    let err = bridge.init_for_native().unwrap_err();
    assert!(matches!(err, BridgeError::UninitializedContext(_)));
    assert_eq!(bridge.state(), BridgeState::Loaded);
}

#[test]
fn test_load_is_idempotent() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();
    bridge.load().unwrap();
    assert_eq!(bridge.state(), BridgeState::Loaded);
}

#[test]
fn test_loader_returns_same_handle_for_same_name() {
    let Some((name, dir)) = find_demo_lib() else {
        eprintln!("demo library not found in target directory, skipping test");
        return;
    };

    let mut loader = LibraryLoader::new();
    loader.add_search_path(dir);

    let first = loader.load(&name).unwrap();
    let second = loader.load(&name).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(loader.loaded_libraries().len(), 1);
}

#[test]
fn test_missing_symbol_fails_at_load_time() {
    let Some((name, dir)) = find_demo_lib() else {
        eprintln!("demo library not found in target directory, skipping test");
        return;
    };

    let config =
        BridgeConfig::new(name, "com.example.DemoHost", "noSuchMethod").add_search_path(dir);
    let mut bridge = Bridge::new(config);

    let err = bridge.load().unwrap_err();
    assert!(matches!(err, BridgeError::SymbolResolution(_)));
    assert_eq!(bridge.state(), BridgeState::Unloaded);
}

#[test]
fn test_conflicting_context_reinitialization_fails() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();
    bridge.init_application_context(host_context()).unwrap();

    // Equivalent context: tolerated
    bridge.init_application_context(host_context()).unwrap();

    // Different context: refused, original stays bound
    let other = NativeContext::new("other-app", "/tmp/other");
    let err = bridge.init_application_context(other).unwrap_err();
    assert!(matches!(err, BridgeError::Reinitialization(_)));
    assert_eq!(
        bridge.application_context().unwrap().app_name,
        "bridge-host-app"
    );
}

#[test]
fn test_native_context_accessor_fails_closed_until_bound() {
    let config = require_demo_lib!("stringFromNative");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();
    bridge.init_application_context(host_context()).unwrap();

    // Staged host-side, but native code has not seen it yet
    assert!(matches!(
        bridge.native_context(),
        Err(BridgeError::UninitializedContext(_))
    ));

    bridge.init_for_native().unwrap();
    assert_eq!(bridge.native_context().unwrap().app_name, "bridge-host-app");
}

#[test]
fn test_context_crosses_the_boundary() {
    let config = require_demo_lib!("describeContext");
    let mut bridge = Bridge::new(config);
    bridge.load().unwrap();
    bridge.init_application_context(host_context()).unwrap();
    bridge.init_for_native().unwrap();

    // The description is built natively from the pushed context
    let description = bridge.invoke().unwrap();
    assert!(
        description.contains("app=bridge-host-app"),
        "unexpected description: {}",
        description
    );
    assert!(
        description.contains("properties=2"),
        "unexpected description: {}",
        description
    );
}

#[test]
fn test_native_init_rejects_conflicting_context() {
    let config = require_demo_lib!("describeContext");

    let mut bridge = Bridge::new(config.clone());
    bridge.load().unwrap();
    bridge.init_application_context(host_context()).unwrap();
    bridge.init_for_native().unwrap();

    // A second bridge staging a different context must be turned away at the
    // boundary instead of rebinding the module's stored context.
    let mut other = Bridge::new(config);
    other.load().unwrap();
    other
        .init_application_context(NativeContext::new("other-app", "/tmp/other"))
        .unwrap();
    let err = other.init_for_native().unwrap_err();
    assert!(matches!(err, BridgeError::NativeInit(_)), "got {:?}", err);
    assert_eq!(other.state(), BridgeState::ContextStaged);

    // The first context is still the one native code describes.
    let description = bridge.invoke().unwrap();
    assert!(
        description.contains("app=bridge-host-app"),
        "unexpected description: {}",
        description
    );
}
