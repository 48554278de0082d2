//! Host Bridge Library
//!
//! A minimal cross-language call boundary: the host loads a compiled native
//! module at startup, pushes a process-wide application context across the
//! boundary, and binds one declared method to a native symbol whose string
//! result it can fetch on demand.
//!
//! # Architecture
//!
//! The bridge is three small components behind one state machine:
//! - The **loader** resolves a logical library name to an on-disk artifact
//!   and loads it exactly once.
//! - The **context registry** holds the application context through its
//!   two-phase initialization (staged host-side, then pushed to native code)
//!   and fails closed when read too early.
//! - The **function binding** maps the declared method to an exported symbol
//!   by a deterministic naming convention and copies the returned string
//!   into host-owned storage.
//!
//! The library does NOT:
//! - Provide a general RPC mechanism or multi-argument call shapes
//! - Support concurrent native calls
//! - Persist anything or touch the network
//!
//! The surface that triggers calls (CLI, UI) lives in the application layer
//! (host-bridge-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use host_bridge::{Bridge, BridgeConfig, NativeContext};
//!
//! let config = BridgeConfig::new("native_lib", "com.example.DemoHost", "stringFromNative");
//! let mut bridge = Bridge::new(config);
//!
//! // One-time startup sequence; any failure here is fatal to the caller
//! bridge.load().unwrap();
//! bridge
//!     .init_application_context(NativeContext::new("demo-host", "/tmp/demo"))
//!     .unwrap();
//! bridge.init_for_native().unwrap();
//!
//! // Repeatable, stateless call
//! let greeting = bridge.invoke().unwrap();
//! println!("{}", greeting);
//! ```

// Public modules
pub mod binding;
pub mod bridge;
pub mod config;
pub mod context;
pub mod loader;
pub mod types;

// Re-export main types for convenience
pub use binding::{symbol_name, FunctionBinding};
pub use bridge::Bridge;
pub use config::{BridgeConfig, DEFAULT_CONTEXT_INIT_SYMBOL};
pub use context::ContextRegistry;
pub use loader::{LibraryHandle, LibraryLoader};
pub use types::{BridgeError, BridgeState, NativeContext, Result};

// Internal modules (not exposed in public API)
mod ffi;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
