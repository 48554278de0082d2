//! Core types for the host bridge library
//!
//! This module defines the fundamental types shared by all bridge components:
//! the bridge lifecycle states, the host application context that is pushed
//! across the interop boundary, and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Lifecycle states of the bridge
///
/// The bridge moves strictly forward through these states during startup:
///
/// ```text
/// Unloaded --load()--> Loaded --init_application_context()--> ContextStaged
///     ContextStaged --init_for_native()--> ContextBound
/// ```
///
/// `ContextBound` is the terminal state; `invoke()` is only permitted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeState {
    /// No native library has been loaded yet
    Unloaded,
    /// The native library is loaded and the invoke symbol is resolved
    Loaded,
    /// The application context is staged host-side but not yet pushed to native code
    ContextStaged,
    /// The context has crossed the boundary; native calls are permitted
    ContextBound,
}

impl BridgeState {
    /// True if `invoke()` is permitted in this state
    pub fn is_ready(&self) -> bool {
        matches!(self, BridgeState::ContextBound)
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Unloaded => write!(f, "Unloaded"),
            BridgeState::Loaded => write!(f, "Loaded"),
            BridgeState::ContextStaged => write!(f, "ContextStaged"),
            BridgeState::ContextBound => write!(f, "ContextBound"),
        }
    }
}

/// Host application context made available to native code
///
/// Exactly one logical instance exists per bridge for the lifetime of the
/// process. It carries the host resources native code may need to reach back
/// into host services: an application name, a data directory, and free-form
/// string properties. It is immutable once pushed across the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeContext {
    /// Host application name
    pub app_name: String,
    /// Directory native code may use for host-side file access
    pub data_dir: PathBuf,
    /// Additional host properties (ordered so equality is well-defined)
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl NativeContext {
    /// Create a new context with an application name and data directory
    pub fn new(app_name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            data_dir: data_dir.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder method: attach a host property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a host property by key
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }
}

/// Errors that can occur while loading, initializing, or invoking the bridge
///
/// All of these are unrecoverable at the point of occurrence: the load and
/// initialization sequence runs once per process and retrying makes no sense.
/// They are surfaced to the caller rather than swallowed.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to load native library: {0}")]
    Load(String),

    #[error("Failed to resolve native symbol: {0}")]
    SymbolResolution(String),

    #[error("Application context already initialized with a different context: {0}")]
    Reinitialization(String),

    #[error("Native library not loaded: {0}")]
    BridgeNotLoaded(String),

    #[error("Application context not initialized: {0}")]
    UninitializedContext(String),

    #[error("Bridge is not ready for native calls (state: {state})")]
    BridgeNotReady {
        /// State the bridge was in when the call was attempted
        state: BridgeState,
    },

    #[error("Native context initialization failed: {0}")]
    NativeInit(String),

    #[error("Failed to marshal value across the native boundary: {0}")]
    Marshal(String),
}
