//! Bridge configuration
//!
//! Everything about the bridge that is fixed at build time of the host
//! application lives here: which library to load, which declared method to
//! bind, and how its symbol name is derived. The configuration is read-only
//! once the bridge starts loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::binding::symbol_name;

/// Well-known export the bridge calls to push the context to native code
pub const DEFAULT_CONTEXT_INIT_SYMBOL: &str = "host_bridge_init_context";

fn default_symbol_prefix() -> String {
    "Host".to_string()
}

fn default_context_init_symbol() -> String {
    DEFAULT_CONTEXT_INIT_SYMBOL.to_string()
}

/// Configuration for a [`crate::Bridge`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Logical library name (resolved to a platform artifact by the loader)
    pub library: String,

    /// Fully qualified name of the type declaring the native method
    pub declaring_type: String,

    /// Declared method name
    pub method: String,

    /// Prefix for derived symbol names
    #[serde(default = "default_symbol_prefix")]
    pub symbol_prefix: String,

    /// Explicit symbol override; bypasses the naming convention entirely
    #[serde(default)]
    pub symbol: Option<String>,

    /// Extra library search paths, tried before the platform defaults
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Export the bridge calls to push the context across the boundary
    #[serde(default = "default_context_init_symbol")]
    pub context_init_symbol: String,
}

impl BridgeConfig {
    /// Create a configuration for one declared method
    pub fn new(
        library: impl Into<String>,
        declaring_type: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            library: library.into(),
            declaring_type: declaring_type.into(),
            method: method.into(),
            symbol_prefix: default_symbol_prefix(),
            symbol: None,
            search_paths: Vec::new(),
            context_init_symbol: default_context_init_symbol(),
        }
    }

    /// Builder method: change the symbol-name prefix
    pub fn with_symbol_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.symbol_prefix = prefix.into();
        self
    }

    /// Builder method: bind to an explicit symbol instead of the derived name
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Builder method: add a library search path
    pub fn add_search_path(mut self, path: impl AsRef<Path>) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Builder method: override the context-init export name
    pub fn with_context_init_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.context_init_symbol = symbol.into();
        self
    }

    /// The symbol the invoke binding resolves against
    ///
    /// The explicit override wins; otherwise the name is derived
    /// deterministically from prefix, declaring type, and method.
    pub fn invoke_symbol(&self) -> String {
        match &self.symbol {
            Some(symbol) => symbol.clone(),
            None => symbol_name(&self.symbol_prefix, &self.declaring_type, &self.method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_symbol() {
        let config = BridgeConfig::new("native_lib", "com.example.DemoHost", "stringFromNative");
        assert_eq!(
            config.invoke_symbol(),
            "Host_com_example_DemoHost_stringFromNative"
        );
        assert_eq!(config.context_init_symbol, DEFAULT_CONTEXT_INIT_SYMBOL);
    }

    #[test]
    fn test_symbol_override_wins() {
        let config = BridgeConfig::new("native_lib", "com.example.DemoHost", "stringFromNative")
            .with_symbol("custom_entry_point");
        assert_eq!(config.invoke_symbol(), "custom_entry_point");
    }

    #[test]
    fn test_builder_methods() {
        let config = BridgeConfig::new("native_lib", "com.example.DemoHost", "stringFromNative")
            .with_symbol_prefix("Bridge")
            .add_search_path("/opt/native")
            .with_context_init_symbol("my_init");

        assert_eq!(config.invoke_symbol(), "Bridge_com_example_DemoHost_stringFromNative");
        assert_eq!(config.search_paths, vec![PathBuf::from("/opt/native")]);
        assert_eq!(config.context_init_symbol, "my_init");
    }

    #[test]
    fn test_config_defaults_from_partial_input() {
        // serde fills in the prefix and init symbol when absent
        let json = r#"{
            "library": "native_lib",
            "declaring_type": "com.example.DemoHost",
            "method": "stringFromNative"
        }"#;
        let config: BridgeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.symbol_prefix, "Host");
        assert_eq!(config.context_init_symbol, DEFAULT_CONTEXT_INIT_SYMBOL);
        assert!(config.search_paths.is_empty());
    }
}
