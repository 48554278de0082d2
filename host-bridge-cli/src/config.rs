//! Configuration loading and parsing

use anyhow::{Context, Result};
use host_bridge::{BridgeConfig, NativeContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub library: LibraryConfig,
    pub binding: BindingConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Logical library name (platform artifact resolution is the loader's job)
    pub name: String,
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingConfig {
    pub declaring_type: String,
    pub method: String,
    /// Explicit symbol override (skips the naming convention)
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub symbol_prefix: Option<String>,
    #[serde(default)]
    pub context_init_symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    pub app_name: String,
    pub data_dir: PathBuf,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl AppConfig {
    /// Split into the bridge configuration and the context to stage
    pub fn into_parts(self) -> (BridgeConfig, NativeContext) {
        let mut bridge = BridgeConfig::new(
            self.library.name,
            self.binding.declaring_type,
            self.binding.method,
        );
        for path in self.library.search_paths {
            bridge = bridge.add_search_path(path);
        }
        if let Some(prefix) = self.binding.symbol_prefix {
            bridge = bridge.with_symbol_prefix(prefix);
        }
        if let Some(symbol) = self.binding.symbol {
            bridge = bridge.with_symbol(symbol);
        }
        if let Some(init) = self.binding.context_init_symbol {
            bridge = bridge.with_context_init_symbol(init);
        }

        let mut context = NativeContext::new(self.context.app_name, self.context.data_dir);
        context.properties = self.context.properties;

        (bridge, context)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
