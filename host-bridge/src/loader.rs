//! Library loader
//!
//! Resolves logical library names to on-disk artifacts and loads them into the
//! process with libloading. A library is loaded at most once per loader: repeat
//! loads of the same name return the same handle with no duplicate OS-level
//! load, and handles are never unloaded during normal operation.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::types::{BridgeError, Result};

/// A loaded native module
///
/// Owns the underlying library handle for the rest of the process lifetime.
pub struct LibraryHandle {
    /// Logical name the library was requested under
    name: String,
    /// Resolved on-disk path
    path: PathBuf,
    /// The loaded library handle
    library: Library,
}

impl LibraryHandle {
    fn open(name: &str, path: &Path) -> Result<Self> {
        // Safety: loading a dynamic library runs its initializers and makes
        // arbitrary code reachable. The caller vouches for the artifact.
        let library = unsafe {
            Library::new(path).map_err(|e| {
                BridgeError::Load(format!(
                    "failed to load '{}' from {}: {}",
                    name,
                    path.display(),
                    e
                ))
            })?
        };

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            library,
        })
    }

    /// Logical name this library was loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved on-disk path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve an exported symbol to its raw address
    ///
    /// The address stays valid for the lifetime of this handle because the
    /// library is never unloaded. Type safety is the caller's contract; the
    /// bridge pins every address to a declared signature at bind time.
    pub fn symbol_addr(&self, symbol: &str) -> Result<usize> {
        let c_name = CString::new(symbol).map_err(|_| {
            BridgeError::SymbolResolution(format!("invalid symbol name: {}", symbol))
        })?;

        // Safety: the symbol is looked up in a loaded library; a wrong name
        // fails here rather than at call time.
        let sym: Symbol<*const ()> = unsafe {
            self.library.get(c_name.as_bytes_with_nul()).map_err(|e| {
                BridgeError::SymbolResolution(format!(
                    "symbol '{}' not found in '{}': {}",
                    symbol,
                    self.path.display(),
                    e
                ))
            })?
        };

        Ok(*sym as usize)
    }
}

impl std::fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

/// Library loader with platform search paths
pub struct LibraryLoader {
    /// Search paths for library artifacts
    search_paths: Vec<PathBuf>,
    /// Libraries already loaded, by logical name
    libraries: HashMap<String, Arc<LibraryHandle>>,
}

impl LibraryLoader {
    /// Create a new loader with the default platform search paths
    pub fn new() -> Self {
        Self {
            search_paths: default_search_paths(),
            libraries: HashMap::new(),
        }
    }

    /// Add a search path (takes precedence over the platform defaults)
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.insert(0, path.as_ref().to_path_buf());
    }

    /// Resolve a logical name to an on-disk artifact
    ///
    /// Names that are already paths to existing files are used as-is;
    /// otherwise the platform filename (`lib<name>.so`, `lib<name>.dylib`,
    /// `<name>.dll`) is searched for in the search paths.
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.exists() {
            return Some(path.to_path_buf());
        }

        let lib_name = library_filename(name);
        for search_path in &self.search_paths {
            let full_path = search_path.join(&lib_name);
            if full_path.exists() {
                return Some(full_path);
            }
        }

        None
    }

    /// Load a library by logical name
    ///
    /// Idempotent: loading the same name twice returns the same handle and
    /// performs no second OS-level load.
    pub fn load(&mut self, name: &str) -> Result<Arc<LibraryHandle>> {
        if let Some(lib) = self.libraries.get(name) {
            log::debug!("Library '{}' already loaded from {:?}", name, lib.path());
            return Ok(Arc::clone(lib));
        }

        let path = self.find_library(name).ok_or_else(|| {
            BridgeError::Load(format!("library '{}' not found in search paths", name))
        })?;

        log::info!("Loading native library '{}' from {:?}", name, path);
        let handle = Arc::new(LibraryHandle::open(name, &path)?);
        self.libraries.insert(name.to_string(), Arc::clone(&handle));

        Ok(handle)
    }

    /// Get an already-loaded library by logical name
    pub fn get(&self, name: &str) -> Option<Arc<LibraryHandle>> {
        self.libraries.get(name).cloned()
    }

    /// Logical names of all loaded libraries
    pub fn loaded_libraries(&self) -> Vec<&str> {
        self.libraries.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Default library search paths for this platform
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(ld_path) = std::env::var("LD_LIBRARY_PATH") {
            for p in ld_path.split(':').filter(|p| !p.is_empty()) {
                paths.push(PathBuf::from(p));
            }
        }

        paths.push(PathBuf::from("/usr/local/lib"));
        paths.push(PathBuf::from("/usr/lib"));
        paths.push(PathBuf::from("/lib"));
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(dyld_path) = std::env::var("DYLD_LIBRARY_PATH") {
            for p in dyld_path.split(':').filter(|p| !p.is_empty()) {
                paths.push(PathBuf::from(p));
            }
        }

        paths.push(PathBuf::from("/usr/local/lib"));
        paths.push(PathBuf::from("/opt/homebrew/lib"));
        paths.push(PathBuf::from("/usr/lib"));
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(path) = std::env::var("PATH") {
            for p in path.split(';').filter(|p| !p.is_empty()) {
                paths.push(PathBuf::from(p));
            }
        }

        paths.push(PathBuf::from("C:\\Windows\\System32"));
    }

    paths
}

/// Construct the platform-specific filename for a logical library name
pub fn library_filename(name: &str) -> String {
    #[cfg(target_os = "linux")]
    {
        if name.starts_with("lib") && name.ends_with(".so") {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }

    #[cfg(target_os = "macos")]
    {
        if name.starts_with("lib") && name.ends_with(".dylib") {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(target_os = "windows")]
    {
        if name.ends_with(".dll") {
            name.to_string()
        } else {
            format!("{}.dll", name)
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        name.to_string()
    }
}
