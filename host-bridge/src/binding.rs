//! Function binding and symbol naming
//!
//! A [`FunctionBinding`] is the declared mapping from a host-visible method to
//! an exported native symbol. The symbol name is a deterministic function of
//! the declaring type name and the method name, so host and native side can
//! agree on it without a registration step. Bindings are resolved once, at
//! load time, and are read-only afterwards.

use std::sync::Arc;

use crate::ffi;
use crate::loader::LibraryHandle;
use crate::types::Result;

/// Compute the exported symbol name for a declared method
///
/// The mangling is deterministic: the prefix, the declaring type, and the
/// method name are joined with `_`, package separators (`.` or `/`) in the
/// declaring type become `_`, and characters that would collide with the
/// separator are escaped (`_` becomes `_1`, anything outside ASCII
/// alphanumerics becomes `_0xxxx` with four hex digits).
///
/// ```
/// use host_bridge::binding::symbol_name;
///
/// assert_eq!(
///     symbol_name("Host", "com.example.DemoHost", "stringFromNative"),
///     "Host_com_example_DemoHost_stringFromNative"
/// );
/// ```
pub fn symbol_name(prefix: &str, declaring_type: &str, method: &str) -> String {
    let mut out = String::new();
    mangle_into(&mut out, prefix);
    out.push('_');
    mangle_into(&mut out, declaring_type);
    out.push('_');
    mangle_into(&mut out, method);
    out
}

fn mangle_into(out: &mut String, component: &str) {
    for ch in component.chars() {
        match ch {
            '.' | '/' => out.push('_'),
            '_' => out.push_str("_1"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => {
                // Escape everything else so distinct inputs never collide
                out.push_str(&format!("_0{:04x}", c as u32));
            }
        }
    }
}

/// A resolved binding from a declared method to a native entry point
///
/// The declared signature is fixed at build time: zero arguments, returning a
/// NUL-terminated string. The binding keeps its library alive, so the resolved
/// address stays valid for as long as the binding exists.
pub struct FunctionBinding {
    /// Exported symbol this binding resolved to
    symbol: String,
    /// Raw entry-point address
    addr: usize,
    /// Keeps the module mapped while the binding is live
    library: Arc<LibraryHandle>,
}

impl FunctionBinding {
    /// Resolve a binding against a loaded library
    ///
    /// Fails with [`crate::BridgeError::SymbolResolution`] if the library does
    /// not export the symbol at all; a mismatched signature behind a matching
    /// name cannot be detected here and is part of the native side's contract.
    pub fn resolve(library: &Arc<LibraryHandle>, symbol: &str) -> Result<Self> {
        let addr = library.symbol_addr(symbol)?;
        log::debug!(
            "Resolved symbol '{}' in '{}' at {:#x}",
            symbol,
            library.name(),
            addr
        );

        Ok(Self {
            symbol: symbol.to_string(),
            addr,
            library: Arc::clone(library),
        })
    }

    /// Exported symbol name this binding resolved to
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The library this binding points into
    pub fn library(&self) -> &LibraryHandle {
        &self.library
    }

    /// Invoke the native entry point and copy its string result
    ///
    /// Synchronous and blocking; the call is stateless with respect to the
    /// bridge. The returned text is copied into host-owned storage before this
    /// function returns, so the native side keeps ownership of its buffer and
    /// the host never frees memory it does not own.
    pub fn invoke(&self) -> Result<String> {
        // Safety: the address was resolved from a live library that this
        // binding keeps mapped, and the declared signature is the fixed
        // `() -> *const c_char` contract of the bridge.
        let func: ffi::StringFn = unsafe { std::mem::transmute(self.addr) };
        let ptr = unsafe { func() };

        ffi::copy_c_string(ptr)
    }
}

impl std::fmt::Debug for FunctionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionBinding")
            .field("symbol", &self.symbol)
            .field("library", &self.library.name())
            .finish()
    }
}
