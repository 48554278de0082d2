//! Marshalling layer for the interop boundary
//!
//! This module owns the wire contract between the host and the native module:
//! the C layout of the pushed application context, the entry-point signatures,
//! and the string copy rules. Returned strings are always copied into
//! host-owned storage (copy-on-return); pushed context strings are backed by
//! host-owned buffers that live as long as the bridge does.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::types::{BridgeError, NativeContext, Result};

/// C layout of the application context pushed across the boundary
///
/// All strings are NUL-terminated and owned by the host; `properties` points
/// at `property_count * 2` entries of alternating key/value strings. The
/// native side must copy anything it wants to keep past the initialization
/// call, although the host in fact keeps these buffers alive for the life of
/// the bridge.
#[repr(C)]
pub struct RawNativeContext {
    pub app_name: *const c_char,
    pub data_dir: *const c_char,
    pub properties: *const *const c_char,
    pub property_count: usize,
}

/// Context-init entry point: receives the context, returns 0 on success
pub type InitContextFn = unsafe extern "C" fn(*const RawNativeContext) -> i32;

/// String-returning entry point: the single declared call shape of the bridge
pub type StringFn = unsafe extern "C" fn() -> *const c_char;

/// Copy a native string into host-owned storage
///
/// A null pointer is a marshalling error rather than an empty string; invalid
/// UTF-8 is copied lossily so the caller always sees a well-formed string.
/// The native buffer is left untouched (the host never frees it).
pub fn copy_c_string(ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(BridgeError::Marshal(
            "native function returned a null string".to_string(),
        ));
    }

    // Safety: non-null and NUL-terminated per the declared contract; the copy
    // completes before control returns to code that could invalidate it.
    let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
    Ok(text)
}

/// Host-owned backing storage for a pushed [`RawNativeContext`]
///
/// Held by the bridge from the moment the context crosses the boundary until
/// process teardown, so native code may retain the raw pointers.
pub struct ContextBuffers {
    app_name: CString,
    data_dir: CString,
    // The CStrings own heap buffers, so the pointer table stays valid even
    // when this struct moves.
    _properties: Vec<CString>,
    property_ptrs: Vec<*const c_char>,
}

impl ContextBuffers {
    /// Marshal a context into C-compatible buffers
    ///
    /// Fails if any field contains an interior NUL byte, which cannot be
    /// represented in a NUL-terminated string.
    pub fn new(ctx: &NativeContext) -> Result<Self> {
        let app_name = to_c_string("app_name", &ctx.app_name)?;
        let data_dir = to_c_string("data_dir", &ctx.data_dir.to_string_lossy())?;

        let mut properties = Vec::with_capacity(ctx.properties.len() * 2);
        for (key, value) in &ctx.properties {
            properties.push(to_c_string("property key", key)?);
            properties.push(to_c_string("property value", value)?);
        }
        let property_ptrs: Vec<*const c_char> = properties.iter().map(|s| s.as_ptr()).collect();

        Ok(Self {
            app_name,
            data_dir,
            _properties: properties,
            property_ptrs,
        })
    }

    /// Build the C view of these buffers
    ///
    /// The returned struct borrows this storage; it must not outlive `self`.
    pub fn raw(&self) -> RawNativeContext {
        RawNativeContext {
            app_name: self.app_name.as_ptr(),
            data_dir: self.data_dir.as_ptr(),
            properties: self.property_ptrs.as_ptr(),
            property_count: self.property_ptrs.len() / 2,
        }
    }
}

fn to_c_string(field: &str, value: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| BridgeError::Marshal(format!("{} contains an interior NUL byte", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_c_string_rejects_null() {
        assert!(matches!(
            copy_c_string(std::ptr::null()),
            Err(BridgeError::Marshal(_))
        ));
    }

    #[test]
    fn test_copy_c_string_copies() {
        let native = CString::new("Hello from native code").unwrap();
        let copied = copy_c_string(native.as_ptr()).unwrap();
        assert_eq!(copied, "Hello from native code");

        // The copy is independent of the native buffer
        drop(native);
        assert_eq!(copied.len(), 22);
    }

    #[test]
    fn test_context_buffers_layout() {
        let ctx = NativeContext::new("app", "/data")
            .with_property("locale", "en-US")
            .with_property("theme", "dark");
        let buffers = ContextBuffers::new(&ctx).unwrap();
        let raw = buffers.raw();

        assert_eq!(raw.property_count, 2);
        let app_name = copy_c_string(raw.app_name).unwrap();
        assert_eq!(app_name, "app");

        // Keys and values alternate in sorted key order
        let first_key = copy_c_string(unsafe { *raw.properties }).unwrap();
        let first_value = copy_c_string(unsafe { *raw.properties.add(1) }).unwrap();
        assert_eq!(first_key, "locale");
        assert_eq!(first_value, "en-US");
    }

    #[test]
    fn test_context_buffers_reject_interior_nul() {
        let ctx = NativeContext::new("app\0name", "/data");
        assert!(matches!(
            ContextBuffers::new(&ctx),
            Err(BridgeError::Marshal(_))
        ));
    }
}
