//! Demo native module for the host bridge
//!
//! Plays the role of the separately compiled library the host loads at
//! startup. It exports the context-init entry point plus two string-returning
//! entry points under the bridge's symbol naming convention (prefix `Host`,
//! declaring type `com.example.DemoHost`).
//!
//! The module deliberately depends on nothing from the host crate: like a
//! real foreign library it has its own definition of the C context layout,
//! and the only contract with the host is the ABI.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Mutex;

/// C layout of the pushed application context
///
/// Must match the host's `RawNativeContext`: NUL-terminated strings, with
/// `properties` pointing at `property_count * 2` alternating key/value
/// entries.
#[repr(C)]
pub struct RawNativeContext {
    pub app_name: *const c_char,
    pub data_dir: *const c_char,
    pub properties: *const *const c_char,
    pub property_count: usize,
}

/// Context copied out of the init call; owned by this module
#[derive(PartialEq, Eq)]
struct StoredContext {
    app_name: String,
    data_dir: String,
    properties: Vec<(String, String)>,
}

static CONTEXT: Mutex<Option<StoredContext>> = Mutex::new(None);

/// Backing storage for the last `describeContext` result; the host copies
/// the string before the next call can replace it.
static DESCRIPTION: Mutex<Option<CString>> = Mutex::new(None);

const HELLO: &[u8] = b"Hello from native code\0";

fn lock<T>(mutex: &'static Mutex<T>) -> std::sync::MutexGuard<'static, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn copy_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // Safety: the host guarantees NUL-terminated strings for the duration of
    // the call; everything is copied before returning.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Context-init entry point called by the bridge during startup
///
/// Returns 0 on success, 1 for a null context, 2 for a malformed context,
/// 3 when a different context is already stored. Re-initialization with an
/// equivalent context is accepted and keeps the stored one; the module never
/// silently rebinds to a different context. The context is copied into
/// module-local storage; nothing in the host's buffers is retained.
///
/// # Safety
///
/// `ctx` must be null or point to a valid [`RawNativeContext`] whose strings
/// stay alive for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn host_bridge_init_context(ctx: *const RawNativeContext) -> i32 {
    if ctx.is_null() {
        return 1;
    }
    let ctx = &*ctx;

    let app_name = match copy_string(ctx.app_name) {
        Some(s) => s,
        None => return 2,
    };
    let data_dir = match copy_string(ctx.data_dir) {
        Some(s) => s,
        None => return 2,
    };
    if ctx.properties.is_null() && ctx.property_count > 0 {
        return 2;
    }

    let mut properties = Vec::with_capacity(ctx.property_count);
    for i in 0..ctx.property_count {
        let key = copy_string(*ctx.properties.add(i * 2));
        let value = copy_string(*ctx.properties.add(i * 2 + 1));
        match (key, value) {
            (Some(key), Some(value)) => properties.push((key, value)),
            _ => return 2,
        }
    }

    let incoming = StoredContext {
        app_name,
        data_dir,
        properties,
    };

    let mut slot = lock(&CONTEXT);
    match &*slot {
        Some(existing) if *existing == incoming => 0,
        Some(_) => 3,
        None => {
            *slot = Some(incoming);
            0
        }
    }
}

/// `Host.com.example.DemoHost.stringFromNative`
///
/// The reference binding: returns a constant greeting from module-owned
/// static storage. Performs no I/O and never fails.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn Host_com_example_DemoHost_stringFromNative() -> *const c_char {
    HELLO.as_ptr() as *const c_char
}

/// `Host.com.example.DemoHost.describeContext`
///
/// Returns a description of the context received during initialization,
/// proving the context actually crossed the boundary. The returned pointer is
/// module-owned and stays valid until the next call.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn Host_com_example_DemoHost_describeContext() -> *const c_char {
    let text = match &*lock(&CONTEXT) {
        Some(ctx) => format!(
            "app={} data_dir={} properties={}",
            ctx.app_name,
            ctx.data_dir,
            ctx.properties.len()
        ),
        None => "context not initialized".to_string(),
    };

    let c_text = match CString::new(text) {
        Ok(s) => s,
        Err(_) => return std::ptr::null(),
    };

    let mut slot = lock(&DESCRIPTION);
    *slot = Some(c_text);
    match &*slot {
        Some(s) => s.as_ptr(),
        None => std::ptr::null(),
    }
}
