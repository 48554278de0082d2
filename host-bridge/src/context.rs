//! Context registry
//!
//! Holds the host application context through its two-phase initialization:
//! first the context is staged host-side, then it is pushed across the interop
//! boundary. The registry's job is to make that ordering checkable: the
//! native-facing accessor fails closed until both phases have completed, so
//! native code can never observe a half-initialized context.

use crate::types::{BridgeError, NativeContext, Result};

/// Registry for the process-wide application context
///
/// Written exactly once (in two phases) and read many times afterwards.
/// The context is immutable after the second phase.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    /// Staged context (set by phase one)
    context: Option<NativeContext>,
    /// True once the context has been pushed to native code (phase two)
    native_initialized: bool,
}

impl ContextRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase one: stage the application context
    ///
    /// Callable exactly once per registry. Calling it again with an equivalent
    /// context is tolerated as a no-op; calling it again with a different
    /// context is a logic error and fails with
    /// [`BridgeError::Reinitialization`] rather than silently rebinding.
    pub fn init_application_context(&mut self, ctx: NativeContext) -> Result<()> {
        match &self.context {
            None => {
                log::info!("Application context staged for '{}'", ctx.app_name);
                self.context = Some(ctx);
                Ok(())
            }
            Some(existing) if *existing == ctx => {
                log::debug!(
                    "Application context for '{}' already staged with an equivalent context",
                    existing.app_name
                );
                Ok(())
            }
            Some(existing) => Err(BridgeError::Reinitialization(format!(
                "context for '{}' is already staged; refusing to rebind to '{}'",
                existing.app_name, ctx.app_name
            ))),
        }
    }

    /// Phase two: record that the context has been pushed to native code
    ///
    /// Only the bridge calls this, after the native init entry point has
    /// accepted the context.
    pub(crate) fn mark_native_initialized(&mut self) -> Result<()> {
        if self.context.is_none() {
            return Err(BridgeError::UninitializedContext(
                "cannot mark native initialization before the context is staged".to_string(),
            ));
        }
        self.native_initialized = true;
        Ok(())
    }

    /// True once phase one has completed
    pub fn is_staged(&self) -> bool {
        self.context.is_some()
    }

    /// True once both phases have completed
    pub fn is_native_initialized(&self) -> bool {
        self.native_initialized
    }

    /// Host-side accessor: available once the context is staged
    pub fn application_context(&self) -> Result<&NativeContext> {
        self.context.as_ref().ok_or_else(|| {
            BridgeError::UninitializedContext(
                "application context has not been initialized".to_string(),
            )
        })
    }

    /// Native-facing accessor: fails closed until both phases have completed
    ///
    /// This is the principal invariant the registry protects. Before the
    /// context has crossed the boundary, reads fail with
    /// [`BridgeError::UninitializedContext`] instead of handing out a context
    /// native code has not been told about.
    pub fn native_context(&self) -> Result<&NativeContext> {
        if !self.native_initialized {
            return Err(BridgeError::UninitializedContext(
                "context has not been pushed to native code".to_string(),
            ));
        }
        self.application_context()
    }
}
