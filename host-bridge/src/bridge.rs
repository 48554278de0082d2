//! Main bridge API
//!
//! The [`Bridge`] ties the loader, the context registry, and the function
//! binding together behind the startup state machine. A host application
//! drives it through the one-time sequence `load` →
//! `init_application_context` → `init_for_native`, and may then call
//! `invoke` any number of times.

use std::sync::Arc;

use crate::binding::FunctionBinding;
use crate::config::BridgeConfig;
use crate::context::ContextRegistry;
use crate::ffi::{self, ContextBuffers};
use crate::loader::{LibraryHandle, LibraryLoader};
use crate::types::{BridgeError, BridgeState, NativeContext, Result};

/// The native interop bridge
///
/// Single-threaded by design: the startup transitions take `&mut self` and
/// run once, on the host's startup thread, before anything depending on the
/// bridge becomes interactive. `invoke` takes `&self` and keeps no mutable
/// call state, so repeated calls are independent.
pub struct Bridge {
    config: BridgeConfig,
    loader: LibraryLoader,
    registry: ContextRegistry,
    library: Option<Arc<LibraryHandle>>,
    binding: Option<FunctionBinding>,
    /// Backing storage for the pushed context; lives until the bridge drops
    context_buffers: Option<ContextBuffers>,
    state: BridgeState,
}

impl Bridge {
    /// Create a bridge in the `Unloaded` state
    pub fn new(config: BridgeConfig) -> Self {
        let mut loader = LibraryLoader::new();
        for path in &config.search_paths {
            loader.add_search_path(path);
        }

        Self {
            config,
            loader,
            registry: ContextRegistry::new(),
            library: None,
            binding: None,
            context_buffers: None,
            state: BridgeState::Unloaded,
        }
    }

    /// Load the native library and resolve the declared binding
    ///
    /// Runs before any other bridge operation. Symbol resolution happens here
    /// rather than at first call, so a mismatch between the declared method
    /// and the compiled module fails at load time. Idempotent once loaded.
    ///
    /// Failure is fatal to the caller's startup: a host surface that depends
    /// on the bridge must not become interactive after a load error.
    pub fn load(&mut self) -> Result<()> {
        if self.state != BridgeState::Unloaded {
            log::debug!("Library '{}' already loaded", self.config.library);
            return Ok(());
        }

        let library = self.loader.load(&self.config.library)?;

        let symbol = self.config.invoke_symbol();
        let binding = FunctionBinding::resolve(&library, &symbol)?;
        log::info!(
            "Bound {}::{} to '{}'",
            self.config.declaring_type,
            self.config.method,
            symbol
        );

        self.library = Some(library);
        self.binding = Some(binding);
        self.state = BridgeState::Loaded;
        Ok(())
    }

    /// Stage the application context host-side
    ///
    /// Requires the library to be loaded first; re-staging an equivalent
    /// context is a no-op, a conflicting context fails with
    /// [`BridgeError::Reinitialization`].
    pub fn init_application_context(&mut self, ctx: NativeContext) -> Result<()> {
        if self.state == BridgeState::Unloaded {
            return Err(BridgeError::BridgeNotLoaded(
                "load the native library before initializing the application context".to_string(),
            ));
        }

        self.registry.init_application_context(ctx)?;
        if self.state == BridgeState::Loaded {
            self.state = BridgeState::ContextStaged;
        }
        Ok(())
    }

    /// Push the staged context across the interop boundary
    ///
    /// Must run strictly after [`Bridge::load`] and
    /// [`Bridge::init_application_context`]. Calls the module's context-init
    /// export with the marshalled context; a nonzero status from the native
    /// side fails with [`BridgeError::NativeInit`] and leaves the bridge in
    /// `ContextStaged`. Idempotent once bound.
    pub fn init_for_native(&mut self) -> Result<()> {
        match self.state {
            BridgeState::Unloaded => {
                return Err(BridgeError::BridgeNotLoaded(
                    "load the native library before pushing the context to native code"
                        .to_string(),
                ));
            }
            BridgeState::Loaded => {
                return Err(BridgeError::UninitializedContext(
                    "stage the application context before pushing it to native code".to_string(),
                ));
            }
            BridgeState::ContextBound => {
                log::debug!("Context already pushed to native code");
                return Ok(());
            }
            BridgeState::ContextStaged => {}
        }

        let library = self.library.as_ref().ok_or_else(|| {
            BridgeError::BridgeNotLoaded("no library handle present".to_string())
        })?;

        let addr = library.symbol_addr(&self.config.context_init_symbol)?;
        let buffers = ContextBuffers::new(self.registry.application_context()?)?;
        let raw = buffers.raw();

        // Safety: the address was resolved from the loaded library under the
        // fixed context-init signature, and `raw` borrows buffers that stay
        // alive well past the call.
        let init: ffi::InitContextFn = unsafe { std::mem::transmute(addr) };
        let status = unsafe { init(&raw) };

        if status != 0 {
            return Err(BridgeError::NativeInit(format!(
                "'{}' rejected the context with status {}",
                self.config.context_init_symbol, status
            )));
        }

        // Keep the backing storage alive for native code that retained
        // pointers into it.
        self.context_buffers = Some(buffers);
        self.registry.mark_native_initialized()?;
        self.state = BridgeState::ContextBound;
        log::info!(
            "Context for '{}' pushed to native code",
            self.registry.application_context()?.app_name
        );
        Ok(())
    }

    /// Invoke the declared native method
    ///
    /// Synchronous, blocking, and stateless: no call depends on a previous
    /// one beyond the context established during startup, and the bridge
    /// state is unchanged afterwards. Permitted only in `ContextBound`.
    pub fn invoke(&self) -> Result<String> {
        if !self.state.is_ready() {
            return Err(BridgeError::BridgeNotReady { state: self.state });
        }

        let binding = self
            .binding
            .as_ref()
            .ok_or(BridgeError::BridgeNotReady { state: self.state })?;

        log::debug!("Invoking '{}'", binding.symbol());
        binding.invoke()
    }

    /// Current lifecycle state
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// True once the startup sequence has completed
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// The bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Host-side context accessor (available once staged)
    pub fn application_context(&self) -> Result<&NativeContext> {
        self.registry.application_context()
    }

    /// Native-facing context accessor (fails closed until bound)
    pub fn native_context(&self) -> Result<&NativeContext> {
        self.registry.native_context()
    }

    /// The loaded library handle, if any
    pub fn library(&self) -> Option<&LibraryHandle> {
        self.library.as_deref()
    }
}
