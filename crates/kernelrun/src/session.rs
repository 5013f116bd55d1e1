//! The session runtime: compiled-module cache, argument binding, dispatch,
//! and the synchronization barrier.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use bytemuck::Pod;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use kernelrun_core::error::{Result, RuntimeError};
use kernelrun_core::types::{
    AccessMode, DeviceType, HostId, KernelArg, KernelId, NdRange, ProgramId, ScalarValue,
};
use kernelrun_core::{AcceleratorBackend, DeviceContext};
use kernelrun_cpu::HostBackend;

use crate::binding::BindState;
use crate::profile::{PendingOps, ProfileRecord};
use crate::registry::BufferRegistry;
use crate::source;

/// Environment variable supplying device-compiler flags when the session
/// builder does not set them explicitly. Absence means no extra flags.
pub const BUILD_OPTIONS_ENV: &str = "KERNELRUN_BUILD_OPTIONS";

/// One compiled source unit, cached for the session's lifetime.
///
/// Keyed by source-unit name only; the macro set is retained so a recompile
/// request with different macros can at least be flagged.
struct Module {
    macros: Vec<String>,
    program: ProgramId,
}

#[derive(Default)]
struct Inner {
    context: Option<Box<dyn DeviceContext>>,
    modules: IndexMap<String, Module>,
    bind: BindState,
    registry: BufferRegistry,
    pending: PendingOps,
}

/// A session over one accelerator context.
///
/// The session owns everything the runtime tracks: the lazily created
/// device context and its profiling queue, the compiled-module table, the
/// active kernel handle and argument slot cursor, the host-pointer-keyed
/// buffer registry, and the outstanding-operation sequence. Sessions are
/// independent of each other; create as many as needed.
///
/// The intended call sequence is compile → bind/transfer → launch,
/// repeated, then [`sync`]. All enqueues are fire-and-forget; [`sync`] is
/// the only blocking call. A session must be driven by one logical caller
/// at a time.
///
/// [`sync`]: Session::sync
pub struct Session {
    backend: Arc<dyn AcceleratorBackend>,
    kernel_dir: PathBuf,
    build_options: Option<String>,
    inner: Mutex<Inner>,
}

impl Session {
    /// Start building a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Compile the source unit `name` against a device context of the given
    /// type, creating the context on first call.
    ///
    /// The unit is loaded from `<kernel_dir>/<name>.cl`; each macro entry
    /// becomes a `#define` line prepended in reverse of the supplied order.
    /// Build diagnostics for every device are logged on success and failure
    /// alike.
    ///
    /// The context is created exactly once: later calls reuse it even if
    /// they request a different device type. The module cache is keyed by
    /// `name` only; recompiling a cached name returns the cached build, with
    /// a warning when the macro set differs.
    pub fn compile(&self, name: &str, macros: &[&str], device_type: DeviceType) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if inner.context.is_none() {
            info!(backend = self.backend.name(), %device_type, "creating device context");
            inner.context = Some(self.backend.create_context(device_type)?);
        }

        if let Some(module) = inner.modules.get(name) {
            if module.macros != macros {
                warn!(
                    module = name,
                    cached = ?module.macros,
                    requested = ?macros,
                    "recompile requested with a different macro set; cached build reused"
                );
            } else {
                debug!(module = name, "module already compiled, reusing");
            }
            return Ok(());
        }

        let mut src = source::load(&self.kernel_dir, name)?;
        source::inject_macros(&mut src, macros);

        let options = self
            .build_options
            .clone()
            .or_else(|| env::var(BUILD_OPTIONS_ENV).ok());

        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        let (diagnostics, built) = ctx.build_program(&src, options.as_deref());
        for d in &diagnostics {
            info!(
                device = %d.device,
                status = ?d.status,
                options = %d.options,
                "build status"
            );
            info!(device = %d.device, "build log:\n{}", d.log);
        }
        let program = built?;

        inner.modules.insert(
            name.to_string(),
            Module {
                macros: macros.iter().map(|m| m.to_string()).collect(),
                program,
            },
        );
        info!(module = name, "module compiled");
        Ok(())
    }

    /// Bind the next argument of the current launch cycle.
    ///
    /// The first bind after a launch (or after session creation) resolves
    /// `kernel_name` across the compiled modules; once a kernel is active,
    /// further binds reuse it and `kernel_name` is ignored until the next
    /// launch resets the cycle. Buffer arguments must have been registered
    /// via [`allocate`] or [`transfer_to_device`] first.
    ///
    /// Binds must arrive in the kernel's declared parameter order; nothing
    /// checks types per slot.
    ///
    /// [`allocate`]: Session::allocate
    /// [`transfer_to_device`]: Session::transfer_to_device
    pub fn set_arg(&self, kernel_name: &str, arg: KernelArg) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        let kernel = resolve_kernel(ctx, &inner.modules, &mut inner.bind, kernel_name)?;

        let slot = inner.bind.cursor;
        match arg {
            KernelArg::Buffer(host) => {
                let buffer = inner.registry.get(host)?;
                ctx.set_buffer_arg(kernel, slot, buffer)?;
            }
            KernelArg::Int(v) => ctx.set_scalar_arg(kernel, slot, ScalarValue::I32(v))?,
            KernelArg::Uint(v) => ctx.set_scalar_arg(kernel, slot, ScalarValue::U32(v))?,
            KernelArg::Long(v) => ctx.set_scalar_arg(kernel, slot, ScalarValue::I64(v))?,
            KernelArg::Float(v) => ctx.set_scalar_arg(kernel, slot, ScalarValue::F32(v))?,
            KernelArg::Double(v) => ctx.set_scalar_arg(kernel, slot, ScalarValue::F64(v))?,
        }
        inner.bind.cursor += 1;
        Ok(())
    }

    /// Materialize a device buffer mirroring `host`, initialized by copying
    /// its current contents.
    ///
    /// Always allocates a new buffer; re-registering the same host region
    /// overwrites the registry entry without releasing the previous buffer.
    pub fn allocate<T: Pod>(&self, host: &[T], mode: AccessMode) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        register(&mut inner.registry, ctx, host, mode)?;
        Ok(())
    }

    /// Materialize a device buffer for `host` and enqueue an asynchronous
    /// write of its current contents, recorded as `"transferToDevice"`.
    pub fn transfer_to_device<T: Pod>(&self, host: &[T], mode: AccessMode) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        let buffer = register(&mut inner.registry, ctx, host, mode)?;
        let event = ctx.enqueue_write(buffer, bytemuck::cast_slice(host))?;
        inner.pending.push("transferToDevice", event);
        Ok(())
    }

    /// Enqueue an asynchronous read of the registered buffer's full capacity
    /// back into `host`, recorded as `"transferFromDevice"`.
    ///
    /// Fails with `UnknownBuffer` when no buffer is registered for `host`.
    pub fn transfer_from_device<T: Pod>(&self, host: &mut [T]) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        let buffer = inner.registry.get(HostId::of(host))?;
        let event = ctx.enqueue_read(buffer, bytemuck::cast_slice_mut(host))?;
        inner.pending.push("transferFromDevice", event);
        Ok(())
    }

    /// Enqueue an asynchronous kernel execution over the `global` index
    /// space, partitioned into work-groups of `local`, then reset the
    /// binding state so the next bind cycle starts fresh.
    ///
    /// When the backend exposes signature introspection, the bound slot
    /// count is checked against the kernel's declared parameter count and a
    /// mismatch fails with `InvalidKernelArgs`. Returns once enqueued; does
    /// not block.
    pub fn launch(
        &self,
        kernel_name: &str,
        global: impl Into<NdRange>,
        local: impl Into<NdRange>,
    ) -> Result<()> {
        let global = global.into();
        let local = local.into();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        let kernel = resolve_kernel(ctx, &inner.modules, &mut inner.bind, kernel_name)?;

        if let Some(arity) = ctx.kernel_arity(kernel)? {
            if inner.bind.cursor != arity {
                return Err(RuntimeError::InvalidKernelArgs {
                    name: kernel_name.to_string(),
                    expected: arity,
                    bound: inner.bind.cursor,
                });
            }
        }

        let event = ctx.enqueue_launch(kernel, &global, &local)?;
        inner.pending.push("launch", event);
        // The only place the active kernel and slot cursor are reset.
        inner.bind.reset();
        debug!(kernel = kernel_name, %global, %local, "launch enqueued");
        Ok(())
    }

    /// The barrier: block until every outstanding operation has completed,
    /// report per-operation profiling in enqueue order, then release every
    /// registered buffer and clear the operation sequence.
    ///
    /// This is the only suspension point in the runtime. The profiling
    /// records are also logged, one line per operation.
    pub fn sync(&self) -> Result<Vec<ProfileRecord>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(ctx) = inner.context.as_deref() else {
            // Nothing was ever enqueued; the barrier is trivially satisfied.
            return Ok(Vec::new());
        };

        ctx.wait_all(&inner.pending.events())?;

        let mut records = Vec::new();
        for (label, event) in inner.pending.iter() {
            let timing = ctx.event_timing(event)?;
            info!(
                op = label,
                start_ns = timing.start_ns,
                end_ns = timing.end_ns,
                elapsed_ns = timing.elapsed_ns(),
                "profile"
            );
            records.push(ProfileRecord {
                label: label.to_string(),
                start_ns: timing.start_ns,
                end_ns: timing.end_ns,
            });
        }

        inner.registry.release_all(ctx)?;
        inner.pending.clear();
        Ok(records)
    }

    /// Write the compiled device binary of module `name` next to its source:
    /// `<name>.ptx` for a single device, `<name>_0.ptx`, `<name>_1.ptx`, …
    /// when the context targets several. Returns the written paths.
    pub fn save_binaries(&self, name: &str) -> Result<Vec<PathBuf>> {
        let guard = self.inner.lock();
        let inner = &*guard;
        let ctx = inner
            .context
            .as_deref()
            .ok_or(RuntimeError::ContextNotCreated)?;
        let module = inner
            .modules
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownModule(name.to_string()))?;

        let binaries = ctx.program_binaries(module.program)?;
        let mut written = Vec::with_capacity(binaries.len());
        if binaries.len() == 1 {
            let path = self.kernel_dir.join(format!("{}.ptx", name));
            fs::write(&path, &binaries[0])?;
            written.push(path);
        } else {
            for (i, binary) in binaries.iter().enumerate() {
                let path = self.kernel_dir.join(format!("{}_{}.ptx", name, i));
                fs::write(&path, binary)?;
                written.push(path);
            }
        }
        info!(module = name, files = written.len(), "device binaries saved");
        Ok(written)
    }

    /// Whether the device context has been created yet.
    pub fn has_context(&self) -> bool {
        self.inner.lock().context.is_some()
    }

    /// Number of device buffers currently registered.
    pub fn buffer_count(&self) -> usize {
        self.inner.lock().registry.len()
    }

    /// Whether any operation is outstanding since the last barrier.
    pub fn has_pending_ops(&self) -> bool {
        !self.inner.lock().pending.is_empty()
    }
}

/// Materialize a buffer for `host` and register it, flagging a displaced
/// entry (which is never released here).
fn register<T: Pod>(
    registry: &mut BufferRegistry,
    ctx: &dyn DeviceContext,
    host: &[T],
    mode: AccessMode,
) -> Result<kernelrun_core::types::BufferId> {
    let id = HostId::of(host);
    let buffer = ctx.create_buffer(mode, bytemuck::cast_slice(host))?;
    if let Some(displaced) = registry.insert(id, buffer) {
        warn!(
            host = %id,
            %displaced,
            "host region re-registered; previous device buffer was not released"
        );
    }
    Ok(buffer)
}

/// Resolve the active kernel, selecting one lazily when the previous launch
/// reset it.
///
/// Modules are scanned in insertion order and the first one defining the
/// entry point wins, so resolution is deterministic and caller-controllable
/// by compile order.
fn resolve_kernel(
    ctx: &dyn DeviceContext,
    modules: &IndexMap<String, Module>,
    bind: &mut BindState,
    name: &str,
) -> Result<KernelId> {
    if let Some(kernel) = bind.active {
        return Ok(kernel);
    }
    for (module_name, module) in modules {
        match ctx.kernel(module.program, name) {
            Ok(kernel) => {
                debug!(module = %module_name, kernel = name, "kernel resolved");
                bind.active = Some(kernel);
                return Ok(kernel);
            }
            Err(_) => continue,
        }
    }
    Err(RuntimeError::InvalidKernelName(name.to_string()))
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    backend: Option<Arc<dyn AcceleratorBackend>>,
    kernel_dir: PathBuf,
    build_options: Option<String>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            kernel_dir: PathBuf::from("."),
            build_options: None,
        }
    }
}

impl SessionBuilder {
    /// Accelerator backend to drive. Defaults to the host backend.
    pub fn backend(mut self, backend: Arc<dyn AcceleratorBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Directory kernel source units are loaded from. Defaults to the
    /// current directory.
    pub fn kernel_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.kernel_dir = dir.into();
        self
    }

    /// Device-compiler flags, overriding the [`BUILD_OPTIONS_ENV`]
    /// environment lookup.
    pub fn build_options(mut self, options: impl Into<String>) -> Self {
        self.build_options = Some(options.into());
        self
    }

    /// Build the session. The device context itself is created lazily, on
    /// the first compile call.
    pub fn build(self) -> Session {
        Session {
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(HostBackend::new())),
            kernel_dir: self.kernel_dir,
            build_options: self.build_options,
            inner: Mutex::new(Inner::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let session = Session::builder().build();
        assert!(!session.has_context());
        assert_eq!(session.buffer_count(), 0);
        assert!(!session.has_pending_ops());
    }

    #[test]
    fn test_sync_without_context_is_empty() {
        let session = Session::builder().build();
        let records = session.sync().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_operations_require_context() {
        let session = Session::builder().build();
        let host = vec![0u8; 16];
        let err = session.allocate(&host, AccessMode::ReadOnly).err().unwrap();
        assert!(matches!(err, RuntimeError::ContextNotCreated));
    }
}
