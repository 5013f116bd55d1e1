//! The trait seam between the session runtime and the accelerator API.
//!
//! A backend models the accelerator's platform layer; a [`DeviceContext`]
//! bundles one selected platform, its devices, and a single in-order command
//! queue with profiling enabled. Device-side objects stay owned by the
//! context; callers hold plain id newtypes.
//!
//! Ordering contract: operations enqueued on a context start in FIFO order.
//! Enqueues are fire-and-forget; [`DeviceContext::wait_all`] is the only
//! blocking call.

use crate::error::Result;
use crate::types::{
    AccessMode, BufferId, BuildDiagnostic, DeviceType, EventId, EventTiming, KernelId, NdRange,
    ProgramId, ScalarValue,
};

/// An accelerator platform layer.
///
/// Implementations scan their platforms in enumeration order and build a
/// context around the first platform that offers at least one device of the
/// requested type.
pub trait AcceleratorBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Select a platform offering the requested device type and create a
    /// context over all its devices, with a profiling command queue.
    ///
    /// Fails with `NoPlatformForType` when no platform qualifies; no context
    /// state may be left behind in that case.
    fn create_context(&self, device_type: DeviceType) -> Result<Box<dyn DeviceContext>>;
}

/// One device set plus its in-order profiling command queue.
pub trait DeviceContext: Send + Sync {
    /// Number of devices the context targets.
    fn device_count(&self) -> usize;

    /// Compile `source` for every device in the context.
    ///
    /// Diagnostics are returned for every device regardless of outcome, so
    /// the caller can surface them on success and failure alike.
    fn build_program(
        &self,
        source: &str,
        options: Option<&str>,
    ) -> (Vec<BuildDiagnostic>, Result<ProgramId>);

    /// Resolve an entry point in a compiled program.
    ///
    /// Fails with `InvalidKernelName` when the program does not define it.
    fn kernel(&self, program: ProgramId, entry: &str) -> Result<KernelId>;

    /// Declared parameter count of a kernel, when the backend can
    /// introspect signatures. `None` means the bind/launch contract is
    /// unchecked.
    fn kernel_arity(&self, kernel: KernelId) -> Result<Option<usize>>;

    /// Bind a scalar into an argument slot.
    fn set_scalar_arg(&self, kernel: KernelId, index: usize, value: ScalarValue) -> Result<()>;

    /// Bind a device buffer into an argument slot.
    fn set_buffer_arg(&self, kernel: KernelId, index: usize, buffer: BufferId) -> Result<()>;

    /// Allocate a device buffer initialized from `init`, with the given
    /// access policy. Capacity equals `init.len()`.
    fn create_buffer(&self, mode: AccessMode, init: &[u8]) -> Result<BufferId>;

    /// Capacity of a device buffer in bytes.
    fn buffer_capacity(&self, buffer: BufferId) -> Result<usize>;

    /// Enqueue an asynchronous host-to-device copy of `data`.
    fn enqueue_write(&self, buffer: BufferId, data: &[u8]) -> Result<EventId>;

    /// Enqueue an asynchronous device-to-host copy of the buffer's full
    /// capacity into `out`. `out` must be at least the buffer's capacity.
    fn enqueue_read(&self, buffer: BufferId, out: &mut [u8]) -> Result<EventId>;

    /// Enqueue an asynchronous kernel execution over `global`, partitioned
    /// into work-groups of `local`, with no offset.
    fn enqueue_launch(&self, kernel: KernelId, global: &NdRange, local: &NdRange)
        -> Result<EventId>;

    /// Release one device buffer.
    fn release_buffer(&self, buffer: BufferId) -> Result<()>;

    /// Block until every listed operation has completed on the device.
    fn wait_all(&self, events: &[EventId]) -> Result<()>;

    /// Device-reported timestamps for a completed operation.
    fn event_timing(&self, event: EventId) -> Result<EventTiming>;

    /// Compiled device binaries of a program, one per device.
    fn program_binaries(&self, program: ProgramId) -> Result<Vec<Vec<u8>>>;
}
