//! The host platform layer and its in-process device context.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info};

use kernelrun_core::error::{code, Result, RuntimeError};
use kernelrun_core::types::{
    AccessMode, BufferId, BuildDiagnostic, BuildStatus, DeviceType, EventId, EventTiming, KernelId,
    NdRange, ProgramId, ScalarValue,
};
use kernelrun_core::{AcceleratorBackend, DeviceContext};

use crate::program::{render_binary, render_build_log, scan_entry_points, EntryPoint};

/// The host accelerator platform.
///
/// Offers devices for [`DeviceType::Cpu`] and [`DeviceType::Default`];
/// any other device type fails the platform scan.
pub struct HostBackend {
    devices: usize,
}

impl HostBackend {
    /// Backend with a single host device.
    pub fn new() -> Self {
        Self::with_devices(1)
    }

    /// Backend exposing `devices` identical host devices, for exercising
    /// multi-device paths such as per-device binary export.
    pub fn with_devices(devices: usize) -> Self {
        Self {
            devices: devices.max(1),
        }
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorBackend for HostBackend {
    fn name(&self) -> &'static str {
        "host"
    }

    fn create_context(&self, device_type: DeviceType) -> Result<Box<dyn DeviceContext>> {
        match device_type {
            DeviceType::Cpu | DeviceType::Default => {
                info!(
                    devices = self.devices,
                    "host context created with profiling queue"
                );
                Ok(Box::new(HostContext::new(self.devices)))
            }
            other => Err(RuntimeError::NoPlatformForType(other)),
        }
    }
}

struct HostProgram {
    entries: Vec<EntryPoint>,
    source: String,
}

struct HostKernel {
    name: String,
    arity: usize,
}

struct HostBuffer {
    data: Vec<u8>,
}

#[derive(Default)]
struct State {
    programs: Vec<HostProgram>,
    kernels: Vec<HostKernel>,
    buffers: HashMap<u64, HostBuffer>,
    events: Vec<EventTiming>,
    next_buffer: u64,
    // End timestamp of the most recently enqueued operation; keeps the
    // simulated queue strictly FIFO-ordered even at host speed.
    last_end_ns: u64,
}

/// In-process device context simulating one in-order profiling queue.
pub struct HostContext {
    devices: usize,
    epoch: Instant,
    state: Mutex<State>,
}

impl HostContext {
    fn new(devices: usize) -> Self {
        Self {
            devices,
            epoch: Instant::now(),
            state: Mutex::new(State::default()),
        }
    }

    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Record a completed operation, returning its event.
    fn record(&self, state: &mut State, start_ns: u64) -> EventId {
        let end_ns = self.now_ns().max(start_ns + 1);
        state.last_end_ns = end_ns;
        state.events.push(EventTiming { start_ns, end_ns });
        EventId::new(state.events.len() as u64 - 1)
    }

    fn op_start(&self, state: &State) -> u64 {
        self.now_ns().max(state.last_end_ns + 1)
    }
}

fn lookup_kernel<'a>(state: &'a State, kernel: KernelId) -> Result<&'a HostKernel> {
    state
        .kernels
        .get(kernel.raw() as usize)
        .ok_or_else(|| RuntimeError::backend(code::INVALID_KERNEL, format!("no kernel {}", kernel)))
}

impl DeviceContext for HostContext {
    fn device_count(&self) -> usize {
        self.devices
    }

    fn build_program(
        &self,
        source: &str,
        options: Option<&str>,
    ) -> (Vec<BuildDiagnostic>, Result<ProgramId>) {
        let options = options.unwrap_or("").to_string();
        let scanned = scan_entry_points(source);

        let (status, log) = match &scanned {
            Ok(entries) => (BuildStatus::Success, render_build_log(entries)),
            Err(reason) => (BuildStatus::Failed, reason.clone()),
        };
        let diagnostics = (0..self.devices)
            .map(|i| BuildDiagnostic {
                device: format!("host-{}", i),
                status,
                options: options.clone(),
                log: log.clone(),
            })
            .collect();

        let result = match scanned {
            Ok(entries) => {
                let mut state = self.state.lock();
                state.programs.push(HostProgram {
                    entries,
                    source: source.to_string(),
                });
                Ok(ProgramId::new(state.programs.len() as u64 - 1))
            }
            Err(reason) => Err(RuntimeError::BuildFailure(reason)),
        };

        (diagnostics, result)
    }

    fn kernel(&self, program: ProgramId, entry: &str) -> Result<KernelId> {
        let mut state = self.state.lock();
        let prog = state.programs.get(program.raw() as usize).ok_or_else(|| {
            RuntimeError::backend(code::INVALID_PROGRAM, format!("no program {}", program))
        })?;
        let arity = prog
            .entries
            .iter()
            .find(|e| e.name == entry)
            .map(|e| e.arity)
            .ok_or_else(|| RuntimeError::InvalidKernelName(entry.to_string()))?;

        state.kernels.push(HostKernel {
            name: entry.to_string(),
            arity,
        });
        Ok(KernelId::new(state.kernels.len() as u64 - 1))
    }

    fn kernel_arity(&self, kernel: KernelId) -> Result<Option<usize>> {
        let state = self.state.lock();
        Ok(Some(lookup_kernel(&state, kernel)?.arity))
    }

    fn set_scalar_arg(&self, kernel: KernelId, index: usize, value: ScalarValue) -> Result<()> {
        let state = self.state.lock();
        let k = lookup_kernel(&state, kernel)?;
        if index >= k.arity {
            return Err(RuntimeError::InvalidArgIndex(index));
        }
        debug!(kernel = %k.name, index, size = value.size(), "scalar argument bound");
        Ok(())
    }

    fn set_buffer_arg(&self, kernel: KernelId, index: usize, buffer: BufferId) -> Result<()> {
        let state = self.state.lock();
        let k = lookup_kernel(&state, kernel)?;
        if index >= k.arity {
            return Err(RuntimeError::InvalidArgIndex(index));
        }
        if !state.buffers.contains_key(&buffer.raw()) {
            return Err(RuntimeError::backend(
                code::INVALID_MEM_OBJECT,
                format!("no buffer {}", buffer),
            ));
        }
        debug!(kernel = %k.name, index, %buffer, "buffer argument bound");
        Ok(())
    }

    fn create_buffer(&self, mode: AccessMode, init: &[u8]) -> Result<BufferId> {
        let mut state = self.state.lock();
        let id = state.next_buffer;
        state.next_buffer += 1;
        state.buffers.insert(
            id,
            HostBuffer {
                data: init.to_vec(),
            },
        );
        debug!(buffer = id, bytes = init.len(), ?mode, "device buffer created");
        Ok(BufferId::new(id))
    }

    fn buffer_capacity(&self, buffer: BufferId) -> Result<usize> {
        let state = self.state.lock();
        state
            .buffers
            .get(&buffer.raw())
            .map(|b| b.data.len())
            .ok_or_else(|| {
                RuntimeError::backend(code::INVALID_MEM_OBJECT, format!("no buffer {}", buffer))
            })
    }

    fn enqueue_write(&self, buffer: BufferId, data: &[u8]) -> Result<EventId> {
        let mut state = self.state.lock();
        let start = self.op_start(&state);
        let buf = state.buffers.get_mut(&buffer.raw()).ok_or_else(|| {
            RuntimeError::backend(code::INVALID_MEM_OBJECT, format!("no buffer {}", buffer))
        })?;
        if data.len() != buf.data.len() {
            return Err(RuntimeError::backend(
                code::INVALID_VALUE,
                format!(
                    "write of {} bytes into buffer of capacity {}",
                    data.len(),
                    buf.data.len()
                ),
            ));
        }
        buf.data.copy_from_slice(data);
        Ok(self.record(&mut state, start))
    }

    fn enqueue_read(&self, buffer: BufferId, out: &mut [u8]) -> Result<EventId> {
        let mut state = self.state.lock();
        let start = self.op_start(&state);
        let buf = state.buffers.get(&buffer.raw()).ok_or_else(|| {
            RuntimeError::backend(code::INVALID_MEM_OBJECT, format!("no buffer {}", buffer))
        })?;
        let len = buf.data.len();
        if out.len() < len {
            return Err(RuntimeError::backend(
                code::INVALID_VALUE,
                format!("read of {} bytes into host region of {}", len, out.len()),
            ));
        }
        out[..len].copy_from_slice(&buf.data);
        Ok(self.record(&mut state, start))
    }

    fn enqueue_launch(
        &self,
        kernel: KernelId,
        global: &NdRange,
        local: &NdRange,
    ) -> Result<EventId> {
        let mut state = self.state.lock();
        let name = lookup_kernel(&state, kernel)?.name.clone();

        if global.ndim() != local.ndim() {
            return Err(RuntimeError::backend(
                code::INVALID_WORK_DIMENSION,
                format!("global {} vs local {}", global, local),
            ));
        }
        for (&g, &l) in global.dims().iter().zip(local.dims()) {
            if l == 0 || g % l != 0 {
                return Err(RuntimeError::InvalidWorkGroupSize {
                    global: global.to_string(),
                    local: local.to_string(),
                });
            }
        }

        debug!(kernel = %name, %global, %local, "kernel launch enqueued");
        let start = self.op_start(&state);
        Ok(self.record(&mut state, start))
    }

    fn release_buffer(&self, buffer: BufferId) -> Result<()> {
        let mut state = self.state.lock();
        state.buffers.remove(&buffer.raw()).ok_or_else(|| {
            RuntimeError::backend(code::INVALID_MEM_OBJECT, format!("no buffer {}", buffer))
        })?;
        debug!(%buffer, "device buffer released");
        Ok(())
    }

    fn wait_all(&self, events: &[EventId]) -> Result<()> {
        // Operations complete at enqueue time on the host queue; waiting
        // only validates the handles.
        let state = self.state.lock();
        for ev in events {
            if ev.raw() as usize >= state.events.len() {
                return Err(RuntimeError::backend(
                    code::INVALID_EVENT,
                    format!("no event {}", ev),
                ));
            }
        }
        Ok(())
    }

    fn event_timing(&self, event: EventId) -> Result<EventTiming> {
        let state = self.state.lock();
        state
            .events
            .get(event.raw() as usize)
            .copied()
            .ok_or_else(|| {
                RuntimeError::backend(
                    code::PROFILING_INFO_NOT_AVAILABLE,
                    format!("no event {}", event),
                )
            })
    }

    fn program_binaries(&self, program: ProgramId) -> Result<Vec<Vec<u8>>> {
        let state = self.state.lock();
        let prog = state.programs.get(program.raw() as usize).ok_or_else(|| {
            RuntimeError::backend(code::INVALID_PROGRAM, format!("no program {}", program))
        })?;
        Ok((0..self.devices)
            .map(|i| render_binary(&prog.entries, &prog.source, i))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Box<dyn DeviceContext> {
        HostBackend::new()
            .create_context(DeviceType::Default)
            .unwrap()
    }

    #[test]
    fn test_platform_scan_rejects_gpu() {
        let err = HostBackend::new()
            .create_context(DeviceType::Gpu)
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::NoPlatformForType(DeviceType::Gpu)));
    }

    #[test]
    fn test_build_and_resolve() {
        let ctx = context();
        let (diags, built) =
            ctx.build_program("__kernel void scale(__global float* d, float f) {}", None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].status, BuildStatus::Success);
        let program = built.unwrap();

        let kernel = ctx.kernel(program, "scale").unwrap();
        assert_eq!(ctx.kernel_arity(kernel).unwrap(), Some(2));

        let err = ctx.kernel(program, "missing").err().unwrap();
        assert!(matches!(err, RuntimeError::InvalidKernelName(_)));
    }

    #[test]
    fn test_build_failure_keeps_diagnostics() {
        let ctx = context();
        let (diags, built) = ctx.build_program("int helper() { return 0; }", Some("-DFOO"));
        assert_eq!(diags[0].status, BuildStatus::Failed);
        assert_eq!(diags[0].options, "-DFOO");
        assert!(matches!(built, Err(RuntimeError::BuildFailure(_))));
    }

    #[test]
    fn test_buffer_round_trip() {
        let ctx = context();
        let data: Vec<u8> = (0..64).collect();
        let buf = ctx.create_buffer(AccessMode::ReadWrite, &data).unwrap();
        assert_eq!(ctx.buffer_capacity(buf).unwrap(), 64);

        let updated: Vec<u8> = (0..64).rev().collect();
        ctx.enqueue_write(buf, &updated).unwrap();

        let mut out = vec![0u8; 64];
        ctx.enqueue_read(buf, &mut out).unwrap();
        assert_eq!(out, updated);
    }

    #[test]
    fn test_event_timestamps_fifo_ordered() {
        let ctx = context();
        let data = vec![0u8; 16];
        let buf = ctx.create_buffer(AccessMode::ReadOnly, &data).unwrap();

        let e1 = ctx.enqueue_write(buf, &data).unwrap();
        let e2 = ctx.enqueue_write(buf, &data).unwrap();

        let t1 = ctx.event_timing(e1).unwrap();
        let t2 = ctx.event_timing(e2).unwrap();
        assert!(t1.end_ns > t1.start_ns);
        assert!(t2.start_ns > t1.end_ns);
    }

    #[test]
    fn test_launch_validates_shapes() {
        let ctx = context();
        let (_, built) = ctx.build_program("__kernel void noop() {}", None);
        let kernel = ctx.kernel(built.unwrap(), "noop").unwrap();

        ctx.enqueue_launch(kernel, &NdRange::d1(1024), &NdRange::d1(64))
            .unwrap();

        let err = ctx
            .enqueue_launch(kernel, &NdRange::d1(1000), &NdRange::d1(64))
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::InvalidWorkGroupSize { .. }));

        let err = ctx
            .enqueue_launch(kernel, &NdRange::d2(8, 8), &NdRange::d1(8))
            .err()
            .unwrap();
        assert_eq!(err.code(), code::INVALID_WORK_DIMENSION);
    }

    #[test]
    fn test_arg_index_checked_against_arity() {
        let ctx = context();
        let (_, built) = ctx.build_program("__kernel void scale(__global float* d, float f) {}", None);
        let kernel = ctx.kernel(built.unwrap(), "scale").unwrap();

        ctx.set_scalar_arg(kernel, 1, ScalarValue::F32(2.0)).unwrap();
        let err = ctx
            .set_scalar_arg(kernel, 2, ScalarValue::F32(2.0))
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::InvalidArgIndex(2)));
    }

    #[test]
    fn test_release_buffer_twice_fails() {
        let ctx = context();
        let buf = ctx.create_buffer(AccessMode::ReadOnly, &[0u8; 8]).unwrap();
        ctx.release_buffer(buf).unwrap();
        let err = ctx.release_buffer(buf).err().unwrap();
        assert_eq!(err.code(), code::INVALID_MEM_OBJECT);
    }

    #[test]
    fn test_binaries_one_per_device() {
        let backend = HostBackend::with_devices(2);
        let ctx = backend.create_context(DeviceType::Cpu).unwrap();
        let (_, built) = ctx.build_program("__kernel void noop() {}", None);
        let bins = ctx.program_binaries(built.unwrap()).unwrap();
        assert_eq!(bins.len(), 2);
        assert!(String::from_utf8(bins[1].clone()).unwrap().contains("host-1"));
    }
}
