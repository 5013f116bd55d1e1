//! # kernelrun
//!
//! A thin execution runtime over an OpenCL-style accelerator API: it
//! compiles device kernel source, binds host memory to device buffers,
//! dispatches kernel launches, and synchronizes and profiles the resulting
//! asynchronous work.
//!
//! Everything happens inside a caller-owned [`Session`]:
//!
//! - **compile** loads `<name>.cl`, prepends `#define` lines for the
//!   supplied macros, and builds the unit for every device in the lazily
//!   created context. Modules are cached per session by unit name.
//! - **set_arg / transfers** bind arguments in declared order and
//!   materialize device buffers keyed by the host region's identity.
//! - **launch** enqueues an asynchronous N-D range execution and resets the
//!   binding state for the next cycle.
//! - **sync** is the only blocking call: it waits for every outstanding
//!   operation, reports per-operation profiling in enqueue order, and
//!   releases all registered buffers.
//!
//! ## Example
//!
//! ```ignore
//! use kernelrun::prelude::*;
//!
//! let session = Session::builder().kernel_dir("kernels").build();
//! session.compile("vecadd", &["N 1024"], DeviceType::Default)?;
//!
//! let a = vec![1.0f32; 1024];
//! let b = vec![2.0f32; 1024];
//! let mut c = vec![0.0f32; 1024];
//!
//! session.transfer_to_device(&a, AccessMode::ReadOnly)?;
//! session.transfer_to_device(&b, AccessMode::ReadOnly)?;
//! session.transfer_to_device(&c, AccessMode::ReadWrite)?;
//!
//! session.set_arg("vecadd", KernelArg::buffer(&a))?;
//! session.set_arg("vecadd", KernelArg::buffer(&b))?;
//! session.set_arg("vecadd", KernelArg::buffer(&c))?;
//! session.launch("vecadd", 1024, 64)?;
//!
//! session.transfer_from_device(&mut c)?;
//! for record in session.sync()? {
//!     println!("{}: {} ns", record.label, record.elapsed_ns());
//! }
//! ```
//!
//! ## Backends
//!
//! The accelerator itself sits behind the
//! [`AcceleratorBackend`]/[`DeviceContext`] trait seam from
//! `kernelrun-core`. The host backend ([`HostBackend`]) is always available
//! and simulates an in-order profiling queue in-process; it is the default
//! and the one the test suite runs against.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod binding;
mod profile;
mod registry;
mod session;
mod source;

pub use profile::ProfileRecord;
pub use session::{Session, SessionBuilder, BUILD_OPTIONS_ENV};

pub use kernelrun_core::error::{code, resolve_error_code, Result, RuntimeError};
pub use kernelrun_core::types::{
    AccessMode, BuildDiagnostic, BuildStatus, DeviceType, EventTiming, HostId, KernelArg, NdRange,
    ScalarValue,
};
pub use kernelrun_core::{AcceleratorBackend, DeviceContext};
pub use kernelrun_cpu::HostBackend;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        AccessMode, DeviceType, HostBackend, KernelArg, NdRange, ProfileRecord, Result,
        RuntimeError, Session, SessionBuilder,
    };
}
