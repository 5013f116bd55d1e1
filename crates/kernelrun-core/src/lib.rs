//! # kernelrun-core
//!
//! Core traits and types for the kernelrun accelerator execution runtime.
//!
//! This crate defines the seam between the session-level runtime (module
//! cache, buffer registry, argument binding, synchronization barrier) and
//! the accelerator API that actually compiles and executes kernels:
//!
//! - [`AcceleratorBackend`] - platform scan and device context creation
//! - [`DeviceContext`] - programs, kernels, buffers, and the in-order queue
//! - [`RuntimeError`] - the error taxonomy, each variant carrying a numeric
//!   code in the accelerator API's code space
//!
//! Device-side objects never cross the trait boundary; backends hand out
//! plain id newtypes ([`ProgramId`], [`KernelId`], [`BufferId`], [`EventId`])
//! and keep ownership of the underlying resources.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{AcceleratorBackend, DeviceContext};
pub use error::{resolve_error_code, Result, RuntimeError};
pub use types::{
    AccessMode, BufferId, BuildDiagnostic, BuildStatus, DeviceType, EventId, EventTiming, HostId,
    KernelArg, KernelId, NdRange, ProgramId, ScalarValue,
};
