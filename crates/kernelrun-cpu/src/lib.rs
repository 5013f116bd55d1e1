//! Host backend for kernelrun.
//!
//! This backend runs the whole enqueue pipeline in-process, simulating an
//! in-order accelerator queue. It is primarily used for testing and as a
//! fallback when no accelerator is available.
//!
//! "Compilation" scans the macro-expanded source for `__kernel void`
//! entry-point declarations, which gives the backend real signature
//! introspection (entry-point names and parameter counts). Transfers execute
//! as host copies, launches are timed no-ops over the index space, and every
//! enqueued operation gets nanosecond start/end timestamps from a
//! context-epoch monotonic clock, so profiling output behaves like a real
//! device queue's.
//!
//! The backend offers devices for [`DeviceType::Cpu`] and
//! [`DeviceType::Default`] only; requesting any other type fails with
//! `NoPlatformForType`, leaving no context behind.
//!
//! [`DeviceType::Cpu`]: kernelrun_core::DeviceType::Cpu
//! [`DeviceType::Default`]: kernelrun_core::DeviceType::Default

#![warn(missing_docs)]
#![warn(clippy::all)]

mod context;
mod program;

pub use context::{HostBackend, HostContext};
