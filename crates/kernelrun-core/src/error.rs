//! Error taxonomy for the execution runtime.
//!
//! Every failure carries a numeric code in the accelerator API's code space,
//! plus two runtime extensions beyond it (`FILE_NOT_FOUND`,
//! `NO_PLATFORM_FOR_TYPE`). [`resolve_error_code`] maps any known code to its
//! symbolic name, defaulting to `"unknown"`.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{DeviceType, HostId};

/// Result type alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Numeric error codes, mirroring the accelerator API's own code space.
///
/// The last two entries are runtime extensions outside the API's range.
pub mod code {
    #![allow(missing_docs)]

    pub const DEVICE_NOT_FOUND: i32 = -1;
    pub const DEVICE_NOT_AVAILABLE: i32 = -2;
    pub const COMPILER_NOT_AVAILABLE: i32 = -3;
    pub const MEM_OBJECT_ALLOCATION_FAILURE: i32 = -4;
    pub const OUT_OF_RESOURCES: i32 = -5;
    pub const OUT_OF_HOST_MEMORY: i32 = -6;
    pub const PROFILING_INFO_NOT_AVAILABLE: i32 = -7;
    pub const MEM_COPY_OVERLAP: i32 = -8;
    pub const IMAGE_FORMAT_MISMATCH: i32 = -9;
    pub const IMAGE_FORMAT_NOT_SUPPORTED: i32 = -10;
    pub const BUILD_PROGRAM_FAILURE: i32 = -11;
    pub const MAP_FAILURE: i32 = -12;
    pub const MISALIGNED_SUB_BUFFER_OFFSET: i32 = -13;
    pub const EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST: i32 = -14;
    pub const INVALID_VALUE: i32 = -30;
    pub const INVALID_DEVICE_TYPE: i32 = -31;
    pub const INVALID_PLATFORM: i32 = -32;
    pub const INVALID_DEVICE: i32 = -33;
    pub const INVALID_CONTEXT: i32 = -34;
    pub const INVALID_QUEUE_PROPERTIES: i32 = -35;
    pub const INVALID_COMMAND_QUEUE: i32 = -36;
    pub const INVALID_HOST_PTR: i32 = -37;
    pub const INVALID_MEM_OBJECT: i32 = -38;
    pub const INVALID_IMAGE_FORMAT_DESCRIPTOR: i32 = -39;
    pub const INVALID_IMAGE_SIZE: i32 = -40;
    pub const INVALID_SAMPLER: i32 = -41;
    pub const INVALID_BINARY: i32 = -42;
    pub const INVALID_BUILD_OPTIONS: i32 = -43;
    pub const INVALID_PROGRAM: i32 = -44;
    pub const INVALID_PROGRAM_EXECUTABLE: i32 = -45;
    pub const INVALID_KERNEL_NAME: i32 = -46;
    pub const INVALID_KERNEL_DEFINITION: i32 = -47;
    pub const INVALID_KERNEL: i32 = -48;
    pub const INVALID_ARG_INDEX: i32 = -49;
    pub const INVALID_ARG_VALUE: i32 = -50;
    pub const INVALID_ARG_SIZE: i32 = -51;
    pub const INVALID_KERNEL_ARGS: i32 = -52;
    pub const INVALID_WORK_DIMENSION: i32 = -53;
    pub const INVALID_WORK_GROUP_SIZE: i32 = -54;
    pub const INVALID_WORK_ITEM_SIZE: i32 = -55;
    pub const INVALID_GLOBAL_OFFSET: i32 = -56;
    pub const INVALID_EVENT_WAIT_LIST: i32 = -57;
    pub const INVALID_EVENT: i32 = -58;
    pub const INVALID_OPERATION: i32 = -59;
    pub const INVALID_GL_OBJECT: i32 = -60;
    pub const INVALID_BUFFER_SIZE: i32 = -61;
    pub const INVALID_MIP_LEVEL: i32 = -62;
    pub const INVALID_GLOBAL_WORK_SIZE: i32 = -63;
    pub const INVALID_PROPERTY: i32 = -64;
    pub const INVALID_GL_SHAREGROUP_REFERENCE_KHR: i32 = -1000;
    pub const PLATFORM_NOT_FOUND_KHR: i32 = -1001;

    // Runtime extensions beyond the accelerator API's own codes.
    pub const FILE_NOT_FOUND: i32 = -128;
    pub const NO_PLATFORM_FOR_TYPE: i32 = -129;
}

/// Runtime error type.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Kernel source file does not exist.
    #[error("kernel source not found: {0}")]
    FileNotFound(PathBuf),

    /// No platform offers a device of the requested type.
    #[error("no platform found for device type {0}")]
    NoPlatformForType(DeviceType),

    /// Device compilation of a source unit failed. Build diagnostics are
    /// surfaced on the log channel before this propagates.
    #[error("program build failed: {0}")]
    BuildFailure(String),

    /// No device buffer is registered for the given host region.
    #[error("no device buffer registered for host region {0}")]
    UnknownBuffer(HostId),

    /// No compiled module defines the requested entry point.
    #[error("no compiled module defines kernel '{0}'")]
    InvalidKernelName(String),

    /// Bound argument count does not match the kernel's declared signature.
    #[error("kernel '{name}' declares {expected} parameters but {bound} were bound")]
    InvalidKernelArgs {
        /// Entry point name.
        name: String,
        /// Parameter count declared by the compiled kernel.
        expected: usize,
        /// Slots bound since the last launch.
        bound: usize,
    },

    /// Argument slot index is outside the kernel's declared signature.
    #[error("invalid argument index {0}")]
    InvalidArgIndex(usize),

    /// Argument value was rejected by the device.
    #[error("invalid argument value at index {0}")]
    InvalidArgValue(usize),

    /// Operation issued before any module was compiled.
    #[error("no device context; compile a module first")]
    ContextNotCreated,

    /// No module is compiled under the given source-unit name.
    #[error("no compiled module named '{0}'")]
    UnknownModule(String),

    /// Work-group shape does not partition the global index space.
    #[error("local shape {local} does not divide global shape {global}")]
    InvalidWorkGroupSize {
        /// Global index-space extent.
        global: String,
        /// Local work-group extent.
        local: String,
    },

    /// An error reported by the accelerator backend itself.
    #[error("backend error ({code}): {message}")]
    Backend {
        /// Numeric code in the accelerator API's code space.
        code: i32,
        /// Backend-supplied detail.
        message: String,
    },

    /// Host-side I/O failure (binary export, source loading internals).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Construct a backend error from a raw code and message.
    pub fn backend(code: i32, message: impl Into<String>) -> Self {
        Self::Backend {
            code,
            message: message.into(),
        }
    }

    /// The numeric code carried by this failure.
    pub fn code(&self) -> i32 {
        match self {
            Self::FileNotFound(_) => code::FILE_NOT_FOUND,
            Self::NoPlatformForType(_) => code::NO_PLATFORM_FOR_TYPE,
            Self::BuildFailure(_) => code::BUILD_PROGRAM_FAILURE,
            Self::UnknownBuffer(_) => code::INVALID_MEM_OBJECT,
            Self::InvalidKernelName(_) => code::INVALID_KERNEL_NAME,
            Self::InvalidKernelArgs { .. } => code::INVALID_KERNEL_ARGS,
            Self::InvalidArgIndex(_) => code::INVALID_ARG_INDEX,
            Self::InvalidArgValue(_) => code::INVALID_ARG_VALUE,
            Self::ContextNotCreated => code::INVALID_CONTEXT,
            Self::UnknownModule(_) => code::INVALID_PROGRAM,
            Self::InvalidWorkGroupSize { .. } => code::INVALID_WORK_GROUP_SIZE,
            Self::Backend { code, .. } => *code,
            Self::Io(_) => code::INVALID_VALUE,
        }
    }

    /// The symbolic name of this failure's numeric code.
    pub fn symbol(&self) -> &'static str {
        resolve_error_code(self.code())
    }
}

/// Map a numeric error code to its symbolic name.
///
/// Unknown codes resolve to `"unknown"`.
pub fn resolve_error_code(error: i32) -> &'static str {
    match error {
        code::DEVICE_NOT_FOUND => "CL_DEVICE_NOT_FOUND",
        code::DEVICE_NOT_AVAILABLE => "CL_DEVICE_NOT_AVAILABLE",
        code::COMPILER_NOT_AVAILABLE => "CL_COMPILER_NOT_AVAILABLE",
        code::MEM_OBJECT_ALLOCATION_FAILURE => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
        code::OUT_OF_RESOURCES => "CL_OUT_OF_RESOURCES",
        code::OUT_OF_HOST_MEMORY => "CL_OUT_OF_HOST_MEMORY",
        code::PROFILING_INFO_NOT_AVAILABLE => "CL_PROFILING_INFO_NOT_AVAILABLE",
        code::MEM_COPY_OVERLAP => "CL_MEM_COPY_OVERLAP",
        code::IMAGE_FORMAT_MISMATCH => "CL_IMAGE_FORMAT_MISMATCH",
        code::IMAGE_FORMAT_NOT_SUPPORTED => "CL_IMAGE_FORMAT_NOT_SUPPORTED",
        code::BUILD_PROGRAM_FAILURE => "CL_BUILD_PROGRAM_FAILURE",
        code::MAP_FAILURE => "CL_MAP_FAILURE",
        code::MISALIGNED_SUB_BUFFER_OFFSET => "CL_MISALIGNED_SUB_BUFFER_OFFSET",
        code::EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST => {
            "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST"
        }
        code::INVALID_VALUE => "CL_INVALID_VALUE",
        code::INVALID_DEVICE_TYPE => "CL_INVALID_DEVICE_TYPE",
        code::INVALID_PLATFORM => "CL_INVALID_PLATFORM",
        code::INVALID_DEVICE => "CL_INVALID_DEVICE",
        code::INVALID_CONTEXT => "CL_INVALID_CONTEXT",
        code::INVALID_QUEUE_PROPERTIES => "CL_INVALID_QUEUE_PROPERTIES",
        code::INVALID_COMMAND_QUEUE => "CL_INVALID_COMMAND_QUEUE",
        code::INVALID_HOST_PTR => "CL_INVALID_HOST_PTR",
        code::INVALID_MEM_OBJECT => "CL_INVALID_MEM_OBJECT",
        code::INVALID_IMAGE_FORMAT_DESCRIPTOR => "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR",
        code::INVALID_IMAGE_SIZE => "CL_INVALID_IMAGE_SIZE",
        code::INVALID_SAMPLER => "CL_INVALID_SAMPLER",
        code::INVALID_BINARY => "CL_INVALID_BINARY",
        code::INVALID_BUILD_OPTIONS => "CL_INVALID_BUILD_OPTIONS",
        code::INVALID_PROGRAM => "CL_INVALID_PROGRAM",
        code::INVALID_PROGRAM_EXECUTABLE => "CL_INVALID_PROGRAM_EXECUTABLE",
        code::INVALID_KERNEL_NAME => "CL_INVALID_KERNEL_NAME",
        code::INVALID_KERNEL_DEFINITION => "CL_INVALID_KERNEL_DEFINITION",
        code::INVALID_KERNEL => "CL_INVALID_KERNEL",
        code::INVALID_ARG_INDEX => "CL_INVALID_ARG_INDEX",
        code::INVALID_ARG_VALUE => "CL_INVALID_ARG_VALUE",
        code::INVALID_ARG_SIZE => "CL_INVALID_ARG_SIZE",
        code::INVALID_KERNEL_ARGS => "CL_INVALID_KERNEL_ARGS",
        code::INVALID_WORK_DIMENSION => "CL_INVALID_WORK_DIMENSION",
        code::INVALID_WORK_GROUP_SIZE => "CL_INVALID_WORK_GROUP_SIZE",
        code::INVALID_WORK_ITEM_SIZE => "CL_INVALID_WORK_ITEM_SIZE",
        code::INVALID_GLOBAL_OFFSET => "CL_INVALID_GLOBAL_OFFSET",
        code::INVALID_EVENT_WAIT_LIST => "CL_INVALID_EVENT_WAIT_LIST",
        code::INVALID_EVENT => "CL_INVALID_EVENT",
        code::INVALID_OPERATION => "CL_INVALID_OPERATION",
        code::INVALID_GL_OBJECT => "CL_INVALID_GL_OBJECT",
        code::INVALID_BUFFER_SIZE => "CL_INVALID_BUFFER_SIZE",
        code::INVALID_MIP_LEVEL => "CL_INVALID_MIP_LEVEL",
        code::INVALID_GLOBAL_WORK_SIZE => "CL_INVALID_GLOBAL_WORK_SIZE",
        code::INVALID_PROPERTY => "CL_INVALID_PROPERTY",
        code::INVALID_GL_SHAREGROUP_REFERENCE_KHR => "CL_INVALID_GL_SHAREGROUP_REFERENCE_KHR",
        code::PLATFORM_NOT_FOUND_KHR => "CL_PLATFORM_NOT_FOUND_KHR",
        code::FILE_NOT_FOUND => "FILE_NOT_FOUND",
        code::NO_PLATFORM_FOR_TYPE => "NO_PLATFORM_FOR_TYPE",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_codes() {
        assert_eq!(resolve_error_code(-1), "CL_DEVICE_NOT_FOUND");
        assert_eq!(resolve_error_code(-11), "CL_BUILD_PROGRAM_FAILURE");
        assert_eq!(resolve_error_code(-46), "CL_INVALID_KERNEL_NAME");
        assert_eq!(resolve_error_code(-1001), "CL_PLATFORM_NOT_FOUND_KHR");
    }

    #[test]
    fn test_resolve_extension_codes() {
        assert_eq!(resolve_error_code(code::FILE_NOT_FOUND), "FILE_NOT_FOUND");
        assert_eq!(
            resolve_error_code(code::NO_PLATFORM_FOR_TYPE),
            "NO_PLATFORM_FOR_TYPE"
        );
    }

    #[test]
    fn test_resolve_unknown_code() {
        assert_eq!(resolve_error_code(42), "unknown");
        assert_eq!(resolve_error_code(-9999), "unknown");
    }

    #[test]
    fn test_error_carries_code() {
        let err = RuntimeError::FileNotFound(PathBuf::from("vecadd.cl"));
        assert_eq!(err.code(), code::FILE_NOT_FOUND);
        assert_eq!(err.symbol(), "FILE_NOT_FOUND");

        let err = RuntimeError::NoPlatformForType(DeviceType::Gpu);
        assert_eq!(err.code(), code::NO_PLATFORM_FOR_TYPE);

        let err = RuntimeError::InvalidKernelName("missing".into());
        assert_eq!(err.symbol(), "CL_INVALID_KERNEL_NAME");
    }

    #[test]
    fn test_backend_error_passthrough() {
        let err = RuntimeError::backend(code::OUT_OF_RESOURCES, "allocation failed");
        assert_eq!(err.code(), -5);
        assert_eq!(err.symbol(), "CL_OUT_OF_RESOURCES");
    }
}
