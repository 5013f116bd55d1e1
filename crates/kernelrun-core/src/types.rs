//! Shared value types for the execution runtime.

use std::fmt;

/// Device class requested when the session's context is first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// A discrete or integrated GPU.
    Gpu,
    /// The host CPU exposed as an accelerator device.
    Cpu,
    /// A dedicated accelerator (FPGA, DSP, ...).
    Accelerator,
    /// Whatever the platform considers its default device.
    Default,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceType::Gpu => "gpu",
            DeviceType::Cpu => "cpu",
            DeviceType::Accelerator => "accelerator",
            DeviceType::Default => "default",
        };
        f.write_str(s)
    }
}

/// Access policy for a device buffer.
///
/// Both policies copy the host region's contents into the buffer at
/// creation time; the policy only constrains device-side access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Device reads only.
    ReadOnly,
    /// Device reads and writes.
    ReadWrite,
}

/// Identity of a host memory region, used to key the buffer registry.
///
/// Two slices have the same identity exactly when they start at the same
/// address. The registry never dereferences the address; it is a key only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(usize);

impl HostId {
    /// Identity of the given host slice.
    pub fn of<T>(slice: &[T]) -> Self {
        Self(slice.as_ptr() as usize)
    }

    /// The raw address value.
    pub fn addr(self) -> usize {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

macro_rules! backend_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend-assigned raw id.
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw id value.
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

backend_id! {
    /// Handle to a compiled program owned by a [`DeviceContext`].
    ///
    /// [`DeviceContext`]: crate::backend::DeviceContext
    ProgramId
}

backend_id! {
    /// Handle to a resolved kernel entry point owned by a backend.
    KernelId
}

backend_id! {
    /// Handle to a device buffer owned by a backend.
    BufferId
}

backend_id! {
    /// Handle to one outstanding enqueued operation.
    EventId
}

/// An N-dimensional index-space extent (1 to 3 dimensions).
///
/// Used for both the global iteration domain of a launch and the local
/// work-group shape it is partitioned into. Passed through to the device
/// unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdRange {
    dims: [usize; 3],
    ndim: usize,
}

impl NdRange {
    /// One-dimensional extent.
    pub fn d1(x: usize) -> Self {
        Self {
            dims: [x, 1, 1],
            ndim: 1,
        }
    }

    /// Two-dimensional extent.
    pub fn d2(x: usize, y: usize) -> Self {
        Self {
            dims: [x, y, 1],
            ndim: 2,
        }
    }

    /// Three-dimensional extent.
    pub fn d3(x: usize, y: usize, z: usize) -> Self {
        Self {
            dims: [x, y, z],
            ndim: 3,
        }
    }

    /// Number of dimensions (1 to 3).
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// The extents of the used dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.ndim]
    }

    /// Total number of index points.
    pub fn size(&self) -> usize {
        self.dims().iter().product()
    }
}

impl From<usize> for NdRange {
    fn from(x: usize) -> Self {
        Self::d1(x)
    }
}

impl From<(usize, usize)> for NdRange {
    fn from((x, y): (usize, usize)) -> Self {
        Self::d2(x, y)
    }
}

impl From<(usize, usize, usize)> for NdRange {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self::d3(x, y, z)
    }
}

impl fmt::Display for NdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, ")")
    }
}

/// A scalar kernel argument value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    /// 32-bit signed integer.
    I32(i32),
    /// 32-bit unsigned integer.
    U32(u32),
    /// 64-bit signed integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
}

impl ScalarValue {
    /// Size of the value in bytes, as bound into the argument slot.
    pub fn size(&self) -> usize {
        match self {
            ScalarValue::I32(_) | ScalarValue::U32(_) | ScalarValue::F32(_) => 4,
            ScalarValue::I64(_) | ScalarValue::F64(_) => 8,
        }
    }
}

/// A kernel argument, dispatched by kind at bind time.
///
/// Scalars are bound directly into the next argument slot; a `Buffer`
/// argument names a host region whose registered device buffer is bound
/// instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelArg {
    /// 32-bit signed integer scalar.
    Int(i32),
    /// 32-bit unsigned integer scalar.
    Uint(u32),
    /// 64-bit signed integer scalar.
    Long(i64),
    /// 32-bit float scalar.
    Float(f32),
    /// 64-bit float scalar.
    Double(f64),
    /// The device buffer registered under this host identity.
    Buffer(HostId),
}

impl KernelArg {
    /// Buffer argument keyed by the identity of `slice`.
    ///
    /// The slice must have been materialized or transferred before the
    /// launch that consumes this argument.
    pub fn buffer<T>(slice: &[T]) -> Self {
        Self::Buffer(HostId::of(slice))
    }

    /// The scalar value, if this argument is scalar-kinded.
    pub fn as_scalar(&self) -> Option<ScalarValue> {
        match *self {
            KernelArg::Int(v) => Some(ScalarValue::I32(v)),
            KernelArg::Uint(v) => Some(ScalarValue::U32(v)),
            KernelArg::Long(v) => Some(ScalarValue::I64(v)),
            KernelArg::Float(v) => Some(ScalarValue::F32(v)),
            KernelArg::Double(v) => Some(ScalarValue::F64(v)),
            KernelArg::Buffer(_) => None,
        }
    }
}

/// Device-reported start and end timestamps for one completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTiming {
    /// Nanoseconds at which the operation started executing.
    pub start_ns: u64,
    /// Nanoseconds at which the operation finished.
    pub end_ns: u64,
}

impl EventTiming {
    /// Elapsed device time in nanoseconds.
    pub fn elapsed_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }
}

/// Outcome of building a program for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Compilation succeeded on this device.
    Success,
    /// Compilation failed on this device.
    Failed,
}

/// Per-device build diagnostics, surfaced on success and failure alike.
#[derive(Debug, Clone)]
pub struct BuildDiagnostic {
    /// Name of the device this diagnostic concerns.
    pub device: String,
    /// Build outcome on this device.
    pub status: BuildStatus,
    /// Compiler options the build ran with.
    pub options: String,
    /// Full build log.
    pub log: String,
}
