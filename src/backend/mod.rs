//! The seam between the noise ball and a GPU
//!
//! The component never calls a graphics API directly. It allocates buffers,
//! dispatches kernels and submits draws through [`GpuBackend`], and refers to
//! GPU memory only through opaque [`BufferHandle`]s. Two implementations
//! exist:
//!
//! - [`RecordingBackend`]: headless, keeps a command log and per-buffer write
//!   generations. Used by the tests and the `trace` command.
//! - `WgpuBackend` (feature `gpu`): executes everything on a wgpu device.
//!
//! Per-frame operations are infallible. A GPU that fails mid-frame is not
//! something the component can recover from.

mod recording;

pub use recording::{BufferRecord, Command, RecordingBackend};

use crate::assets::{ComputeProgram, Kernel, Material, MaterialPropertyBlock, Mesh};
use crate::gpu::types::{IndirectDrawArgs, MaterialUniforms, SimulationUniforms};
use crate::transform::Bounds;

/// Opaque reference to a GPU buffer owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

impl std::fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a buffer is used for; decides its usage flags on a real device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Node state array, read and written by kernels, read by the material
    Nodes,
    /// Edge array
    Edges,
    /// One indirect draw record
    DrawArgs,
}

/// Description of a buffer to allocate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    /// Debug label
    pub label: &'static str,
    /// Usage
    pub kind: BufferKind,
    /// Number of elements
    pub element_count: u32,
    /// Size of one element in bytes
    pub element_size: u32,
}

impl BufferDesc {
    /// Describe a buffer of `element_count` values of `T`
    pub fn of<T>(label: &'static str, kind: BufferKind, element_count: u32) -> Self {
        Self {
            label,
            kind,
            element_count,
            element_size: std::mem::size_of::<T>() as u32,
        }
    }

    /// Total size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.element_count as u64 * self.element_size as u64
    }
}

/// One compute dispatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelDispatch {
    /// Kernel to run
    pub kernel: Kernel,
    /// Number of thread groups along x
    pub groups: u32,
    /// Buffer bound to `NodeListRead`, if the kernel reads one
    pub read: Option<BufferHandle>,
    /// Buffer bound to `NodeListWrite`
    pub write: BufferHandle,
    /// Uniform block, if the kernel takes one
    pub uniforms: Option<SimulationUniforms>,
}

/// One indirect, instanced, indexed draw
#[derive(Debug, Clone, Copy)]
pub struct IndirectDraw<'a> {
    /// Mesh drawn per instance
    pub mesh: &'a Mesh,
    /// Material placing each instance
    pub material: &'a Material,
    /// Buffer bound to `_NodeList`
    pub node_buffer: BufferHandle,
    /// Buffer holding the draw record
    pub draw_args: BufferHandle,
    /// Byte offset of the record in `draw_args`
    pub args_offset: u64,
    /// Matrices and scale for the material
    pub uniforms: MaterialUniforms,
    /// Per-instance property block
    pub properties: &'a MaterialPropertyBlock,
    /// Culling volume
    pub bounds: Bounds,
    /// Whether the instances cast shadows
    pub cast_shadows: bool,
    /// Whether the instances receive shadows
    pub receive_shadows: bool,
}

/// Operations the noise ball needs from a GPU
pub trait GpuBackend {
    /// Allocate a buffer
    fn create_buffer(&mut self, desc: &BufferDesc) -> BufferHandle;

    /// Upload the draw record into a draw-args buffer
    fn write_draw_args(&mut self, buffer: BufferHandle, args: &IndirectDrawArgs);

    /// Free a buffer. The handle must not be used again.
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Record a compute dispatch from `program`
    fn dispatch(&mut self, program: &ComputeProgram, dispatch: &KernelDispatch);

    /// Record an indirect instanced draw
    fn draw_indirect(&mut self, draw: &IndirectDraw<'_>);
}
