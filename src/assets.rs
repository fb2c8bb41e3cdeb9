//! Render and compute assets the noise ball is built from
//!
//! The component does not own an asset pipeline. It takes a mesh, a material
//! and a compute program from the host and refers to them by name when it
//! issues GPU work. Bundled defaults exist for all three.

use std::borrow::Cow;

use crate::error::{NoiseBallError, Result};
use crate::gpu::geometry::{MeshVertex, icosphere};
use crate::gpu::render_shaders::{FRAGMENT_ENTRY, VERTEX_ENTRY, node_shader};
use crate::gpu::shaders::{INIT_NODES, UPDATE_NODES, noise_ball_kernels};

/// Default icosphere subdivision level for node instances
pub const DEFAULT_MESH_SUBDIVISIONS: u32 = 1;

/// An indexed triangle mesh drawn once per node
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Name used by backends to cache uploaded geometry
    pub name: String,
    /// Vertex data
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a mesh from raw vertices and indices
    pub fn new(name: impl Into<String>, vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
        }
    }

    /// Unit icosphere with the given subdivision level
    pub fn icosphere(subdivisions: u32) -> Self {
        let (vertices, indices) = icosphere(subdivisions);
        Self::new(format!("icosphere-{subdivisions}"), vertices, indices)
    }

    /// Indices per instance, as written into the draw arguments
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::icosphere(DEFAULT_MESH_SUBDIVISIONS)
    }
}

/// A render program that places one mesh copy per node.
///
/// The shader must read `_NodeList`, `_Scale`, `_LocalToWorld` and
/// `_WorldToLocal` (see [`crate::gpu::render_shaders`]).
#[derive(Debug, Clone)]
pub struct Material {
    /// Name used by backends to cache pipelines
    pub name: String,
    /// WGSL source
    pub source: Cow<'static, str>,
    /// Vertex entry point
    pub vertex_entry: &'static str,
    /// Fragment entry point
    pub fragment_entry: &'static str,
}

impl Material {
    /// Create a material from WGSL source using the default entry points
    pub fn new(name: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            vertex_entry: VERTEX_ENTRY,
            fragment_entry: FRAGMENT_ENTRY,
        }
    }

    /// The bundled lit node material
    pub fn nodes() -> Self {
        Self::new("noise-ball-nodes", node_shader())
    }
}

/// The two kernels the stepper dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Fills the write buffer from node indices
    InitNodes,
    /// Advances read into write
    UpdateNodes,
}

impl Kernel {
    /// Entry point name in the compute program
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::InitNodes => INIT_NODES,
            Kernel::UpdateNodes => UPDATE_NODES,
        }
    }

    /// Every kernel a compute program must provide
    pub const ALL: [Kernel; 2] = [Kernel::InitNodes, Kernel::UpdateNodes];
}

/// A compute program providing `InitNodes` and `UpdateNodes`
#[derive(Debug, Clone)]
pub struct ComputeProgram {
    /// Name used by backends to cache pipelines
    pub name: String,
    /// WGSL source
    pub source: Cow<'static, str>,
}

impl ComputeProgram {
    /// Create a program from WGSL source
    pub fn new(name: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// The bundled noise ball kernels
    pub fn noise_ball() -> Self {
        Self::new("noise-ball-kernels", noise_ball_kernels())
    }

    /// Whether the source declares `kernel` as a function
    pub fn has_kernel(&self, kernel: Kernel) -> bool {
        self.source.contains(&format!("fn {}(", kernel.name()))
    }

    /// Check that every kernel the stepper needs is declared
    pub fn validate(&self) -> Result<()> {
        match Kernel::ALL.into_iter().find(|k| !self.has_kernel(*k)) {
            Some(kernel) => Err(NoiseBallError::MissingKernel {
                program: self.name.clone(),
                kernel: kernel.name(),
            }),
            None => Ok(()),
        }
    }
}

/// Per-instance material values that travel with the draw.
///
/// A fresh `unique_id` is assigned on every buffer (re)initialisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialPropertyBlock {
    /// Random tag in `[0, 1)`, exposed to the material as `_UniqueID`
    pub unique_id: f32,
}

impl MaterialPropertyBlock {
    /// A block with a fresh random tag
    pub fn fresh() -> Self {
        let mut bytes = [0u8; 4];
        if let Err(err) = getrandom::getrandom(&mut bytes) {
            tracing::warn!(%err, "no system randomness; deriving unique id from the clock");
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or_default();
            bytes = nanos.to_le_bytes();
        }
        Self::with_unique_id(unit_interval(u32::from_le_bytes(bytes)))
    }

    /// A block with a chosen tag
    pub fn with_unique_id(unique_id: f32) -> Self {
        Self { unique_id }
    }
}

/// Map 32 random bits onto `[0, 1)` using the top 24 (the f32 mantissa width)
fn unit_interval(bits: u32) -> f32 {
    (bits >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mesh_index_count() {
        let mesh = Mesh::default();
        assert_eq!(mesh.index_count(), 80 * 3);
        assert_eq!(mesh.name, "icosphere-1");
    }

    #[test]
    fn test_bundled_program_validates() {
        assert!(ComputeProgram::noise_ball().validate().is_ok());
    }

    #[test]
    fn test_program_without_update_kernel_is_rejected() {
        let program = ComputeProgram::new(
            "half",
            "@compute @workgroup_size(64) fn InitNodes() {}",
        );
        assert!(program.has_kernel(Kernel::InitNodes));
        let err = program.validate().unwrap_err();
        assert!(matches!(
            err,
            NoiseBallError::MissingKernel { kernel: "UpdateNodes", .. }
        ));
    }

    #[test]
    fn test_kernel_names() {
        assert_eq!(Kernel::InitNodes.name(), "InitNodes");
        assert_eq!(Kernel::UpdateNodes.name(), "UpdateNodes");
    }

    #[test]
    fn test_unit_interval_bounds() {
        assert_eq!(unit_interval(0), 0.0);
        assert!(unit_interval(u32::MAX) < 1.0);
    }

    #[test]
    fn test_fresh_block_in_range() {
        let block = MaterialPropertyBlock::fresh();
        assert!((0.0..1.0).contains(&block.unique_id));
    }
}
