//! GPU buffer types for the noise ball
//!
//! These types are laid out to be written straight into GPU buffers.
//! All are repr(C) and Pod so they can go through `bytemuck`.

use bytemuck::{Pod, Zeroable};

/// Number of 32-bit words in an indexed indirect draw record
pub const DRAW_ARGS_WORDS: usize = 5;

/// State of one node.
///
/// Layout matches the WGSL `vec4<f32>` element of `NodeListRead`/`NodeListWrite`.
/// The host never reads these back; the type exists for sizing and for tests.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeState {
    /// Position in object space
    pub position: [f32; 3],
    /// Growth phase / current size
    pub size: f32,
}

/// An edge between two nodes.
///
/// Allocated alongside the node buffers but not read by any kernel yet.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Edge {
    /// First node index
    pub a: u32,
    /// Second node index
    pub b: u32,
}

/// Arguments of one indexed, instanced indirect draw.
///
/// Same layout as the GPU's indexed indirect command, so it is written to the
/// draw-args buffer as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct IndirectDrawArgs {
    /// Indices per instance (mesh index count)
    pub index_count_per_instance: u32,
    /// Number of instances (node count)
    pub instance_count: u32,
    /// First index in the index buffer
    pub start_index_location: u32,
    /// Value added to each index
    pub base_vertex_location: u32,
    /// First instance id
    pub start_instance_location: u32,
}

impl IndirectDrawArgs {
    /// Draw `instance_count` copies of a mesh with `index_count` indices
    pub fn new(index_count: u32, instance_count: u32) -> Self {
        Self {
            index_count_per_instance: index_count,
            instance_count,
            start_index_location: 0,
            base_vertex_location: 0,
            start_instance_location: 0,
        }
    }

    /// The record as raw words, in buffer order
    pub fn to_words(&self) -> [u32; DRAW_ARGS_WORDS] {
        [
            self.index_count_per_instance,
            self.instance_count,
            self.start_index_location,
            self.base_vertex_location,
            self.start_instance_location,
        ]
    }
}

/// Uniforms pushed to `UpdateNodes` every step.
///
/// Field order matches the WGSL `Params` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SimulationUniforms {
    /// Host time in seconds
    pub time: f32,
    /// Node scale
    pub scale: f32,
    /// Growth per step
    pub growth_rate: f32,
    /// Maximum node size
    pub max_size: f32,
    /// Number of simulated nodes
    pub num_points: u32,
    /// Active edge count
    pub num_edges: u32,
    /// Padding for 16-byte alignment
    pub _padding: [u32; 2],
}

/// Per-draw material values: `_LocalToWorld`, `_WorldToLocal`, `_Scale`
/// and the property block's unique tag.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Object to world matrix (column-major)
    pub local_to_world: [[f32; 4]; 4],
    /// World to object matrix (column-major)
    pub world_to_local: [[f32; 4]; 4],
    /// Node scale
    pub scale: f32,
    /// Per-instance tag from the material property block
    pub unique_id: f32,
    /// Padding for 16-byte alignment
    pub _padding: [f32; 2],
}

/// Camera matrices for the render target.
///
/// Layout matches the WGSL `CameraUniforms` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniforms {
    /// View matrix (world -> camera space)
    pub view: [[f32; 4]; 4],
    /// Projection matrix (camera -> clip space)
    pub projection: [[f32; 4]; 4],
    /// Camera position in world space (for lighting)
    pub camera_pos: [f32; 3],
    /// Padding for 16-byte alignment
    pub _padding: f32,
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view: IDENTITY,
            projection: IDENTITY,
            camera_pos: [0.0, 0.0, 0.0],
            _padding: 0.0,
        }
    }
}

/// 4x4 identity matrix
pub const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_state_size() {
        // One vec4<f32>
        assert_eq!(std::mem::size_of::<NodeState>(), 16);
    }

    #[test]
    fn test_edge_size() {
        assert_eq!(std::mem::size_of::<Edge>(), 8);
    }

    #[test]
    fn test_draw_args_size() {
        assert_eq!(
            std::mem::size_of::<IndirectDrawArgs>(),
            DRAW_ARGS_WORDS * std::mem::size_of::<u32>()
        );
    }

    #[test]
    fn test_draw_args_layout() {
        let args = IndirectDrawArgs::new(960, 128);
        assert_eq!(args.to_words(), [960, 128, 0, 0, 0]);
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&args));
        assert_eq!(words, &[960, 128, 0, 0, 0]);
    }

    #[test]
    fn test_uniform_sizes_are_aligned() {
        for (name, size) in [
            ("SimulationUniforms", std::mem::size_of::<SimulationUniforms>()),
            ("MaterialUniforms", std::mem::size_of::<MaterialUniforms>()),
            ("CameraUniforms", std::mem::size_of::<CameraUniforms>()),
        ] {
            assert_eq!(size % 16, 0, "{} size {} is not 16-byte aligned", name, size);
        }
    }
}
