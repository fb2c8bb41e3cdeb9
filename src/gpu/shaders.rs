//! WGSL compute kernels bundled with the default compute program
//!
//! The program exposes two entry points: `InitNodes` fills `NodeListWrite`
//! from nothing but the node index, and `UpdateNodes` advances every node from
//! `NodeListRead` into `NodeListWrite`. Each invocation touches one node only.

/// Entry point of the initialisation kernel
pub const INIT_NODES: &str = "InitNodes";

/// Entry point of the update kernel
pub const UPDATE_NODES: &str = "UpdateNodes";

/// Bindings and uniform block shared by both kernels
pub const KERNEL_BINDINGS: &str = r#"
struct Params {
    Time: f32,
    Scale: f32,
    GrowthRate: f32,
    MaxSize: f32,
    NumPoints: u32,
    NumEdges: u32,
    _padding0: u32,
    _padding1: u32,
}

@group(0) @binding(0) var<storage, read> NodeListRead: array<vec4<f32>>;
@group(0) @binding(1) var<storage, read_write> NodeListWrite: array<vec4<f32>>;
@group(0) @binding(2) var<uniform> params: Params;
"#;

/// Index-only seeding shared by both kernels
pub const SEED: &str = r#"
fn hash11(n: f32) -> f32 {
    return fract(sin(n) * 43758.5453);
}

// Point on the unit sphere picked from the node index, with a tiny size
fn seed_node(i: u32) -> vec4<f32> {
    let f = f32(i);
    let theta = hash11(f * 12.9898 + 1.0) * 6.2831853;
    let z = hash11(f * 78.233 + 2.0) * 2.0 - 1.0;
    let r = sqrt(max(1.0 - z * z, 0.0));
    return vec4<f32>(r * cos(theta), r * sin(theta), z, 0.001);
}
"#;

/// Initialisation kernel: writes `NodeListWrite` only
pub const INIT_KERNEL: &str = r#"
@compute @workgroup_size(64)
fn InitNodes(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let i = global_id.x;
    if (i >= arrayLength(&NodeListWrite)) {
        return;
    }
    NodeListWrite[i] = seed_node(i);
}
"#;

/// Update kernel: displaces each node with a time-varying field and grows it
pub const UPDATE_KERNEL: &str = r#"
fn field(p: vec3<f32>, t: f32) -> vec3<f32> {
    return vec3<f32>(
        sin(p.y * 1.7 + p.z * 0.9 + t),
        sin(p.z * 1.3 + p.x * 1.1 + t * 1.3),
        sin(p.x * 1.5 + p.y * 0.7 + t * 0.7),
    );
}

@compute @workgroup_size(64)
fn UpdateNodes(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let i = global_id.x;
    if (i >= params.NumPoints) {
        return;
    }

    var node = NodeListRead[i];
    // The slot InitNodes filled is overwritten by the first update; reseed
    if (node.w <= 0.0) {
        node = seed_node(i);
    }

    let size = min(node.w + params.GrowthRate, params.MaxSize);
    var pos = node.xyz + field(node.xyz * 3.0, params.Time) * params.Scale * 0.05;

    // Relax back toward a shell that expands with the node's size
    let len = max(length(pos), 1e-5);
    pos = mix(pos, pos / len * (1.0 + size), 0.1);

    NodeListWrite[i] = vec4<f32>(pos, size);
}
"#;

/// Full source of the default noise ball compute program
pub fn noise_ball_kernels() -> String {
    format!("{KERNEL_BINDINGS}\n{SEED}\n{INIT_KERNEL}\n{UPDATE_KERNEL}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_source_declares_entry_points() {
        let source = noise_ball_kernels();
        assert!(source.contains(&format!("fn {INIT_NODES}(")));
        assert!(source.contains(&format!("fn {UPDATE_NODES}(")));
    }

    #[test]
    fn test_kernel_source_declares_bindings() {
        let source = noise_ball_kernels();
        for name in [
            "NodeListRead",
            "NodeListWrite",
            "Time",
            "Scale",
            "GrowthRate",
            "MaxSize",
            "NumPoints",
            "NumEdges",
        ] {
            assert!(source.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_workgroup_size_matches_thread_group_width() {
        let expected = format!("@workgroup_size({})", crate::config::THREAD_GROUP_WIDTH);
        assert_eq!(noise_ball_kernels().matches(&expected).count(), 2);
    }
}
