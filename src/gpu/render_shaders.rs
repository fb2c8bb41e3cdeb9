//! WGSL render shader for the default node material
//!
//! Every instance reads its node from `_NodeList[instance_index]`, scales the
//! mesh by `_Scale * size`, and moves it into world space with
//! `_LocalToWorld`.

/// Camera, material and node list bindings
pub const MATERIAL_BINDINGS: &str = r#"
struct CameraUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    camera_pos: vec3<f32>,
    _padding: f32,
}

struct MaterialUniforms {
    _LocalToWorld: mat4x4<f32>,
    _WorldToLocal: mat4x4<f32>,
    _Scale: f32,
    _UniqueID: f32,
    _padding: vec2<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(0) @binding(1) var<uniform> material: MaterialUniforms;
@group(0) @binding(2) var<storage, read> _NodeList: array<vec4<f32>>;
"#;

/// Instanced vertex stage
pub const NODE_VERTEX_SHADER: &str = r#"
struct MeshVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) world_position: vec3<f32>,
    @location(2) phase: f32,
}

@vertex
fn vs_node(mesh: MeshVertex, @builtin(instance_index) instance: u32) -> VertexOutput {
    var out: VertexOutput;

    let node = _NodeList[instance];
    let radius = material._Scale * max(node.w, 0.0);
    let world = material._LocalToWorld * vec4<f32>(node.xyz + mesh.position * radius, 1.0);

    out.clip_position = camera.projection * camera.view * world;
    // Normals go through the inverse transpose
    out.world_normal = (transpose(material._WorldToLocal) * vec4<f32>(mesh.normal, 0.0)).xyz;
    out.world_position = world.xyz;
    out.phase = node.w;
    return out;
}
"#;

/// Blinn-Phong fragment stage, tinted by node phase
pub const NODE_FRAGMENT_SHADER: &str = r#"
struct FragmentInput {
    @location(0) world_normal: vec3<f32>,
    @location(1) world_position: vec3<f32>,
    @location(2) phase: f32,
}

@fragment
fn fs_node(in: FragmentInput) -> @location(0) vec4<f32> {
    let normal = normalize(in.world_normal);
    let light_dir = normalize(vec3<f32>(0.5, 1.0, 0.3));
    let view_dir = normalize(camera.camera_pos - in.world_position);
    let half_dir = normalize(light_dir + view_dir);

    let ambient = 0.3;
    let diffuse = max(dot(normal, light_dir), 0.0) * 0.5;
    let specular = pow(max(dot(normal, half_dir), 0.0), 32.0) * 0.3;

    let warm = vec3<f32>(0.95, 0.55, 0.2);
    let cool = vec3<f32>(0.2, 0.6, 0.95);
    let base = mix(warm, cool, clamp(in.phase * 2.0, 0.0, 1.0));
    let color = base * (ambient + diffuse) + vec3<f32>(specular);
    return vec4<f32>(color, 1.0);
}
"#;

/// Vertex entry point of the node material
pub const VERTEX_ENTRY: &str = "vs_node";

/// Fragment entry point of the node material
pub const FRAGMENT_ENTRY: &str = "fs_node";

/// Full source of the default node material
pub fn node_shader() -> String {
    format!("{MATERIAL_BINDINGS}\n{NODE_VERTEX_SHADER}\n{NODE_FRAGMENT_SHADER}")
}
