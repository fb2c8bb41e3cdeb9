//! Mesh generation for node instances
//!
//! The noise ball draws every node as a copy of one indexed mesh. The default
//! mesh is a small icosphere.

use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;

/// A mesh vertex with position and normal.
///
/// Layout matches the vertex buffer layout of the node material.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Vertex position
    pub position: [f32; 3],
    /// Vertex normal
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// A vertex on the unit sphere (normal equals position)
    pub fn on_unit_sphere(p: [f32; 3]) -> Self {
        let p = normalize(p);
        Self {
            position: p,
            normal: p,
        }
    }
}

const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Generate a unit icosphere.
///
/// Level 0 is the icosahedron (12 vertices, 20 faces); each level splits every
/// triangle into four. Level 1 has 42 vertices and 80 faces.
///
/// ```
/// use noiseball::gpu::geometry::icosphere;
///
/// let (vertices, indices) = icosphere(1);
/// assert_eq!(vertices.len(), 42);
/// assert_eq!(indices.len(), 80 * 3);
/// ```
pub fn icosphere(subdivisions: u32) -> (Vec<MeshVertex>, Vec<u32>) {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut points: Vec<[f32; 3]> = [
        [-1.0, phi, 0.0],
        [1.0, phi, 0.0],
        [-1.0, -phi, 0.0],
        [1.0, -phi, 0.0],
        [0.0, -1.0, phi],
        [0.0, 1.0, phi],
        [0.0, -1.0, -phi],
        [0.0, 1.0, -phi],
        [phi, 0.0, -1.0],
        [phi, 0.0, 1.0],
        [-phi, 0.0, -1.0],
        [-phi, 0.0, 1.0],
    ]
    .into_iter()
    .map(normalize)
    .collect();

    let mut faces = ICOSAHEDRON_FACES.to_vec();

    for _ in 0..subdivisions {
        let mut split: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, points: &mut Vec<[f32; 3]>| -> u32 {
            let key = (a.min(b), a.max(b));
            *split.entry(key).or_insert_with(|| {
                let (p, q) = (points[a as usize], points[b as usize]);
                points.push(normalize([
                    (p[0] + q[0]) * 0.5,
                    (p[1] + q[1]) * 0.5,
                    (p[2] + q[2]) * 0.5,
                ]));
                (points.len() - 1) as u32
            })
        };

        faces = faces
            .iter()
            .flat_map(|&[v1, v2, v3]| {
                let a = midpoint(v1, v2, &mut points);
                let b = midpoint(v2, v3, &mut points);
                let c = midpoint(v3, v1, &mut points);
                [[v1, a, c], [v2, b, a], [v3, c, b], [a, b, c]]
            })
            .collect();
    }

    let vertices = points.into_iter().map(MeshVertex::on_unit_sphere).collect();
    let indices = faces.into_iter().flatten().collect();
    (vertices, indices)
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}
