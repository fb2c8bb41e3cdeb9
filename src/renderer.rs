//! Renderer: one indirect instanced draw per frame
//!
//! The instance count is never passed from the host. It lives in the
//! draw-args buffer written at initialisation, so the draw is correct for
//! whatever node count the GPU buffers were sized for.

use crate::assets::{Material, MaterialPropertyBlock, Mesh};
use crate::backend::{GpuBackend, IndirectDraw};
use crate::buffers::NodeBuffers;
use crate::gpu::types::MaterialUniforms;
use crate::transform::{Bounds, Transform};

/// Submits the node draw
#[derive(Debug, Default)]
pub struct Renderer {
    draws: u64,
}

impl Renderer {
    /// A renderer that has drawn nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws submitted since creation
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Submit the draw for the current frame.
    ///
    /// Binds the "read" node buffer (the one the stepper just wrote) as
    /// `_NodeList`, sets `_Scale` and the object matrices, and draws from
    /// offset 0 of the draw-args buffer. Culling uses a box of five times the
    /// object's scale around its origin.
    #[allow(clippy::too_many_arguments)]
    pub fn draw<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        buffers: &NodeBuffers,
        mesh: &Mesh,
        material: &Material,
        properties: &MaterialPropertyBlock,
        scale: f32,
        transform: &Transform,
    ) {
        let uniforms = MaterialUniforms {
            local_to_world: transform.local_to_world(),
            world_to_local: transform.world_to_local(),
            scale,
            unique_id: properties.unique_id,
            _padding: [0.0; 2],
        };

        backend.draw_indirect(&IndirectDraw {
            mesh,
            material,
            node_buffer: buffers.nodes.read(),
            draw_args: buffers.draw_args,
            args_offset: 0,
            uniforms,
            properties,
            bounds: Bounds::for_transform(transform),
            cast_shadows: true,
            receive_shadows: true,
        });
        self.draws += 1;

        tracing::trace!(draw = self.draws, nodes = %buffers.nodes.read(), "drew noise ball");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Command, RecordingBackend};
    use crate::buffers::BufferManager;

    #[test]
    fn test_draw_reads_args_from_buffer() {
        let mut backend = RecordingBackend::new();
        let mut manager = BufferManager::new();
        let mesh = Mesh::default();
        let buffers = manager.initialize(&mut backend, 256, mesh.index_count());

        let mut renderer = Renderer::new();
        renderer.draw(
            &mut backend,
            &buffers,
            &mesh,
            &Material::nodes(),
            manager.properties(),
            0.25,
            &Transform::from_translation([1.0, 0.0, 0.0]),
        );

        let Some(Command::DrawIndirect {
            node_buffer,
            draw_args,
            args,
            scale,
            bounds,
            ..
        }) = backend.commands().last()
        else {
            panic!("expected a draw");
        };
        assert_eq!(*node_buffer, buffers.nodes.read());
        assert_eq!(*draw_args, buffers.draw_args);
        assert_eq!(args.to_words(), [mesh.index_count(), 256, 0, 0, 0]);
        assert_eq!(*scale, 0.25);
        assert_eq!(bounds.center, [1.0, 0.0, 0.0]);
        assert_eq!(bounds.size(), [5.0, 5.0, 5.0]);
        assert_eq!(renderer.draws(), 1);
    }

    #[test]
    fn test_draw_does_not_touch_buffers() {
        let mut backend = RecordingBackend::new();
        let mut manager = BufferManager::new();
        let mesh = Mesh::default();
        let buffers = manager.initialize(&mut backend, 64, mesh.index_count());
        let before = backend.commands().len();

        Renderer::new().draw(
            &mut backend,
            &buffers,
            &mesh,
            &Material::nodes(),
            manager.properties(),
            0.1,
            &Transform::default(),
        );

        assert_eq!(backend.commands().len(), before + 1);
        assert_eq!(backend.live_buffer_count(), 4);
    }
}
