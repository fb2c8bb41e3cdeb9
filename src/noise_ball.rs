//! The noise ball component
//!
//! Ties the buffer manager, stepper and renderer together behind three host
//! hooks:
//!
//! - [`NoiseBall::validate`] / [`NoiseBall::reconfigure`]: clamp the
//!   configuration whenever it changes.
//! - [`NoiseBall::update`]: once per rendered frame. Capacity check, step,
//!   swap, draw, in that order, all recorded on one backend.
//! - [`NoiseBall::teardown`]: once before the component is dropped. Frees
//!   every GPU buffer.
//!
//! # Example
//!
//! ```
//! use noiseball::{NoiseBall, NoiseBallConfig, FrameContext, RecordingBackend};
//!
//! let mut ball = NoiseBall::builder()
//!     .config(NoiseBallConfig::default().with_max_nodes(128))
//!     .with_default_assets()
//!     .build()
//!     .unwrap();
//!
//! let mut backend = RecordingBackend::new();
//! let report = ball.update(&mut backend, &FrameContext::at(0.0));
//! assert!(report.reinitialized);
//! assert_eq!(report.node_count, 128);
//!
//! ball.teardown(&mut backend);
//! assert_eq!(backend.live_buffer_count(), 0);
//! ```

use crate::assets::{ComputeProgram, Material, MaterialPropertyBlock, Mesh};
use crate::backend::{BufferHandle, GpuBackend};
use crate::buffers::{BufferManager, NodeBuffers};
use crate::config::NoiseBallConfig;
use crate::error::{NoiseBallError, Result};
use crate::renderer::Renderer;
use crate::stepper::{SimulationStepper, StepperState};
use crate::transform::Transform;

/// What the host supplies each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Host time in seconds
    pub time: f32,
    /// Object placement
    pub transform: Transform,
}

impl FrameContext {
    /// Frame at `time` with the identity transform
    pub fn at(time: f32) -> Self {
        Self {
            time,
            transform: Transform::IDENTITY,
        }
    }

    /// Set the object transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// What one call to [`NoiseBall::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Whether buffers were (re)allocated this frame
    pub reinitialized: bool,
    /// Nodes simulated and drawn
    pub node_count: u32,
    /// Node buffer the draw bound
    pub drawn_buffer: BufferHandle,
}

/// Builder validating that every required asset is present
#[derive(Debug, Default)]
pub struct NoiseBallBuilder {
    config: NoiseBallConfig,
    mesh: Option<Mesh>,
    material: Option<Material>,
    compute: Option<ComputeProgram>,
}

impl NoiseBallBuilder {
    /// Set the configuration (validated on build)
    pub fn config(mut self, config: NoiseBallConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the instanced mesh
    pub fn mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Set the node material
    pub fn material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the compute program
    pub fn compute(mut self, compute: ComputeProgram) -> Self {
        self.compute = Some(compute);
        self
    }

    /// Fill any missing asset with the bundled default
    pub fn with_default_assets(mut self) -> Self {
        self.mesh.get_or_insert_with(Mesh::default);
        self.material.get_or_insert_with(Material::nodes);
        self.compute.get_or_insert_with(ComputeProgram::noise_ball);
        self
    }

    /// Build the component.
    ///
    /// Fails if the mesh, material or compute program is missing, or if the
    /// program lacks `InitNodes` or `UpdateNodes`.
    pub fn build(self) -> Result<NoiseBall> {
        let mesh = self.mesh.ok_or(NoiseBallError::MissingAsset("mesh"))?;
        let material = self.material.ok_or(NoiseBallError::MissingAsset("material"))?;
        let compute = self
            .compute
            .ok_or(NoiseBallError::MissingAsset("compute program"))?;
        compute.validate()?;

        Ok(NoiseBall {
            config: self.config.validated(),
            mesh,
            material,
            compute,
            buffers: BufferManager::new(),
            stepper: SimulationStepper::new(),
            renderer: Renderer::new(),
        })
    }
}

/// A GPU-animated, GPU-drawn growing point cloud
#[derive(Debug)]
pub struct NoiseBall {
    config: NoiseBallConfig,
    mesh: Mesh,
    material: Material,
    compute: ComputeProgram,
    buffers: BufferManager,
    stepper: SimulationStepper,
    renderer: Renderer,
}

impl NoiseBall {
    /// Start building a noise ball
    pub fn builder() -> NoiseBallBuilder {
        NoiseBallBuilder::default()
    }

    /// Current configuration
    pub fn config(&self) -> &NoiseBallConfig {
        &self.config
    }

    /// Clamp the configuration to its invariants
    pub fn validate(&mut self) {
        self.config.validate();
    }

    /// Replace the configuration.
    ///
    /// A new node count takes effect on the next [`update`](Self::update),
    /// which reallocates once.
    pub fn reconfigure(&mut self, config: NoiseBallConfig) {
        self.config = config;
        self.validate();
    }

    /// Change only the capacity ceiling
    pub fn set_max_nodes(&mut self, max_nodes: u32) {
        self.config.max_nodes = max_nodes;
        self.validate();
    }

    /// Run one frame: capacity check, step, swap, draw.
    pub fn update<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame: &FrameContext,
    ) -> FrameReport {
        let outcome = self.stepper.step(
            backend,
            &mut self.buffers,
            &self.compute,
            &self.config,
            self.mesh.index_count(),
            frame.time,
        );

        let buffers = outcome.buffers;
        self.renderer.draw(
            backend,
            &buffers,
            &self.mesh,
            &self.material,
            self.buffers.properties(),
            self.config.scale,
            &frame.transform,
        );

        FrameReport {
            reinitialized: outcome.reinitialized,
            node_count: buffers.capacity,
            drawn_buffer: buffers.nodes.read(),
        }
    }

    /// Free every GPU buffer. Safe to call before the first update and more
    /// than once.
    pub fn teardown<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        self.buffers.release(backend);
        self.stepper.reset();
        tracing::debug!(
            steps = self.stepper.steps(),
            draws = self.renderer.draws(),
            "noise ball torn down"
        );
    }

    /// Buffer set currently held, if any
    pub fn buffers(&self) -> Option<&NodeBuffers> {
        self.buffers.buffers()
    }

    /// Stepper lifecycle state
    pub fn state(&self) -> StepperState {
        self.stepper.state()
    }

    /// Active node count (reset to 2 on every initialisation)
    pub fn active_nodes(&self) -> u32 {
        self.buffers.active_nodes()
    }

    /// Active edge count (reset to 1 on every initialisation)
    pub fn active_edges(&self) -> u32 {
        self.buffers.active_edges()
    }

    /// Number of buffer initialisations so far
    pub fn initializations(&self) -> u64 {
        self.buffers.initializations()
    }

    /// Property block sent with the draw
    pub fn properties(&self) -> &MaterialPropertyBlock {
        self.buffers.properties()
    }

    /// The instanced mesh
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl Drop for NoiseBall {
    fn drop(&mut self) {
        if let Some(buffers) = self.buffers.buffers() {
            tracing::warn!(
                capacity = buffers.capacity,
                "noise ball dropped without teardown; its GPU buffers were not released"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    fn ball(max_nodes: u32) -> NoiseBall {
        NoiseBall::builder()
            .config(NoiseBallConfig::default().with_max_nodes(max_nodes))
            .with_default_assets()
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_assets_are_fatal() {
        let err = NoiseBall::builder().build().unwrap_err();
        assert!(matches!(err, NoiseBallError::MissingAsset("mesh")));

        let err = NoiseBall::builder().mesh(Mesh::default()).build().unwrap_err();
        assert!(matches!(err, NoiseBallError::MissingAsset("material")));

        let err = NoiseBall::builder()
            .mesh(Mesh::default())
            .material(Material::nodes())
            .build()
            .unwrap_err();
        assert!(matches!(err, NoiseBallError::MissingAsset("compute program")));
    }

    #[test]
    fn test_program_without_kernels_is_fatal() {
        let err = NoiseBall::builder()
            .compute(ComputeProgram::new("empty", ""))
            .with_default_assets()
            .build()
            .unwrap_err();
        assert!(matches!(err, NoiseBallError::MissingKernel { kernel: "InitNodes", .. }));
    }

    #[test]
    fn test_build_validates_config() {
        let ball = NoiseBall::builder()
            .config(NoiseBallConfig::default().with_max_nodes(3))
            .with_default_assets()
            .build()
            .unwrap();
        assert_eq!(ball.config().max_nodes, 64);
    }

    #[test]
    fn test_update_then_teardown_releases_everything() {
        let mut backend = RecordingBackend::new();
        let mut ball = ball(128);
        for frame in 0..5 {
            ball.update(&mut backend, &FrameContext::at(frame as f32 / 60.0));
        }
        assert_eq!(backend.live_buffer_count(), 4);

        ball.teardown(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
        assert_eq!(ball.state(), StepperState::Uninitialized);
        assert!(ball.buffers().is_none());
    }

    #[test]
    fn test_teardown_twice_is_harmless() {
        let mut backend = RecordingBackend::new();
        let mut ball = ball(64);
        ball.update(&mut backend, &FrameContext::at(0.0));
        ball.teardown(&mut backend);
        ball.teardown(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
    }

    #[test]
    fn test_set_max_nodes_clamps() {
        let mut ball = ball(128);
        ball.set_max_nodes(1);
        assert_eq!(ball.config().max_nodes, 64);
    }

    #[test]
    fn test_report_names_drawn_buffer() {
        let mut backend = RecordingBackend::new();
        let mut ball = ball(64);
        let first = ball.update(&mut backend, &FrameContext::at(0.0));
        let second = ball.update(&mut backend, &FrameContext::at(0.1));
        assert_ne!(first.drawn_buffer, second.drawn_buffer);
        assert!(!second.reinitialized);
        ball.teardown(&mut backend);
    }
}
