//! GPU-side pieces of the noise ball
//!
//! Buffer layouts, bundled WGSL, the instanced mesh and a viewing camera are
//! always available so the headless backend and tests can use them. The wgpu
//! executor is behind the `gpu` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use noiseball::gpu::WgpuBackend;
//! use noiseball::{FrameContext, NoiseBall};
//!
//! let mut backend = WgpuBackend::new(512, 512)?;
//! let mut ball = NoiseBall::builder().with_default_assets().build()?;
//!
//! for frame in 0..120 {
//!     ball.update(&mut backend, &FrameContext::at(frame as f32 / 60.0));
//!     backend.submit();
//! }
//! let pixels = backend.read_pixels()?;
//! ball.teardown(&mut backend);
//! ```

pub mod camera;
pub mod geometry;
pub mod render_shaders;
pub mod shaders;
pub mod types;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use camera::OrbitCamera;
pub use types::{
    CameraUniforms, Edge, IndirectDrawArgs, MaterialUniforms, NodeState, SimulationUniforms,
};
#[cfg(feature = "gpu")]
pub use wgpu_backend::{CLEAR_COLOR, WgpuBackend, create_device};
