//! noiseball - a GPU-driven growing point cloud.
//!
//! A fixed-capacity array of nodes lives entirely in GPU memory as two
//! buffers whose read/write roles swap every frame. A compute kernel advances
//! the nodes from one buffer into the other, and a single indirect instanced
//! draw renders one mesh copy per node, with the instance count taken from a
//! GPU-resident draw record rather than passed from the host.
//!
//! The crate is split along the frame:
//!
//! - [`buffers`]: allocation, sizing and release of the GPU buffers
//! - [`stepper`]: per-frame capacity check, kernel dispatch and buffer swap
//! - [`renderer`]: the indirect draw
//! - [`noise_ball`]: the component tying them to host lifecycle hooks
//!
//! All GPU access goes through the [`GpuBackend`] trait. The
//! [`RecordingBackend`] runs anywhere and is what the tests use; the wgpu
//! backend is available with the `gpu` feature.

pub mod assets;
pub mod backend;
pub mod buffers;
pub mod config;
pub mod error;
pub mod gpu;
pub mod noise_ball;
pub mod renderer;
pub mod stepper;
pub mod transform;

pub use backend::{BufferHandle, Command, GpuBackend, RecordingBackend};
pub use config::NoiseBallConfig;
pub use error::{NoiseBallError, Result};
pub use noise_ball::{FrameContext, FrameReport, NoiseBall, NoiseBallBuilder};
pub use transform::{Bounds, Transform};
