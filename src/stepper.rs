//! Simulation stepper: per-frame capacity check, update dispatch and swap
//!
//! ```text
//! Uninitialized --(initialize + InitNodes)--> Stepping
//!       ^                                        |
//!       +-------- node count no longer fits -----+
//! ```
//!
//! Re-entering `Uninitialized` and returning to `Stepping` happen within the
//! same frame, so every call to [`SimulationStepper::step`] ends in `Stepping`.

use crate::assets::{ComputeProgram, Kernel};
use crate::backend::{GpuBackend, KernelDispatch};
use crate::buffers::{BufferManager, NodeBuffers};
use crate::config::NoiseBallConfig;
use crate::gpu::types::SimulationUniforms;

/// Lifecycle state of the stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    /// No buffers, or buffers sized for another node count
    Uninitialized,
    /// Buffers match the configured node count
    Stepping,
}

/// What one step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Whether buffers were (re)allocated and re-seeded this step
    pub reinitialized: bool,
    /// Thread groups dispatched
    pub groups: u32,
    /// Buffer set after the swap; `nodes.read()` holds this step's output
    pub buffers: NodeBuffers,
}

/// Issues the init and update dispatches and flips the node buffer roles
#[derive(Debug)]
pub struct SimulationStepper {
    state: StepperState,
    steps: u64,
}

impl Default for SimulationStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationStepper {
    /// A stepper that has not allocated anything
    pub fn new() -> Self {
        Self {
            state: StepperState::Uninitialized,
            steps: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> StepperState {
        self.state
    }

    /// Steps taken since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Forget the buffers; the next step initialises again
    pub fn reset(&mut self) {
        self.state = StepperState::Uninitialized;
    }

    /// Advance the simulation by one frame.
    ///
    /// 1. Reallocate and seed if the node buffers do not hold
    ///    `config.node_count()` elements.
    /// 2. Push the uniforms.
    /// 3. Dispatch `UpdateNodes` from "read" into "write".
    /// 4. Swap the roles.
    pub fn step<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        manager: &mut BufferManager,
        program: &ComputeProgram,
        config: &NoiseBallConfig,
        index_count: u32,
        time: f32,
    ) -> StepOutcome {
        let node_count = config.node_count();
        let groups = config.thread_group_count();

        let (buffers, reinitialized) = match manager.buffers().copied() {
            Some(buffers) if !manager.needs_reallocation(node_count) => (buffers, false),
            _ => {
                let buffers = manager.initialize(backend, node_count, index_count);
                backend.dispatch(
                    program,
                    &KernelDispatch {
                        kernel: Kernel::InitNodes,
                        groups,
                        read: None,
                        write: buffers.nodes.write(),
                        uniforms: None,
                    },
                );
                tracing::info!(
                    node_count,
                    groups,
                    from = ?self.state,
                    "seeded noise ball nodes"
                );
                self.state = StepperState::Stepping;
                (buffers, true)
            }
        };

        let uniforms = SimulationUniforms {
            time,
            scale: config.scale,
            growth_rate: config.growth_rate,
            max_size: config.max_size,
            num_points: node_count,
            num_edges: manager.active_edges(),
            _padding: [0; 2],
        };
        backend.dispatch(
            program,
            &KernelDispatch {
                kernel: Kernel::UpdateNodes,
                groups,
                read: Some(buffers.nodes.read()),
                write: buffers.nodes.write(),
                uniforms: Some(uniforms),
            },
        );
        manager.swap();
        self.steps += 1;

        tracing::trace!(
            step = self.steps,
            time,
            written = %buffers.nodes.write(),
            "stepped noise ball"
        );
        let mut buffers = buffers;
        buffers.nodes.swap();
        StepOutcome {
            reinitialized,
            groups,
            buffers,
        }
    }
}
