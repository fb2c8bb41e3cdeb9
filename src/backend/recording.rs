//! Headless backend that records every command
//!
//! Node data never exists here. What is tracked is exactly what the host can
//! observe of GPU memory: which buffers are alive, their sizes, the contents
//! of draw-args buffers, and a write generation per buffer that increases
//! every time a kernel writes it.

use std::collections::BTreeMap;
use std::fmt;

use super::{BufferDesc, BufferHandle, BufferKind, GpuBackend, IndirectDraw, KernelDispatch};
use crate::assets::{ComputeProgram, Kernel};
use crate::gpu::types::{IndirectDrawArgs, SimulationUniforms};
use crate::transform::Bounds;

/// What the recording backend knows about one live buffer
#[derive(Debug, Clone, PartialEq)]
pub struct BufferRecord {
    /// How it was allocated
    pub desc: BufferDesc,
    /// Generation of the last kernel write (0 = never written)
    pub generation: u64,
    /// Last draw record uploaded, for draw-args buffers
    pub draw_args: Option<IndirectDrawArgs>,
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A buffer was allocated
    CreateBuffer {
        handle: BufferHandle,
        kind: BufferKind,
        element_count: u32,
        element_size: u32,
    },
    /// A draw record was uploaded
    WriteDrawArgs {
        handle: BufferHandle,
        args: IndirectDrawArgs,
    },
    /// A buffer was freed
    ReleaseBuffer { handle: BufferHandle },
    /// A kernel ran
    Dispatch {
        program: String,
        kernel: Kernel,
        groups: u32,
        read: Option<BufferHandle>,
        write: BufferHandle,
        uniforms: Option<SimulationUniforms>,
        /// Generation stamped on `write` by this dispatch
        generation: u64,
    },
    /// An indirect draw was submitted
    DrawIndirect {
        mesh: String,
        material: String,
        node_buffer: BufferHandle,
        /// Generation of `node_buffer` at draw time
        node_generation: u64,
        draw_args: BufferHandle,
        /// Contents of `draw_args` at draw time
        args: IndirectDrawArgs,
        scale: f32,
        unique_id: f32,
        bounds: Bounds,
    },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateBuffer {
                handle,
                kind,
                element_count,
                element_size,
            } => write!(f, "create {handle} {kind:?} x{element_count} ({element_size} B)"),
            Command::WriteDrawArgs { handle, args } => {
                write!(f, "write-args {handle} {:?}", args.to_words())
            }
            Command::ReleaseBuffer { handle } => write!(f, "release {handle}"),
            Command::Dispatch {
                kernel,
                groups,
                read,
                write,
                generation,
                ..
            } => {
                write!(f, "dispatch {} groups={groups}", kernel.name())?;
                if let Some(read) = read {
                    write!(f, " read={read}")?;
                }
                write!(f, " write={write} gen={generation}")
            }
            Command::DrawIndirect {
                node_buffer,
                node_generation,
                draw_args,
                args,
                ..
            } => write!(
                f,
                "draw nodes={node_buffer} gen={node_generation} args={draw_args} {:?}",
                args.to_words()
            ),
        }
    }
}

/// Backend that keeps state and a command log instead of touching a GPU
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    next_generation: u64,
    buffers: BTreeMap<BufferHandle, BufferRecord>,
    commands: Vec<Command>,
}

impl RecordingBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command recorded so far, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain the command log, keeping buffer state
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Record of a live buffer
    pub fn buffer(&self, handle: BufferHandle) -> Option<&BufferRecord> {
        self.buffers.get(&handle)
    }

    /// Handles of all live buffers
    pub fn live_buffers(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.buffers.keys().copied()
    }

    /// Number of live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Write generation of a live buffer
    pub fn generation(&self, handle: BufferHandle) -> Option<u64> {
        self.buffers.get(&handle).map(|b| b.generation)
    }

    /// Current contents of a live draw-args buffer
    pub fn draw_args(&self, handle: BufferHandle) -> Option<IndirectDrawArgs> {
        self.buffers.get(&handle).and_then(|b| b.draw_args)
    }

    /// Number of recorded dispatches of `kernel`
    pub fn dispatch_count(&self, kernel: Kernel) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Dispatch { kernel: k, .. } if *k == kernel))
            .count()
    }

    /// Number of recorded buffer allocations
    pub fn create_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::CreateBuffer { .. }))
            .count()
    }

    /// Number of recorded draws
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndirect { .. }))
            .count()
    }

    fn live(&mut self, handle: BufferHandle, op: &str) -> &mut BufferRecord {
        match self.buffers.get_mut(&handle) {
            Some(record) => record,
            None => panic!("{op} on buffer {handle} which is not alive"),
        }
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(&mut self, desc: &BufferDesc) -> BufferHandle {
        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.buffers.insert(
            handle,
            BufferRecord {
                desc: desc.clone(),
                generation: 0,
                draw_args: None,
            },
        );
        self.commands.push(Command::CreateBuffer {
            handle,
            kind: desc.kind,
            element_count: desc.element_count,
            element_size: desc.element_size,
        });
        handle
    }

    fn write_draw_args(&mut self, buffer: BufferHandle, args: &IndirectDrawArgs) {
        let record = self.live(buffer, "write_draw_args");
        assert_eq!(
            record.desc.kind,
            BufferKind::DrawArgs,
            "draw args written to a {:?} buffer",
            record.desc.kind
        );
        record.draw_args = Some(*args);
        self.commands.push(Command::WriteDrawArgs {
            handle: buffer,
            args: *args,
        });
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            panic!("release of buffer {buffer} which is not alive");
        }
        self.commands.push(Command::ReleaseBuffer { handle: buffer });
    }

    fn dispatch(&mut self, program: &ComputeProgram, dispatch: &KernelDispatch) {
        assert!(
            program.has_kernel(dispatch.kernel),
            "program '{}' has no kernel {}",
            program.name,
            dispatch.kernel.name()
        );
        if let Some(read) = dispatch.read {
            assert_ne!(read, dispatch.write, "read and write alias buffer {read}");
            self.live(read, "dispatch read");
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.live(dispatch.write, "dispatch write").generation = generation;

        self.commands.push(Command::Dispatch {
            program: program.name.clone(),
            kernel: dispatch.kernel,
            groups: dispatch.groups,
            read: dispatch.read,
            write: dispatch.write,
            uniforms: dispatch.uniforms,
            generation,
        });
    }

    fn draw_indirect(&mut self, draw: &IndirectDraw<'_>) {
        let node_generation = self.live(draw.node_buffer, "draw node list").generation;
        let args = self
            .live(draw.draw_args, "draw args")
            .draw_args
            .unwrap_or_else(|| panic!("draw with unwritten args buffer {}", draw.draw_args));

        self.commands.push(Command::DrawIndirect {
            mesh: draw.mesh.name.clone(),
            material: draw.material.name.clone(),
            node_buffer: draw.node_buffer,
            node_generation,
            draw_args: draw.draw_args,
            args,
            scale: draw.uniforms.scale,
            unique_id: draw.properties.unique_id,
            bounds: draw.bounds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::types::NodeState;

    fn nodes(backend: &mut RecordingBackend, count: u32) -> BufferHandle {
        backend.create_buffer(&BufferDesc::of::<NodeState>("nodes", BufferKind::Nodes, count))
    }

    #[test]
    fn test_create_and_release_tracks_live_set() {
        let mut backend = RecordingBackend::new();
        let a = nodes(&mut backend, 64);
        let b = nodes(&mut backend, 64);
        assert_ne!(a, b);
        assert_eq!(backend.live_buffer_count(), 2);
        assert_eq!(backend.buffer(a).unwrap().desc.size_bytes(), 64 * 16);

        backend.release_buffer(a);
        assert_eq!(backend.live_buffer_count(), 1);
        assert!(backend.buffer(a).is_none());
        assert_eq!(backend.create_count(), 2);
    }

    #[test]
    #[should_panic(expected = "not alive")]
    fn test_double_release_panics() {
        let mut backend = RecordingBackend::new();
        let a = nodes(&mut backend, 64);
        backend.release_buffer(a);
        backend.release_buffer(a);
    }

    #[test]
    fn test_dispatch_stamps_increasing_generations() {
        let mut backend = RecordingBackend::new();
        let program = ComputeProgram::noise_ball();
        let a = nodes(&mut backend, 64);
        let b = nodes(&mut backend, 64);

        backend.dispatch(
            &program,
            &KernelDispatch {
                kernel: Kernel::InitNodes,
                groups: 1,
                read: None,
                write: b,
                uniforms: None,
            },
        );
        backend.dispatch(
            &program,
            &KernelDispatch {
                kernel: Kernel::UpdateNodes,
                groups: 1,
                read: Some(a),
                write: b,
                uniforms: None,
            },
        );

        assert_eq!(backend.generation(a), Some(0));
        assert_eq!(backend.generation(b), Some(2));
        assert_eq!(backend.dispatch_count(Kernel::InitNodes), 1);
        assert_eq!(backend.dispatch_count(Kernel::UpdateNodes), 1);
    }

    #[test]
    fn test_draw_args_contents_are_kept() {
        let mut backend = RecordingBackend::new();
        let args_buffer = backend.create_buffer(&BufferDesc::of::<IndirectDrawArgs>(
            "args",
            BufferKind::DrawArgs,
            1,
        ));
        backend.write_draw_args(args_buffer, &IndirectDrawArgs::new(60, 128));
        assert_eq!(
            backend.draw_args(args_buffer).map(|a| a.to_words()),
            Some([60, 128, 0, 0, 0])
        );
        assert_eq!(
            backend.commands().last().map(|c| c.to_string()),
            Some("write-args #1 [60, 128, 0, 0, 0]".to_string())
        );
    }

    #[test]
    #[should_panic(expected = "draw args written")]
    fn test_draw_args_into_node_buffer_panics() {
        let mut backend = RecordingBackend::new();
        let a = nodes(&mut backend, 64);
        backend.write_draw_args(a, &IndirectDrawArgs::new(60, 64));
    }
}
