//! Buffer manager: allocation, sizing and release of the noise ball's GPU buffers
//!
//! Four buffers are owned at any time once initialised: two node buffers used
//! as a read/write pair, the (inert) edge buffer, and a single indirect draw
//! record. Reinitialisation always frees the old set before allocating.

use crate::assets::MaterialPropertyBlock;
use crate::backend::{BufferDesc, BufferHandle, BufferKind, GpuBackend};
use crate::config::MIN_ACTIVE_NODES;
use crate::gpu::types::{Edge, IndirectDrawArgs, NodeState};

/// Active edge count after every (re)initialisation
pub const INITIAL_ACTIVE_EDGES: u32 = 1;

/// Two node buffers whose read/write roles alternate.
///
/// Swapping flips an index; no node data moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBufferPair {
    slots: [BufferHandle; 2],
    read: usize,
}

impl NodeBufferPair {
    /// Pair two buffers, the first starting as "read"
    pub fn new(read: BufferHandle, write: BufferHandle) -> Self {
        Self {
            slots: [read, write],
            read: 0,
        }
    }

    /// Buffer holding the last committed state
    pub fn read(&self) -> BufferHandle {
        self.slots[self.read]
    }

    /// Scratch buffer the next step writes
    pub fn write(&self) -> BufferHandle {
        self.slots[1 - self.read]
    }

    /// Exchange the roles
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    /// Both handles, in allocation order
    pub fn handles(&self) -> [BufferHandle; 2] {
        self.slots
    }
}

/// The full buffer set of one initialisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBuffers {
    /// Node state read/write pair
    pub nodes: NodeBufferPair,
    /// Edge list (allocated, never populated)
    pub edges: BufferHandle,
    /// Indirect draw record
    pub draw_args: BufferHandle,
    /// Element count of the node and edge buffers
    pub capacity: u32,
}

impl NodeBuffers {
    fn handles(&self) -> [BufferHandle; 4] {
        let [a, b] = self.nodes.handles();
        [a, b, self.edges, self.draw_args]
    }
}

/// Owns the buffer set and the values reset alongside it
#[derive(Debug)]
pub struct BufferManager {
    buffers: Option<NodeBuffers>,
    active_nodes: u32,
    active_edges: u32,
    properties: MaterialPropertyBlock,
    initializations: u64,
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferManager {
    /// A manager holding no buffers
    pub fn new() -> Self {
        Self {
            buffers: None,
            active_nodes: MIN_ACTIVE_NODES,
            active_edges: INITIAL_ACTIVE_EDGES,
            properties: MaterialPropertyBlock::with_unique_id(0.0),
            initializations: 0,
        }
    }

    /// (Re)allocate every buffer for `capacity` nodes.
    ///
    /// Releases whatever is currently held, allocates the node pair and edge
    /// buffer at `capacity` elements plus one draw record, writes
    /// `{index_count, capacity, 0, 0, 0}` into it, resets the active counts
    /// and assigns a fresh property block tag.
    pub fn initialize<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        capacity: u32,
        index_count: u32,
    ) -> NodeBuffers {
        self.release(backend);

        let read = backend.create_buffer(&BufferDesc::of::<NodeState>(
            "Node List A",
            BufferKind::Nodes,
            capacity,
        ));
        let write = backend.create_buffer(&BufferDesc::of::<NodeState>(
            "Node List B",
            BufferKind::Nodes,
            capacity,
        ));
        let edges = backend.create_buffer(&BufferDesc::of::<Edge>(
            "Edge List",
            BufferKind::Edges,
            capacity,
        ));
        let draw_args = backend.create_buffer(&BufferDesc::of::<IndirectDrawArgs>(
            "Draw Args",
            BufferKind::DrawArgs,
            1,
        ));
        backend.write_draw_args(draw_args, &IndirectDrawArgs::new(index_count, capacity));

        self.active_nodes = MIN_ACTIVE_NODES;
        self.active_edges = INITIAL_ACTIVE_EDGES;
        self.properties = MaterialPropertyBlock::fresh();
        self.initializations += 1;

        let buffers = NodeBuffers {
            nodes: NodeBufferPair::new(read, write),
            edges,
            draw_args,
            capacity,
        };
        self.buffers = Some(buffers);

        tracing::info!(
            capacity,
            index_count,
            unique_id = self.properties.unique_id,
            "allocated noise ball buffers"
        );
        buffers
    }

    /// Release every held buffer. Does nothing when none are held.
    pub fn release<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(buffers) = self.buffers.take() {
            for handle in buffers.handles() {
                backend.release_buffer(handle);
            }
            tracing::debug!(capacity = buffers.capacity, "released noise ball buffers");
        }
    }

    /// Whether the held node buffers cannot serve `target` nodes
    pub fn needs_reallocation(&self, target: u32) -> bool {
        self.buffers.is_none_or(|b| b.capacity != target)
    }

    /// Current buffer set, if initialised
    pub fn buffers(&self) -> Option<&NodeBuffers> {
        self.buffers.as_ref()
    }

    /// Swap the node pair roles. No effect before initialisation.
    pub fn swap(&mut self) {
        if let Some(buffers) = self.buffers.as_mut() {
            buffers.nodes.swap();
        }
    }

    /// Active node count (2 after every initialisation)
    pub fn active_nodes(&self) -> u32 {
        self.active_nodes
    }

    /// Active edge count (1 after every initialisation)
    pub fn active_edges(&self) -> u32 {
        self.active_edges
    }

    /// Property block travelling with the draw
    pub fn properties(&self) -> &MaterialPropertyBlock {
        &self.properties
    }

    /// Number of initialisations performed so far
    pub fn initializations(&self) -> u64 {
        self.initializations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    #[test]
    fn test_pair_swap_is_its_own_inverse() {
        let mut pair = NodeBufferPair::new(BufferHandle(1), BufferHandle(2));
        let (read, write) = (pair.read(), pair.write());

        pair.swap();
        assert_eq!(pair.read(), write);
        assert_eq!(pair.write(), read);

        pair.swap();
        assert_eq!(pair.read(), read);
        assert_eq!(pair.write(), write);
    }

    #[test]
    fn test_swap_never_changes_handles() {
        let mut pair = NodeBufferPair::new(BufferHandle(7), BufferHandle(9));
        pair.swap();
        assert_eq!(pair.handles(), [BufferHandle(7), BufferHandle(9)]);
    }

    #[test]
    fn test_initialize_allocates_four_buffers() {
        let mut backend = RecordingBackend::new();
        let mut manager = BufferManager::new();
        let buffers = manager.initialize(&mut backend, 128, 240);

        assert_eq!(backend.live_buffer_count(), 4);
        for handle in buffers.nodes.handles() {
            let record = backend.buffer(handle).unwrap();
            assert_eq!(record.desc.kind, BufferKind::Nodes);
            assert_eq!(record.desc.element_count, 128);
            assert_eq!(record.desc.element_size, 16);
        }
        assert_eq!(backend.buffer(buffers.edges).unwrap().desc.element_count, 128);
        assert_eq!(
            backend.draw_args(buffers.draw_args).unwrap().to_words(),
            [240, 128, 0, 0, 0]
        );
    }

    #[test]
    fn test_reinitialize_releases_previous_set() {
        let mut backend = RecordingBackend::new();
        let mut manager = BufferManager::new();
        let first = manager.initialize(&mut backend, 64, 60);
        let second = manager.initialize(&mut backend, 192, 60);

        assert_eq!(backend.live_buffer_count(), 4);
        for handle in first.handles() {
            assert!(backend.buffer(handle).is_none(), "{} leaked", handle);
        }
        for handle in second.handles() {
            assert!(backend.buffer(handle).is_some());
        }
        assert_eq!(manager.initializations(), 2);
    }

    #[test]
    fn test_release_without_buffers_is_noop() {
        let mut backend = RecordingBackend::new();
        let mut manager = BufferManager::new();
        manager.release(&mut backend);
        manager.release(&mut backend);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_needs_reallocation() {
        let mut backend = RecordingBackend::new();
        let mut manager = BufferManager::new();
        assert!(manager.needs_reallocation(64));

        manager.initialize(&mut backend, 64, 60);
        assert!(!manager.needs_reallocation(64));
        assert!(manager.needs_reallocation(128));
    }
}
