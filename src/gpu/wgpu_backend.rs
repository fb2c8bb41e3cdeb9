//! wgpu implementation of [`GpuBackend`]
//!
//! Runs the noise ball on a real device and draws into an offscreen target
//! that can be read back. Work is recorded into one command encoder and
//! submitted by the host with [`WgpuBackend::submit`], normally once per frame
//! after [`NoiseBall::update`](crate::NoiseBall::update).
//!
//! Buffers are addressed by [`BufferHandle`]. Pipelines are cached per
//! program/material name, and bind groups per set of bound handles. Releasing
//! a buffer drops every bind group that references it.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::assets::{ComputeProgram, Kernel, Material, Mesh};
use crate::backend::{
    BufferDesc, BufferHandle, BufferKind, GpuBackend, IndirectDraw, KernelDispatch,
};
use crate::error::{NoiseBallError, Result};
use crate::gpu::camera::OrbitCamera;
use crate::gpu::geometry::MeshVertex;
use crate::gpu::types::{
    CameraUniforms, IndirectDrawArgs, MaterialUniforms, NodeState, SimulationUniforms,
};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Background of the offscreen target
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

/// Request a device the way every command in this crate does.
///
/// Fails with [`NoiseBallError::NoAdapter`] on machines without a usable GPU
/// (or software rasteriser).
pub async fn create_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(NoiseBallError::NoAdapter)?;

    tracing::info!(adapter = ?adapter.get_info().name, "using GPU adapter");

    let device = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Noise Ball Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await?;
    Ok(device)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BindingKey {
    Kernel {
        kernel: Kernel,
        read: Option<BufferHandle>,
        write: BufferHandle,
    },
    Material {
        nodes: BufferHandle,
    },
}

impl BindingKey {
    fn references(&self, handle: BufferHandle) -> bool {
        match *self {
            BindingKey::Kernel { read, write, .. } => write == handle || read == Some(handle),
            BindingKey::Material { nodes } => nodes == handle,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UniformSlot {
    Simulation = 0,
    Material = 1,
    Camera = 2,
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

struct Layouts {
    init: wgpu::BindGroupLayout,
    update: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
}

struct OffscreenTarget {
    color: wgpu::Texture,
    depth: wgpu::Texture,
    width: u32,
    height: u32,
}

/// Backend executing on a wgpu device with an offscreen render target
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layouts: Layouts,

    next_handle: u64,
    buffers: HashMap<BufferHandle, wgpu::Buffer>,
    bind_groups: HashMap<BindingKey, wgpu::BindGroup>,
    compute_pipelines: HashMap<(String, Kernel), wgpu::ComputePipeline>,
    render_pipelines: HashMap<String, wgpu::RenderPipeline>,
    meshes: HashMap<String, MeshBuffers>,

    uniforms: [wgpu::Buffer; 3],
    uniforms_staged: [bool; 3],

    encoder: Option<wgpu::CommandEncoder>,
    cleared: bool,
    target: OffscreenTarget,
}

impl WgpuBackend {
    /// Create a device and a `width` x `height` target
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let (device, queue) = pollster::block_on(create_device())?;
        Ok(Self::with_device(Arc::new(device), Arc::new(queue), width, height))
    }

    /// Use an existing device
    pub fn with_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        width: u32,
        height: u32,
    ) -> Self {
        let layouts = create_layouts(&device);
        let uniforms = [
            uniform_buffer::<SimulationUniforms>(&device, "Simulation Uniforms"),
            uniform_buffer::<MaterialUniforms>(&device, "Material Uniforms"),
            uniform_buffer::<CameraUniforms>(&device, "Camera Uniforms"),
        ];
        let target = create_target(&device, width, height);

        let camera = OrbitCamera::new(width as f32 / height.max(1) as f32).uniforms();
        queue.write_buffer(
            &uniforms[UniformSlot::Camera as usize],
            0,
            bytemuck::bytes_of(&camera),
        );

        Self {
            device,
            queue,
            layouts,
            next_handle: 0,
            buffers: HashMap::new(),
            bind_groups: HashMap::new(),
            compute_pipelines: HashMap::new(),
            render_pipelines: HashMap::new(),
            meshes: HashMap::new(),
            uniforms,
            uniforms_staged: [false; 3],
            encoder: None,
            cleared: false,
            target,
        }
    }

    /// Target width in pixels
    pub fn width(&self) -> u32 {
        self.target.width
    }

    /// Target height in pixels
    pub fn height(&self) -> u32 {
        self.target.height
    }

    /// Number of live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Set the camera used by subsequent draws
    pub fn set_camera(&mut self, camera: &CameraUniforms) {
        self.stage_uniforms(UniformSlot::Camera, bytemuck::bytes_of(camera));
    }

    /// Submit everything recorded since the last submit.
    ///
    /// The next draw after a submit clears the target.
    pub fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        self.uniforms_staged = [false; 3];
        self.cleared = false;
    }

    /// Copy a node buffer back to the host.
    ///
    /// # Panics
    ///
    /// If `handle` has already been released.
    pub fn read_nodes(&mut self, handle: BufferHandle) -> Result<Vec<NodeState>> {
        self.submit();
        let source = self.buffer(handle);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Node Readback Buffer"),
            size: source.size(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Node Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging, 0, source.size());
        self.queue.submit(std::iter::once(encoder.finish()));

        let data = map_read(&self.device, &staging)?;
        let nodes = data
            .chunks_exact(std::mem::size_of::<NodeState>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        staging.destroy();
        Ok(nodes)
    }

    /// Read the offscreen target as tightly packed RGBA8 rows
    pub fn read_pixels(&mut self) -> Result<Vec<u8>> {
        self.submit();

        let OffscreenTarget {
            color,
            width,
            height,
            ..
        } = &self.target;
        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pixel Readback Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pixel Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(*height),
                },
            },
            wgpu::Extent3d {
                width: *width,
                height: *height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let data = map_read(&self.device, &staging)?;
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for row in data.chunks(padded_bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        staging.destroy();
        Ok(pixels)
    }

    // queue.write_buffer lands before the next submit's commands, so a slot
    // already consumed by recorded work forces a flush first.
    fn stage_uniforms(&mut self, slot: UniformSlot, bytes: &[u8]) {
        if self.uniforms_staged[slot as usize] && self.encoder.is_some() {
            let cleared = self.cleared;
            self.submit();
            self.cleared = cleared;
        }
        self.queue.write_buffer(&self.uniforms[slot as usize], 0, bytes);
        self.uniforms_staged[slot as usize] = true;
    }

    fn buffer(&self, handle: BufferHandle) -> &wgpu::Buffer {
        match self.buffers.get(&handle) {
            Some(buffer) => buffer,
            None => panic!("buffer {handle} is not alive on this device"),
        }
    }

    fn ensure_compute_pipeline(&mut self, program: &ComputeProgram, kernel: Kernel) {
        let key = (program.name.clone(), kernel);
        if self.compute_pipelines.contains_key(&key) {
            return;
        }

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.name.as_str()),
                source: wgpu::ShaderSource::Wgsl(program.source.clone()),
            });
        let layout = match kernel {
            Kernel::InitNodes => &self.layouts.init,
            Kernel::UpdateNodes => &self.layouts.update,
        };
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(kernel.name()),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.name()),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(kernel.name()),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        tracing::debug!(
            program = %program.name,
            kernel = kernel.name(),
            "compiled compute pipeline"
        );
        self.compute_pipelines.insert(key, pipeline);
    }

    fn ensure_render_pipeline(&mut self, material: &Material) {
        if self.render_pipelines.contains_key(&material.name) {
            return;
        }

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(material.name.as_str()),
                source: wgpu::ShaderSource::Wgsl(material.source.clone()),
            });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Node Material Pipeline Layout"),
                bind_group_layouts: &[&self.layouts.material],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(material.name.as_str()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(material.vertex_entry),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            // position
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 0,
                                shader_location: 0,
                            },
                            // normal
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 12,
                                shader_location: 1,
                            },
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(material.fragment_entry),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        tracing::debug!(material = %material.name, "compiled render pipeline");
        self.render_pipelines.insert(material.name.clone(), pipeline);
    }

    fn ensure_mesh(&mut self, mesh: &Mesh) {
        if self.meshes.contains_key(&mesh.name) {
            return;
        }
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.meshes
            .insert(mesh.name.clone(), MeshBuffers { vertices, indices });
    }

    fn ensure_bind_group(&mut self, key: BindingKey) {
        if self.bind_groups.contains_key(&key) {
            return;
        }

        let bind_group = match key {
            BindingKey::Kernel {
                kernel: Kernel::InitNodes,
                write,
                ..
            } => self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("InitNodes Bind Group"),
                layout: &self.layouts.init,
                entries: &[wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.buffer(write).as_entire_binding(),
                }],
            }),
            BindingKey::Kernel {
                kernel: Kernel::UpdateNodes,
                read,
                write,
            } => {
                let read = match read {
                    Some(read) => read,
                    None => panic!("UpdateNodes dispatched without a read buffer"),
                };
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("UpdateNodes Bind Group"),
                    layout: &self.layouts.update,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: self.buffer(read).as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: self.buffer(write).as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: self.uniforms[UniformSlot::Simulation as usize]
                                .as_entire_binding(),
                        },
                    ],
                })
            }
            BindingKey::Material { nodes } => {
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Node Material Bind Group"),
                    layout: &self.layouts.material,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: self.uniforms[UniformSlot::Camera as usize]
                                .as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: self.uniforms[UniformSlot::Material as usize]
                                .as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: self.buffer(nodes).as_entire_binding(),
                        },
                    ],
                })
            }
        };
        self.bind_groups.insert(key, bind_group);
    }
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(&mut self, desc: &BufferDesc) -> BufferHandle {
        let usage = match desc.kind {
            BufferKind::Nodes => {
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST
            }
            BufferKind::Edges => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            BufferKind::DrawArgs => wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: desc.size_bytes(),
            usage,
            mapped_at_creation: false,
        });

        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.buffers.insert(handle, buffer);
        handle
    }

    fn write_draw_args(&mut self, buffer: BufferHandle, args: &IndirectDrawArgs) {
        self.queue
            .write_buffer(self.buffer(buffer), 0, bytemuck::bytes_of(args));
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        // Recorded work may still reference the buffer
        self.submit();
        self.bind_groups.retain(|key, _| !key.references(buffer));
        match self.buffers.remove(&buffer) {
            Some(released) => released.destroy(),
            None => panic!("release of buffer {buffer} which is not alive"),
        }
    }

    fn dispatch(&mut self, program: &ComputeProgram, dispatch: &KernelDispatch) {
        self.ensure_compute_pipeline(program, dispatch.kernel);
        if let Some(uniforms) = &dispatch.uniforms {
            self.stage_uniforms(UniformSlot::Simulation, bytemuck::bytes_of(uniforms));
        }
        let key = BindingKey::Kernel {
            kernel: dispatch.kernel,
            read: dispatch.read,
            write: dispatch.write,
        };
        self.ensure_bind_group(key);

        let pipeline = &self.compute_pipelines[&(program.name.clone(), dispatch.kernel)];
        let bind_group = &self.bind_groups[&key];
        let encoder = self.encoder.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Noise Ball Frame Encoder"),
                })
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(dispatch.kernel.name()),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(dispatch.groups, 1, 1);
    }

    fn draw_indirect(&mut self, draw: &IndirectDraw<'_>) {
        self.ensure_render_pipeline(draw.material);
        self.ensure_mesh(draw.mesh);
        self.stage_uniforms(UniformSlot::Material, bytemuck::bytes_of(&draw.uniforms));
        let key = BindingKey::Material {
            nodes: draw.node_buffer,
        };
        self.ensure_bind_group(key);

        let load = if self.cleared {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(CLEAR_COLOR)
        };
        let depth_load = if self.cleared {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(1.0)
        };
        self.cleared = true;

        let pipeline = &self.render_pipelines[&draw.material.name];
        let mesh = &self.meshes[&draw.mesh.name];
        let bind_group = &self.bind_groups[&key];
        let args = match self.buffers.get(&draw.draw_args) {
            Some(args) => args,
            None => panic!("draw args buffer {} is not alive", draw.draw_args),
        };
        let color_view = self
            .target
            .color
            .create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = self
            .target
            .depth
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.encoder.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Noise Ball Frame Encoder"),
                })
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Noise Ball Node Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertices.slice(..));
        pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed_indirect(args, draw.args_offset);

        tracing::trace!(
            nodes = %draw.node_buffer,
            bounds = ?draw.bounds,
            cast_shadows = draw.cast_shadows,
            "recorded indirect node draw"
        );
    }
}

fn map_read(device: &wgpu::Device, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv().unwrap_or(Err(wgpu::BufferAsyncError))?;

    let data = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(data)
}

fn uniform_buffer<T>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn storage_entry(
    binding: u32,
    read_only: bool,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_layouts(device: &wgpu::Device) -> Layouts {
    let compute = wgpu::ShaderStages::COMPUTE;
    let draw = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

    Layouts {
        init: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("InitNodes Layout"),
            entries: &[storage_entry(1, false, compute)],
        }),
        update: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("UpdateNodes Layout"),
            entries: &[
                storage_entry(0, true, compute),
                storage_entry(1, false, compute),
                uniform_entry(2, compute),
            ],
        }),
        material: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Material Layout"),
            entries: &[
                uniform_entry(0, draw),
                uniform_entry(1, draw),
                storage_entry(2, true, wgpu::ShaderStages::VERTEX),
            ],
        }),
    }
}

fn create_target(device: &wgpu::Device, width: u32, height: u32) -> OffscreenTarget {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Color Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    OffscreenTarget {
        color,
        depth,
        width,
        height,
    }
}
