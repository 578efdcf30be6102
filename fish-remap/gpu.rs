//! wgpu compute backend.
//!
//! A [`GpuRemapper`] owns its own device, queue and compiled pipeline. Build
//! one per worker and reuse it for every image that worker converts.

use fish_core::{FishError, FishResult, Image, RemapParams};
use std::sync::mpsc;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use crate::backend::RemapBackend;

const SHADER_SOURCE: &str = include_str!("shaders/equ2fish.wgsl");
const WORKGROUP_SIZE: u32 = 16;

/// Uniform block mirrored by `Params` in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct KernelParams {
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    aperture: f32,
    projection: u32,
    _pad: [u32; 2],
}

pub struct GpuRemapper {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    name: String,
}

impl GpuRemapper {
    /// Acquires the high-performance adapter and compiles the kernel
    pub fn new() -> FishResult<Self> {
        Self::with_power_preference(wgpu::PowerPreference::HighPerformance)
    }

    pub fn with_power_preference(power_preference: wgpu::PowerPreference) -> FishResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| FishError::Device("no compatible GPU adapter found".to_string()))?;

        let info = adapter.get_info();
        let name = format!("gpu ({} - {:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("equ2fish device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
            },
            None,
        ))
        .map_err(|e| FishError::Device(format!("failed to create device: {e}")))?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("equ2fish kernel"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("equ2fish bind group layout"),
            entries: &[
                storage(0, true),
                storage(1, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("equ2fish pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("equ2fish pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(FishError::Device(format!("kernel compilation failed: {err}")));
        }

        info!(adapter = %info.name, backend = ?info.backend, "GPU remap context ready");

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            name,
        })
    }

    fn dispatch(&self, source: &Image, params: &RemapParams) -> FishResult<Image> {
        let (w, h) = source.dimensions();
        let byte_len = source.as_raw().len() as u64;

        let limit = self.device.limits().max_storage_buffer_binding_size as u64;
        if byte_len > limit {
            return Err(FishError::Device(format!(
                "{w}x{h} image needs {byte_len} bytes, device binding limit is {limit}"
            )));
        }

        let kernel_params = KernelParams {
            src_w: w,
            src_h: h,
            dst_w: w,
            dst_h: h,
            aperture: params.aperture.radians(),
            projection: params.projection.kernel_id(),
            _pad: [0; 2],
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let input = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("equirect source"),
            contents: source.as_raw(),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let output = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fisheye output"),
            size: byte_len,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fisheye readback"),
            size: byte_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("equ2fish params"),
            contents: bytemuck::bytes_of(&kernel_params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("equ2fish bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: input.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: output.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: uniform.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("equ2fish dispatch"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("equ2fish pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(w.div_ceil(WORKGROUP_SIZE), h.div_ceil(WORKGROUP_SIZE), 1);
        }
        encoder.copy_buffer_to_buffer(&output, 0, &staging, 0, byte_len);
        self.queue.submit(Some(encoder.finish()));

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(FishError::Device(format!("kernel dispatch failed: {err}")));
        }

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| FishError::Device("readback channel closed".to_string()))?
            .map_err(|e| FishError::Device(format!("buffer mapping failed: {e}")))?;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();

        debug!(width = w, height = h, "GPU remap complete");

        Image::from_raw(w, h, bytes)
            .ok_or_else(|| FishError::Device("readback size does not match image".to_string()))
    }
}

impl RemapBackend for GpuRemapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn project(&self, source: &Image, params: &RemapParams) -> FishResult<Image> {
        self.dispatch(source, params)
    }
}
