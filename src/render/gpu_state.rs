//! GPU state for the torus scene
//!
//! Owns the surface, device and the single normal-material pipeline. The
//! torus mesh is uploaded once and drawn instanced; the two text meshes are
//! drawn with one identity instance and re-uploaded when their text changes.

use web_time::Instant;
use wgpu::util::DeviceExt;

use crate::constants::surface::{CLEAR_COLOR, SAMPLE_COUNT};
use crate::constants::torus::{RADIAL_SEGMENTS, RADIUS, TUBE, TUBULAR_SEGMENTS};
use crate::error::{AppError, AppResult};
use crate::render::mesh::{build_torus, Mesh};
use crate::render::vertex::{InstanceRaw, Vertex};
use crate::scene::{build_camera_uniform, CameraUniform, Scene};
use crate::view::ErrorFlag;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex and index buffers for one mesh
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    /// `None` for an empty mesh; wgpu rejects zero-sized buffers on some backends
    fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }

        let vertex_label = format!("{} Vertex Buffer", label);
        let index_label = format!("{} Index Buffer", label);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(vertex_label.as_str()),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(index_label.as_str()),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }
}

/// Uploaded text mesh plus the string it was built from
struct TextBuffers {
    text: String,
    buffers: Option<MeshBuffers>,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    render_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    torus: MeshBuffers,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_count: u32,
    text_instance_buffer: wgpu::Buffer,
    title: TextBuffers,
    countdown: TextBuffers,
    // Reused between frames
    model_scratch: Vec<glam::Mat4>,
    instance_scratch: Vec<InstanceRaw>,
    error_flag: ErrorFlag,
    frames_rendered: u64,
    init_time: Instant,
}

/// Instance for the host's backends
pub fn create_instance(backends: wgpu::Backends) -> wgpu::Instance {
    log::info!("[create_instance] Creating WGPU instance for {:?}", backends);
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    })
}

/// Physical surface size for a logical size at a device pixel ratio.
///
/// Rounds to the nearest pixel and clamps each side into `1..=max_dimension`.
pub fn surface_extent(
    logical_width: f64,
    logical_height: f64,
    device_pixel_ratio: f64,
    max_dimension: u32,
) -> (u32, u32) {
    let side = |logical: f64| -> u32 {
        let physical = (logical.max(0.0) * device_pixel_ratio).round();
        (physical.min(max_dimension as f64) as u32).clamp(1, max_dimension.max(1))
    };
    (side(logical_width), side(logical_height))
}

impl GpuState {
    /// Bring up the device for `surface` and upload the scene's static meshes.
    ///
    /// Any failure here is a rendering-context failure; the caller shows the
    /// error fallback.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        scene: &Scene,
        error_flag: ErrorFlag,
    ) -> AppResult<Self> {
        log::info!("[GpuState::new] Starting GPU initialization");
        let init_start = Instant::now();

        let adapter = request_adapter(instance, &surface).await?;
        let info = adapter.get_info();
        log::info!("[GpuState::new] Adapter: {} ({:?})", info.name, info.device_type);
        log::info!("[GpuState::new] Backend: {:?}", info.backend);

        // WebGL2 defaults are the floor every backend meets
        let limits = wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        log::debug!(
            "[GpuState::new] Requesting limits: max_texture_2d {}",
            limits.max_texture_dimension_2d
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Torus Countdown Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                },
                None,
            )
            .await
            .map_err(|e| {
                log::error!("[GpuState::new] Failed to create GPU device: {}", e);
                AppError::DeviceCreation(e.to_string())
            })?;

        let flag = error_flag.clone();
        device.on_uncaptured_error(Box::new(move |error| {
            log::error!("[GPU] Uncaptured device error: {:?}", error);
            flag.raise();
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(AppError::NoSurfaceFormat)?;
        log::info!("[GpuState::new] Selected surface format: {:?}", surface_format);

        let present_mode = if surface_caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let max_dimension = device.limits().max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.clamp(1, max_dimension),
            height: height.clamp(1, max_dimension),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "[GpuState::new] Configuring surface with size {}x{}...",
            config.width,
            config.height
        );
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let camera_uniform = build_camera_uniform(scene.camera());
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        log::debug!(
            "[GpuState::new] Camera buffer created with size: {} bytes",
            std::mem::size_of::<CameraUniform>()
        );

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let render_pipeline =
            create_normal_pipeline(&device, &camera_bind_group_layout, config.format);

        let torus_mesh = build_torus(RADIUS, TUBE, RADIAL_SEGMENTS, TUBULAR_SEGMENTS);
        let torus = MeshBuffers::upload(&device, "Torus", &torus_mesh)
            .ok_or_else(|| AppError::ContextLost("torus mesh is empty".to_string()))?;

        let instance_capacity = scene.field.len().max(1);
        let instance_buffer = create_instance_buffer(&device, instance_capacity);

        let text_instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Text Instance Buffer"),
            contents: bytemuck::cast_slice(&[InstanceRaw::identity()]),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let title = TextBuffers {
            text: scene.title.text.clone(),
            buffers: MeshBuffers::upload(&device, "Title", scene.title.mesh()),
        };
        let countdown = TextBuffers {
            text: scene.countdown.text.clone(),
            buffers: MeshBuffers::upload(&device, "Countdown", scene.countdown.mesh()),
        };

        log::info!(
            "[GpuState::new] GPU initialization complete in {:?} ({} tori, {} torus triangles)",
            init_start.elapsed(),
            scene.field.len(),
            torus_mesh.triangle_count()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            render_pipeline,
            camera_buffer,
            camera_bind_group,
            torus,
            instance_buffer,
            instance_capacity,
            instance_count: 0,
            text_instance_buffer,
            title,
            countdown,
            model_scratch: Vec::with_capacity(instance_capacity),
            instance_scratch: Vec::with_capacity(instance_capacity),
            error_flag,
            frames_rendered: 0,
            init_time: init_start,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn max_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let max_dimension = self.max_dimension();
        let clamped_width = width.min(max_dimension);
        let clamped_height = height.min(max_dimension);
        if clamped_width != width || clamped_height != height {
            log::warn!(
                "[GpuState::resize] {}x{} exceeds GPU texture limit {}, clamping to {}x{}",
                width,
                height,
                max_dimension,
                clamped_width,
                clamped_height
            );
        }

        self.config.width = clamped_width;
        self.config.height = clamped_height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = create_depth_texture(&self.device, &self.config);
    }

    /// Upload the scene's per-frame data and draw it.
    ///
    /// Lost or outdated surfaces are reconfigured and the frame skipped.
    /// Out-of-memory and device errors raise the error flag and fail.
    pub fn render(&mut self, scene: &Scene) -> AppResult<()> {
        if self.error_flag.is_raised() {
            return Err(AppError::ContextLost("device reported an error".to_string()));
        }

        match self.draw(scene) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                log::warn!("[GpuState::render] Surface lost or outdated, reconfiguring");
                let (width, height) = self.size();
                self.resize(width, height);
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("[GpuState::render] Surface timeout, skipping frame");
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.error_flag.raise();
                Err(AppError::ContextLost("out of GPU memory".to_string()))
            }
        }
    }

    fn draw(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        self.upload_frame_data(scene);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.frames_rendered += 1;
        if self.frames_rendered == 1 {
            log::info!(
                "[GpuState::render] First frame rendered {:?} after init",
                self.init_time.elapsed()
            );
        }

        {
            let [r, g, b, a] = CLEAR_COLOR;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if self.instance_count > 0 {
                render_pass.set_vertex_buffer(0, self.torus.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.torus.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.torus.index_count, 0, 0..self.instance_count);
            }

            render_pass.set_vertex_buffer(1, self.text_instance_buffer.slice(..));
            for text in [&self.title, &self.countdown] {
                if let Some(buffers) = &text.buffers {
                    render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn upload_frame_data(&mut self, scene: &Scene) {
        let camera_uniform = build_camera_uniform(scene.camera());
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        scene.field.write_model_matrices(&mut self.model_scratch);
        if self.model_scratch.len() > self.instance_capacity {
            log::debug!(
                "[GpuState] Growing instance buffer from {} to {}",
                self.instance_capacity,
                self.model_scratch.len()
            );
            self.instance_capacity = self.model_scratch.len();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
        }
        self.instance_scratch.clear();
        self.instance_scratch
            .extend(self.model_scratch.iter().copied().map(InstanceRaw::from_matrix));
        self.instance_count = self.instance_scratch.len() as u32;
        if !self.instance_scratch.is_empty() {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instance_scratch),
            );
        }

        if self.title.text != scene.title.text {
            self.title.text = scene.title.text.clone();
            self.title.buffers = MeshBuffers::upload(&self.device, "Title", scene.title.mesh());
        }
        if self.countdown.text != scene.countdown.text {
            self.countdown.text = scene.countdown.text.clone();
            self.countdown.buffers =
                MeshBuffers::upload(&self.device, "Countdown", scene.countdown.mesh());
        }
    }
}

/// High-performance, then low-power, then the fallback adapter
async fn request_adapter(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'static>,
) -> AppResult<wgpu::Adapter> {
    let mut adapter_options = wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(surface),
        force_fallback_adapter: false,
    };

    log::info!("[request_adapter] Trying high-performance adapter...");
    if let Some(adapter) = instance.request_adapter(&adapter_options).await {
        return Ok(adapter);
    }

    log::warn!("[request_adapter] No high-performance adapter found, trying low power...");
    adapter_options.power_preference = wgpu::PowerPreference::LowPower;
    if let Some(adapter) = instance.request_adapter(&adapter_options).await {
        return Ok(adapter);
    }

    log::warn!("[request_adapter] No low-power adapter found, trying fallback...");
    adapter_options.force_fallback_adapter = true;
    match instance.request_adapter(&adapter_options).await {
        Some(adapter) => {
            log::warn!("[request_adapter] Using fallback adapter: {}", adapter.get_info().name);
            Ok(adapter)
        }
        None => {
            log::error!("[request_adapter] No suitable GPU adapter found");
            Err(AppError::AdapterUnavailable)
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Torus Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_normal_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Normal Material Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/normal.wgsl").into()),
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Render Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout: Some(&render_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[Vertex::desc(), InstanceRaw::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Tori are seen from inside the field as well
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: SAMPLE_COUNT,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Depth attachment matching the surface configuration
fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let max_dimension = device.limits().max_texture_dimension_2d;
    let size = wgpu::Extent3d {
        width: config.width.clamp(1, max_dimension),
        height: config.height.clamp(1, max_dimension),
        depth_or_array_layers: 1,
    };

    log::debug!(
        "[create_depth_texture] Creating depth texture with size {}x{}",
        size.width,
        size.height
    );

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size,
        mip_level_count: 1,
        sample_count: SAMPLE_COUNT,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::surface::FIXED_DEVICE_PIXEL_RATIO;

    #[test]
    fn test_surface_extent_applies_pixel_ratio() {
        assert_eq!(
            surface_extent(640.0, 360.0, FIXED_DEVICE_PIXEL_RATIO, 8192),
            (1280, 720)
        );
        assert_eq!(surface_extent(100.5, 10.25, 1.0, 8192), (101, 10));
    }

    #[test]
    fn test_surface_extent_is_clamped() {
        assert_eq!(surface_extent(0.0, -4.0, 2.0, 2048), (1, 1));
        assert_eq!(surface_extent(5000.0, 300.0, 2.0, 2048), (2048, 600));
    }
}
