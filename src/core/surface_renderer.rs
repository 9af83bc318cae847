use std::sync::Arc;

use anyhow::{bail, Context, Result};
use wgpu::{BindGroup, BindGroupLayout, Device, RenderPipeline, Surface, SurfaceConfiguration, Texture, TextureView};
use winit::window::Window;

use super::canvas::Canvas;
use super::display_context::DisplayContext;
use super::gpu_context::GpuContext;

/// Uploads composed canvases to a texture and stretches it over the window
///
/// The canvas texture follows the canvas size; the surface follows the
/// window size. The two are independent so camera geometry changes never
/// need a surface reconfigure.
pub struct SurfaceRenderer {
    gpu: GpuContext,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    render_pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    texture: Texture,
    bind_group: BindGroup,
    canvas: DisplayContext,
}

impl SurfaceRenderer {
    /// Create a new surface renderer for a window
    pub async fn new(window: Arc<Window>, canvas: DisplayContext) -> Result<Self> {
        let size = window.inner_size();

        let instance = GpuContext::instance();
        let surface = instance
            .create_surface(window)
            .context("Failed to create window surface")?;
        let gpu = GpuContext::new_with_surface(&instance, &surface).await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(gpu.adapter());
        let Some(&fallback_format) = surface_caps.formats.first() else {
            bail!("Surface reports no supported formats");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(fallback_format);

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        let bind_group_layout = Self::create_bind_group_layout(gpu.device());
        let render_pipeline =
            Self::create_render_pipeline(gpu.device(), &bind_group_layout, surface_format);

        let texture = Self::create_canvas_texture(gpu.device(), &canvas);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = Self::create_bind_group(gpu.device(), &bind_group_layout, &view);

        Ok(Self {
            gpu,
            surface,
            surface_config,
            render_pipeline,
            bind_group_layout,
            texture,
            bind_group,
            canvas,
        })
    }

    /// Upload a composed canvas and present it
    pub fn render(&mut self, canvas: &Canvas) -> Result<()> {
        let (width, height) = canvas.dimensions();
        let context = DisplayContext::new(width, height);
        if context != self.canvas {
            self.resize_canvas(context);
        }

        if canvas.pixels().len() != context.buffer_size() {
            bail!(
                "Invalid canvas buffer size: expected {} bytes, got {}",
                context.buffer_size(),
                canvas.pixels().len()
            );
        }

        // Upload pixels to texture
        self.gpu.queue().write_texture(
            self.texture.as_image_copy(),
            canvas.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.surface.configure(self.gpu.device(), &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire surface texture"),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Canvas Blit Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Canvas Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.gpu.queue().submit(Some(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    /// Resize the window surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(self.gpu.device(), &self.surface_config);
    }

    /// Recreate the canvas texture for a new canvas size
    fn resize_canvas(&mut self, context: DisplayContext) {
        log::debug!("Canvas texture resized to {}x{}", context.width, context.height);

        self.texture = Self::create_canvas_texture(self.gpu.device(), &context);
        let view = self.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.bind_group = Self::create_bind_group(self.gpu.device(), &self.bind_group_layout, &view);
        self.canvas = context;
    }

    fn create_canvas_texture(device: &Device, context: &DisplayContext) -> Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Canvas Texture"),
            size: wgpu::Extent3d {
                width: context.width.max(1),
                height: context.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Canvas Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Create render pipeline for displaying texture on surface
    fn create_render_pipeline(
        device: &Device,
        bind_group_layout: &BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../display.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Canvas Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Canvas Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Create bind group for texture
    fn create_bind_group(
        device: &Device,
        layout: &BindGroupLayout,
        texture_view: &TextureView,
    ) -> BindGroup {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Canvas Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    }
}
