//! WGPU-based rendering engine for the editor viewport
//!
//! Frames are lit in linear light into a floating point target: one depth pass
//! per shadow casting light, then the background, a base pass (ambient,
//! directional light and emissive), one additive pass per spotlight and the
//! grid lines. A final pass copies the result onto the surface and the UI is
//! drawn on top.

use std::sync::Arc;

use anyhow::Context;
use wgpu::{Device, TextureFormat};

use crate::{
    assets::TextureId,
    gfx::{
        camera::CameraUniform,
        resources::{
            linear_rgb, update_global_ubo, GlobalBindings, GlobalUBO, LightBindings, ObjectBindings,
            TextureResource,
        },
        scene::{Background, Scene, Topology},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

use super::{
    gpu_cache::{DrawItem, GpuCache},
    pipeline_manager::{PipelineConfig, PipelineManager},
    render_pass_ext::DrawMesh,
    shadow_maps::{ShadowMaps, ShadowTarget},
};

const SCENE_SHADER: &str = include_str!("scene.wgsl");
const SHADOW_SHADER: &str = include_str!("shadow.wgsl");
const FULLSCREEN_SHADER: &str = include_str!("fullscreen.wgsl");

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,
    hdr_target: TextureResource,
    pipeline_manager: PipelineManager,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_bindings: ObjectBindings,
    light_bindings: LightBindings,

    gpu_cache: GpuCache,
    shadow_maps: ShadowMaps,

    fullscreen_layout: BindGroupLayoutWithDesc,
    composite_group: wgpu::BindGroup,
    background_group: Option<(TextureId, wgpu::BindGroup)>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Picks an adapter compatible with the window surface, configures the
    /// surface for `width` x `height` and builds every pipeline up front.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "Depth Texture");
        let hdr_target = TextureResource::create_hdr_target(&device, &config, "HDR Target");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        let object_bindings = ObjectBindings::new(&device);
        let light_bindings = LightBindings::new(&device);

        let gpu_cache = GpuCache::new(&device, &queue);
        let shadow_maps = ShadowMaps::new(&device, &light_bindings);
        let directional_map = &shadow_maps.directional.map;
        global_bindings.create_bind_group(&device, &global_ubo, &directional_map.view, &directional_map.sampler);

        let fullscreen_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .create(&device, "Fullscreen Bind Group Layout");
        let composite_group = fullscreen_group(&device, &fullscreen_layout, &hdr_target.view, &hdr_target.sampler, "Composite");

        let mut pipeline_manager = PipelineManager::new(device.clone());
        register_pipelines(
            &mut pipeline_manager,
            format,
            &global_bindings,
            &object_bindings,
            &light_bindings,
            &fullscreen_layout,
        );
        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            anyhow::bail!("Failed to build render pipelines: {}", errors.join("; "));
        }

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            format,
            depth_texture,
            hdr_target,
            pipeline_manager,
            global_ubo,
            global_bindings,
            object_bindings,
            light_bindings,
            gpu_cache,
            shadow_maps,
            fullscreen_layout,
            composite_group,
            background_group: None,
        })
    }

    /// Renders `scene` from `camera` followed by the UI overlay.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped; the
    /// remaining surface errors are returned to the caller.
    pub fn render_frame<F>(&mut self, scene: &Scene, camera: CameraUniform, ui_callback: F) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the next surface texture");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.gpu_cache.begin_frame();
        let items = self
            .gpu_cache
            .prepare_scene(&self.device, &self.queue, scene, &self.object_bindings);
        let lights = self
            .shadow_maps
            .prepare(&self.device, &self.queue, scene, &self.light_bindings);
        update_global_ubo(&mut self.global_ubo, &self.queue, camera, scene);
        self.prepare_background(scene);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Shadow maps
        self.shadow_pass(&mut encoder, &self.shadow_maps.directional, &items, "Directional Shadow Pass");
        for id in &lights {
            if let Some(spot) = self.shadow_maps.spot(*id).filter(|spot| spot.cast_shadow) {
                self.shadow_pass(&mut encoder, &spot.target, &items, "Spot Shadow Pass");
            }
        }

        // Lit scene into the HDR target
        {
            let [r, g, b] = linear_rgb(scene.background_color());
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some((_, group)), Some(pipeline)) =
                (&self.background_group, self.pipeline_manager.pipeline("Background"))
            {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, group, &[]);
                render_pass.draw_fullscreen();
            }

            if let Some(globals) = self.global_bindings.bind_group() {
                render_pass.set_bind_group(0, globals, &[]);

                if let Some(pipeline) = self.pipeline_manager.pipeline("Base") {
                    render_pass.set_pipeline(pipeline);
                    self.draw_items(&mut render_pass, &items, |item| item.topology == Topology::Triangles);
                }

                if let Some(pipeline) = self.pipeline_manager.pipeline("Spot") {
                    render_pass.set_pipeline(pipeline);
                    for id in &lights {
                        let Some(spot) = self.shadow_maps.spot(*id) else {
                            continue;
                        };
                        render_pass.set_bind_group(2, &spot.spot_group, &[]);
                        self.draw_items(&mut render_pass, &items, |item| item.topology == Topology::Triangles);
                    }
                }

                if let Some(pipeline) = self.pipeline_manager.pipeline("Grid") {
                    render_pass.set_pipeline(pipeline);
                    self.draw_items(&mut render_pass, &items, |item| item.topology == Topology::Lines);
                }
            }
        }

        // HDR target onto the surface
        {
            let mut composite_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            if let Some(pipeline) = self.pipeline_manager.pipeline("Composite") {
                composite_pass.set_pipeline(pipeline);
                composite_pass.set_bind_group(0, &self.composite_group, &[]);
                composite_pass.draw_fullscreen();
            }
        }

        ui_callback(&self.device, &self.queue, &mut encoder, &surface_view);

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        self.gpu_cache.end_frame();
        Ok(())
    }

    /// Keeps the background bind group in step with the scene's background texture.
    fn prepare_background(&mut self, scene: &Scene) {
        let Background::Texture(texture) = &scene.background else {
            self.background_group = None;
            return;
        };

        self.gpu_cache.prepare_texture(&self.device, &self.queue, texture);
        let current = self.background_group.as_ref().map(|(id, _)| *id);
        if current == Some(texture.id()) {
            return;
        }

        self.background_group = self.gpu_cache.texture(texture.id()).map(|image| {
            let group = fullscreen_group(
                &self.device,
                &self.fullscreen_layout,
                &image.srgb_view,
                &self.hdr_target.sampler,
                "Background",
            );
            (texture.id(), group)
        });
    }

    fn shadow_pass(&self, encoder: &mut wgpu::CommandEncoder, target: &ShadowTarget, items: &[DrawItem], label: &str) {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(pipeline) = self.pipeline_manager.pipeline("Shadow") else {
            return;
        };
        shadow_pass.set_pipeline(pipeline);
        shadow_pass.set_bind_group(0, &target.view_group, &[]);
        self.draw_items(&mut shadow_pass, items, |item| {
            item.cast_shadow && item.topology == Topology::Triangles
        });
    }

    fn draw_items(&self, render_pass: &mut wgpu::RenderPass<'_>, items: &[DrawItem], include: impl Fn(&DrawItem) -> bool) {
        for item in items.iter().filter(|item| include(item)) {
            let (Some(mesh), Some(bind_group)) = (
                self.gpu_cache.mesh(item.mesh),
                self.gpu_cache.object_bind_group(item.node),
            ) else {
                continue;
            };
            render_pass.set_bind_group(1, bind_group, &[]);
            render_pass.draw_mesh(mesh);
        }
    }

    /// Resizes the surface and every screen-sized target.
    ///
    /// Zero sizes (a minimised window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(&self.device, &self.config, "Depth Texture");
        self.hdr_target = TextureResource::create_hdr_target(&self.device, &self.config, "HDR Target");
        self.composite_group = fullscreen_group(
            &self.device,
            &self.fullscreen_layout,
            &self.hdr_target.view,
            &self.hdr_target.sampler,
            "Composite",
        );
    }

    /// Returns current surface dimensions
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    ///
    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn fullscreen_group(
    device: &Device,
    layout: &BindGroupLayoutWithDesc,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    BindGroupBuilder::new(layout)
        .texture(view)
        .sampler(sampler)
        .create(device, label)
}

fn register_pipelines(
    manager: &mut PipelineManager,
    surface_format: TextureFormat,
    global_bindings: &GlobalBindings,
    object_bindings: &ObjectBindings,
    light_bindings: &LightBindings,
    fullscreen_layout: &BindGroupLayoutWithDesc,
) {
    manager.load_shader("scene", SCENE_SHADER);
    manager.load_shader("shadow", SHADOW_SHADER);
    manager.load_shader("fullscreen", FULLSCREEN_SHADER);

    let globals = global_bindings.bind_group_layout().clone();
    let object = object_bindings.bind_group_layout().clone();
    let additive = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent::REPLACE,
    };

    manager.register_pipeline(
        "Shadow",
        PipelineConfig::default()
            .with_label("Shadow")
            .with_shader("shadow")
            .with_vertex_only()
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![light_bindings.shadow_view_layout().clone(), object.clone()])
            .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::LessEqual)
            .with_depth_bias(wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            }),
    );

    manager.register_pipeline(
        "Background",
        PipelineConfig::default()
            .with_label("Background")
            .with_shader("fullscreen")
            .with_fragment_entry("fs_passthrough")
            .with_no_vertex_buffers()
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![fullscreen_layout.layout.clone()])
            .with_depth(TextureResource::DEPTH_FORMAT, false, wgpu::CompareFunction::Always)
            .with_color_target(TextureResource::HDR_FORMAT, Some(wgpu::BlendState::REPLACE)),
    );

    manager.register_pipeline(
        "Base",
        PipelineConfig::default()
            .with_label("Base")
            .with_fragment_entry("fs_base")
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![globals.clone(), object.clone()])
            .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
            .with_color_target(TextureResource::HDR_FORMAT, Some(wgpu::BlendState::REPLACE)),
    );

    manager.register_pipeline(
        "Spot",
        PipelineConfig::default()
            .with_label("Spot")
            .with_fragment_entry("fs_spot")
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![globals.clone(), object.clone(), light_bindings.spot_layout().clone()])
            .with_depth(TextureResource::DEPTH_FORMAT, false, wgpu::CompareFunction::LessEqual)
            .with_color_target(TextureResource::HDR_FORMAT, Some(additive)),
    );

    manager.register_pipeline(
        "Grid",
        PipelineConfig::default()
            .with_label("Grid")
            .with_fragment_entry("fs_unlit")
            .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![globals, object])
            .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
            .with_color_target(TextureResource::HDR_FORMAT, Some(wgpu::BlendState::REPLACE)),
    );

    let composite_entry = if surface_format.is_srgb() {
        "fs_passthrough"
    } else {
        "fs_encode"
    };
    manager.register_pipeline(
        "Composite",
        PipelineConfig::default()
            .with_label("Composite")
            .with_shader("fullscreen")
            .with_fragment_entry(composite_entry)
            .with_no_vertex_buffers()
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![fullscreen_layout.layout.clone()])
            .with_color_target(surface_format, Some(wgpu::BlendState::REPLACE)),
    );
}
