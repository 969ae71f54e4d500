//! GPU-side copies of scene data
//!
//! Meshes are keyed by [`MeshId`], images by [`TextureId`] and per-part bind
//! groups by [`NodeId`]. Anything not touched during a frame is dropped at the
//! end of it, which is how deleted parts and replaced textures are released.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    assets::{TextureData, TextureHandle, TextureId},
    gfx::{
        resources::{
            object_bindings::{detail_map, ObjectTextures, ObjectUBO},
            texture_resource::{address_mode, create_sampler},
            ImageTexture, ObjectBindings, ObjectUniform,
        },
        scene::{MeshData, MeshId, NodeId, Scene, TextureMap, Topology, Wrap},
    },
};

/// Vertex and index buffers for one mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Uploads `mesh`; empty meshes have nothing to draw and yield `None`.
    pub fn upload(device: &wgpu::Device, mesh: &MeshData) -> Option<Self> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
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

/// One visible mesh part, in scene draw order.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshId,
    pub topology: Topology,
    pub cast_shadow: bool,
}

struct Cached<T> {
    value: T,
    frame: u64,
}

struct GpuObject {
    ubo: ObjectUBO,
    bind_group: wgpu::BindGroup,
    revision: u64,
    textures: [Option<TextureId>; 3],
}

pub struct GpuCache {
    meshes: HashMap<MeshId, Cached<GpuMesh>>,
    textures: HashMap<TextureId, Cached<ImageTexture>>,
    objects: HashMap<NodeId, Cached<GpuObject>>,
    clamp_sampler: wgpu::Sampler,
    repeat_sampler: wgpu::Sampler,
    fallback: ImageTexture,
    frame: u64,
}

impl GpuCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let fallback = ImageTexture::upload(device, queue, &TextureData::solid("fallback", [255; 4]));
        Self {
            meshes: HashMap::new(),
            textures: HashMap::new(),
            objects: HashMap::new(),
            clamp_sampler: create_sampler(device, address_mode(Wrap::Clamp), "Clamp"),
            repeat_sampler: create_sampler(device, address_mode(Wrap::Repeat), "Repeat"),
            fallback,
            frame: 0,
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Uploads `texture` if needed and keeps it alive for this frame.
    pub fn prepare_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &TextureHandle) {
        let frame = self.frame;
        self.textures
            .entry(texture.id())
            .and_modify(|cached| cached.frame = frame)
            .or_insert_with(|| {
                log::debug!(
                    "Uploading texture {} ({}x{})",
                    texture.path(),
                    texture.width(),
                    texture.height()
                );
                Cached {
                    value: ImageTexture::upload(device, queue, texture),
                    frame,
                }
            });
    }

    pub fn texture(&self, id: TextureId) -> Option<&ImageTexture> {
        self.textures.get(&id).map(|cached| &cached.value)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(&id).map(|cached| &cached.value)
    }

    pub fn object_bind_group(&self, node: NodeId) -> Option<&wgpu::BindGroup> {
        self.objects.get(&node).map(|cached| &cached.value.bind_group)
    }

    /// Brings every visible mesh part up to date and returns them in draw order.
    pub fn prepare_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        bindings: &ObjectBindings,
    ) -> Vec<DrawItem> {
        let frame = self.frame;
        let mut items = Vec::new();

        for (id, node, part) in scene.visible_meshes() {
            let Some(world) = scene.graph.world_matrix(id) else {
                continue;
            };
            let mesh_id = part.mesh.id();
            if !self.meshes.contains_key(&mesh_id) {
                let Some(uploaded) = GpuMesh::upload(device, &part.mesh) else {
                    continue;
                };
                self.meshes.insert(mesh_id, Cached { value: uploaded, frame });
            }
            if let Some(cached) = self.meshes.get_mut(&mesh_id) {
                cached.frame = frame;
            }

            let material = &part.material;
            let maps = [&material.map, &material.bump_map, &material.normal_map];
            for map in maps.into_iter().flatten() {
                self.prepare_texture(device, queue, &map.texture);
            }
            let texture_ids = maps.map(|map| map.as_ref().map(|m| m.texture.id()));

            let uniform = ObjectUniform::new(world, material, node.receive_shadow);
            let stale = self.objects.get(&id).is_none_or(|cached| {
                cached.value.revision != material.revision() || cached.value.textures != texture_ids
            });

            if stale {
                let ubo = match self.objects.remove(&id) {
                    Some(cached) => cached.value.ubo,
                    None => ObjectUBO::new(device),
                };
                let bind_group = bindings.create_bind_group(
                    device,
                    &ubo,
                    ObjectTextures {
                        map: image_view(&self.textures, &self.fallback, material.map.as_ref(), true),
                        map_sampler: self.sampler(material.map.as_ref()),
                        bump: image_view(&self.textures, &self.fallback, material.bump_map.as_ref(), false),
                        normal: image_view(&self.textures, &self.fallback, material.normal_map.as_ref(), false),
                        detail_sampler: self.sampler(detail_map(material)),
                    },
                    &node.name,
                );
                self.objects.insert(
                    id,
                    Cached {
                        value: GpuObject {
                            ubo,
                            bind_group,
                            revision: material.revision(),
                            textures: texture_ids,
                        },
                        frame,
                    },
                );
            }

            if let Some(cached) = self.objects.get_mut(&id) {
                cached.value.ubo.update_content(queue, uniform);
                cached.frame = frame;
            }

            items.push(DrawItem {
                node: id,
                mesh: mesh_id,
                topology: part.mesh.topology,
                cast_shadow: node.cast_shadow,
            });
        }

        items
    }

    fn sampler(&self, map: Option<&TextureMap>) -> &wgpu::Sampler {
        match map.map(|m| m.wrap) {
            Some(Wrap::Repeat) => &self.repeat_sampler,
            _ => &self.clamp_sampler,
        }
    }

    /// Drops everything the current frame did not use.
    pub fn end_frame(&mut self) {
        let frame = self.frame;
        self.meshes.retain(|_, cached| cached.frame == frame);
        self.textures.retain(|_, cached| cached.frame == frame);
        self.objects.retain(|_, cached| cached.frame == frame);
    }
}

/// View of an uploaded map, or of the white fallback when there is none.
fn image_view<'a>(
    textures: &'a HashMap<TextureId, Cached<ImageTexture>>,
    fallback: &'a ImageTexture,
    map: Option<&TextureMap>,
    srgb: bool,
) -> &'a wgpu::TextureView {
    let image = map
        .and_then(|m| textures.get(&m.texture.id()))
        .map_or(fallback, |cached| &cached.value);
    if srgb {
        &image.srgb_view
    } else {
        &image.linear_view
    }
}
