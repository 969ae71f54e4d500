//! Per-node uniforms and texture bindings for mesh parts

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::{
    gfx::scene::{Material, TextureMap},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::linear_rgb;

/// MUST match `Part` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// Linear emissive colour already scaled by its intensity
    pub emissive: [f32; 4],
    /// metalness, roughness, bump scale, receives shadows
    pub params: [f32; 4],
    /// has diffuse map, has bump map, has normal map
    pub maps: [f32; 4],
    /// diffuse repeat (xy), detail map repeat (zw)
    pub uv: [f32; 4],
    pub normal_scale: [f32; 4],
}

pub type ObjectUBO = UniformBuffer<ObjectUniform>;

fn flag(present: bool) -> f32 {
    if present {
        1.0
    } else {
        0.0
    }
}

/// The map whose sampler and repeat drive bump and normal lookups.
pub fn detail_map(material: &Material) -> Option<&TextureMap> {
    material.normal_map.as_ref().or(material.bump_map.as_ref())
}

impl ObjectUniform {
    pub fn new(world: Matrix4<f32>, material: &Material, receive_shadow: bool) -> Self {
        let normal_matrix = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        let color = linear_rgb(material.color);
        let emissive = linear_rgb(material.emissive);
        let e = material.emissive_intensity;
        let map_repeat = material.map.as_ref().map_or([1.0, 1.0], |m| m.repeat);
        let detail_repeat = detail_map(material).map_or([1.0, 1.0], |m| m.repeat);

        Self {
            model: world.into(),
            normal_matrix: normal_matrix.into(),
            color: [color[0], color[1], color[2], 1.0],
            emissive: [emissive[0] * e, emissive[1] * e, emissive[2] * e, 1.0],
            params: [
                material.metalness,
                material.roughness.max(0.04),
                material.bump_scale,
                flag(receive_shadow),
            ],
            maps: [
                flag(material.map.is_some()),
                flag(material.bump_map.is_some()),
                flag(material.normal_map.is_some()),
                0.0,
            ],
            uv: [map_repeat[0], map_repeat[1], detail_repeat[0], detail_repeat[1]],
            normal_scale: [material.normal_scale[0], material.normal_scale[1], 0.0, 0.0],
        }
    }
}

/// Texture views and samplers for one part, fallbacks already substituted.
pub struct ObjectTextures<'a> {
    pub map: &'a wgpu::TextureView,
    pub map_sampler: &'a wgpu::Sampler,
    pub bump: &'a wgpu::TextureView,
    pub normal: &'a wgpu::TextureView,
    pub detail_sampler: &'a wgpu::Sampler,
}

/// Layout of bind group 1: the part's uniform and material textures.
pub struct ObjectBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl ObjectBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .create(device, "Object Bind Group Layout");

        Self { bind_group_layout }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        ubo: &ObjectUBO,
        textures: ObjectTextures<'_>,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(textures.map)
            .sampler(textures.map_sampler)
            .texture(textures.bump)
            .texture(textures.normal)
            .sampler(textures.detail_sampler)
            .create(device, label)
    }
}
