//! Global uniform bindings for camera and scene data
//!
//! Everything in bind group 0 of the lit passes: the camera, the ambient and
//! directional lights, and the directional light's shadow map.

use cgmath::{ortho, EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    gfx::{
        camera::{camera_utils::CameraUniform, orbit_camera::OPENGL_TO_WGPU_MATRIX},
        scene::{DirectionalLight, Scene},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::linear_rgb;

/// Half extent of the directional light's orthographic shadow frustum
pub const DIRECTIONAL_SHADOW_EXTENT: f32 = 15.0;
pub const DIRECTIONAL_SHADOW_DISTANCE: f32 = 30.0;
pub const DIRECTIONAL_SHADOW_MAP_SIZE: u32 = 2048;

/// MUST match `Globals` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    /// xyz towards the light, w = 1 when it casts shadows
    sun_direction: [f32; 4],
    sun_color: [f32; 4],
    sun_view_proj: [[f32; 4]; 4],
    /// bias, radius, texel size
    sun_shadow: [f32; 4],
}

pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// View-projection of the directional light, looking along its direction at the origin.
///
/// Only the direction of `position` matters; the shadow camera is pulled back
/// far enough that the whole ground lies in front of it.
pub fn directional_view_proj(light: &DirectionalLight) -> Matrix4<f32> {
    let direction = Vector3::from(light.position).normalize();
    let eye = Point3::from_vec(direction * DIRECTIONAL_SHADOW_DISTANCE);
    let view = Matrix4::look_at_rh(eye, Point3::origin(), Vector3::unit_y());
    let e = DIRECTIONAL_SHADOW_EXTENT;
    OPENGL_TO_WGPU_MATRIX * ortho(-e, e, -e, e, 0.5, 2.0 * DIRECTIONAL_SHADOW_DISTANCE)
        * view
}

fn scaled(color: [f32; 3], intensity: f32) -> [f32; 4] {
    let c = linear_rgb(color);
    [c[0] * intensity, c[1] * intensity, c[2] * intensity, 1.0]
}

/// Refreshes the per-frame globals from the camera and the scene's fixed lights.
pub fn update_global_ubo(ubo: &mut GlobalUBO, queue: &wgpu::Queue, camera: CameraUniform, scene: &Scene) {
    let sun = &scene.directional;
    let direction = Vector3::from(sun.position).normalize();

    let content = GlobalUniform {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        ambient: scaled(scene.ambient.color, scene.ambient.intensity),
        sun_direction: [
            direction.x,
            direction.y,
            direction.z,
            if sun.cast_shadow { 1.0 } else { 0.0 },
        ],
        sun_color: scaled(sun.color, sun.intensity),
        sun_view_proj: directional_view_proj(sun).into(),
        sun_shadow: [0.0, 1.0, 1.0 / DIRECTIONAL_SHADOW_MAP_SIZE as f32, 0.0],
    };

    ubo.update_content(queue, content);
}

/// Layout and bind group for slot 0 of the lit pipelines.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::comparison_sampler())
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// (Re)creates the bind group; the shadow map view is part of it.
    pub fn create_bind_group(
        &mut self,
        device: &wgpu::Device,
        ubo: &GlobalUBO,
        shadow_map: &wgpu::TextureView,
        shadow_sampler: &wgpu::Sampler,
    ) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .texture(shadow_map)
                .sampler(shadow_sampler)
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn test_directional_frustum_covers_ground() {
        let light = DirectionalLight {
            color: [1.0; 3],
            intensity: 1.0,
            position: [5.0, 5.0, 5.0],
            cast_shadow: true,
        };
        let view_proj = directional_view_proj(&light);
        for corner in [[-10.0, 0.0, -10.0], [10.0, 0.0, 10.0], [0.0, 0.0, 0.0]] {
            let clip = view_proj * Vector4::new(corner[0], corner[1], corner[2], 1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{:?}", ndc);
            assert!((0.0..=1.0).contains(&ndc.z), "{:?}", ndc);
        }
    }
}
