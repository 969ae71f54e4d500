//! Per-light uniforms for the shadow and spotlight passes

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    gfx::{camera::orbit_camera::OPENGL_TO_WGPU_MATRIX, scene::SpotLight},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::linear_rgb;

/// Light view-projection used while rendering a shadow map.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowViewUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// MUST match `Spot` in scene.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotUniform {
    /// w = cut-off distance, zero for unlimited
    pub position: [f32; 4],
    /// Unit vector from the light towards its target, w = decay
    pub direction: [f32; 4],
    /// Linear colour times intensity, w = 1 when casting shadows
    pub color: [f32; 4],
    /// cos(outer), cos(inner)
    pub cone: [f32; 4],
    /// bias, blur radius, texel size
    pub shadow: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

pub type ShadowViewUBO = UniformBuffer<ShadowViewUniform>;
pub type SpotUBO = UniformBuffer<SpotUniform>;

/// Perspective view-projection from `position` towards `target`.
pub fn spot_view_proj(position: Vector3<f32>, target: Vector3<f32>, projection: Matrix4<f32>) -> Matrix4<f32> {
    let forward = target - position;
    let forward = if forward.magnitude2() > 1e-12 {
        forward.normalize()
    } else {
        -Vector3::unit_z()
    };
    // Looking straight up or down needs a different up vector.
    let up = if forward.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let eye = Point3::from_vec(position);
    let view = Matrix4::look_at_rh(eye, eye + forward, up);
    OPENGL_TO_WGPU_MATRIX * projection * view
}

impl SpotUniform {
    pub fn new(light: &SpotLight, position: Vector3<f32>, target: Vector3<f32>) -> Self {
        let direction = target - position;
        let direction = if direction.magnitude2() > 1e-12 {
            direction.normalize()
        } else {
            -Vector3::unit_z()
        };
        let outer = light.angle().0.cos();
        let inner = (light.angle().0 * (1.0 - light.penumbra.clamp(0.0, 1.0))).cos();
        let color = linear_rgb(light.color);
        let view_proj = spot_view_proj(position, target, light.shadow.camera.projection());

        Self {
            position: [position.x, position.y, position.z, light.distance.max(0.0)],
            direction: [direction.x, direction.y, direction.z, light.decay],
            color: [
                color[0] * light.intensity,
                color[1] * light.intensity,
                color[2] * light.intensity,
                if light.cast_shadow { 1.0 } else { 0.0 },
            ],
            // smoothstep needs distinct edges
            cone: [outer, inner.max(outer + 1e-4), 0.0, 0.0],
            shadow: [
                light.shadow.bias,
                light.shadow.radius,
                1.0 / light.shadow.map_size() as f32,
                0.0,
            ],
            view_proj: view_proj.into(),
        }
    }

    pub fn shadow_view(&self) -> ShadowViewUniform {
        ShadowViewUniform {
            view_proj: self.view_proj,
        }
    }
}

/// Bind group layouts for light data.
///
/// `shadow_view` is slot 0 of the depth-only passes. `spot` is slot 2 of the
/// additive spotlight pass and carries the light's shadow map, so it can never
/// be bound while that map is the depth attachment.
pub struct LightBindings {
    shadow_view: BindGroupLayoutWithDesc,
    spot: BindGroupLayoutWithDesc,
}

impl LightBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let shadow_view = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Shadow View Bind Group Layout");
        let spot = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::depth_texture_2d())
            .create(device, "Spot Light Bind Group Layout");

        Self { shadow_view, spot }
    }

    pub fn shadow_view_layout(&self) -> &wgpu::BindGroupLayout {
        &self.shadow_view.layout
    }

    pub fn spot_layout(&self) -> &wgpu::BindGroupLayout {
        &self.spot.layout
    }

    pub fn create_shadow_view_group(&self, device: &wgpu::Device, ubo: &ShadowViewUBO, label: &str) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.shadow_view)
            .resource(ubo.binding_resource())
            .create(device, label)
    }

    pub fn create_spot_group(
        &self,
        device: &wgpu::Device,
        ubo: &SpotUBO,
        shadow_map: &wgpu::TextureView,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.spot)
            .resource(ubo.binding_resource())
            .texture(shadow_map)
            .create(device, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::NodeId;
    use cgmath::{Deg, Vector4};

    fn light() -> SpotLight {
        let mut light = SpotLight::new([1.0; 3], 1.0, NodeId::from_raw(1));
        light.distance = 100.0;
        light.update_projection();
        light
    }

    #[test]
    fn test_target_projects_to_centre() {
        let light = light();
        let position = Vector3::new(0.0, 5.0, 0.0);
        let target = Vector3::new(0.0, 0.0, -1.0);
        let view_proj = spot_view_proj(position, target, light.shadow.camera.projection());
        let clip = view_proj * Vector4::new(0.0, 0.0, -1.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
        assert!((0.0..=1.0).contains(&(clip.z / clip.w)));
    }

    #[test]
    fn test_straight_down_is_not_degenerate() {
        let light = light();
        let view_proj = spot_view_proj(
            Vector3::new(0.0, 5.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            light.shadow.camera.projection(),
        );
        let clip = view_proj * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x.is_finite() && (clip.x / clip.w).abs() < 1e-4);
    }

    #[test]
    fn test_cone_edges() {
        let mut light = light();
        light.set_angle(Deg(60.0));
        light.penumbra = 0.5;
        let uniform = SpotUniform::new(&light, Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, 4.0, 0.0));
        assert!((uniform.cone[0] - 0.5).abs() < 1e-5);
        assert!((uniform.cone[1] - Deg(30.0f32).0.to_radians().cos()).abs() < 1e-5);
        assert_eq!(uniform.direction[1], -1.0);

        light.penumbra = 0.0;
        let hard = SpotUniform::new(&light, Vector3::new(0.0, 5.0, 0.0), Vector3::new(0.0, 4.0, 0.0));
        assert!(hard.cone[1] > hard.cone[0]);
    }
}
