//! Light sources placed in the scene graph

use cgmath::{perspective, Deg, Matrix4, Rad};

use super::node::NodeId;

/// Smallest shadow map edge length offered by the editor
pub const SHADOW_MAP_MIN: u32 = 256;
/// Largest shadow map edge length offered by the editor
pub const SHADOW_MAP_MAX: u32 = 2048;
/// Shadow map sizes are multiples of this step
pub const SHADOW_MAP_STEP: u32 = 256;

/// Perspective camera used to render a spotlight's shadow map.
#[derive(Debug, Clone, Copy)]
pub struct ShadowCamera {
    pub near: f32,
    pub far: f32,
    pub fov: Rad<f32>,
    projection: Matrix4<f32>,
}

impl ShadowCamera {
    fn new(near: f32, far: f32, fov: Rad<f32>) -> Self {
        let mut camera = Self {
            near,
            far,
            fov,
            projection: Matrix4::from_scale(1.0),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        // A zero cone would make a degenerate frustum.
        let fov = Rad(self.fov.0.clamp(0.001, std::f32::consts::PI - 0.001));
        let near = self.near.max(0.001);
        self.projection = perspective(fov, 1.0, near, self.far.max(near + 0.001));
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }
}

/// Shadow configuration for a shadow-casting light.
#[derive(Debug, Clone, Copy)]
pub struct ShadowSettings {
    /// Blur radius applied when filtering the shadow map
    pub radius: f32,
    pub bias: f32,
    map_size: u32,
    map_revision: u64,
    pub camera: ShadowCamera,
}

impl ShadowSettings {
    pub fn map_size(&self) -> u32 {
        self.map_size
    }

    /// Bumped whenever the cached shadow map must be thrown away.
    pub fn map_revision(&self) -> u64 {
        self.map_revision
    }

    /// Resizes the shadow map, snapping to the supported set of sizes.
    ///
    /// Always invalidates the cached map, even when the size is unchanged.
    pub fn set_map_size(&mut self, size: u32) -> u32 {
        self.map_size = snap_shadow_map_size(size);
        self.map_revision += 1;
        self.camera.update_projection_matrix();
        self.map_size
    }
}

/// Clamps to [256, 2048] and rounds to the nearest multiple of 256.
pub fn snap_shadow_map_size(size: u32) -> u32 {
    let clamped = size.clamp(SHADOW_MAP_MIN, SHADOW_MAP_MAX);
    let steps = (clamped - SHADOW_MAP_MIN + SHADOW_MAP_STEP / 2) / SHADOW_MAP_STEP;
    SHADOW_MAP_MIN + steps * SHADOW_MAP_STEP
}

/// A cone light aimed at a target node.
#[derive(Debug, Clone)]
pub struct SpotLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cut-off distance; zero means unlimited range
    pub distance: f32,
    pub decay: f32,
    angle: Rad<f32>,
    pub penumbra: f32,
    pub target: NodeId,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl SpotLight {
    pub fn new(color: [f32; 3], intensity: f32, target: NodeId) -> Self {
        let angle = Rad(std::f32::consts::FRAC_PI_3);
        Self {
            color,
            intensity,
            distance: 0.0,
            decay: 2.0,
            angle,
            penumbra: 0.0,
            target,
            cast_shadow: false,
            shadow: ShadowSettings {
                radius: 1.0,
                bias: 0.0,
                map_size: 512,
                map_revision: 0,
                camera: ShadowCamera::new(0.5, 500.0, angle * 2.0),
            },
        }
    }

    pub fn angle(&self) -> Rad<f32> {
        self.angle
    }

    /// Sets the cone half-angle and recomputes the shadow projection.
    pub fn set_angle(&mut self, angle: impl Into<Rad<f32>>) {
        self.angle = angle.into();
        self.update_projection();
    }

    /// Sets the shadow camera near plane and recomputes the projection.
    pub fn set_shadow_near(&mut self, near: f32) {
        self.shadow.camera.near = near;
        self.update_projection();
    }

    /// Re-derives the shadow frustum from the cone angle and range.
    pub fn update_projection(&mut self) {
        let camera = &mut self.shadow.camera;
        camera.fov = self.angle * 2.0;
        camera.far = if self.distance > 0.0 {
            self.distance
        } else {
            500.0
        };
        camera.update_projection_matrix();
    }

    pub fn angle_degrees(&self) -> f32 {
        Deg::from(self.angle).0
    }
}

/// Uniform, non-directional fill light
#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Infinitely distant light shining from `position` towards the origin
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub cast_shadow: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_map_size_snaps_to_steps() {
        assert_eq!(snap_shadow_map_size(0), 256);
        assert_eq!(snap_shadow_map_size(300), 256);
        assert_eq!(snap_shadow_map_size(400), 512);
        assert_eq!(snap_shadow_map_size(1000), 1024);
        assert_eq!(snap_shadow_map_size(9000), 2048);
    }

    #[test]
    fn test_resize_invalidates_cached_map() {
        let mut light = SpotLight::new([1.0; 3], 1.0, NodeId::from_raw(1));
        let revision = light.shadow.map_revision();
        assert_eq!(light.shadow.set_map_size(777), 768);
        assert!(light.shadow.map_revision() > revision);
    }

    #[test]
    fn test_angle_updates_projection() {
        let mut light = SpotLight::new([1.0; 3], 1.0, NodeId::from_raw(1));
        let wide = light.shadow.camera.projection();
        light.set_angle(Deg(20.0));
        let narrow = light.shadow.camera.projection();
        // A narrower frustum scales x harder.
        assert!(narrow.x.x > wide.x.x);
        assert!((light.angle_degrees() - 20.0).abs() < 1e-4);
    }
}
