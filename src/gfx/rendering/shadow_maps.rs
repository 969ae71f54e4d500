//! Shadow map storage for the directional light and every spotlight
//!
//! A spotlight's map is only reallocated when its size or `map_revision`
//! changes; otherwise the same texture is re-rendered every frame.

use std::collections::HashMap;

use cgmath::Vector3;

use crate::gfx::{
    resources::{
        global_bindings::{directional_view_proj, DIRECTIONAL_SHADOW_MAP_SIZE},
        light_bindings::{ShadowViewUBO, SpotUBO},
        LightBindings, ShadowViewUniform, SpotUniform, TextureResource,
    },
    scene::{NodeId, Scene},
};

/// Depth target plus the bind group used while rendering into it.
pub struct ShadowTarget {
    pub map: TextureResource,
    view_ubo: ShadowViewUBO,
    pub view_group: wgpu::BindGroup,
}

impl ShadowTarget {
    fn new(device: &wgpu::Device, bindings: &LightBindings, size: u32, label: &str) -> Self {
        let map = TextureResource::create_shadow_map(device, size, label);
        let view_ubo = ShadowViewUBO::new(device);
        let view_group = bindings.create_shadow_view_group(device, &view_ubo, label);
        Self {
            map,
            view_ubo,
            view_group,
        }
    }
}

pub struct SpotShadow {
    pub target: ShadowTarget,
    spot_ubo: SpotUBO,
    /// Slot 2 of the spotlight pass
    pub spot_group: wgpu::BindGroup,
    pub cast_shadow: bool,
    size: u32,
    revision: u64,
}

pub struct ShadowMaps {
    pub directional: ShadowTarget,
    spots: HashMap<NodeId, SpotShadow>,
}

impl ShadowMaps {
    pub fn new(device: &wgpu::Device, bindings: &LightBindings) -> Self {
        Self {
            directional: ShadowTarget::new(
                device,
                bindings,
                DIRECTIONAL_SHADOW_MAP_SIZE,
                "Directional Shadow Map",
            ),
            spots: HashMap::new(),
        }
    }

    pub fn spot(&self, id: NodeId) -> Option<&SpotShadow> {
        self.spots.get(&id)
    }

    /// Updates light uniforms and returns the visible spotlights in draw order.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        bindings: &LightBindings,
    ) -> Vec<NodeId> {
        self.directional.view_ubo.update_content(
            queue,
            ShadowViewUniform {
                view_proj: directional_view_proj(&scene.directional).into(),
            },
        );

        let mut lights = Vec::new();
        for (id, light) in scene.spot_lights() {
            let Some(position) = scene.graph.world_position(id) else {
                continue;
            };
            let target = scene
                .graph
                .world_position(light.target)
                .unwrap_or(position - Vector3::unit_z());
            let uniform = SpotUniform::new(light, position, target);
            let size = light.shadow.map_size();
            let revision = light.shadow.map_revision();

            let outdated = self
                .spots
                .get(&id)
                .is_none_or(|shadow| shadow.size != size || shadow.revision != revision);
            if outdated {
                log::debug!("Allocating {}x{} shadow map for light {}", size, size, id);
                let label = format!("Spot Shadow Map {}", id);
                let target = ShadowTarget::new(device, bindings, size, &label);
                let spot_ubo = SpotUBO::new(device);
                let spot_group = bindings.create_spot_group(device, &spot_ubo, &target.map.view, &label);
                self.spots.insert(
                    id,
                    SpotShadow {
                        target,
                        spot_ubo,
                        spot_group,
                        cast_shadow: light.cast_shadow,
                        size,
                        revision,
                    },
                );
            }

            if let Some(shadow) = self.spots.get_mut(&id) {
                shadow.cast_shadow = light.cast_shadow;
                shadow.target.view_ubo.update_content(queue, uniform.shadow_view());
                shadow.spot_ubo.update_content(queue, uniform);
            }
            lights.push(id);
        }

        self.spots.retain(|id, _| lights.contains(id));
        lights
    }
}
