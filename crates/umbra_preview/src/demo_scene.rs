//! Demo Scene
//!
//! A small courtyard: a sun, a fill light without shadows, a ring of
//! shadowed point lights and two spot lights, over a grid of caster boxes.

use glam::{Vec3, Vec4};

use umbra_render::culling::{Bounds, SceneCulling};
use umbra_render::light::{LightBaking, LightShadowSettings, MixedLightingMode, VisibleLight};
use umbra_render::shadow::CameraFrustum;

const POINT_RING: usize = 6;

/// Main camera looking over the courtyard
pub fn main_camera(aspect: f32) -> CameraFrustum {
    CameraFrustum::look_at(Vec3::new(0.0, 8.0, 24.0), Vec3::ZERO, 60.0, aspect, 0.3, 1000.0)
}

/// Top-down camera, as a minimap would use
pub fn overhead_camera() -> CameraFrustum {
    CameraFrustum::look_at(Vec3::new(0.0, 40.0, 0.1), Vec3::ZERO, 45.0, 1.0, 1.0, 200.0)
}

pub fn build(camera: CameraFrustum, shadow_distance: f32) -> SceneCulling {
    let mut scene = SceneCulling::new(camera, shadow_distance)
        .with_light(
            VisibleLight::directional(Vec3::new(0.4, -1.0, -0.3), Vec4::new(1.0, 0.95, 0.85, 1.0) * 2.0)
                .with_shadows(LightShadowSettings::soft())
                .with_baking(LightBaking::Mixed {
                    mode: MixedLightingMode::Shadowmask,
                    occlusion_channel: 0,
                }),
        )
        .with_light(VisibleLight::directional(Vec3::new(-0.5, -0.2, 0.6), Vec4::new(0.2, 0.25, 0.35, 1.0)));

    for i in 0..POINT_RING {
        let angle = i as f32 / POINT_RING as f32 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos() * 8.0, 2.0, angle.sin() * 8.0);
        let light = VisibleLight::point(position, 6.0, Vec4::new(1.0, 0.6, 0.3, 1.0) * 4.0);
        let light = if i % 2 == 0 {
            light.with_shadows(LightShadowSettings::hard().with_strength(0.8))
        } else {
            light
        };
        scene = scene.with_light(light);
    }

    scene = scene
        .with_light(
            VisibleLight::spot(Vec3::new(-4.0, 6.0, 4.0), Vec3::new(0.3, -1.0, -0.3), 15.0, 25.0, 40.0, Vec4::ONE * 6.0)
                .with_shadows(LightShadowSettings::soft()),
        )
        .with_light(
            VisibleLight::spot(Vec3::new(4.0, 6.0, -4.0), Vec3::new(-0.3, -1.0, 0.3), 15.0, 30.0, 50.0, Vec4::ONE * 6.0)
                .with_shadows(LightShadowSettings::hard()),
        );

    // Ground and crates
    scene = scene.with_caster(Bounds::new(Vec3::new(0.0, -0.5, 0.0), Vec3::new(30.0, 0.5, 30.0)));
    for x in -2..=2 {
        for z in -2..=2 {
            let center = Vec3::new(x as f32 * 5.0, 1.0, z as f32 * 5.0);
            scene = scene.with_caster(Bounds::new(center, Vec3::splat(1.0)));
        }
    }

    scene
}
