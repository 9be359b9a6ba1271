//! Culling Interface
//!
//! The lighting and shadow components consume culling results through the
//! `CullingResults` trait: the visible light list, shadow caster bounds, and
//! light-space matrices for cascades and spot lights. Hosts implement it on
//! top of their own visibility system.
//!
//! `SceneCulling` is a self-contained implementation over a camera, a light
//! list and a set of caster bounds. It is used by the preview tool and the
//! tests, and is a reasonable starting point for simple hosts.

use glam::{Mat4, Vec3, Vec4};

use crate::light::{LightKind, VisibleLight};
use crate::shadow::cascade::{fit_directional_cascade, fit_spot_shadow, CameraFrustum};

/// Axis-aligned world bounds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self {
            center,
            extents: extents.abs(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// Smallest bounds enclosing both
    pub fn union(&self, other: &Bounds) -> Bounds {
        Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min(), self.max());
        closest.distance_squared(center) <= radius * radius
    }
}

/// Culling data for one shadow tile
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowSplitData {
    /// xyz = center, w = radius
    pub culling_sphere: Vec4,
    /// Fraction of the cascade blend region casters may be culled from
    pub cascade_blend_culling_factor: f32,
}

/// Light-space matrices for one shadow tile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub split: ShadowSplitData,
}

impl ShadowMatrices {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Parameters of a directional cascade query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalCascadeRequest {
    pub visible_light_index: usize,
    pub cascade_index: u32,
    pub cascade_count: u32,
    pub ratios: Vec3,
    /// Tile edge length in pixels
    pub tile_size: u32,
    pub near_plane_offset: f32,
}

/// Culling results for one camera
pub trait CullingResults {
    /// Lights that survived culling, in culling order
    fn visible_lights(&self) -> &[VisibleLight];

    /// Bounds of everything that can cast a shadow for the light, if any
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds>;

    /// View, projection and culling sphere for one directional cascade
    fn directional_shadow_matrices(&self, request: &DirectionalCascadeRequest) -> Option<ShadowMatrices>;

    /// View, projection and culling data for a spot (or point) light
    fn spot_shadow_matrices(&self, visible_light_index: usize) -> Option<ShadowMatrices>;

    /// Receive the visible-light to other-light-slot map used for per-object
    /// lighting; `-1` marks lights without a slot
    fn set_light_index_map(&mut self, map: Vec<i32>);
}

/// Culling over an explicit camera, light list and caster set
#[derive(Clone, Debug)]
pub struct SceneCulling {
    pub camera: CameraFrustum,
    /// Real-time shadow distance from the camera
    pub shadow_distance: f32,
    pub lights: Vec<VisibleLight>,
    pub casters: Vec<Bounds>,
    light_index_map: Option<Vec<i32>>,
}

impl SceneCulling {
    pub fn new(camera: CameraFrustum, shadow_distance: f32) -> Self {
        Self {
            camera,
            shadow_distance,
            lights: Vec::new(),
            casters: Vec::new(),
            light_index_map: None,
        }
    }

    pub fn with_light(mut self, light: VisibleLight) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_caster(mut self, bounds: Bounds) -> Self {
        self.casters.push(bounds);
        self
    }

    /// Last per-object light index map handed back by the collector
    pub fn light_index_map(&self) -> Option<&[i32]> {
        self.light_index_map.as_deref()
    }

    fn casters_within(&self, center: Vec3, radius: f32) -> Option<Bounds> {
        self.casters
            .iter()
            .filter(|b| b.intersects_sphere(center, radius))
            .fold(None, |acc: Option<Bounds>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }
}

impl CullingResults for SceneCulling {
    fn visible_lights(&self) -> &[VisibleLight] {
        &self.lights
    }

    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds> {
        let light = self.lights.get(visible_light_index)?;
        match light.kind {
            LightKind::Directional => {
                let reach = self.shadow_distance.min(self.camera.far);
                self.casters_within(self.camera.position(), reach)
            }
            LightKind::Point { range } | LightKind::Spot { range, .. } => {
                self.casters_within(light.position(), range)
            }
        }
    }

    fn directional_shadow_matrices(&self, request: &DirectionalCascadeRequest) -> Option<ShadowMatrices> {
        let light = self.lights.get(request.visible_light_index)?;
        if light.kind != LightKind::Directional {
            return None;
        }
        Some(fit_directional_cascade(
            &self.camera,
            light.forward(),
            self.shadow_distance,
            request,
        ))
    }

    fn spot_shadow_matrices(&self, visible_light_index: usize) -> Option<ShadowMatrices> {
        let light = self.lights.get(visible_light_index)?;
        match light.kind {
            LightKind::Directional => None,
            LightKind::Point { range } => Some(fit_spot_shadow(light.position(), light.forward(), 90.0, range)),
            LightKind::Spot {
                range, outer_angle, ..
            } => Some(fit_spot_shadow(light.position(), light.forward(), outer_angle, range)),
        }
    }

    fn set_light_index_map(&mut self, map: Vec<i32>) {
        self.light_index_map = Some(map);
    }
}
