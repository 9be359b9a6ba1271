//! Shadow Atlas Planner
//!
//! Collects shadow reservations for one camera frame, lays the shadowed
//! lights out in the directional and other-light atlases, records the depth
//! draws and publishes everything shading needs as globals.
//!
//! A frame runs `setup` → `reserve_*` → `render` → `cleanup`. Reservations
//! are only accepted between `setup` and `render`.

use glam::{Mat4, Vec4};

use crate::command::{CommandBuffer, ShadowDrawRequest};
use crate::config::{
    LightCapacity, PlatformSettings, ShadowSettings, ShadowmaskMode, MAX_CASCADES,
    MAX_SHADOWED_DIRECTIONAL_LIGHTS, MAX_SHADOWED_OTHER_LIGHTS,
};
use crate::culling::{CullingResults, DirectionalCascadeRequest};
use crate::light::VisibleLight;
use crate::properties::{
    CASCADE_BLEND_KEYWORDS, CASCADE_COUNT, CASCADE_CULLING_SPHERES, CASCADE_DATA, DIRECTIONAL_FILTER_KEYWORDS,
    DIR_SHADOW_ATLAS, DIR_SHADOW_MATRICES, OTHER_FILTER_KEYWORDS, OTHER_SHADOW_ATLAS, OTHER_SHADOW_MATRICES,
    SHADOW_ATLAS_SIZE, SHADOW_DISTANCE_FADE, SHADOW_MASK_KEYWORDS, SHADOW_PANCAKING,
};

use super::atlas::AtlasLayout;
use super::cascade::CascadeCulling;
use super::data::{ShadowData, ShadowedDirectionalLight, ShadowedOtherLight};

/// Profiler sample wrapping shadow rendering
pub const SHADOWS_SAMPLE: &str = "Shadows";

/// Directional atlas tiles: every shadowed light gets one tile per cascade
pub const MAX_DIRECTIONAL_TILES: usize = MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES;

/// Frame phase of the planner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlannerPhase {
    #[default]
    Idle,
    /// Between `setup` and `render`: reservations accepted
    Collecting,
    /// Shadows recorded, waiting for `cleanup`
    Rendered,
}

/// Counters for the last rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowFrameStats {
    pub directional_tiles: u32,
    pub other_tiles: u32,
    /// Tiles skipped because the matrix query failed
    pub skipped_tiles: u32,
    pub mask_only_lights: u32,
}

/// Per-camera shadow atlas planner
#[derive(Debug)]
pub struct ShadowPlanner {
    platform: PlatformSettings,
    max_shadowed_other: usize,
    settings: ShadowSettings,
    phase: PlannerPhase,

    directional: Vec<ShadowedDirectionalLight>,
    other: Vec<ShadowedOtherLight>,
    use_shadow_mask: bool,
    dir_atlas_allocated: bool,
    other_atlas_allocated: bool,

    dir_matrices: [Mat4; MAX_DIRECTIONAL_TILES],
    other_matrices: [Mat4; MAX_SHADOWED_OTHER_LIGHTS],
    cascades: [CascadeCulling; MAX_CASCADES],
    /// (dir size, 1/dir size, other size, 1/other size)
    atlas_sizes: Vec4,

    stats: ShadowFrameStats,
}

impl ShadowPlanner {
    pub fn new(platform: PlatformSettings, capacity: LightCapacity) -> Self {
        Self {
            platform,
            max_shadowed_other: capacity.max_shadowed_other_lights(),
            settings: ShadowSettings::default(),
            phase: PlannerPhase::Idle,
            directional: Vec::with_capacity(MAX_SHADOWED_DIRECTIONAL_LIGHTS),
            other: Vec::with_capacity(MAX_SHADOWED_OTHER_LIGHTS),
            use_shadow_mask: false,
            dir_atlas_allocated: false,
            other_atlas_allocated: false,
            dir_matrices: [Mat4::ZERO; MAX_DIRECTIONAL_TILES],
            other_matrices: [Mat4::ZERO; MAX_SHADOWED_OTHER_LIGHTS],
            cascades: [CascadeCulling::default(); MAX_CASCADES],
            atlas_sizes: Vec4::ZERO,
            stats: ShadowFrameStats::default(),
        }
    }

    /// Start a frame: store settings and forget last frame's reservations
    pub fn setup(&mut self, settings: &ShadowSettings) {
        if self.phase == PlannerPhase::Rendered {
            log::warn!("Shadow planner set up again before cleanup; atlases of the previous frame stay allocated");
        }

        self.settings = settings.clone();
        self.settings.validate();
        self.phase = PlannerPhase::Collecting;

        self.directional.clear();
        self.other.clear();
        self.use_shadow_mask = false;
        self.dir_atlas_allocated = false;
        self.other_atlas_allocated = false;
        self.dir_matrices = [Mat4::ZERO; MAX_DIRECTIONAL_TILES];
        self.other_matrices = [Mat4::ZERO; MAX_SHADOWED_OTHER_LIGHTS];
        self.cascades = [CascadeCulling::default(); MAX_CASCADES];
        self.atlas_sizes = Vec4::ZERO;
        self.stats = ShadowFrameStats::default();
    }

    /// Record the shadow-mask channel of a mixed shadowmask light
    fn mask_channel(&mut self, light: &VisibleLight) -> Option<u32> {
        let channel = light.baking.shadow_mask_channel();
        if channel.is_some() {
            self.use_shadow_mask = true;
        }
        channel
    }

    fn mask_only(&mut self, strength: f32, mask_channel: Option<u32>) -> ShadowData {
        self.stats.mask_only_lights += 1;
        ShadowData::MaskOnly { strength, mask_channel }
    }

    fn accepts_reservations(&self, kind: &str) -> bool {
        if self.phase != PlannerPhase::Collecting {
            log::warn!("{} shadow reservation rejected outside of setup/render ({:?})", kind, self.phase);
            return false;
        }
        true
    }

    /// Reserve atlas tiles for a directional light's cascades
    pub fn reserve_directional(
        &mut self,
        culling: &dyn CullingResults,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> ShadowData {
        if !self.accepts_reservations("Directional") {
            return ShadowData::Disabled;
        }
        if self.directional.len() >= MAX_SHADOWED_DIRECTIONAL_LIGHTS || !light.shadows.is_casting() {
            return ShadowData::Disabled;
        }

        let strength = light.shadows.strength;
        let mask_channel = self.mask_channel(light);

        if culling.shadow_caster_bounds(visible_light_index).is_none() {
            log::debug!("Directional light {} has no shadow casters, mask only", visible_light_index);
            return self.mask_only(strength, mask_channel);
        }

        let slot = self.directional.len() as u32;
        self.directional.push(ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.shadows.bias,
            near_plane_offset: light.shadows.near_plane,
        });
        log::debug!("Directional light {} reserved shadow slot {}", visible_light_index, slot);

        ShadowData::Realtime {
            strength,
            tile_index: self.settings.directional.cascade_count * slot,
            normal_bias: light.shadows.normal_bias,
            mask_channel,
        }
    }

    /// Reserve an atlas tile for a point or spot light
    pub fn reserve_other(
        &mut self,
        culling: &dyn CullingResults,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> ShadowData {
        if !self.accepts_reservations("Other") {
            return ShadowData::Disabled;
        }
        if !light.shadows.is_casting() {
            return ShadowData::Disabled;
        }

        let strength = light.shadows.strength;
        let mask_channel = self.mask_channel(light);

        if self.other.len() >= self.max_shadowed_other {
            log::debug!("Other shadow capacity reached, light {} falls back to mask only", visible_light_index);
            return self.mask_only(strength, mask_channel);
        }
        if culling.shadow_caster_bounds(visible_light_index).is_none() {
            log::debug!("Light {} has no shadow casters, mask only", visible_light_index);
            return self.mask_only(strength, mask_channel);
        }

        let slot = self.other.len() as u32;
        self.other.push(ShadowedOtherLight {
            visible_light_index,
            slope_scale_bias: light.shadows.bias,
            normal_bias: light.shadows.normal_bias,
        });
        log::debug!("Light {} reserved other shadow slot {}", visible_light_index, slot);

        ShadowData::Realtime {
            strength,
            tile_index: slot,
            normal_bias: 0.0,
            mask_channel,
        }
    }

    /// Record shadow atlas rendering and publish shadow globals
    pub fn render(&mut self, culling: &dyn CullingResults, buffer: &mut CommandBuffer) {
        if self.phase != PlannerPhase::Collecting {
            log::warn!("Shadow render skipped: planner is {:?}, expected Collecting", self.phase);
            return;
        }

        buffer.begin_sample(SHADOWS_SAMPLE);

        if self.directional.is_empty() {
            buffer.get_shadow_target(DIR_SHADOW_ATLAS, 1);
        } else {
            self.render_directional(culling, buffer);
        }
        self.dir_atlas_allocated = true;

        if self.other.is_empty() {
            buffer.set_global_texture(OTHER_SHADOW_ATLAS.name(), DIR_SHADOW_ATLAS);
        } else {
            self.render_other(culling, buffer);
            self.other_atlas_allocated = true;
        }

        self.publish_globals(buffer);
        buffer.end_sample(SHADOWS_SAMPLE);

        self.phase = PlannerPhase::Rendered;
    }

    fn render_directional(&mut self, culling: &dyn CullingResults, buffer: &mut CommandBuffer) {
        let dir = &self.settings.directional;
        let atlas_size = dir.atlas_size.pixels();
        self.atlas_sizes.x = atlas_size as f32;
        self.atlas_sizes.y = 1.0 / atlas_size as f32;

        buffer.get_shadow_target(DIR_SHADOW_ATLAS, atlas_size);
        buffer.set_render_target(DIR_SHADOW_ATLAS);
        buffer.clear_depth();
        buffer.set_global_float(SHADOW_PANCAKING, 1.0);

        let cascade_count = dir.cascade_count;
        let layout = AtlasLayout::new(atlas_size, self.directional.len() as u32 * cascade_count);
        let blend_culling_factor = dir.blend_culling_factor();
        let ratios = dir.ratios();
        let filter = dir.filter;
        log::debug!(
            "Directional atlas {}px: {} tiles, split {}, tile {}px",
            atlas_size,
            layout.tile_count,
            layout.split,
            layout.tile_size
        );

        for (slot, light) in self.directional.iter().enumerate() {
            let tile_offset = slot as u32 * cascade_count;

            for cascade in 0..cascade_count {
                let request = DirectionalCascadeRequest {
                    visible_light_index: light.visible_light_index,
                    cascade_index: cascade,
                    cascade_count,
                    ratios,
                    tile_size: layout.tile_size,
                    near_plane_offset: light.near_plane_offset,
                };
                let Some(matrices) = culling.directional_shadow_matrices(&request) else {
                    log::warn!(
                        "No cascade {} matrices for directional light {}, tile skipped",
                        cascade,
                        light.visible_light_index
                    );
                    self.stats.skipped_tiles += 1;
                    continue;
                };

                let mut split = matrices.split;
                split.cascade_blend_culling_factor = blend_culling_factor;
                if slot == 0 {
                    self.cascades[cascade as usize] = CascadeCulling::new(split.culling_sphere, layout.tile_size, filter);
                }

                let tile = layout.tile(tile_offset + cascade);
                log::trace!("Directional tile {} at {:?}", tile.index, tile.grid());
                buffer.set_viewport(tile.viewport());
                self.dir_matrices[tile.index as usize] =
                    tile.atlas_matrix(matrices.view_projection(), self.platform.reversed_z);
                buffer.set_view_projection(matrices.view, matrices.projection);

                buffer.set_depth_bias(0.0, light.slope_scale_bias);
                buffer.draw_shadows(ShadowDrawRequest {
                    visible_light_index: light.visible_light_index,
                    split,
                });
                buffer.set_depth_bias(0.0, 0.0);
                self.stats.directional_tiles += 1;
            }
        }
    }

    fn render_other(&mut self, culling: &dyn CullingResults, buffer: &mut CommandBuffer) {
        let atlas_size = self.settings.other.atlas_size.pixels();
        self.atlas_sizes.z = atlas_size as f32;
        self.atlas_sizes.w = 1.0 / atlas_size as f32;

        buffer.get_shadow_target(OTHER_SHADOW_ATLAS, atlas_size);
        buffer.set_render_target(OTHER_SHADOW_ATLAS);
        buffer.clear_depth();
        buffer.set_global_float(SHADOW_PANCAKING, 0.0);

        let layout = AtlasLayout::new(atlas_size, self.other.len() as u32);
        log::debug!(
            "Other atlas {}px: {} tiles, split {}, tile {}px",
            atlas_size,
            layout.tile_count,
            layout.split,
            layout.tile_size
        );

        for (slot, light) in self.other.iter().enumerate() {
            let Some(matrices) = culling.spot_shadow_matrices(light.visible_light_index) else {
                log::warn!("No shadow matrices for light {}, tile skipped", light.visible_light_index);
                self.stats.skipped_tiles += 1;
                continue;
            };

            let tile = layout.tile(slot as u32);
            log::trace!("Other tile {} at {:?}", tile.index, tile.grid());
            buffer.set_viewport(tile.viewport());
            self.other_matrices[slot] = tile.atlas_matrix(matrices.view_projection(), self.platform.reversed_z);
            buffer.set_view_projection(matrices.view, matrices.projection);

            buffer.set_depth_bias(0.0, light.slope_scale_bias);
            buffer.draw_shadows(ShadowDrawRequest {
                visible_light_index: light.visible_light_index,
                split: matrices.split,
            });
            buffer.set_depth_bias(0.0, 0.0);
            self.stats.other_tiles += 1;
        }
    }

    fn publish_globals(&self, buffer: &mut CommandBuffer) {
        let dir = &self.settings.directional;

        let cascade_count = if self.directional.is_empty() { 0 } else { dir.cascade_count };
        buffer.set_global_int(CASCADE_COUNT, cascade_count as i32);

        let spheres: Vec<Vec4> = self.cascades.iter().map(|c| c.culling_sphere).collect();
        let data: Vec<Vec4> = self.cascades.iter().map(|c| c.data).collect();
        buffer.set_global_vector_array(CASCADE_CULLING_SPHERES, &spheres);
        buffer.set_global_vector_array(CASCADE_DATA, &data);
        buffer.set_global_matrix_array(DIR_SHADOW_MATRICES, &self.dir_matrices);
        buffer.set_global_matrix_array(OTHER_SHADOW_MATRICES, &self.other_matrices);

        buffer.set_keyword_group(&SHADOW_MASK_KEYWORDS, self.shadow_mask_keyword());
        buffer.set_keyword_group(&DIRECTIONAL_FILTER_KEYWORDS, dir.filter.keyword_index());
        buffer.set_keyword_group(&OTHER_FILTER_KEYWORDS, self.settings.other.filter.keyword_index());
        buffer.set_keyword_group(&CASCADE_BLEND_KEYWORDS, dir.cascade_blend.keyword_index());

        buffer.set_global_vector(SHADOW_DISTANCE_FADE, self.settings.distance_fade_vector());
        buffer.set_global_vector(SHADOW_ATLAS_SIZE, self.atlas_sizes);
    }

    fn shadow_mask_keyword(&self) -> Option<usize> {
        if !self.use_shadow_mask {
            return None;
        }
        match self.platform.shadowmask_mode {
            ShadowmaskMode::Shadowmask => Some(0),
            ShadowmaskMode::DistanceShadowmask => Some(1),
        }
    }

    /// Release the atlases allocated by `render`
    pub fn cleanup(&mut self, buffer: &mut CommandBuffer) {
        if self.dir_atlas_allocated {
            buffer.release_temporary_target(DIR_SHADOW_ATLAS);
        }
        if self.other_atlas_allocated {
            buffer.release_temporary_target(OTHER_SHADOW_ATLAS);
        }
        if self.phase == PlannerPhase::Collecting {
            log::debug!("Shadow planner cleaned up without rendering");
        }

        self.dir_atlas_allocated = false;
        self.other_atlas_allocated = false;
        self.phase = PlannerPhase::Idle;
    }

    pub fn phase(&self) -> PlannerPhase {
        self.phase
    }

    pub fn platform(&self) -> &PlatformSettings {
        &self.platform
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn shadowed_directional_lights(&self) -> &[ShadowedDirectionalLight] {
        &self.directional
    }

    pub fn shadowed_other_lights(&self) -> &[ShadowedOtherLight] {
        &self.other
    }

    pub fn uses_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    pub fn directional_matrices(&self) -> &[Mat4] {
        &self.dir_matrices
    }

    pub fn other_matrices(&self) -> &[Mat4] {
        &self.other_matrices
    }

    pub fn cascade_culling(&self) -> &[CascadeCulling] {
        &self.cascades
    }

    pub fn atlas_sizes(&self) -> Vec4 {
        self.atlas_sizes
    }

    pub fn stats(&self) -> ShadowFrameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, ShaderGlobals};
    use crate::config::{CascadeBlendMode, FilterMode};
    use crate::culling::{Bounds, SceneCulling};
    use crate::light::{LightBaking, LightShadowSettings, MixedLightingMode};
    use crate::shadow::cascade::CameraFrustum;
    use glam::Vec3;

    fn camera() -> CameraFrustum {
        CameraFrustum::look_at(Vec3::new(0.0, 4.0, 12.0), Vec3::ZERO, 60.0, 1.5, 0.3, 500.0)
    }

    fn sun(strength: f32) -> VisibleLight {
        VisibleLight::directional(Vec3::new(0.2, -1.0, 0.3), Vec4::ONE)
            .with_shadows(LightShadowSettings::hard().with_strength(strength))
    }

    fn lit_scene(lights: Vec<VisibleLight>) -> SceneCulling {
        let mut culling = SceneCulling::new(camera(), 50.0).with_caster(Bounds::new(Vec3::ZERO, Vec3::splat(2.0)));
        culling.lights = lights;
        culling
    }

    fn planner() -> ShadowPlanner {
        let mut planner = ShadowPlanner::new(PlatformSettings::default(), LightCapacity::Compact);
        planner.setup(&ShadowSettings::default());
        planner
    }

    #[test]
    fn test_directional_capacity() {
        let culling = lit_scene((0..6).map(|_| sun(1.0)).collect());
        let mut planner = planner();

        let results: Vec<ShadowData> = culling
            .lights
            .iter()
            .enumerate()
            .map(|(i, light)| planner.reserve_directional(&culling, light, i))
            .collect();

        for (slot, data) in results[..4].iter().enumerate() {
            match data {
                ShadowData::Realtime { tile_index, .. } => assert_eq!(*tile_index, 4 * slot as u32),
                other => panic!("expected realtime shadows, got {:?}", other),
            }
        }
        assert_eq!(results[4], ShadowData::Disabled);
        assert_eq!(results[5], ShadowData::Disabled);
        assert_eq!(planner.shadowed_directional_lights().len(), 4);
    }

    #[test]
    fn test_reserve_rejects_non_casting() {
        let culling = lit_scene(vec![sun(0.0), VisibleLight::directional(Vec3::NEG_Y, Vec4::ONE)]);
        let mut planner = planner();

        assert_eq!(planner.reserve_directional(&culling, &culling.lights[0], 0), ShadowData::Disabled);
        assert_eq!(planner.reserve_directional(&culling, &culling.lights[1], 1), ShadowData::Disabled);
        assert!(planner.shadowed_directional_lights().is_empty());
    }

    #[test]
    fn test_mask_only_without_casters() {
        let light = sun(0.8).with_baking(LightBaking::Mixed {
            mode: MixedLightingMode::Shadowmask,
            occlusion_channel: 2,
        });
        let mut culling = SceneCulling::new(camera(), 50.0);
        culling.lights = vec![light];
        let mut planner = planner();

        let data = planner.reserve_directional(&culling, &culling.lights[0], 0);
        assert_eq!(
            data,
            ShadowData::MaskOnly {
                strength: 0.8,
                mask_channel: Some(2)
            }
        );
        assert_eq!(data.encode(), Vec4::new(-0.8, 0.0, 0.0, 2.0));
        assert!(planner.uses_shadow_mask());
    }

    #[test]
    fn test_other_over_capacity_is_mask_only() {
        let lights: Vec<VisibleLight> = (0..18)
            .map(|i| {
                VisibleLight::point(Vec3::new(i as f32 * 0.1, 1.0, 0.0), 5.0, Vec4::ONE)
                    .with_shadows(LightShadowSettings::soft())
            })
            .collect();
        let culling = lit_scene(lights);
        let mut planner = planner();

        let results: Vec<ShadowData> = culling
            .lights
            .iter()
            .enumerate()
            .map(|(i, light)| planner.reserve_other(&culling, light, i))
            .collect();

        assert!(results[..16].iter().all(ShadowData::is_realtime));
        assert_eq!(
            results[16],
            ShadowData::MaskOnly {
                strength: 1.0,
                mask_channel: None
            }
        );
        assert_eq!(planner.stats().mask_only_lights, 2);
    }

    #[test]
    fn test_reserve_after_render_rejected() {
        let culling = lit_scene(vec![sun(1.0)]);
        let mut planner = planner();
        let mut buffer = CommandBuffer::new();

        planner.render(&culling, &mut buffer);
        assert_eq!(planner.phase(), PlannerPhase::Rendered);
        assert_eq!(planner.reserve_directional(&culling, &culling.lights[0], 0), ShadowData::Disabled);
    }

    #[test]
    fn test_render_without_setup_records_nothing() {
        let culling = lit_scene(vec![]);
        let mut planner = ShadowPlanner::new(PlatformSettings::default(), LightCapacity::Compact);
        let mut buffer = CommandBuffer::new();

        planner.render(&culling, &mut buffer);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_no_shadows_uses_placeholder_atlas() {
        let culling = lit_scene(vec![]);
        let mut planner = planner();
        let mut buffer = CommandBuffer::new();

        planner.render(&culling, &mut buffer);
        planner.cleanup(&mut buffer);

        let gets: Vec<&Command> = buffer
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::GetTemporaryTarget(_)))
            .collect();
        assert_eq!(gets.len(), 1);
        assert!(matches!(gets[0], Command::GetTemporaryTarget(desc) if desc.width == 1 && desc.id == DIR_SHADOW_ATLAS));

        let releases: Vec<&Command> = buffer
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ReleaseTemporaryTarget(_)))
            .collect();
        assert_eq!(releases, vec![&Command::ReleaseTemporaryTarget(DIR_SHADOW_ATLAS)]);
        assert_eq!(planner.phase(), PlannerPhase::Idle);
    }

    #[test]
    fn test_render_two_lights_four_cascades() {
        let culling = lit_scene(vec![sun(1.0), sun(0.5)]);
        let mut planner = planner();
        for (i, light) in culling.lights.iter().enumerate() {
            planner.reserve_directional(&culling, light, i);
        }

        let mut buffer = CommandBuffer::new();
        planner.render(&culling, &mut buffer);

        let mut globals = ShaderGlobals::new();
        globals.execute(&buffer).unwrap();

        let draws = globals.shadow_draws();
        assert_eq!(draws.len(), 8);
        let tile = 1024.0 / 4.0;
        for (k, draw) in draws.iter().enumerate() {
            assert_eq!(draw.viewport.x, (k % 4) as f32 * tile);
            assert_eq!(draw.viewport.y, (k / 4) as f32 * tile);
            assert_eq!(draw.viewport.width, tile);
            assert!((draw.request.split.cascade_blend_culling_factor - 0.7).abs() < 1e-6);
        }

        assert_eq!(globals.int(CASCADE_COUNT), Some(4));
        assert_eq!(globals.float(SHADOW_PANCAKING), Some(1.0));
        let atlas_sizes = globals.vector(SHADOW_ATLAS_SIZE).unwrap();
        assert_eq!(atlas_sizes.x, 1024.0);
        assert_eq!(atlas_sizes.z, 0.0);
        assert_eq!(globals.texture(OTHER_SHADOW_ATLAS.name()), Some(DIR_SHADOW_ATLAS));
        assert!(planner.directional_matrices()[..8].iter().all(|m| *m != Mat4::ZERO));
        assert_eq!(globals.depth_bias().slope_scale, 0.0);
    }

    #[test]
    fn test_render_keywords() {
        let culling = lit_scene(vec![sun(1.0)]);
        let mut settings = ShadowSettings::default();
        settings.directional.filter = FilterMode::Pcf5x5;
        settings.directional.cascade_blend = CascadeBlendMode::Dither;
        settings.other.filter = FilterMode::Pcf2x2;

        let mut planner = ShadowPlanner::new(
            PlatformSettings {
                reversed_z: false,
                shadowmask_mode: ShadowmaskMode::Shadowmask,
            },
            LightCapacity::Compact,
        );
        planner.setup(&settings);
        let light = culling.lights[0].clone().with_baking(LightBaking::Mixed {
            mode: MixedLightingMode::Shadowmask,
            occlusion_channel: 0,
        });
        planner.reserve_directional(&culling, &light, 0);

        let mut buffer = CommandBuffer::new();
        planner.render(&culling, &mut buffer);
        let mut globals = ShaderGlobals::new();
        globals.execute(&buffer).unwrap();

        assert!(globals.keyword_enabled("_DIRECTIONAL_PCF5"));
        assert!(!globals.keyword_enabled("_DIRECTIONAL_PCF3"));
        assert!(!OTHER_FILTER_KEYWORDS.iter().any(|k| globals.keyword_enabled(k)));
        assert!(globals.keyword_enabled("_CASCADE_BLEND_DITHER"));
        assert!(globals.keyword_enabled("_SHADOW_MASK_ALWAYS"));
        assert!(!globals.keyword_enabled("_SHADOW_MASK_DISTANCE"));
    }

    #[test]
    fn test_first_light_fills_cascades() {
        let culling = lit_scene(vec![sun(1.0)]);
        let mut planner = planner();
        planner.reserve_directional(&culling, &culling.lights[0], 0);

        let mut buffer = CommandBuffer::new();
        planner.render(&culling, &mut buffer);

        for cascade in planner.cascade_culling() {
            assert!(cascade.culling_sphere.w > 0.0);
            assert!(cascade.data.x > 0.0);
        }
    }

    #[test]
    fn test_other_atlas_released_on_cleanup() {
        let spot = VisibleLight::spot(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 10.0, 20.0, 40.0, Vec4::ONE)
            .with_shadows(LightShadowSettings::hard());
        let culling = lit_scene(vec![spot]);
        let mut planner = planner();
        assert!(planner.reserve_other(&culling, &culling.lights[0], 0).is_realtime());

        let mut buffer = CommandBuffer::new();
        planner.render(&culling, &mut buffer);
        planner.cleanup(&mut buffer);

        let mut globals = ShaderGlobals::new();
        globals.execute(&buffer).unwrap();
        assert_eq!(globals.live_target_count(), 0);
        assert_eq!(globals.total_allocations(), 2);
        assert_eq!(globals.shadow_draws().len(), 1);
        assert_eq!(globals.float(SHADOW_PANCAKING), Some(0.0));
        assert_ne!(planner.other_matrices()[0], Mat4::ZERO);
    }
}
