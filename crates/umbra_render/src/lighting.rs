//! Light Collection
//!
//! Turns the visible light list of one camera into the fixed-size uniform
//! arrays shading reads, reserving shadows for each light on the way.
//! Directional lights fill up to four slots; point and spot lights share the
//! other-light pool whose size depends on the capacity profile. Lights beyond
//! capacity are dropped for the frame.

use glam::Vec4;

use crate::command::CommandBuffer;
use crate::config::{LightCapacity, PlatformSettings, ShadowSettings, MAX_DIRECTIONAL_LIGHTS};
use crate::culling::CullingResults;
use crate::light::LightRecord;
use crate::properties::{
    DIR_LIGHT_COLORS, DIR_LIGHT_COUNT, DIR_LIGHT_DIRECTIONS, DIR_LIGHT_SHADOW_DATA, LIGHTS_PER_OBJECT_KEYWORD,
    OTHER_LIGHT_COLORS, OTHER_LIGHT_COUNT, OTHER_LIGHT_DIRECTIONS, OTHER_LIGHT_POSITIONS, OTHER_LIGHT_SHADOW_DATA,
    OTHER_LIGHT_SPOT_ANGLES,
};
use crate::shadow::{ShadowData, ShadowPlanner};

/// Profiler sample wrapping light setup
pub const LIGHTING_SAMPLE: &str = "Lighting";

/// Slot value of lights without an other-light slot in the per-object map
pub const NO_LIGHT_SLOT: i32 = -1;

/// Per-camera light uniform builder
#[derive(Debug)]
pub struct LightCollector {
    max_other: usize,
    planner: ShadowPlanner,

    dir_count: usize,
    dir_colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    dir_directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    dir_shadows: [ShadowData; MAX_DIRECTIONAL_LIGHTS],

    other_count: usize,
    other_colors: Vec<Vec4>,
    other_positions: Vec<Vec4>,
    other_directions: Vec<Vec4>,
    other_spot_angles: Vec<Vec4>,
    other_shadows: Vec<ShadowData>,

    light_index_map: Vec<i32>,
    dropped_lights: usize,
}

impl LightCollector {
    pub fn new(capacity: LightCapacity, platform: PlatformSettings) -> Self {
        let max_other = capacity.max_other_lights();
        Self {
            max_other,
            planner: ShadowPlanner::new(platform, capacity),
            dir_count: 0,
            dir_colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            dir_directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            dir_shadows: [ShadowData::Disabled; MAX_DIRECTIONAL_LIGHTS],
            other_count: 0,
            other_colors: vec![Vec4::ZERO; max_other],
            other_positions: vec![Vec4::ZERO; max_other],
            other_directions: vec![Vec4::ZERO; max_other],
            other_spot_angles: vec![Vec4::ZERO; max_other],
            other_shadows: vec![ShadowData::Disabled; max_other],
            light_index_map: Vec::new(),
            dropped_lights: 0,
        }
    }

    /// Collect the frame's lights, upload light globals and render shadows
    pub fn setup(
        &mut self,
        culling: &mut dyn CullingResults,
        settings: &ShadowSettings,
        use_lights_per_object: bool,
        buffer: &mut CommandBuffer,
    ) {
        buffer.begin_sample(LIGHTING_SAMPLE);
        self.planner.setup(settings);

        self.collect(&*culling, use_lights_per_object);
        if use_lights_per_object {
            culling.set_light_index_map(self.light_index_map.clone());
        }
        buffer.set_keyword(LIGHTS_PER_OBJECT_KEYWORD, use_lights_per_object);

        self.upload(buffer);
        self.planner.render(&*culling, buffer);
        buffer.end_sample(LIGHTING_SAMPLE);
    }

    fn reset(&mut self) {
        self.dir_count = 0;
        self.dir_colors.fill(Vec4::ZERO);
        self.dir_directions.fill(Vec4::ZERO);
        self.dir_shadows.fill(ShadowData::Disabled);

        self.other_count = 0;
        self.other_colors.fill(Vec4::ZERO);
        self.other_positions.fill(Vec4::ZERO);
        self.other_directions.fill(Vec4::ZERO);
        self.other_spot_angles.fill(Vec4::ZERO);
        self.other_shadows.fill(ShadowData::Disabled);

        self.light_index_map.clear();
        self.dropped_lights = 0;
    }

    fn collect(&mut self, culling: &dyn CullingResults, use_lights_per_object: bool) {
        self.reset();

        for (visible_index, light) in culling.visible_lights().iter().enumerate() {
            let mut slot = NO_LIGHT_SLOT;

            match LightRecord::classify(light) {
                LightRecord::Directional { color, direction } => {
                    if self.dir_count < MAX_DIRECTIONAL_LIGHTS {
                        let index = self.dir_count;
                        self.dir_count += 1;
                        self.dir_colors[index] = color;
                        self.dir_directions[index] = direction;
                        self.dir_shadows[index] = self.planner.reserve_directional(culling, light, visible_index);
                    } else {
                        self.dropped_lights += 1;
                    }
                }
                LightRecord::Other {
                    color,
                    position,
                    direction,
                    spot_angles,
                } => {
                    if self.other_count < self.max_other {
                        let index = self.other_count;
                        self.other_count += 1;
                        self.other_colors[index] = color;
                        self.other_positions[index] = position;
                        self.other_directions[index] = direction;
                        self.other_spot_angles[index] = spot_angles;
                        self.other_shadows[index] = self.planner.reserve_other(culling, light, visible_index);
                        slot = index as i32;
                    } else {
                        self.dropped_lights += 1;
                    }
                }
            }

            if use_lights_per_object {
                self.light_index_map.push(slot);
            }
        }

        if self.dropped_lights > 0 {
            log::debug!("{} visible lights over capacity were dropped", self.dropped_lights);
        }
        log::trace!(
            "Collected {} directional and {} other lights",
            self.dir_count,
            self.other_count
        );
    }

    fn upload(&self, buffer: &mut CommandBuffer) {
        let encode = |data: &[ShadowData]| data.iter().map(ShadowData::encode).collect::<Vec<Vec4>>();

        buffer.set_global_int(DIR_LIGHT_COUNT, self.dir_count as i32);
        buffer.set_global_vector_array(DIR_LIGHT_COLORS, &self.dir_colors);
        buffer.set_global_vector_array(DIR_LIGHT_DIRECTIONS, &self.dir_directions);
        buffer.set_global_vector_array(DIR_LIGHT_SHADOW_DATA, &encode(&self.dir_shadows[..]));

        buffer.set_global_int(OTHER_LIGHT_COUNT, self.other_count as i32);
        buffer.set_global_vector_array(OTHER_LIGHT_COLORS, &self.other_colors);
        buffer.set_global_vector_array(OTHER_LIGHT_POSITIONS, &self.other_positions);
        buffer.set_global_vector_array(OTHER_LIGHT_DIRECTIONS, &self.other_directions);
        buffer.set_global_vector_array(OTHER_LIGHT_SPOT_ANGLES, &self.other_spot_angles);
        buffer.set_global_vector_array(OTHER_LIGHT_SHADOW_DATA, &encode(&self.other_shadows[..]));
    }

    /// Release this frame's shadow atlases
    pub fn cleanup(&mut self, buffer: &mut CommandBuffer) {
        self.planner.cleanup(buffer);
    }

    pub fn directional_count(&self) -> usize {
        self.dir_count
    }

    pub fn other_count(&self) -> usize {
        self.other_count
    }

    pub fn max_other_lights(&self) -> usize {
        self.max_other
    }

    /// Lights dropped for exceeding capacity in the last frame
    pub fn dropped_lights(&self) -> usize {
        self.dropped_lights
    }

    pub fn directional_shadow_data(&self) -> &[ShadowData] {
        &self.dir_shadows[..self.dir_count]
    }

    pub fn other_shadow_data(&self) -> &[ShadowData] {
        &self.other_shadows[..self.other_count]
    }

    /// Visible light index to other-light slot (empty without per-object lighting)
    pub fn light_index_map(&self) -> &[i32] {
        &self.light_index_map
    }

    pub fn planner(&self) -> &ShadowPlanner {
        &self.planner
    }
}
