//! Shader Property and Keyword Names
//!
//! Names of the global uniforms, textures and keywords the shading side
//! reads. Keyword groups are mutually exclusive: at most one entry of a
//! group is enabled at a time.

use crate::command::RenderTargetId;

// Lighting
pub const DIR_LIGHT_COUNT: &str = "_DirectionalLightCount";
pub const DIR_LIGHT_COLORS: &str = "_DirectionalLightColors";
pub const DIR_LIGHT_DIRECTIONS: &str = "_DirectionalLightDirections";
pub const DIR_LIGHT_SHADOW_DATA: &str = "_DirectionalLightShadowData";

pub const OTHER_LIGHT_COUNT: &str = "_OtherLightCount";
pub const OTHER_LIGHT_COLORS: &str = "_OtherLightColors";
pub const OTHER_LIGHT_POSITIONS: &str = "_OtherLightPositions";
pub const OTHER_LIGHT_DIRECTIONS: &str = "_OtherLightDirections";
pub const OTHER_LIGHT_SPOT_ANGLES: &str = "_OtherLightSpotAngles";
pub const OTHER_LIGHT_SHADOW_DATA: &str = "_OtherLightShadowData";

pub const LIGHTS_PER_OBJECT_KEYWORD: &str = "_LIGHTS_PER_OBJECT";

// Shadows
pub const DIR_SHADOW_ATLAS: RenderTargetId = RenderTargetId("_DirectionalShadowAtlas");
pub const OTHER_SHADOW_ATLAS: RenderTargetId = RenderTargetId("_OtherShadowAtlas");

pub const DIR_SHADOW_MATRICES: &str = "_DirectionalShadowMatrices";
pub const OTHER_SHADOW_MATRICES: &str = "_OtherShadowMatrices";
pub const CASCADE_COUNT: &str = "_CascadeCount";
pub const CASCADE_CULLING_SPHERES: &str = "_CascadeCullingSpheres";
pub const CASCADE_DATA: &str = "_CascadeData";
pub const SHADOW_ATLAS_SIZE: &str = "_ShadowAtlasSize";
pub const SHADOW_DISTANCE_FADE: &str = "_ShadowDistanceFade";
pub const SHADOW_PANCAKING: &str = "_ShadowPancaking";

pub const DIRECTIONAL_FILTER_KEYWORDS: [&str; 3] = [
    "_DIRECTIONAL_PCF3",
    "_DIRECTIONAL_PCF5",
    "_DIRECTIONAL_PCF7",
];

pub const OTHER_FILTER_KEYWORDS: [&str; 3] = [
    "_OTHER_PCF3",
    "_OTHER_PCF5",
    "_OTHER_PCF7",
];

pub const CASCADE_BLEND_KEYWORDS: [&str; 2] = [
    "_CASCADE_BLEND_SOFT",
    "_CASCADE_BLEND_DITHER",
];

pub const SHADOW_MASK_KEYWORDS: [&str; 2] = [
    "_SHADOW_MASK_ALWAYS",
    "_SHADOW_MASK_DISTANCE",
];
