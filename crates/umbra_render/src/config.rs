//! Pipeline and Shadow Configuration
//!
//! Fixed configuration consumed by the light collector and shadow planner.
//! Everything here is plain serde data so hosts can load it from a settings
//! file; nothing in this module changes from frame to frame.

use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Maximum directional lights uploaded to shaders
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
/// Maximum directional lights with real-time shadows
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;
/// Maximum point/spot lights with real-time shadows (one 4x4 atlas grid)
pub const MAX_SHADOWED_OTHER_LIGHTS: usize = 16;
/// Maximum cascades per directional light
pub const MAX_CASCADES: usize = 4;

/// Shadow atlas edge length in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AtlasSize {
    Px256,
    Px512,
    Px1024,
    Px2048,
    Px4096,
    Px8192,
}

impl AtlasSize {
    /// Edge length in pixels
    pub fn pixels(self) -> u32 {
        match self {
            Self::Px256 => 256,
            Self::Px512 => 512,
            Self::Px1024 => 1024,
            Self::Px2048 => 2048,
            Self::Px4096 => 4096,
            Self::Px8192 => 8192,
        }
    }
}

impl Default for AtlasSize {
    fn default() -> Self {
        Self::Px1024
    }
}

impl TryFrom<u32> for AtlasSize {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            256 => Ok(Self::Px256),
            512 => Ok(Self::Px512),
            1024 => Ok(Self::Px1024),
            2048 => Ok(Self::Px2048),
            4096 => Ok(Self::Px4096),
            8192 => Ok(Self::Px8192),
            other => Err(ConfigError::InvalidAtlasSize(other)),
        }
    }
}

impl From<AtlasSize> for u32 {
    fn from(size: AtlasSize) -> Self {
        size.pixels()
    }
}

/// Percentage-closer filter kernel used when sampling an atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Hardware 2x2 bilinear comparison, no shader keyword
    #[default]
    Pcf2x2,
    Pcf3x3,
    Pcf5x5,
    Pcf7x7,
}

impl FilterMode {
    /// Position in the kernel progression (0 = 2x2 .. 3 = 7x7)
    pub fn ordinal(self) -> u32 {
        match self {
            Self::Pcf2x2 => 0,
            Self::Pcf3x3 => 1,
            Self::Pcf5x5 => 2,
            Self::Pcf7x7 => 3,
        }
    }

    /// Index into the PCF keyword group, `None` for the 2x2 kernel
    pub fn keyword_index(self) -> Option<usize> {
        self.ordinal().checked_sub(1).map(|i| i as usize)
    }
}

/// How neighbouring directional cascades are blended
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeBlendMode {
    #[default]
    Hard,
    Soft,
    Dither,
}

impl CascadeBlendMode {
    /// Index into the cascade-blend keyword group, `None` for hard edges
    pub fn keyword_index(self) -> Option<usize> {
        match self {
            Self::Hard => None,
            Self::Soft => Some(0),
            Self::Dither => Some(1),
        }
    }
}

/// Directional light shadow atlas settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    pub atlas_size: AtlasSize,
    pub filter: FilterMode,
    /// Cascades per light (1-4)
    pub cascade_count: u32,
    /// Split ratios of the shadow distance for cascades 1..3
    pub cascade_ratios: [f32; 3],
    /// Fraction of the last cascade used to fade out
    pub cascade_fade: f32,
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::Px1024,
            filter: FilterMode::Pcf2x2,
            cascade_count: 4,
            cascade_ratios: [0.1, 0.25, 0.5],
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl DirectionalShadowSettings {
    /// Cascade ratios as a vector, the form the cascade query consumes
    pub fn ratios(&self) -> Vec3 {
        Vec3::from_array(self.cascade_ratios)
    }

    /// Culling factor applied to cascade blend regions
    pub fn blend_culling_factor(&self) -> f32 {
        (0.8 - self.cascade_fade).max(0.0)
    }
}

/// Point and spot light shadow atlas settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherShadowSettings {
    pub atlas_size: AtlasSize,
    pub filter: FilterMode,
}

/// Global shadow configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Maximum shadow distance from the camera
    pub max_distance: f32,
    /// Fraction of `max_distance` over which shadows fade out
    pub distance_fade: f32,
    pub directional: DirectionalShadowSettings,
    pub other: OtherShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    /// Clamp values to ranges the planner can work with
    pub fn validate(&mut self) {
        self.max_distance = self.max_distance.max(0.001);
        self.distance_fade = self.distance_fade.clamp(0.001, 1.0);

        let dir = &mut self.directional;
        dir.cascade_count = dir.cascade_count.clamp(1, MAX_CASCADES as u32);
        for ratio in &mut dir.cascade_ratios {
            *ratio = ratio.clamp(0.0, 1.0);
        }
        dir.cascade_fade = dir.cascade_fade.clamp(0.001, 1.0);
    }

    /// Strict check for values that cannot be clamped meaningfully
    pub fn check(&self) -> ConfigResult<()> {
        let count = self.directional.cascade_count;
        if count == 0 || count > MAX_CASCADES as u32 {
            return Err(ConfigError::InvalidCascadeCount(count));
        }
        Ok(())
    }

    /// `(1/maxDistance, 1/distanceFade, 1/(1-f^2))` with `f = 1 - cascadeFade`
    pub fn distance_fade_vector(&self) -> Vec4 {
        let f = 1.0 - self.directional.cascade_fade;
        Vec4::new(
            1.0 / self.max_distance,
            1.0 / self.distance_fade,
            1.0 / (1.0 - f * f),
            0.0,
        )
    }
}

/// Light array capacity profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightCapacity {
    /// 16 point/spot lights
    #[default]
    Compact,
    /// 64 point/spot lights
    Extended,
}

impl LightCapacity {
    pub fn max_other_lights(self) -> usize {
        match self {
            Self::Compact => 16,
            Self::Extended => 64,
        }
    }

    /// Shadowed point/spot lights, bounded by the 4x4 atlas grid
    pub fn max_shadowed_other_lights(self) -> usize {
        self.max_other_lights().min(MAX_SHADOWED_OTHER_LIGHTS)
    }
}

/// Platform quality setting for baked shadow masks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowmaskMode {
    /// Shadow mask replaces real-time shadows everywhere for static casters
    Shadowmask,
    /// Shadow mask only beyond the real-time shadow distance
    #[default]
    DistanceShadowmask,
}

/// Facts about the graphics platform the planner must honour
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Depth buffer stores 1 at the near plane
    pub reversed_z: bool,
    pub shadowmask_mode: ShadowmaskMode,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            reversed_z: true,
            shadowmask_mode: ShadowmaskMode::DistanceShadowmask,
        }
    }
}

/// Top-level pipeline configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Build the per-object light index map
    pub use_lights_per_object: bool,
    pub capacity: LightCapacity,
    pub platform: PlatformSettings,
    pub shadows: ShadowSettings,
}

impl PipelineSettings {
    /// Parse settings from TOML, rejecting invalid cascade counts
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let mut settings: Self = toml::from_str(source)?;
        settings.shadows.check()?;
        settings.shadows.validate();
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml_str(&source)?;
        log::debug!("Loaded pipeline settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_settings_default() {
        let settings = ShadowSettings::default();
        assert_eq!(settings.max_distance, 100.0);
        assert_eq!(settings.directional.cascade_count, 4);
        assert_eq!(settings.directional.atlas_size.pixels(), 1024);
        assert_eq!(settings.other.filter, FilterMode::Pcf2x2);
    }

    #[test]
    fn test_shadow_settings_validate() {
        let mut settings = ShadowSettings {
            max_distance: -5.0,
            distance_fade: 3.0,
            ..Default::default()
        };
        settings.directional.cascade_count = 9;
        settings.directional.cascade_ratios = [-1.0, 0.5, 2.0];
        settings.directional.cascade_fade = 0.0;

        settings.validate();

        assert_eq!(settings.max_distance, 0.001);
        assert_eq!(settings.distance_fade, 1.0);
        assert_eq!(settings.directional.cascade_count, 4);
        assert_eq!(settings.directional.cascade_ratios, [0.0, 0.5, 1.0]);
        assert_eq!(settings.directional.cascade_fade, 0.001);
    }

    #[test]
    fn test_filter_keyword_index() {
        assert_eq!(FilterMode::Pcf2x2.keyword_index(), None);
        assert_eq!(FilterMode::Pcf3x3.keyword_index(), Some(0));
        assert_eq!(FilterMode::Pcf7x7.keyword_index(), Some(2));
        assert_eq!(CascadeBlendMode::Hard.keyword_index(), None);
        assert_eq!(CascadeBlendMode::Dither.keyword_index(), Some(1));
    }

    #[test]
    fn test_distance_fade_vector() {
        let settings = ShadowSettings::default();
        let fade = settings.distance_fade_vector();
        let f = 0.9f32;

        assert!((fade.x - 0.01).abs() < 1e-6);
        assert!((fade.y - 10.0).abs() < 1e-4);
        assert!((fade.z - 1.0 / (1.0 - f * f)).abs() < 1e-3);
    }

    #[test]
    fn test_blend_culling_factor() {
        let mut dir = DirectionalShadowSettings::default();
        assert!((dir.blend_culling_factor() - 0.7).abs() < 1e-6);
        dir.cascade_fade = 0.95;
        assert_eq!(dir.blend_culling_factor(), 0.0);
    }

    #[test]
    fn test_capacity_profiles() {
        assert_eq!(LightCapacity::Compact.max_other_lights(), 16);
        assert_eq!(LightCapacity::Extended.max_other_lights(), 64);
        assert_eq!(LightCapacity::Extended.max_shadowed_other_lights(), 16);
    }

    #[test]
    fn test_atlas_size_serialization() {
        let json = serde_json::to_string(&AtlasSize::Px2048).unwrap();
        assert_eq!(json, "2048");

        let restored: AtlasSize = serde_json::from_str("4096").unwrap();
        assert_eq!(restored, AtlasSize::Px4096);

        assert!(serde_json::from_str::<AtlasSize>("1000").is_err());
    }

    #[test]
    fn test_pipeline_settings_toml() {
        let source = r#"
            use_lights_per_object = true
            capacity = "extended"

            [platform]
            reversed_z = false

            [shadows]
            max_distance = 50.0

            [shadows.directional]
            atlas_size = 2048
            filter = "pcf5x5"
            cascade_count = 2
            cascade_blend = "dither"
        "#;

        let settings = PipelineSettings::from_toml_str(source).unwrap();
        assert!(settings.use_lights_per_object);
        assert_eq!(settings.capacity, LightCapacity::Extended);
        assert!(!settings.platform.reversed_z);
        assert_eq!(settings.shadows.max_distance, 50.0);
        assert_eq!(settings.shadows.directional.atlas_size, AtlasSize::Px2048);
        assert_eq!(settings.shadows.directional.filter, FilterMode::Pcf5x5);
        assert_eq!(settings.shadows.directional.cascade_count, 2);
        assert_eq!(settings.shadows.directional.cascade_blend, CascadeBlendMode::Dither);
        // Untouched tables keep their defaults
        assert_eq!(settings.shadows.other, OtherShadowSettings::default());
    }

    #[test]
    fn test_pipeline_settings_rejects_bad_values() {
        let bad_size = "[shadows.other]\natlas_size = 300\n";
        assert!(PipelineSettings::from_toml_str(bad_size).is_err());

        let bad_cascades = "[shadows.directional]\ncascade_count = 0\n";
        assert!(matches!(
            PipelineSettings::from_toml_str(bad_cascades),
            Err(ConfigError::InvalidCascadeCount(0))
        ));
    }

    #[test]
    fn test_pipeline_settings_round_trip() {
        let mut settings = PipelineSettings::default();
        settings.shadows.other.filter = FilterMode::Pcf7x7;

        let text = settings.to_toml_string().unwrap();
        let restored = PipelineSettings::from_toml_str(&text).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_pipeline_settings_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umbra.toml");
        std::fs::write(&path, "use_lights_per_object = true\n").unwrap();

        let settings = PipelineSettings::load(&path).unwrap();
        assert!(settings.use_lights_per_object);

        let missing = PipelineSettings::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
