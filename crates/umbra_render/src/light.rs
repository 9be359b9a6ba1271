//! Visible Lights
//!
//! Host-facing description of a light that survived culling this frame and
//! the classified record the collector derives from it. Light kinds form a
//! closed set, so the per-kind data lives in the `LightKind` variants.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Smallest squared range used for the inverse-square falloff term
const MIN_RANGE_SQUARED: f32 = 0.00001;

/// Smallest cosine difference between inner and outer spot cones
const MIN_SPOT_ANGLE_RANGE: f32 = 0.001;

/// Kind of light, carrying the data only that kind has
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point {
        range: f32,
    },
    Spot {
        range: f32,
        /// Full inner cone angle in degrees
        inner_angle: f32,
        /// Full outer cone angle in degrees
        outer_angle: f32,
    },
}

/// Shadow casting mode of a light
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowMode {
    #[default]
    None,
    Hard,
    Soft,
}

/// Per-light shadow parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightShadowSettings {
    pub mode: ShadowMode,
    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub strength: f32,
    /// Slope-scaled depth bias
    pub bias: f32,
    pub normal_bias: f32,
    /// Near plane offset for directional shadow cameras
    pub near_plane: f32,
}

impl Default for LightShadowSettings {
    fn default() -> Self {
        Self {
            mode: ShadowMode::None,
            strength: 1.0,
            bias: 0.05,
            normal_bias: 0.4,
            near_plane: 0.2,
        }
    }
}

impl LightShadowSettings {
    /// Hard shadows with default biases
    pub fn hard() -> Self {
        Self {
            mode: ShadowMode::Hard,
            ..Default::default()
        }
    }

    /// Soft shadows with default biases
    pub fn soft() -> Self {
        Self {
            mode: ShadowMode::Soft,
            ..Default::default()
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    /// Shadows requested and strong enough to matter
    pub fn is_casting(&self) -> bool {
        self.mode != ShadowMode::None && self.strength > 0.0
    }
}

/// Mixed lighting mode for lights baked as mixed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixedLightingMode {
    IndirectOnly,
    Subtractive,
    Shadowmask,
}

/// How the light was baked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightBaking {
    #[default]
    Realtime,
    Baked,
    Mixed {
        mode: MixedLightingMode,
        /// Shadow mask channel holding this light's baked occlusion
        occlusion_channel: u32,
    },
}

impl LightBaking {
    /// Occlusion channel when the light contributes to the shadow mask
    pub fn shadow_mask_channel(&self) -> Option<u32> {
        match *self {
            Self::Mixed {
                mode: MixedLightingMode::Shadowmask,
                occlusion_channel,
            } => Some(occlusion_channel),
            _ => None,
        }
    }
}

/// A light that survived culling this frame
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleLight {
    pub kind: LightKind,
    /// Linear color premultiplied by intensity
    pub final_color: Vec4,
    pub local_to_world: Mat4,
    pub shadows: LightShadowSettings,
    pub baking: LightBaking,
}

impl VisibleLight {
    /// Directional light shining along `direction`
    pub fn directional(direction: Vec3, final_color: Vec4) -> Self {
        Self {
            kind: LightKind::Directional,
            final_color,
            local_to_world: transform_facing(Vec3::ZERO, direction),
            shadows: LightShadowSettings::default(),
            baking: LightBaking::Realtime,
        }
    }

    /// Point light at `position`
    pub fn point(position: Vec3, range: f32, final_color: Vec4) -> Self {
        Self {
            kind: LightKind::Point { range },
            final_color,
            local_to_world: Mat4::from_translation(position),
            shadows: LightShadowSettings::default(),
            baking: LightBaking::Realtime,
        }
    }

    /// Spot light at `position` shining along `direction`, angles in degrees
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
        final_color: Vec4,
    ) -> Self {
        Self {
            kind: LightKind::Spot {
                range,
                inner_angle,
                outer_angle,
            },
            final_color,
            local_to_world: transform_facing(position, direction),
            shadows: LightShadowSettings::default(),
            baking: LightBaking::Realtime,
        }
    }

    pub fn with_shadows(mut self, shadows: LightShadowSettings) -> Self {
        self.shadows = shadows;
        self
    }

    pub fn with_baking(mut self, baking: LightBaking) -> Self {
        self.baking = baking;
        self
    }

    /// World position (translation column)
    pub fn position(&self) -> Vec3 {
        self.local_to_world.w_axis.truncate()
    }

    /// Local +Z axis in world space
    pub fn forward(&self) -> Vec3 {
        self.local_to_world.z_axis.truncate()
    }

    /// Direction toward the light, as shading expects it
    pub fn direction_to_light(&self) -> Vec4 {
        (-self.forward()).extend(0.0)
    }

    pub fn range(&self) -> Option<f32> {
        match self.kind {
            LightKind::Directional => None,
            LightKind::Point { range } | LightKind::Spot { range, .. } => Some(range),
        }
    }
}

/// Rigid transform at `position` whose +Z axis points along `direction`
pub fn transform_facing(position: Vec3, direction: Vec3) -> Mat4 {
    let forward = direction.normalize_or_zero();
    let forward = if forward == Vec3::ZERO { Vec3::Z } else { forward };
    let reference = if forward.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let right = reference.cross(forward).normalize();
    let up = forward.cross(right);

    Mat4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        forward.extend(0.0),
        position.extend(1.0),
    )
}

/// Position with the inverse squared range packed into `w`
pub fn position_with_range(position: Vec3, range: f32) -> Vec4 {
    position.extend(1.0 / (range * range).max(MIN_RANGE_SQUARED))
}

/// Spot cone falloff pair for full cone angles given in degrees
///
/// Shading evaluates `saturate(dot(spotDir, lightDir) * a + b)` and squares
/// it; `a` and `b` are chosen so that the result is 0 at the outer cone edge
/// and 1 at the inner one.
pub fn spot_angles(inner_angle: f32, outer_angle: f32) -> Vec4 {
    let inner_cos = (0.5 * inner_angle.to_radians()).cos();
    let outer_cos = (0.5 * outer_angle.to_radians()).cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(MIN_SPOT_ANGLE_RANGE);
    Vec4::new(angle_range_inv, -outer_cos * angle_range_inv, 0.0, 0.0)
}

/// Neutral spot pair for point lights: always fully lit
pub const NO_SPOT_ANGLES: Vec4 = Vec4::new(0.0, 1.0, 0.0, 0.0);

/// Shading parameters derived from one visible light
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightRecord {
    Directional {
        color: Vec4,
        direction: Vec4,
    },
    Other {
        color: Vec4,
        position: Vec4,
        direction: Vec4,
        spot_angles: Vec4,
    },
}

impl LightRecord {
    /// Classify a visible light into its shading parameters
    pub fn classify(light: &VisibleLight) -> Self {
        match light.kind {
            LightKind::Directional => Self::Directional {
                color: light.final_color,
                direction: light.direction_to_light(),
            },
            LightKind::Point { range } => Self::Other {
                color: light.final_color,
                position: position_with_range(light.position(), range),
                direction: Vec4::ZERO,
                spot_angles: NO_SPOT_ANGLES,
            },
            LightKind::Spot {
                range,
                inner_angle,
                outer_angle,
            } => Self::Other {
                color: light.final_color,
                position: position_with_range(light.position(), range),
                direction: light.direction_to_light(),
                spot_angles: spot_angles(inner_angle, outer_angle),
            },
        }
    }
}
