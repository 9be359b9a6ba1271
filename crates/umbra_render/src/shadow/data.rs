//! Per-Light Shadow Data
//!
//! What a reservation hands back to the light collector, and the packed
//! four-float form shading reads from the light arrays.

use glam::Vec4;

/// Shadow state of one light for the current frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ShadowData {
    /// No shadows of any kind
    #[default]
    Disabled,
    /// Only baked shadow mask occlusion applies
    MaskOnly {
        strength: f32,
        mask_channel: Option<u32>,
    },
    /// Real-time shadows sampled from an atlas tile
    Realtime {
        strength: f32,
        /// First atlas tile of the light (cascade 0 for directional lights)
        tile_index: u32,
        normal_bias: f32,
        mask_channel: Option<u32>,
    },
}

impl ShadowData {
    pub fn is_realtime(&self) -> bool {
        matches!(self, Self::Realtime { .. })
    }

    pub fn strength(&self) -> f32 {
        match *self {
            Self::Disabled => 0.0,
            Self::MaskOnly { strength, .. } | Self::Realtime { strength, .. } => strength,
        }
    }

    pub fn mask_channel(&self) -> Option<u32> {
        match *self {
            Self::Disabled => None,
            Self::MaskOnly { mask_channel, .. } | Self::Realtime { mask_channel, .. } => mask_channel,
        }
    }

    /// Pack as `(strength, tile, normal bias, mask channel)`
    ///
    /// Mask-only lights carry a negated strength so shading skips the atlas;
    /// a channel of -1 means no shadow mask.
    pub fn encode(&self) -> Vec4 {
        let channel = |c: Option<u32>| c.map_or(-1.0, |c| c as f32);
        match *self {
            Self::Disabled => Vec4::new(0.0, 0.0, 0.0, -1.0),
            Self::MaskOnly {
                strength,
                mask_channel,
            } => Vec4::new(-strength, 0.0, 0.0, channel(mask_channel)),
            Self::Realtime {
                strength,
                tile_index,
                normal_bias,
                mask_channel,
            } => Vec4::new(strength, tile_index as f32, normal_bias, channel(mask_channel)),
        }
    }

    /// Inverse of `encode`
    pub fn decode(packed: Vec4) -> Self {
        let mask_channel = if packed.w < 0.0 { None } else { Some(packed.w as u32) };
        if packed.x > 0.0 {
            Self::Realtime {
                strength: packed.x,
                tile_index: packed.y.max(0.0) as u32,
                normal_bias: packed.z,
                mask_channel,
            }
        } else if packed.x < 0.0 {
            Self::MaskOnly {
                strength: -packed.x,
                mask_channel,
            }
        } else {
            Self::Disabled
        }
    }
}

/// GPU layout of packed shadow data (one float4 per light)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuShadowData {
    pub strength: f32,
    pub tile_index: f32,
    pub normal_bias: f32,
    pub mask_channel: f32,
}

impl From<ShadowData> for GpuShadowData {
    fn from(data: ShadowData) -> Self {
        let packed = data.encode();
        Self {
            strength: packed.x,
            tile_index: packed.y,
            normal_bias: packed.z,
            mask_channel: packed.w,
        }
    }
}

impl From<GpuShadowData> for Vec4 {
    fn from(data: GpuShadowData) -> Self {
        Vec4::new(data.strength, data.tile_index, data.normal_bias, data.mask_channel)
    }
}

/// Directional light holding atlas tiles this frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowedDirectionalLight {
    pub visible_light_index: usize,
    pub slope_scale_bias: f32,
    pub near_plane_offset: f32,
}

/// Point or spot light holding an atlas tile this frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowedOtherLight {
    pub visible_light_index: usize,
    pub slope_scale_bias: f32,
    pub normal_bias: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_disabled() {
        assert_eq!(ShadowData::Disabled.encode(), Vec4::new(0.0, 0.0, 0.0, -1.0));
        assert_eq!(ShadowData::default().strength(), 0.0);
    }

    #[test]
    fn test_encode_mask_only_negates_strength() {
        let data = ShadowData::MaskOnly {
            strength: 0.75,
            mask_channel: Some(2),
        };
        assert_eq!(data.encode(), Vec4::new(-0.75, 0.0, 0.0, 2.0));

        let unmasked = ShadowData::MaskOnly {
            strength: 1.0,
            mask_channel: None,
        };
        assert_eq!(unmasked.encode().w, -1.0);
    }

    #[test]
    fn test_encode_realtime() {
        let data = ShadowData::Realtime {
            strength: 1.0,
            tile_index: 8,
            normal_bias: 0.4,
            mask_channel: None,
        };
        assert_eq!(data.encode(), Vec4::new(1.0, 8.0, 0.4, -1.0));
        assert!(data.is_realtime());
    }

    #[test]
    fn test_decode_distinguishes_states() {
        let mask = ShadowData::MaskOnly {
            strength: 0.5,
            mask_channel: Some(1),
        };
        assert_eq!(ShadowData::decode(mask.encode()), mask);
        assert_eq!(ShadowData::decode(Vec4::new(0.0, 0.0, 0.0, -1.0)), ShadowData::Disabled);
    }

    #[test]
    fn test_gpu_layout() {
        assert_eq!(std::mem::size_of::<GpuShadowData>(), 16);

        let gpu: GpuShadowData = ShadowData::Realtime {
            strength: 0.9,
            tile_index: 3,
            normal_bias: 0.0,
            mask_channel: Some(0),
        }
        .into();
        let bytes = bytemuck::bytes_of(&gpu);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats, &[0.9f32, 3.0, 0.0, 0.0]);
    }
}
