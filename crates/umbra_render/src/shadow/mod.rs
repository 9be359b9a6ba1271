//! Shadow Atlas Planning
//!
//! Backend-agnostic shadow mapping for directional, spot and point lights.
//!
//! # Architecture
//!
//! - **Atlas**: tile grid layout and atlas-space matrix conversion
//! - **Cascade**: cascade splits, culling data and light-space fitting
//! - **Data**: per-light shadow descriptors and their GPU packing
//! - **Planner**: per-frame reservation, atlas rendering and shader globals
//!
//! # Usage
//!
//! ```ignore
//! use umbra_render::shadow::*;
//!
//! let mut planner = ShadowPlanner::new(PlatformSettings::default(), LightCapacity::Compact);
//!
//! // Per frame
//! planner.setup(&settings.shadows);
//! let data = planner.reserve_directional(&culling, &culling.visible_lights()[0], 0);
//! light_shadow_data.push(data.encode());
//!
//! planner.render(&culling, &mut buffer);
//! // ... draw geometry sampling the atlases ...
//! planner.cleanup(&mut buffer);
//! ```

pub mod atlas;
pub mod cascade;
pub mod data;
pub mod planner;

pub use atlas::{split_for_tiles, to_atlas_matrix, AtlasLayout, AtlasTile, MAX_SPLIT};

pub use cascade::{
    bounding_sphere, cascade_split_ratios, fit_directional_cascade, fit_spot_shadow, frustum_slice_corners,
    CameraFrustum, CascadeCulling,
};

pub use data::{GpuShadowData, ShadowData, ShadowedDirectionalLight, ShadowedOtherLight};

pub use planner::{PlannerPhase, ShadowFrameStats, ShadowPlanner, MAX_DIRECTIONAL_TILES, SHADOWS_SAMPLE};
