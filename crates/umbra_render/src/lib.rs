//! # umbra_render - Forward Lighting and Shadow Atlas Planning
//!
//! Backend-agnostic per-camera light setup for a forward renderer:
//! - Visible light classification into fixed-size uniform arrays
//! - Shadow reservation with graceful fallback to baked shadow masks
//! - Directional cascades and point/spot tiles packed into shadow atlases
//! - Shader globals and keywords recorded into a command buffer
//!
//! ## Architecture
//!
//! 1. **Culling**: the host supplies visible lights and light-space queries
//!    through `CullingResults`
//! 2. **Lighting**: `LightCollector` fills the light arrays and drives the
//!    `ShadowPlanner`
//! 3. **Commands**: everything is recorded into a `CommandBuffer` the host
//!    replays; `ShaderGlobals` replays it in memory
//!
//! ## Example
//!
//! ```ignore
//! use umbra_render::prelude::*;
//!
//! let settings = PipelineSettings::load("umbra.toml")?;
//! let mut renderer = CameraRenderer::new(settings);
//!
//! let mut buffer = CommandBuffer::new();
//! renderer.render("Main Camera", &mut culling, &mut buffer);
//!
//! // Replay against a backend, or inspect the resulting state
//! let mut globals = ShaderGlobals::new();
//! globals.execute(&buffer)?;
//! ```

pub mod command;
pub mod config;
pub mod culling;
pub mod error;
pub mod light;
pub mod lighting;
pub mod properties;
pub mod renderer;
pub mod shadow;

pub use command::{Command, CommandBuffer, RenderTargetId, ShaderGlobals};
pub use config::{PipelineSettings, ShadowSettings};
pub use culling::{CullingResults, SceneCulling};
pub use error::{ConfigError, ExecuteError};
pub use light::VisibleLight;
pub use lighting::LightCollector;
pub use renderer::{CameraRenderer, CameraView, FrameHooks, RenderPipeline};
pub use shadow::{ShadowData, ShadowPlanner};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::command::{
        Command, CommandBuffer, DepthBias, ExecutedShadowDraw, RenderTargetId, ShadowDrawRequest, ShaderGlobals,
        TargetDesc, Viewport,
    };
    pub use crate::config::{
        AtlasSize, CascadeBlendMode, DirectionalShadowSettings, FilterMode, LightCapacity, OtherShadowSettings,
        PipelineSettings, PlatformSettings, ShadowSettings, ShadowmaskMode,
    };
    pub use crate::culling::{
        Bounds, CullingResults, DirectionalCascadeRequest, SceneCulling, ShadowMatrices, ShadowSplitData,
    };
    pub use crate::error::{ConfigError, ConfigResult, ExecuteError};
    pub use crate::light::{
        LightBaking, LightKind, LightRecord, LightShadowSettings, MixedLightingMode, ShadowMode, VisibleLight,
    };
    pub use crate::lighting::LightCollector;
    pub use crate::renderer::{CameraFrameStats, CameraRenderer, CameraView, FrameHooks, RenderPipeline};
    pub use crate::shadow::{
        AtlasLayout, AtlasTile, CameraFrustum, CascadeCulling, GpuShadowData, PlannerPhase, ShadowData,
        ShadowFrameStats, ShadowPlanner,
    };
}
