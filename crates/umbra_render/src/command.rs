//! Command Recording
//!
//! Backend-agnostic command stream. The lighting and shadow components never
//! talk to a graphics API; they record `Command`s in submission order and the
//! host replays them. `ShaderGlobals` is an in-memory executor that models
//! the global shader state a backend would end up with, validating render
//! target lifetimes along the way.

use std::collections::{HashMap, HashSet};
use std::fmt;

use glam::{Mat4, Vec4};

use crate::culling::ShadowSplitData;
use crate::error::ExecuteError;

/// Depth bits of every shadow atlas
pub const SHADOW_ATLAS_DEPTH_BITS: u32 = 32;

/// Name of a temporary render target, doubling as its global texture name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub &'static str);

impl RenderTargetId {
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for RenderTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Temporary render target description
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetDesc {
    pub id: RenderTargetId,
    pub width: u32,
    pub height: u32,
    pub depth_bits: u32,
}

/// Pixel rectangle inside the bound render target
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Rasterizer depth bias
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthBias {
    pub constant: f32,
    pub slope_scale: f32,
}

impl DepthBias {
    pub const NONE: Self = Self {
        constant: 0.0,
        slope_scale: 0.0,
    };
}

/// Depth-only draw of one light's shadow casters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowDrawRequest {
    pub visible_light_index: usize,
    pub split: ShadowSplitData,
}

/// A recorded command
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    BeginSample(String),
    EndSample(String),
    GetTemporaryTarget(TargetDesc),
    ReleaseTemporaryTarget(RenderTargetId),
    SetRenderTarget(RenderTargetId),
    /// Clear depth of the bound target
    ClearDepth,
    SetViewport(Viewport),
    SetViewProjection { view: Mat4, projection: Mat4 },
    SetDepthBias(DepthBias),
    DrawShadows(ShadowDrawRequest),
    /// Draw the camera's visible geometry (host-defined)
    DrawGeometry { lights_per_object: bool },
    SetGlobalTexture { name: &'static str, source: RenderTargetId },
    SetGlobalInt { name: &'static str, value: i32 },
    SetGlobalFloat { name: &'static str, value: f32 },
    SetGlobalVector { name: &'static str, value: Vec4 },
    SetGlobalVectorArray { name: &'static str, values: Vec<Vec4> },
    SetGlobalMatrixArray { name: &'static str, values: Vec<Mat4> },
    SetKeyword { keyword: &'static str, enabled: bool },
}

/// Ordered list of commands
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn begin_sample(&mut self, name: impl Into<String>) {
        self.push(Command::BeginSample(name.into()));
    }

    pub fn end_sample(&mut self, name: impl Into<String>) {
        self.push(Command::EndSample(name.into()));
    }

    /// Allocate a square shadow-map target
    pub fn get_shadow_target(&mut self, id: RenderTargetId, size: u32) {
        self.push(Command::GetTemporaryTarget(TargetDesc {
            id,
            width: size,
            height: size,
            depth_bits: SHADOW_ATLAS_DEPTH_BITS,
        }));
    }

    pub fn release_temporary_target(&mut self, id: RenderTargetId) {
        self.push(Command::ReleaseTemporaryTarget(id));
    }

    pub fn set_render_target(&mut self, id: RenderTargetId) {
        self.push(Command::SetRenderTarget(id));
    }

    pub fn clear_depth(&mut self) {
        self.push(Command::ClearDepth);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.push(Command::SetViewport(viewport));
    }

    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.push(Command::SetViewProjection { view, projection });
    }

    pub fn set_depth_bias(&mut self, constant: f32, slope_scale: f32) {
        self.push(Command::SetDepthBias(DepthBias {
            constant,
            slope_scale,
        }));
    }

    pub fn draw_shadows(&mut self, request: ShadowDrawRequest) {
        self.push(Command::DrawShadows(request));
    }

    pub fn draw_geometry(&mut self, lights_per_object: bool) {
        self.push(Command::DrawGeometry { lights_per_object });
    }

    pub fn set_global_texture(&mut self, name: &'static str, source: RenderTargetId) {
        self.push(Command::SetGlobalTexture { name, source });
    }

    pub fn set_global_int(&mut self, name: &'static str, value: i32) {
        self.push(Command::SetGlobalInt { name, value });
    }

    pub fn set_global_float(&mut self, name: &'static str, value: f32) {
        self.push(Command::SetGlobalFloat { name, value });
    }

    pub fn set_global_vector(&mut self, name: &'static str, value: Vec4) {
        self.push(Command::SetGlobalVector { name, value });
    }

    pub fn set_global_vector_array(&mut self, name: &'static str, values: &[Vec4]) {
        self.push(Command::SetGlobalVectorArray {
            name,
            values: values.to_vec(),
        });
    }

    pub fn set_global_matrix_array(&mut self, name: &'static str, values: &[Mat4]) {
        self.push(Command::SetGlobalMatrixArray {
            name,
            values: values.to_vec(),
        });
    }

    pub fn set_keyword(&mut self, keyword: &'static str, enabled: bool) {
        self.push(Command::SetKeyword { keyword, enabled });
    }

    /// Enable `group[index]` and disable every other keyword of the group
    pub fn set_keyword_group(&mut self, group: &[&'static str], enabled: Option<usize>) {
        for (i, keyword) in group.iter().enumerate() {
            self.set_keyword(*keyword, Some(i) == enabled);
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Take the recorded commands, leaving the buffer empty
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Number of recorded shadow draws
    pub fn shadow_draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawShadows(_)))
            .count()
    }
}

/// A shadow draw as a backend would execute it
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedShadowDraw {
    pub target: RenderTargetId,
    pub viewport: Viewport,
    pub view: Mat4,
    pub projection: Mat4,
    pub depth_bias: DepthBias,
    pub request: ShadowDrawRequest,
}

/// In-memory model of global shader state
#[derive(Clone, Debug, Default)]
pub struct ShaderGlobals {
    ints: HashMap<&'static str, i32>,
    floats: HashMap<&'static str, f32>,
    vectors: HashMap<&'static str, Vec4>,
    vector_arrays: HashMap<&'static str, Vec<Vec4>>,
    matrix_arrays: HashMap<&'static str, Vec<Mat4>>,
    textures: HashMap<&'static str, RenderTargetId>,
    keywords: HashSet<&'static str>,

    live_targets: HashMap<RenderTargetId, TargetDesc>,
    bound_target: Option<RenderTargetId>,
    viewport: Viewport,
    view: Mat4,
    projection: Mat4,
    depth_bias: DepthBias,
    open_samples: Vec<String>,

    shadow_draws: Vec<ExecutedShadowDraw>,
    geometry_draws: u32,
    total_allocations: u64,
}

impl ShaderGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a command buffer
    pub fn execute(&mut self, buffer: &CommandBuffer) -> Result<(), ExecuteError> {
        for command in buffer.commands() {
            self.apply(command)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: &Command) -> Result<(), ExecuteError> {
        match command {
            Command::BeginSample(name) => self.open_samples.push(name.clone()),
            Command::EndSample(name) => match self.open_samples.pop() {
                Some(open) if &open == name => {}
                Some(open) => {
                    return Err(ExecuteError::UnbalancedSample {
                        expected: open,
                        found: name.clone(),
                    })
                }
                None => return Err(ExecuteError::SampleNotOpen(name.clone())),
            },
            Command::GetTemporaryTarget(desc) => {
                if self.live_targets.contains_key(&desc.id) {
                    return Err(ExecuteError::DoubleAllocation(desc.id));
                }
                self.live_targets.insert(desc.id, *desc);
                self.textures.insert(desc.id.name(), desc.id);
                self.total_allocations += 1;
            }
            Command::ReleaseTemporaryTarget(id) => {
                if self.live_targets.remove(id).is_none() {
                    return Err(ExecuteError::ReleaseUnallocated(*id));
                }
                self.textures.retain(|_, source| source != id);
                if self.bound_target == Some(*id) {
                    self.bound_target = None;
                }
            }
            Command::SetRenderTarget(id) => {
                if !self.live_targets.contains_key(id) {
                    return Err(ExecuteError::UnknownTarget(*id));
                }
                self.bound_target = Some(*id);
            }
            Command::ClearDepth => {
                if self.bound_target.is_none() {
                    return Err(ExecuteError::NoRenderTarget);
                }
            }
            Command::SetViewport(viewport) => self.viewport = *viewport,
            Command::SetViewProjection { view, projection } => {
                self.view = *view;
                self.projection = *projection;
            }
            Command::SetDepthBias(bias) => self.depth_bias = *bias,
            Command::DrawShadows(request) => {
                let target = self.bound_target.ok_or(ExecuteError::NoRenderTarget)?;
                self.shadow_draws.push(ExecutedShadowDraw {
                    target,
                    viewport: self.viewport,
                    view: self.view,
                    projection: self.projection,
                    depth_bias: self.depth_bias,
                    request: *request,
                });
            }
            Command::DrawGeometry { .. } => self.geometry_draws += 1,
            Command::SetGlobalTexture { name, source } => {
                if !self.live_targets.contains_key(source) {
                    return Err(ExecuteError::UnknownTarget(*source));
                }
                self.textures.insert(*name, *source);
            }
            Command::SetGlobalInt { name, value } => {
                self.ints.insert(*name, *value);
            }
            Command::SetGlobalFloat { name, value } => {
                self.floats.insert(*name, *value);
            }
            Command::SetGlobalVector { name, value } => {
                self.vectors.insert(*name, *value);
            }
            Command::SetGlobalVectorArray { name, values } => {
                self.vector_arrays.insert(*name, values.clone());
            }
            Command::SetGlobalMatrixArray { name, values } => {
                self.matrix_arrays.insert(*name, values.clone());
            }
            Command::SetKeyword { keyword, enabled } => {
                if *enabled {
                    self.keywords.insert(*keyword);
                } else {
                    self.keywords.remove(*keyword);
                }
            }
        }
        Ok(())
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn vector(&self, name: &str) -> Option<Vec4> {
        self.vectors.get(name).copied()
    }

    pub fn vector_array(&self, name: &str) -> Option<&[Vec4]> {
        self.vector_arrays.get(name).map(Vec::as_slice)
    }

    pub fn matrix_array(&self, name: &str) -> Option<&[Mat4]> {
        self.matrix_arrays.get(name).map(Vec::as_slice)
    }

    /// Raw bytes of a vector array, laid out for a uniform upload
    pub fn vector_array_bytes(&self, name: &str) -> Option<&[u8]> {
        self.vector_array(name).map(bytemuck::cast_slice)
    }

    /// Raw bytes of a matrix array, column-major
    pub fn matrix_array_bytes(&self, name: &str) -> Option<&[u8]> {
        self.matrix_array(name).map(bytemuck::cast_slice)
    }

    /// Render target a global texture name resolves to
    pub fn texture(&self, name: &str) -> Option<RenderTargetId> {
        self.textures.get(name).copied()
    }

    pub fn keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    /// Currently allocated temporary target
    pub fn live_target(&self, id: RenderTargetId) -> Option<&TargetDesc> {
        self.live_targets.get(&id)
    }

    pub fn live_target_count(&self) -> usize {
        self.live_targets.len()
    }

    pub fn total_allocations(&self) -> u64 {
        self.total_allocations
    }

    pub fn shadow_draws(&self) -> &[ExecutedShadowDraw] {
        &self.shadow_draws
    }

    pub fn geometry_draws(&self) -> u32 {
        self.geometry_draws
    }

    pub fn depth_bias(&self) -> DepthBias {
        self.depth_bias
    }

    /// Forget recorded draws (global state persists like on a GPU)
    pub fn clear_draws(&mut self) {
        self.shadow_draws.clear();
        self.geometry_draws = 0;
    }
}
