//! Camera Rendering
//!
//! Drives the per-camera frame: light and shadow setup, the geometry draw,
//! optional editor hooks and atlas cleanup, all recorded into one command
//! buffer inside a profiler sample named after the camera.

use crate::command::CommandBuffer;
use crate::config::PipelineSettings;
use crate::culling::CullingResults;
use crate::lighting::LightCollector;
use crate::shadow::ShadowFrameStats;

/// Optional extra drawing around the main geometry pass
///
/// Editors use this to draw objects with unsupported shaders and gizmos.
/// Both default to doing nothing.
pub trait FrameHooks {
    fn draw_unsupported(&mut self, _camera: &str, _buffer: &mut CommandBuffer) {}

    fn draw_gizmos(&mut self, _camera: &str, _buffer: &mut CommandBuffer) {}
}

/// Summary of one rendered camera
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraFrameStats {
    pub camera: String,
    pub directional_lights: usize,
    pub other_lights: usize,
    pub dropped_lights: usize,
    pub shadows: ShadowFrameStats,
}

/// Renders one camera at a time, reusing its light and shadow state
pub struct CameraRenderer {
    settings: PipelineSettings,
    collector: LightCollector,
    hooks: Option<Box<dyn FrameHooks>>,
}

impl CameraRenderer {
    pub fn new(settings: PipelineSettings) -> Self {
        let collector = LightCollector::new(settings.capacity, settings.platform.clone());
        Self {
            settings,
            collector,
            hooks: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn FrameHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn set_hooks(&mut self, hooks: Option<Box<dyn FrameHooks>>) {
        self.hooks = hooks;
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Replace settings between frames
    ///
    /// Light arrays are rebuilt when the capacity profile or platform
    /// changes; shadow settings take effect on the next frame.
    pub fn apply_settings(&mut self, settings: PipelineSettings) {
        if settings.capacity != self.settings.capacity || settings.platform != self.settings.platform {
            log::info!("Rebuilding light collector for {:?} capacity", settings.capacity);
            self.collector = LightCollector::new(settings.capacity, settings.platform.clone());
        }
        self.settings = settings;
    }

    pub fn collector(&self) -> &LightCollector {
        &self.collector
    }

    /// Record one camera's frame
    pub fn render(
        &mut self,
        camera: &str,
        culling: &mut dyn CullingResults,
        buffer: &mut CommandBuffer,
    ) -> CameraFrameStats {
        let lights_per_object = self.settings.use_lights_per_object;

        buffer.begin_sample(camera);
        self.collector
            .setup(culling, &self.settings.shadows, lights_per_object, buffer);

        buffer.draw_geometry(lights_per_object);
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.draw_unsupported(camera, buffer);
            hooks.draw_gizmos(camera, buffer);
        }

        self.collector.cleanup(buffer);
        buffer.end_sample(camera);

        let stats = CameraFrameStats {
            camera: camera.to_string(),
            directional_lights: self.collector.directional_count(),
            other_lights: self.collector.other_count(),
            dropped_lights: self.collector.dropped_lights(),
            shadows: self.collector.planner().stats(),
        };
        log::trace!("Rendered camera {}: {:?}", camera, stats);
        stats
    }
}

/// A camera to render: its name and culling results
pub struct CameraView<'a> {
    pub name: &'a str,
    pub culling: &'a mut dyn CullingResults,
}

/// Renders cameras one after another with a shared renderer
pub struct RenderPipeline {
    renderer: CameraRenderer,
    frame: u64,
}

impl RenderPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            renderer: CameraRenderer::new(settings),
            frame: 0,
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn FrameHooks>) -> Self {
        self.renderer.set_hooks(Some(hooks));
        self
    }

    pub fn renderer(&self) -> &CameraRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut CameraRenderer {
        &mut self.renderer
    }

    /// Frames rendered so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Record every camera in order
    pub fn render(&mut self, cameras: &mut [CameraView<'_>], buffer: &mut CommandBuffer) -> Vec<CameraFrameStats> {
        let stats = cameras
            .iter_mut()
            .map(|view| self.renderer.render(view.name, &mut *view.culling, buffer))
            .collect();
        self.frame += 1;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, ShaderGlobals};
    use crate::config::LightCapacity;
    use crate::culling::{Bounds, SceneCulling};
    use crate::light::{LightShadowSettings, VisibleLight};
    use crate::shadow::CameraFrustum;
    use glam::{Vec3, Vec4};
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingHooks {
        gizmos: Rc<Cell<u32>>,
    }

    impl FrameHooks for CountingHooks {
        fn draw_gizmos(&mut self, _camera: &str, buffer: &mut CommandBuffer) {
            self.gizmos.set(self.gizmos.get() + 1);
            buffer.begin_sample("Gizmos");
            buffer.end_sample("Gizmos");
        }
    }

    fn scene() -> SceneCulling {
        let camera = CameraFrustum::look_at(Vec3::new(0.0, 5.0, 15.0), Vec3::ZERO, 60.0, 1.6, 0.3, 500.0);
        SceneCulling::new(camera, 80.0)
            .with_light(
                VisibleLight::directional(Vec3::new(0.3, -1.0, -0.2), Vec4::ONE).with_shadows(LightShadowSettings::soft()),
            )
            .with_light(VisibleLight::point(Vec3::new(2.0, 1.0, 0.0), 5.0, Vec4::ONE))
            .with_caster(Bounds::new(Vec3::ZERO, Vec3::ONE))
    }

    #[test]
    fn test_camera_frame_is_balanced() {
        let mut renderer = CameraRenderer::new(PipelineSettings::default());
        let mut culling = scene();
        let mut buffer = CommandBuffer::new();

        let stats = renderer.render("Main Camera", &mut culling, &mut buffer);
        assert_eq!(stats.directional_lights, 1);
        assert_eq!(stats.other_lights, 1);
        assert_eq!(stats.shadows.directional_tiles, 4);

        assert_eq!(buffer.commands().first(), Some(&Command::BeginSample("Main Camera".into())));
        assert_eq!(buffer.commands().last(), Some(&Command::EndSample("Main Camera".into())));

        let mut globals = ShaderGlobals::new();
        globals.execute(&buffer).unwrap();
        assert_eq!(globals.geometry_draws(), 1);
        assert_eq!(globals.live_target_count(), 0);
    }

    #[test]
    fn test_hooks_run_each_frame() {
        let gizmos = Rc::new(Cell::new(0));
        let mut renderer = CameraRenderer::new(PipelineSettings::default()).with_hooks(Box::new(CountingHooks {
            gizmos: gizmos.clone(),
        }));
        let mut culling = scene();
        let mut buffer = CommandBuffer::new();

        renderer.render("Scene", &mut culling, &mut buffer);
        renderer.render("Scene", &mut culling, &mut buffer);
        assert_eq!(gizmos.get(), 2);

        let mut globals = ShaderGlobals::new();
        globals.execute(&buffer).unwrap();
    }

    #[test]
    fn test_pipeline_renders_cameras_in_order() {
        let mut settings = PipelineSettings::default();
        settings.use_lights_per_object = true;
        let mut pipeline = RenderPipeline::new(settings);

        let mut main = scene();
        let mut minimap = scene();
        let mut buffer = CommandBuffer::new();
        let stats = pipeline.render(
            &mut [
                CameraView {
                    name: "Main",
                    culling: &mut main,
                },
                CameraView {
                    name: "Minimap",
                    culling: &mut minimap,
                },
            ],
            &mut buffer,
        );

        let names: Vec<&str> = stats.iter().map(|s| s.camera.as_str()).collect();
        assert_eq!(names, vec!["Main", "Minimap"]);
        assert_eq!(pipeline.frame(), 1);
        assert_eq!(main.light_index_map(), Some(&[-1, 0][..]));
        assert_eq!(minimap.light_index_map(), Some(&[-1, 0][..]));

        let mut globals = ShaderGlobals::new();
        globals.execute(&buffer).unwrap();
        assert_eq!(globals.total_allocations(), 2);
        assert_eq!(globals.live_target_count(), 0);
    }

    #[test]
    fn test_apply_settings_rebuilds_collector() {
        let mut renderer = CameraRenderer::new(PipelineSettings::default());
        assert_eq!(renderer.collector().max_other_lights(), 16);

        let mut settings = PipelineSettings::default();
        settings.capacity = LightCapacity::Extended;
        renderer.apply_settings(settings);
        assert_eq!(renderer.collector().max_other_lights(), 64);
    }
}
