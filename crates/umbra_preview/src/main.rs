//! Umbra Preview
//!
//! Headless frame preview: loads pipeline settings, builds a demo scene with
//! two cameras, records a few frames through the render pipeline, replays
//! them against an in-memory shader state and logs what shading would see.
//!
//! Run with: cargo run -p umbra_preview -- [settings.toml]
//!   RUST_LOG=debug for reservation and atlas layout details

mod demo_scene;
mod preview_config;

use std::process::ExitCode;

use umbra_render::prelude::*;
use umbra_render::properties;

use crate::preview_config::PreviewConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match PreviewConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.print_summary();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Command stream rejected: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &PreviewConfig) -> Result<(), ExecuteError> {
    let shadow_distance = config.settings.shadows.max_distance;
    let mut main_view = demo_scene::build(demo_scene::main_camera(16.0 / 9.0), shadow_distance);
    let mut overhead_view = demo_scene::build(demo_scene::overhead_camera(), shadow_distance);

    let mut pipeline = RenderPipeline::new(config.settings.clone());
    let mut globals = ShaderGlobals::new();
    let mut buffer = CommandBuffer::new();

    for _ in 0..config.frames {
        let stats = pipeline.render(
            &mut [
                CameraView {
                    name: "Main Camera",
                    culling: &mut main_view,
                },
                CameraView {
                    name: "Overhead",
                    culling: &mut overhead_view,
                },
            ],
            &mut buffer,
        );

        let command_count = buffer.len();
        globals.execute(&buffer)?;
        buffer.clear();

        log::info!("Frame {}: {} commands", pipeline.frame(), command_count);
        for camera in &stats {
            log::info!(
                "  {}: {} directional, {} other ({} dropped); tiles {} dir + {} other, {} skipped, {} mask-only",
                camera.camera,
                camera.directional_lights,
                camera.other_lights,
                camera.dropped_lights,
                camera.shadows.directional_tiles,
                camera.shadows.other_tiles,
                camera.shadows.skipped_tiles,
                camera.shadows.mask_only_lights,
            );
        }
        log::info!(
            "  shadow draws: {}, geometry draws: {}, live targets: {}",
            globals.shadow_draws().len(),
            globals.geometry_draws(),
            globals.live_target_count()
        );
        globals.clear_draws();
    }

    log_shader_state(&globals);
    Ok(())
}

/// Log the global state left behind by the last camera
fn log_shader_state(globals: &ShaderGlobals) {
    log::info!("Final shader state:");
    log::info!("  {} = {:?}", properties::CASCADE_COUNT, globals.int(properties::CASCADE_COUNT));
    log::info!(
        "  {} = {:?}",
        properties::SHADOW_ATLAS_SIZE,
        globals.vector(properties::SHADOW_ATLAS_SIZE)
    );
    log::info!(
        "  {} = {:?}",
        properties::SHADOW_DISTANCE_FADE,
        globals.vector(properties::SHADOW_DISTANCE_FADE)
    );

    if let Some(shadow_data) = globals.vector_array(properties::OTHER_LIGHT_SHADOW_DATA) {
        let count = globals.int(properties::OTHER_LIGHT_COUNT).unwrap_or(0).max(0) as usize;
        for (slot, packed) in shadow_data.iter().take(count).enumerate() {
            log::debug!("  other light {}: {:?}", slot, ShadowData::decode(*packed));
        }
    }

    let keywords: Vec<&str> = properties::DIRECTIONAL_FILTER_KEYWORDS
        .iter()
        .chain(properties::OTHER_FILTER_KEYWORDS.iter())
        .chain(properties::CASCADE_BLEND_KEYWORDS.iter())
        .chain(properties::SHADOW_MASK_KEYWORDS.iter())
        .chain(std::iter::once(&properties::LIGHTS_PER_OBJECT_KEYWORD))
        .copied()
        .filter(|k| globals.keyword_enabled(k))
        .collect();
    log::info!("  enabled keywords: {:?}", keywords);

    if let Some(bytes) = globals.matrix_array_bytes(properties::DIR_SHADOW_MATRICES) {
        log::info!("  directional shadow matrices: {} bytes", bytes.len());
    }
}
