//! Preview Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `UMBRA_LIGHTS_PER_OBJECT=1`, `UMBRA_REVERSED_Z=0`,
//!    `UMBRA_FRAMES=4`
//! 2. Settings file given as the first positional argument
//! 3. `umbra.toml` in the working directory
//! 4. Built-in defaults
//!
//! # Example Settings File
//!
//! ```toml
//! use_lights_per_object = true
//! capacity = "extended"
//!
//! [platform]
//! reversed_z = true
//! shadowmask_mode = "distance_shadowmask"
//!
//! [shadows]
//! max_distance = 80.0
//!
//! [shadows.directional]
//! atlas_size = 2048
//! filter = "pcf5x5"
//! cascade_count = 4
//! cascade_blend = "soft"
//! ```

use std::path::{Path, PathBuf};

use umbra_render::config::PipelineSettings;
use umbra_render::error::ConfigResult;

const DEFAULT_SETTINGS_FILE: &str = "umbra.toml";
const DEFAULT_FRAMES: u32 = 2;

/// Everything the preview needs to run
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub settings: PipelineSettings,
    /// Frames to render per camera
    pub frames: u32,
    /// File the settings came from, if any
    pub settings_path: Option<PathBuf>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            settings: PipelineSettings::default(),
            frames: DEFAULT_FRAMES,
            settings_path: None,
        }
    }
}

impl PreviewConfig {
    /// Load from the command line, settings file and environment
    pub fn load() -> ConfigResult<Self> {
        let mut config = Self::default();

        let explicit = std::env::args().skip(1).find(|arg| !arg.starts_with("--"));
        match explicit {
            Some(path) => config.load_settings(Path::new(&path))?,
            None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
                config.load_settings(Path::new(DEFAULT_SETTINGS_FILE))?
            }
            None => log::info!("No settings file, using defaults"),
        }

        config.apply_env();
        Ok(config)
    }

    fn load_settings(&mut self, path: &Path) -> ConfigResult<()> {
        self.settings = PipelineSettings::load(path)?;
        self.settings_path = Some(path.to_path_buf());
        log::info!("Settings loaded from {}", path.display());
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Some(value) = env_flag("UMBRA_LIGHTS_PER_OBJECT") {
            self.settings.use_lights_per_object = value;
            log::info!("Lights per object from env: {}", value);
        }

        if let Some(value) = env_flag("UMBRA_REVERSED_Z") {
            self.settings.platform.reversed_z = value;
            log::info!("Reversed Z from env: {}", value);
        }

        if let Ok(frames) = std::env::var("UMBRA_FRAMES") {
            match frames.parse() {
                Ok(n) => self.frames = n,
                Err(_) => log::warn!("Ignoring invalid UMBRA_FRAMES value: {}", frames),
            }
        }
    }

    pub fn print_summary(&self) {
        let shadows = &self.settings.shadows;
        log::info!("Preview configuration:");
        log::info!(
            "  Settings file: {}",
            self.settings_path
                .as_ref()
                .map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string())
        );
        log::info!("  Light capacity: {:?}", self.settings.capacity);
        log::info!("  Lights per object: {}", self.settings.use_lights_per_object);
        log::info!("  Reversed Z: {}", self.settings.platform.reversed_z);
        log::info!(
            "  Directional atlas: {}px, {} cascades, {:?}",
            shadows.directional.atlas_size.pixels(),
            shadows.directional.cascade_count,
            shadows.directional.filter
        );
        log::info!("  Other atlas: {}px, {:?}", shadows.other.atlas_size.pixels(), shadows.other.filter);
        log::info!("  Frames: {}", self.frames);
    }
}

/// Parse a boolean environment flag ("1"/"true"/"0"/"false")
fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Ignoring invalid {} value: {}", name, value);
            None
        }
    }
}
