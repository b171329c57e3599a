use crate::domain::WorldGeometry;
use crate::interface_adapters::clients::UploadTarget;
use crate::use_cases::{TileSettings, WorkerSchedule, WorldMapSettings};
use crate::use_cases::world_map::channel_blocks_per_dimension;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, io, time::Duration};

// Runtime/server constants (not loaded from the config file).

pub const CONFIG_PATH_VAR: &str = "TERRITORY_CONFIG";
pub const PORT_VAR: &str = "TERRITORY_SERVER_PORT";
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

pub const TILES_DIR: &str = "territoryTiles";
pub const GAME_TILES_DIR: &str = "gameTiles";

const MAX_ZOOM_LEVELS: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Empty binds every interface.
    pub host: String,
    pub port: u16,
    /// Public `host[:port]` announced to consumers instead of the bind address.
    pub alternative_url: String,
    pub www_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8881,
            alternative_url: String::new(),
            www_dir: PathBuf::from("./www"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enable_tiles: bool,
    pub enable_world_map: bool,
    pub fetch_rate_seconds: u64,
    pub top_tribes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enable_tiles: false,
            enable_world_map: true,
            fetch_rate_seconds: 15,
            top_tribes: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub servers_x: u32,
    pub servers_y: u32,
    pub grid_size: f64,
    pub land_radius: f64,
    pub water_radius: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            servers_x: 3,
            servers_y: 3,
            grid_size: 1_400_000.0,
            land_radius: 10_000.0,
            water_radius: 21_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub game_size: u32,
    pub tile_size: u32,
    pub max_zoom: u32,
    pub circle_alpha: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            game_size: 2048,
            tile_size: 256,
            max_zoom: 7,
            circle_alpha: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub data_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub endpoint: String,
    /// Empty disables uploads.
    pub access_id: String,
    pub secret_key: String,
    pub bucket: String,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Empty logs the world map url instead of posting it.
    pub webhook_url: String,
}

/// Immutable service configuration, shared with every task at construction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub grid: GridConfig,
    pub render: RenderConfig,
    pub source: SourceConfig,
    pub upload: UploadConfig,
    pub notify: NotifyConfig,
}

impl Settings {
    /// Parses, normalises and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = toml::from_str(raw)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reads `TERRITORY_CONFIG` (default `./config.toml`) and applies the port override.
    /// Any problem with the file falls back to defaults.
    pub fn load() -> Self {
        let path = env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut settings = match Self::from_file(&path) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "config loaded");
                settings
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "using default config");
                Self::default()
            }
        };

        if let Some(port) = port_override() {
            settings.server.port = port;
        }
        settings
    }

    fn normalize(&mut self) {
        let prefix = &mut self.upload.key_prefix;
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(message.to_string()))
        };

        if self.grid.servers_x == 0 || self.grid.servers_y == 0 {
            return invalid("grid dimensions must be non-zero");
        }
        if !(self.grid.grid_size.is_finite() && self.grid.grid_size > 0.0) {
            return invalid("grid_size must be positive");
        }
        for radius in [self.grid.land_radius, self.grid.water_radius] {
            if !(radius.is_finite() && radius >= 0.0) {
                return invalid("marker radii must be finite and non-negative");
            }
        }
        if self.render.tile_size == 0 {
            return invalid("tile_size must be non-zero");
        }
        if self.render.max_zoom == 0 || self.render.max_zoom > MAX_ZOOM_LEVELS {
            return invalid("max_zoom must be between 1 and 16");
        }
        let tile_extent = u64::from(self.render.tile_size) << (self.render.max_zoom - 1);
        if tile_extent > u64::from(u32::MAX) {
            return invalid("tile_size is too large for max_zoom");
        }
        let corrected = u64::from(self.render.game_size) * u64::from(channel_blocks_per_dimension());
        if self.render.game_size == 0 || corrected > u64::from(u16::MAX) {
            return invalid("game_size must be non-zero and game_size * 5 must fit in 16 bits");
        }
        if self.generation.fetch_rate_seconds == 0 {
            return invalid("fetch_rate_seconds must be non-zero");
        }
        Ok(())
    }

    pub fn geometry(&self) -> WorldGeometry {
        WorldGeometry {
            servers_x: self.grid.servers_x,
            servers_y: self.grid.servers_y,
            grid_size: self.grid.grid_size,
            land_radius: self.grid.land_radius,
            water_radius: self.grid.water_radius,
        }
    }

    pub fn tile_settings(&self) -> TileSettings {
        TileSettings {
            tile_size: self.render.tile_size,
            max_zoom: self.render.max_zoom,
            circle_alpha: self.render.circle_alpha,
            geometry: self.geometry(),
        }
    }

    pub fn world_map_settings(&self) -> WorldMapSettings {
        WorldMapSettings {
            game_size: self.render.game_size,
            geometry: self.geometry(),
        }
    }

    pub fn schedule(&self) -> WorkerSchedule {
        WorkerSchedule {
            servers_x: self.grid.servers_x,
            servers_y: self.grid.servers_y,
            interval: Duration::from_secs(self.generation.fetch_rate_seconds),
        }
    }

    pub fn tiles_dir(&self) -> PathBuf {
        self.server.www_dir.join(TILES_DIR)
    }

    pub fn game_tiles_dir(&self) -> PathBuf {
        self.server.www_dir.join(GAME_TILES_DIR)
    }

    pub fn bind_address(&self) -> String {
        let host = if self.server.host.is_empty() {
            "0.0.0.0"
        } else {
            self.server.host.as_str()
        };
        format!("{host}:{}", self.server.port)
    }

    /// `host[:port]` consumers use to reach the published artifacts.
    pub fn announce_endpoint(&self) -> String {
        if !self.server.alternative_url.is_empty() {
            return self.server.alternative_url.clone();
        }
        if !self.server.host.is_empty() {
            return format!("{}:{}", self.server.host, self.server.port);
        }
        format!("localhost:{}", self.server.port)
    }

    pub fn upload_target(&self) -> Option<UploadTarget> {
        if self.upload.access_id.is_empty() {
            return None;
        }
        Some(UploadTarget {
            endpoint: self.upload.endpoint.clone(),
            bucket: self.upload.bucket.clone(),
            key_prefix: self.upload.key_prefix.clone(),
            access_id: self.upload.access_id.clone(),
            secret_key: self.upload.secret_key.clone(),
        })
    }
}

fn port_override() -> Option<u16> {
    let raw = env::var(PORT_VAR).ok()?;
    match raw.parse() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring invalid port override");
            None
        }
    }
}
