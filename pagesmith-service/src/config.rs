//! Static configuration loaded at startup.
//! These settings affect server binding or the rasterizer environment and
//! require a restart to change.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Static configuration loaded from `config.*` and `PAGESMITH__`-prefixed
/// environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_rasterizer")]
    pub rasterizer: RasterizerSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Rasterizer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RasterizerSettings {
    /// Path to the external page-rasterization binary (poppler's pdftoppm).
    #[serde(default = "default_tool_path")]
    pub tool_path: PathBuf,

    /// Directory temp artifacts are written to. Shared between calls;
    /// isolation comes from per-call filename namespacing, not from
    /// per-call directories.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Subprocess timeout. A conversion that exceeds it is killed and
    /// reported as `RasterizationTimeout`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// DPI used when a request does not specify one.
    #[serde(default = "default_dpi")]
    pub default_dpi: u32,

    /// Largest accepted input document, checked before the tool is spawned.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl RasterizerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ==================== Default Value Functions ====================

pub(crate) fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_rasterizer() -> RasterizerSettings {
    RasterizerSettings {
        tool_path: default_tool_path(),
        temp_dir: default_temp_dir(),
        timeout_secs: default_timeout_secs(),
        default_dpi: default_dpi(),
        max_document_bytes: default_max_document_bytes(),
    }
}

pub(crate) fn default_tool_path() -> PathBuf {
    PathBuf::from("pdftoppm")
}

pub(crate) fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

pub(crate) fn default_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_dpi() -> u32 {
    150
}

pub(crate) fn default_max_document_bytes() -> u64 {
    50 * 1024 * 1024
}
