//! stealthbrowse
//!
//! Multi-session anti-detect browser automation: per-identity profiles,
//! randomized human behavior simulation, and an orchestrator that runs
//! up to ten concurrent browser sessions with per-instance failure
//! isolation. The browser engine itself is pluggable behind the
//! [`driver::PageDriver`] capability.

pub mod driver;
pub mod motion;
pub mod profiles;
pub mod proxy;
pub mod session;
pub mod validate;

use std::path::PathBuf;
use tracing::{error, info, warn};

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stealthbrowse").join("logs"))
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("stealthbrowse"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Application configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Where the profile store document lives
    pub profile_dir: PathBuf,
    /// Where verification screenshots are written
    pub screenshot_dir: PathBuf,
    /// Launch browsers headless
    pub headless: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = app_dir();
        Self {
            profile_dir: base.join("profiles"),
            screenshot_dir: base.join("screenshots"),
            headless: true,
        }
    }
}

impl AppConfig {
    /// Get config file path
    fn config_path() -> PathBuf {
        app_dir().join("config.json")
    }

    /// Load config from file, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => {
                        info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&path, content) {
                    error!("Failed to save config: {}", e);
                } else {
                    info!("Config saved to {:?}", path);
                }
            }
            Err(e) => {
                error!("Failed to serialize config: {}", e);
            }
        }
    }
}

/// Initialize logging with a console layer and a daily-rolling file layer.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "stealthbrowse.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
