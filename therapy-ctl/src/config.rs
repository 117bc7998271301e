//! Command-line client configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use therapy_core::tools::stylus::DEFAULT_CURSOR_LAYER;
use therapy_core::tools::DEFAULT_LAYER;
use therapy_core::{Brush, ClientConfig, KeyboardNavigator, Rgba};

/// Top-level configuration for `therapy-ctl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CtlConfig {
    /// Server endpoints and dispatch.
    pub connection: ClientConfig,
    /// Drawing tool settings.
    pub tools: ToolsConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Drawing tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Layer strokes are drawn on.
    pub layer: String,
    pub color: Rgba,
    pub line_thickness: f32,
    pub pencil_thickness: f32,
    pub stylus_thickness: f32,
    /// Layer holding the stylus crosshair.
    pub cursor_layer: String,
    /// Events buffered between the listener task and the tool.
    pub event_queue: usize,
    pub navigation: KeyboardNavigator,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            layer: DEFAULT_LAYER.into(),
            color: Rgba::RED,
            line_thickness: 0.01,
            pencil_thickness: 0.001,
            stylus_thickness: 0.001,
            cursor_layer: DEFAULT_CURSOR_LAYER.into(),
            event_queue: 256,
            navigation: KeyboardNavigator::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl ToolsConfig {
    pub fn line_brush(&self) -> Brush {
        Brush::new(self.layer.clone(), self.line_thickness, self.color)
    }

    pub fn pencil_brush(&self) -> Brush {
        Brush::new(self.layer.clone(), self.pencil_thickness, self.color)
    }

    pub fn stylus_brush(&self) -> Brush {
        Brush::new(self.layer.clone(), self.stylus_thickness, self.color)
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CtlConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
