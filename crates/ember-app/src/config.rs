// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use ember_render::{
    FrameControllerConfig, PresentModePreference, SurfacePreferences, DEFAULT_ROTATION_STEP,
};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeCfg {
    /// Smart vsync, falls back to fifo when unavailable
    #[default]
    Mailbox,
    /// Strict vsync
    Fifo,
}

impl From<PresentModeCfg> for PresentModePreference {
    fn from(m: PresentModeCfg) -> Self {
        match m {
            PresentModeCfg::Mailbox => PresentModePreference::LowLatency,
            PresentModeCfg::Fifo => PresentModePreference::Vsync,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            width: 800,
            height: 600,
            title: "ember".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderCfg {
    pub clear_color: [f32; 4],
    pub present_mode: PresentModeCfg,
    /// Radians added to each object's rotation per drawn frame.
    pub rotation_step: f32,
}

impl Default for RenderCfg {
    fn default() -> Self {
        RenderCfg {
            clear_color: [0.1, 0.1, 0.1, 1.0],
            present_mode: PresentModeCfg::Mailbox,
            rotation_step: DEFAULT_ROTATION_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AppCfg {
    pub window: WindowCfg,
    pub render: RenderCfg,
}

impl AppCfg {
    pub fn frame_controller_config(&self) -> FrameControllerConfig {
        FrameControllerConfig {
            clear_color: self.render.clear_color,
            preferences: SurfacePreferences {
                present_mode: self.render.present_mode.into(),
            },
        }
    }
}

pub fn parse_cfg(s: &str) -> Result<AppCfg, toml::de::Error> {
    toml::from_str(s)
}

/// Reads `path`; a missing or malformed file yields the defaults.
pub fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).unwrap_or_else(|e| {
            warn!("{}: {e}; using defaults", path.display());
            AppCfg::default()
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("no {} found, using defaults", path.display());
            AppCfg::default()
        }
        Err(e) => {
            warn!("reading {}: {e}; using defaults", path.display());
            AppCfg::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = parse_cfg("").unwrap();
        assert_eq!(cfg, AppCfg::default());
        assert_eq!(cfg.window.width, 800);
        assert_eq!(cfg.window.height, 600);
        assert_eq!(cfg.render.rotation_step, 0.01);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_cfg(
            r#"
            [window]
            title = "demo"

            [render]
            present_mode = "fifo"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.window.title, "demo");
        assert_eq!(cfg.window.width, 800);
        assert_eq!(cfg.render.present_mode, PresentModeCfg::Fifo);
        assert_eq!(cfg.render.clear_color, [0.1, 0.1, 0.1, 1.0]);
    }

    #[test]
    fn unknown_present_mode_is_rejected() {
        assert!(parse_cfg("[render]\npresent_mode = \"immediate\"").is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let cfg = load_cfg(Path::new("definitely/not/here/ember.toml"));
        assert_eq!(cfg, AppCfg::default());
    }

    #[test]
    fn maps_onto_frame_controller_config() {
        let mut cfg = AppCfg::default();
        cfg.render.clear_color = [0.0, 0.0, 0.0, 1.0];
        cfg.render.present_mode = PresentModeCfg::Fifo;

        let fc = cfg.frame_controller_config();
        assert_eq!(fc.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(fc.preferences.present_mode, PresentModePreference::Vsync);
    }
}
