//! Startup configuration.

use std::path::PathBuf;

use crate::gfx::scene::color_from_hex;

/// Environment variable naming the asset root directory
pub const ASSETS_ENV: &str = "DIORAMA_ASSETS";
/// Set to anything but `0`/`false` to start with an empty scene
pub const SKIP_INITIAL_MODELS_ENV: &str = "DIORAMA_SKIP_INITIAL_MODELS";

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub asset_root: PathBuf,
    pub window_size: (u32, u32),
    pub move_speed: f32,
    pub background_color: [f32; 3],
    pub load_initial_models: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            window_size: (1280, 800),
            move_speed: 0.1,
            background_color: color_from_hex(0x2a2a2a),
            load_initial_models: true,
        }
    }
}

impl EditorConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = var(ASSETS_ENV).filter(|v| !v.is_empty()) {
            config.asset_root = PathBuf::from(root);
        }
        if let Some(skip) = var(SKIP_INITIAL_MODELS_ENV) {
            config.load_initial_models = matches!(skip.trim(), "0" | "false" | "");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = EditorConfig::from_vars(|_| None);
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.asset_root, PathBuf::from("assets"));
    }

    #[test]
    fn test_env_overrides() {
        let config = EditorConfig::from_vars(|key| match key {
            ASSETS_ENV => Some("/srv/diorama".to_string()),
            SKIP_INITIAL_MODELS_ENV => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(config.asset_root, PathBuf::from("/srv/diorama"));
        assert!(!config.load_initial_models);

        let config = EditorConfig::from_vars(|key| {
            (key == SKIP_INITIAL_MODELS_ENV).then(|| "false".to_string())
        });
        assert!(config.load_initial_models);
    }
}
