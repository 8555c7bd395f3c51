//! Application configuration.
//!
//! Loaded from a JSON file with serde defaults for every field, then
//! optionally overridden by CLI flags. The defaults make `rotulo serve`
//! usable from a checkout with a `templates/` directory and system fonts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RotuloError;

/// Server and rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub listen_addr: String,
    /// Directory of stored label templates (`*.json` / `*.lbl`).
    pub template_dir: PathBuf,
    /// Directories scanned for fonts at startup.
    pub font_dirs: Vec<PathBuf>,
    /// Directory where print jobs are spooled as PNG files.
    pub spool_dir: PathBuf,
    /// Default font applied when a request names none.
    pub default_font_family: String,
    pub default_font_style: String,
    /// Default media size name (see [`crate::media`]).
    pub default_label_size: String,
    /// Default nominal font size in pixels.
    pub default_font_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8013".to_string(),
            template_dir: PathBuf::from("templates"),
            font_dirs: vec![
                PathBuf::from("/usr/share/fonts"),
                PathBuf::from("/usr/local/share/fonts"),
                PathBuf::from("fonts"),
            ],
            spool_dir: PathBuf::from("spool"),
            default_font_family: "DejaVu Sans".to_string(),
            default_font_style: "Book".to_string(),
            default_label_size: "62".to_string(),
            default_font_size: 40,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RotuloError> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| RotuloError::Template(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Load from a file if given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, RotuloError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_label_size, "62");
        assert_eq!(config.default_font_size, 40);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"listen_addr": "127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.default_label_size, "62");
    }
}
