//! Server state shared across handlers.

use std::path::PathBuf;

use crate::compose::Composer;
use crate::config::Config;
use crate::error::RotuloError;
use crate::printer::{PrintBackend, SpoolBackend};
use crate::template::Template;

/// Application state: everything is read-only after startup, so one
/// instance serves all requests concurrently.
pub struct AppState {
    pub config: Config,
    pub composer: Composer,
    pub printer: Box<dyn PrintBackend>,
}

impl AppState {
    pub fn new(config: Config, composer: Composer) -> Self {
        let printer = Box::new(SpoolBackend::new(config.spool_dir.clone()));
        Self {
            config,
            composer,
            printer,
        }
    }

    /// Stored template names (file stems), sorted.
    pub fn list_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.config.template_dir)
            .into_iter()
            .flatten()
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("json") | Some("lbl")
                )
            })
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        names
    }

    /// Resolve a template name to its file, refusing anything that could
    /// escape the template directory.
    pub fn template_path(&self, name: &str) -> Result<PathBuf, RotuloError> {
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(RotuloError::Lookup(format!("invalid template name '{}'", name)));
        }
        for ext in ["json", "lbl"] {
            let path = self.config.template_dir.join(format!("{}.{}", name, ext));
            if path.is_file() {
                return Ok(path);
            }
        }
        Err(RotuloError::Lookup(format!("template '{}' not found", name)))
    }

    pub fn load_template(&self, name: &str) -> Result<Template, RotuloError> {
        Template::load(&self.template_path(name)?)
    }
}
