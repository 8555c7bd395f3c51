//! Print job submission.
//!
//! The engine's output is a finished PNG; what happens to it is a backend
//! concern behind [`PrintBackend`]. The built-in backend spools jobs into a
//! directory where an external printer daemon (or a human) picks them up.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;

use crate::error::RotuloError;

pub trait PrintBackend: Send + Sync {
    /// Submit a finished label. Returns a backend-specific job reference.
    fn submit(&self, label: &str, png: &[u8]) -> Result<String, RotuloError>;
}

/// Writes each job as a PNG file into a spool directory.
pub struct SpoolBackend {
    dir: PathBuf,
    counter: AtomicU64,
}

impl SpoolBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            counter: AtomicU64::new(0),
        }
    }
}

impl PrintBackend for SpoolBackend {
    fn submit(&self, label: &str, png: &[u8]) -> Result<String, RotuloError> {
        fs::create_dir_all(&self.dir)?;
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let name = format!("{}-{:04}-{}.png", stamp, seq, sanitize(label));
        let path = self.dir.join(&name);
        fs::write(&path, png)?;
        println!("[print] spooled {}", path.display());
        Ok(name)
    }
}

fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "label".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("shelf/milk 62"), "shelf_milk_62");
        assert_eq!(sanitize(""), "label");
    }

    #[test]
    fn test_spool_writes_file() {
        let dir = std::env::temp_dir().join(format!("spool-test-{}", std::process::id()));
        let backend = SpoolBackend::new(dir.clone());
        let job = backend.submit("demo", b"png-bytes").unwrap();
        let path = dir.join(&job);
        assert_eq!(fs::read(&path).unwrap(), b"png-bytes");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_sequential_jobs_get_distinct_names() {
        let dir = std::env::temp_dir().join(format!("spool-test-seq-{}", std::process::id()));
        let backend = SpoolBackend::new(dir.clone());
        let a = backend.submit("demo", b"a").unwrap();
        let b = backend.submit("demo", b"b").unwrap();
        assert_ne!(a, b);
        fs::remove_dir_all(&dir).unwrap();
    }
}
