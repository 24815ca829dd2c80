//! Screenshot artifact persistence.
//!
//! Layout: `<root>/<suite-slug>/<name>.png`. Writing never fails a scenario;
//! problems come back as [`ScreenshotWriteWarning`]s.

use crate::result::ScreenshotWriteWarning;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default artifact root
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts/screenshots";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]+"#).expect("static regex"))
}

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static regex"))
}

/// Make a checkpoint name safe to use as a file stem
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let cleaned = unsafe_chars().replace_all(name.trim(), "-");
    let cleaned = cleaned.trim_matches(|c| c == '-' || c == '.');
    if cleaned.is_empty() {
        "screenshot".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Directory slug for a suite name
#[must_use]
pub fn slugify(name: &str) -> String {
    let slug = non_word()
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string();
    if slug.is_empty() {
        "suite".to_string()
    } else {
        slug
    }
}

/// Writes screenshot bytes under a per-suite directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Store for `suite_name` under `root`
    #[must_use]
    pub fn new(root: impl AsRef<Path>, suite_name: &str) -> Self {
        Self {
            dir: root.as_ref().join(slugify(suite_name)),
        }
    }

    /// Directory screenshots are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for a checkpoint
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize_name(name)))
    }

    /// Persist PNG bytes, creating the directory on demand
    pub fn write(&self, name: &str, png: &[u8]) -> Result<PathBuf, ScreenshotWriteWarning> {
        let path = self.path_for(name);
        let warn = |e: std::io::Error| ScreenshotWriteWarning {
            name: name.to_string(),
            path: Some(path.clone()),
            message: e.to_string(),
        };
        std::fs::create_dir_all(&self.dir).map_err(warn)?;
        std::fs::write(&path, png).map_err(warn)?;
        tracing::debug!(path = %path.display(), bytes = png.len(), "screenshot written");
        Ok(path)
    }
}
