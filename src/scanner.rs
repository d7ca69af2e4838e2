//! Scanner Contract (spec.md §4.8): the contract between this core and
//! file/URL producers. Filesystem walking itself is an external concern
//! (spec.md §1), but a reference filesystem launcher is provided here the
//! way the teacher's sibling crates (`sd-indexer`, `notify`) provide a
//! concrete `walkdir`-based walker alongside their trait contracts.

use crate::error::NonCriticalError;
use async_trait::async_trait;
use globset::{Glob, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// One discovered path, attributed to a system by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub path: String,
}

/// Directory marker file that excludes itself and all descendants from a
/// filesystem scan (spec.md §4.8).
pub const IGNORE_MARKER: &str = ".zaparooignore";

/// A custom scanner function (spec.md §4.8 "Custom scanner"). Must not
/// assume it will be called with filesystem results in `prior` — scanner
/// output is independent of prior input.
#[async_trait]
pub trait CustomScanner: Send + Sync {
    async fn scan(&self, system_id: &str, prior: &[ScanResult]) -> Result<Vec<ScanResult>, NonCriticalError>;
}

/// Declares `Folders`/`Extensions` for a filesystem launcher (spec.md §4.8
/// "Filesystem launcher").
#[derive(Debug, Clone, Default)]
pub struct FilesystemLauncherConfig {
    pub folders: Vec<PathBuf>,
    pub extensions: Vec<String>,
}

/// A launcher bound to a system (or to `""`, meaning "any": called once per
/// known system, per spec.md §4.6 "For each system").
#[derive(Clone)]
pub struct Launcher {
    pub system_id: String,
    pub filesystem: Option<FilesystemLauncherConfig>,
    pub custom: Option<Arc<dyn CustomScanner>>,
    pub skip_filesystem_scan: bool,
}

impl Launcher {
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.system_id.is_empty()
    }

    /// Runs this launcher against `system_id`, combining filesystem and
    /// custom-scanner output. Errors from the scanner are logged and
    /// skipped, not propagated, per spec.md §7 "Scanner returned error for
    /// one launcher".
    pub async fn collect(&self, system_id: &str, prior: &[ScanResult]) -> Vec<ScanResult> {
        let mut results = Vec::new();

        if !self.skip_filesystem_scan {
            if let Some(config) = &self.filesystem {
                match walk_filesystem(config) {
                    Ok(found) => results.extend(found),
                    Err(e) => warn!(system_id, error = %e, "filesystem scan failed for launcher"),
                }
            }
        }

        if let Some(custom) = &self.custom {
            match custom.scan(system_id, prior).await {
                Ok(found) => results.extend(found),
                Err(e) => warn!(system_id, error = %e, "custom scanner failed for launcher"),
            }
        }

        results
    }
}

/// Reference filesystem walker: resolves candidate roots, walks them,
/// filters by extension, honors [`IGNORE_MARKER`], resolves symlinks, and
/// deduplicates visits by canonical path.
pub fn walk_filesystem(config: &FilesystemLauncherConfig) -> std::io::Result<Vec<ScanResult>> {
    let extension_set = build_extension_set(&config.extensions);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for root in &config.folders {
        if !root.exists() {
            continue;
        }
        walk_one_root(root, &extension_set, &mut seen, &mut out)?;
    }

    Ok(out)
}

fn build_extension_set(extensions: &[String]) -> globset::GlobSet {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let pattern = format!("*.{}", ext.trim_start_matches('.').to_lowercase());
        if let Ok(glob) = Glob::new(&pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().expect("empty globset builds"))
}

fn walk_one_root(
    root: &Path,
    extension_set: &globset::GlobSet,
    seen: &mut HashSet<PathBuf>,
    out: &mut Vec<ScanResult>,
) -> std::io::Result<()> {
    let mut walker = walkdir::WalkDir::new(root).follow_links(true).into_iter();

    loop {
        let entry = match walker.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(_)) => continue,
        };

        if entry.file_type().is_dir() {
            if entry.path().join(IGNORE_MARKER).is_file() {
                walker.skip_current_dir();
            }
            continue;
        }

        let canonical = entry.path().canonicalize().unwrap_or_else(|_| entry.path().to_path_buf());
        if !seen.insert(canonical.clone()) {
            continue;
        }

        let file_name_lower = entry
            .file_name()
            .to_str()
            .map(str::to_lowercase)
            .unwrap_or_default();

        if extension_set.is_empty() || extension_set.is_match(&file_name_lower) {
            out.push(ScanResult {
                path: entry.path().to_string_lossy().into_owned(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn walks_and_filters_by_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Mario.nes"), b"").unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let config = FilesystemLauncherConfig {
            folders: vec![dir.path().to_path_buf()],
            extensions: vec!["nes".to_string()],
        };

        let results = walk_filesystem(&config).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].path.ends_with("Mario.nes"));
    }

    #[test]
    fn honors_ignore_marker() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("skip_me");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join(IGNORE_MARKER), b"").unwrap();
        fs::write(sub.join("Hidden.nes"), b"").unwrap();
        fs::write(dir.path().join("Visible.nes"), b"").unwrap();

        let config = FilesystemLauncherConfig {
            folders: vec![dir.path().to_path_buf()],
            extensions: vec!["nes".to_string()],
        };

        let results = walk_filesystem(&config).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].path.ends_with("Visible.nes"));
    }
}
