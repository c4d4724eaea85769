//! File discovery for finding images under the input root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    supported_formats: Vec<String>,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            supported_formats: config
                .supported_formats
                .iter()
                .map(|f| f.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Discover all supported image files under `root`.
    ///
    /// `root` should be canonical. Entries that resolve outside it (symlinks
    /// pointing elsewhere) are skipped, as is anything under `exclude`, which
    /// keeps a destination nested inside the input from being re-sorted. An
    /// `exclude` at or above `root` is ignored, so an input nested inside the
    /// destination is still walked.
    ///
    /// Each real file is reported once: symlinks to files are skipped, and a
    /// file reached again through a linked directory is dropped.
    pub fn discover(&self, root: &Path, exclude: Option<&Path>) -> Vec<DiscoveredFile> {
        if root.is_file() {
            if self.is_supported(root) {
                if let Ok(meta) = std::fs::metadata(root) {
                    return vec![DiscoveredFile {
                        path: root.to_path_buf(),
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        // An excluded tree that contains the root would hide everything
        let exclude = exclude.filter(|ex| !root.starts_with(ex));

        // Keyed by canonical path; the entry reached without links wins.
        let mut found: HashMap<PathBuf, DiscoveredFile> = HashMap::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| exclude.map_or(true, |ex| !e.path().starts_with(ex)));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            let entry_path = entry.path();
            if !entry.file_type().is_file() || !self.is_supported(entry_path) {
                continue;
            }
            let Some(resolved) = Self::resolve_within(root, entry_path) else {
                tracing::warn!("Skipping {:?}: resolves outside the input root", entry_path);
                continue;
            };
            if entry.path_is_symlink() {
                tracing::debug!("Skipping {:?}: symlink to {:?}", entry_path, resolved);
                continue;
            }
            let direct = entry_path == resolved;
            if let Some(previous) = found.get(&resolved) {
                if !direct {
                    tracing::debug!("Skipping {:?}: same file as {:?}", entry_path, previous.path);
                    continue;
                }
            }
            if let Ok(meta) = entry.metadata() {
                let file = DiscoveredFile {
                    path: entry_path.to_path_buf(),
                    size: meta.len(),
                };
                if let Some(replaced) = found.insert(resolved, file) {
                    tracing::debug!("Skipping {:?}: reached through a linked directory", replaced.path);
                }
            }
        }

        let mut files: Vec<DiscoveredFile> = found.into_values().collect();
        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("Discovered {} file(s) under {:?}", files.len(), root);
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.supported_formats.iter().any(|fmt| *fmt == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Canonical form of `path`, if it lies inside `root`.
    fn resolve_within(root: &Path, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path)
            .ok()
            .filter(|resolved| resolved.starts_with(root))
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
