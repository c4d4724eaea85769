//! Destination path planning.
//!
//! Pure: the planner never looks at the filesystem. Callers describe which
//! paths are already taken through a predicate.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{FolderNames, LayoutConfig};
use crate::types::Classification;

/// Computes destination paths for classified files.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    input_root: PathBuf,
    destination_root: PathBuf,
    keep_structure: bool,
    folder_names: FolderNames,
}

impl PathPlanner {
    pub fn new(input_root: PathBuf, destination_root: PathBuf, layout: &LayoutConfig) -> Self {
        Self {
            input_root,
            destination_root,
            keep_structure: layout.keep_directory_structure,
            folder_names: layout.folder_names.clone(),
        }
    }

    /// Plan the destination of `source`.
    ///
    /// `is_taken` reports paths already claimed by earlier files or already
    /// present at the destination. On collision a ` (n)` suffix is added
    /// before the extension, counting up from 1 until a free path is found.
    pub fn plan<F>(&self, source: &Path, classification: &Classification, is_taken: F) -> PathBuf
    where
        F: Fn(&Path) -> bool,
    {
        let candidate = self.base_path(source, classification);
        if !is_taken(&candidate) {
            return candidate;
        }

        let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = candidate
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        let extension = candidate.extension().map(|e| e.to_os_string());

        let mut counter: u64 = 1;
        loop {
            let mut name = stem.clone();
            name.push(format!(" ({counter})"));
            if let Some(ext) = &extension {
                name.push(".");
                name.push(ext);
            }
            let path = parent.join(name);
            if !is_taken(&path) {
                return path;
            }
            counter += 1;
        }
    }

    /// Destination before collision handling.
    fn base_path(&self, source: &Path, classification: &Classification) -> PathBuf {
        let mut path = self
            .destination_root
            .join(self.folder_names.category(classification.category));
        if let Some(shape) = classification.shape {
            path.push(self.folder_names.shape(shape));
        }
        path.push(self.remainder(source));
        path
    }

    /// Relative subpath in structure-preserving mode, otherwise the file name.
    fn remainder(&self, source: &Path) -> PathBuf {
        if self.keep_structure {
            if let Ok(relative) = source.strip_prefix(&self.input_root) {
                if relative.file_name().is_some() {
                    return relative.to_path_buf();
                }
            }
        }
        PathBuf::from(
            source
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| OsString::from("unnamed")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Shape};
    use std::collections::HashSet;

    fn planner(keep_structure: bool) -> PathPlanner {
        let layout = LayoutConfig {
            keep_directory_structure: keep_structure,
            ..LayoutConfig::default()
        };
        PathPlanner::new(PathBuf::from("/in"), PathBuf::from("/out"), &layout)
    }

    fn free(_: &Path) -> bool {
        false
    }

    #[test]
    fn test_flat_layout() {
        let p = planner(false);
        let c = Classification::new(Category::Large, None);
        let dest = p.plan(Path::new("/in/trips/2019/beach.jpg"), &c, free);
        assert_eq!(dest, PathBuf::from("/out/Large/beach.jpg"));
    }

    #[test]
    fn test_structure_preserving_layout() {
        let p = planner(true);
        let c = Classification::new(Category::Small, None);
        let dest = p.plan(Path::new("/in/trips/2019/beach.jpg"), &c, free);
        assert_eq!(dest, PathBuf::from("/out/Small/trips/2019/beach.jpg"));
    }

    #[test]
    fn test_shape_segment_between_category_and_subpath() {
        let p = planner(true);
        let c = Classification::new(Category::BestQuality, Some(Shape::Portrait));
        let dest = p.plan(Path::new("/in/trips/beach.jpg"), &c, free);
        assert_eq!(dest, PathBuf::from("/out/Best Quality/Portrait/trips/beach.jpg"));
    }

    #[test]
    fn test_source_outside_input_root_falls_back_to_file_name() {
        let p = planner(true);
        let c = Classification::new(Category::Standard, None);
        let dest = p.plan(Path::new("/elsewhere/a.png"), &c, free);
        assert_eq!(dest, PathBuf::from("/out/Standard/a.png"));
    }

    #[test]
    fn test_error_category_uses_errors_folder() {
        let p = planner(false);
        let dest = p.plan(Path::new("/in/x/broken.jpg"), &Classification::ERROR, free);
        assert_eq!(dest, PathBuf::from("/out/Errors/broken.jpg"));
    }

    #[test]
    fn test_collision_appends_suffix_before_extension() {
        let p = planner(false);
        let c = Classification::new(Category::Large, None);
        let mut taken = HashSet::new();

        let first = p.plan(Path::new("/in/a/photo.jpg"), &c, |path| taken.contains(path));
        taken.insert(first.clone());
        let second = p.plan(Path::new("/in/b/photo.jpg"), &c, |path| taken.contains(path));
        taken.insert(second.clone());
        let third = p.plan(Path::new("/in/c/photo.jpg"), &c, |path| taken.contains(path));

        assert_eq!(first, PathBuf::from("/out/Large/photo.jpg"));
        assert_eq!(second, PathBuf::from("/out/Large/photo (1).jpg"));
        assert_eq!(third, PathBuf::from("/out/Large/photo (2).jpg"));
    }

    #[test]
    fn test_collision_without_extension() {
        let p = planner(false);
        let c = Classification::new(Category::Small, None);
        let taken: HashSet<PathBuf> = [PathBuf::from("/out/Small/README")].into();
        let dest = p.plan(Path::new("/in/README"), &c, |path| taken.contains(path));
        assert_eq!(dest, PathBuf::from("/out/Small/README (1)"));
    }

    #[test]
    fn test_collision_resolution_is_deterministic() {
        let p = planner(false);
        let c = Classification::new(Category::Large, None);
        let run = || {
            let mut taken = HashSet::new();
            let mut out = Vec::new();
            for src in ["/in/a/x.jpg", "/in/b/x.jpg", "/in/c/x.jpg"] {
                let dest = p.plan(Path::new(src), &c, |path| taken.contains(path));
                taken.insert(dest.clone());
                out.push(dest);
            }
            out
        };
        let first = run();
        assert_eq!(first, run());
        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), 3);
    }
}
