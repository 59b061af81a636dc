use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::types::FileKind;

/// A file selected for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub rel_path: String,
    /// `None` when the file was picked up by an include pattern only.
    pub kind: Option<FileKind>,
}

/// Enumerates candidate files under a root using extension and glob rules.
pub struct FileWalker {
    code_extensions: Vec<String>,
    config_extensions: Vec<String>,
    exclude: GlobSet,
    /// Directory prefixes of `dir/**` excludes; matching directories are not descended.
    exclude_dirs: GlobSet,
    include: GlobSet,
    skip: Vec<PathBuf>,
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("ignoring invalid glob pattern '{pattern}': {e}"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

fn directory_prefixes(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .filter_map(|p| p.strip_suffix("/**"))
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect()
}

impl FileWalker {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            code_extensions: normalize_extensions(&config.code_extensions),
            config_extensions: normalize_extensions(&config.config_extensions),
            exclude: build_globset(&config.exclude_patterns),
            exclude_dirs: build_globset(&directory_prefixes(&config.exclude_patterns)),
            include: build_globset(&config.include_patterns),
            skip: Vec::new(),
        }
    }

    /// Never report this path (e.g. the report being written).
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip.push(path.into());
        self
    }

    /// Kind implied by a file's extension, if any.
    pub fn kind_for(&self, path: &Path) -> Option<FileKind> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if self.code_extensions.contains(&ext) {
            Some(FileKind::Code)
        } else if self.config_extensions.contains(&ext) {
            Some(FileKind::Config)
        } else {
            None
        }
    }

    /// Whether a directory (relative to the root) is excluded as a whole.
    pub fn is_excluded_dir(&self, rel_dir: &str) -> bool {
        self.exclude_dirs.is_match(rel_dir)
    }

    /// Walk `root` and return candidates sorted by relative path.
    ///
    /// Excluded directories are pruned rather than walked. Symlinks are not
    /// followed into directories; a symlink to a regular file is scanned.
    pub fn walk(&self, root: &Path) -> Vec<Candidate> {
        let skip: Vec<PathBuf> = self
            .skip
            .iter()
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
            .collect();

        let mut candidates: Vec<Candidate> = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !self.is_excluded_dir(&relative(root, e.path()))
            })
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|e| {
                if e.file_type().is_file() {
                    return true;
                }
                if e.path_is_symlink() {
                    if e.path().is_file() {
                        return true;
                    }
                    tracing::debug!(path = %e.path().display(), "skipping symlink");
                }
                false
            })
            .filter_map(|e| {
                let path = e.into_path();
                let rel_path = relative(root, &path);

                if self.exclude.is_match(&rel_path) {
                    return None;
                }
                if !skip.is_empty() {
                    let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
                    if skip.contains(&resolved) {
                        return None;
                    }
                }

                let kind = self.kind_for(&path);
                if kind.is_none() && !self.include.is_match(&rel_path) {
                    return None;
                }

                Some(Candidate {
                    path,
                    rel_path,
                    kind,
                })
            })
            .collect();

        candidates.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        candidates
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
