use std::path::Path;

use tidyfin_model::MediaFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::confidence::initial_confidence;
use crate::error::{OrganizeError, Result};
use crate::parser::FilenameParser;

/// Discovers video files under a root and parses each into a [`MediaFile`]
/// carrying its parser-only confidence.
#[derive(Debug, Clone)]
pub struct MediaScanner {
    /// Supported video file extensions, lowercase, without dots.
    pub video_extensions: Vec<String>,
    /// Maximum depth for directory traversal (None = unlimited).
    pub max_depth: Option<usize>,
    /// Whether to follow symbolic links.
    pub follow_links: bool,
    parser: FilenameParser,
}

impl Default for MediaScanner {
    fn default() -> Self {
        Self {
            video_extensions: [
                "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "ts",
                "mpg", "mpeg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_depth: None,
            follow_links: false,
            parser: FilenameParser::new(),
        }
    }
}

impl MediaScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.video_extensions = extensions;
        self
    }

    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.video_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Walk `root` and return every video file, parsed and scored.
    ///
    /// A missing or non-directory root is a hard error; unreadable entries
    /// are logged and skipped so one bad directory never sinks a scan.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<MediaFile>> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(OrganizeError::NotFound(format!(
                "Directory does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(OrganizeError::InvalidPath(format!(
                "Path is not a directory: {}",
                root.display()
            )));
        }

        info!("Scanning {} for media files", root.display());

        let mut walker = WalkDir::new(root).follow_links(self.follow_links);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_video_file(entry.path()) {
                continue;
            }
            let Some(filename) = entry.file_name().to_str() else {
                warn!("Skipping non-UTF-8 filename: {}", entry.path().display());
                continue;
            };

            let parsed = self.parser.parse(filename);
            let (score, _tier) = initial_confidence(&parsed);
            debug!(
                "Found {} -> {:?} (score {:.2})",
                filename, parsed.kind, score
            );
            files.push(MediaFile::new(entry.path().to_path_buf(), parsed, score));
        }

        info!("Scan complete: {} media files found", files.len());
        Ok(files)
    }
}
