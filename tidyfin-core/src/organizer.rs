//! Routing policy: enrich, score, and route each file to
//! moved / manual review / skipped / error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tidyfin_model::{MediaFile, RouteAction, RouteOutcome, RouteSummary};
use tracing::{debug, info, warn};

use crate::confidence::AUTO_THRESHOLD;
use crate::layout::LibraryLayout;
use crate::providers::MetadataProvider;

/// Executes the actual filesystem relocation. In dry-run mode the
/// organizer never invokes this at all.
pub trait FileMover: Send + Sync {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

/// Default mover: create parents and rename, falling back to copy+remove
/// when rename fails (cross-device moves cannot rename).
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMover;

impl FileMover for FsMover {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(
                    "rename failed ({e}), copying {} -> {}",
                    source.display(),
                    destination.display()
                );
                fs::copy(source, destination)?;
                fs::remove_file(source)
            }
        }
    }
}

/// Orchestrates identification and routing for a batch of media files.
///
/// Files are processed sequentially and independently; every failure is
/// contained at the single-file boundary, so one bad file never aborts a
/// batch. Preview and execute share this exact code path and differ only
/// in whether the mover is invoked.
pub struct FileOrganizer {
    layout: LibraryLayout,
    review_dir: Option<PathBuf>,
    provider: Option<Arc<dyn MetadataProvider>>,
    mover: Arc<dyn FileMover>,
    dry_run: bool,
}

impl std::fmt::Debug for FileOrganizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileOrganizer")
            .field("layout", &self.layout)
            .field("review_dir", &self.review_dir)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl FileOrganizer {
    pub fn new(layout: LibraryLayout) -> Self {
        Self {
            layout,
            review_dir: None,
            provider: None,
            mover: Arc::new(FsMover),
            dry_run: false,
        }
    }

    pub fn with_review_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.review_dir = Some(dir.into());
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_mover(mut self, mover: Arc<dyn FileMover>) -> Self {
        self.mover = mover;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Route a whole batch, sequentially.
    pub async fn organize(&self, files: Vec<MediaFile>) -> RouteSummary {
        self.organize_with_progress(files, |_, _, _| {}).await
    }

    /// Route a whole batch, invoking `progress(current, total, file)`
    /// before each file.
    pub async fn organize_with_progress<F>(
        &self,
        files: Vec<MediaFile>,
        mut progress: F,
    ) -> RouteSummary
    where
        F: FnMut(usize, usize, &MediaFile),
    {
        let total = files.len();
        let mut summary = RouteSummary::default();
        for (index, file) in files.into_iter().enumerate() {
            progress(index + 1, total, &file);
            let outcome = self.route_file(file).await;
            summary.record(outcome);
        }
        info!(
            "Batch complete: {} files, {} movies moved, {} episodes moved, \
             {} to review, {} skipped, {} errors",
            summary.total,
            summary.movies_moved,
            summary.shows_moved,
            summary.manual_review,
            summary.skipped,
            summary.errors
        );
        summary
    }

    /// Route a single file through enrich -> score -> move/review/skip.
    pub async fn route_file(&self, file: MediaFile) -> RouteOutcome {
        let file = self.enrich(file).await;

        if file.score < AUTO_THRESHOLD {
            debug!(
                "{} scored {:.2}, below auto threshold",
                file.filename(),
                file.score
            );
            return self.send_to_review(file, "low confidence");
        }

        let Some(destination) = self.layout.resolve(&file) else {
            debug!("{} has no resolvable destination", file.filename());
            return self.send_to_review(file, "destination unresolved");
        };

        self.relocate(file, destination)
    }

    /// Look the file up with the metadata provider, when one is
    /// configured. Lookup failure is not fatal: the file proceeds with its
    /// parser-only confidence.
    async fn enrich(&self, file: MediaFile) -> MediaFile {
        let Some(provider) = &self.provider else {
            return file;
        };
        if file.parsed.title.is_empty() {
            return file;
        }
        match provider.identify(&file.parsed).await {
            Ok(Some(found)) => {
                debug!(
                    "{} matched \"{}\" (score {:.2})",
                    file.filename(),
                    found.title,
                    found.score
                );
                file.with_match(found)
            }
            Ok(None) => {
                debug!("no metadata match for {}", file.filename());
                file
            }
            Err(e) => {
                warn!(
                    "Metadata lookup failed for {}: {} (continuing unenriched)",
                    file.filename(),
                    e
                );
                file
            }
        }
    }

    fn send_to_review(&self, file: MediaFile, reason: &str) -> RouteOutcome {
        let Some(review_dir) = &self.review_dir else {
            return RouteOutcome {
                error: Some(format!(
                    "{reason} and no review directory configured"
                )),
                file,
                action: RouteAction::Skipped,
                destination: None,
                dry_run: self.dry_run,
            };
        };

        let destination = review_dir.join(file.filename());
        if !self.dry_run {
            if let Err(e) = self.mover.move_file(&file.source, &destination) {
                warn!("Review move failed for {}: {}", file.source.display(), e);
                return RouteOutcome {
                    file,
                    action: RouteAction::Error,
                    destination: Some(destination),
                    error: Some(e.to_string()),
                    dry_run: false,
                };
            }
        }
        RouteOutcome {
            file,
            action: RouteAction::ManualReview,
            destination: Some(destination),
            error: None,
            dry_run: self.dry_run,
        }
    }

    fn relocate(&self, file: MediaFile, destination: PathBuf) -> RouteOutcome {
        if !self.dry_run {
            if let Err(e) = self.mover.move_file(&file.source, &destination) {
                warn!("Move failed for {}: {}", file.source.display(), e);
                return RouteOutcome {
                    file,
                    action: RouteAction::Error,
                    destination: Some(destination),
                    error: Some(e.to_string()),
                    dry_run: false,
                };
            }
        }
        RouteOutcome {
            file,
            action: RouteAction::Moved,
            destination: Some(destination),
            error: None,
            dry_run: self.dry_run,
        }
    }
}
