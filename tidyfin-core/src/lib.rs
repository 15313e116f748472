//! # TidyFin Core
//!
//! The identification-and-routing pipeline behind TidyFin:
//!
//! - [`parser`] turns raw filenames into structured [`ParsedMedia`]
//!   candidates,
//! - [`confidence`] scores candidates, offline and against TMDB matches,
//! - [`layout`] computes Jellyfin-compatible destination paths,
//! - [`organizer`] ties it together and routes each file to
//!   moved / manual review / skipped / error,
//! - [`scanner`] discovers video files on disk,
//! - [`providers`] holds the TMDB metadata lookup behind a trait seam.

pub mod confidence;
pub mod error;
pub mod layout;
pub mod organizer;
pub mod parser;
pub mod providers;
pub mod scanner;

pub use confidence::{AUTO_THRESHOLD, initial_confidence, match_confidence};
pub use error::{OrganizeError, Result};
pub use layout::LibraryLayout;
pub use organizer::{FileMover, FileOrganizer, FsMover};
pub use parser::FilenameParser;
pub use providers::{MetadataProvider, ProviderError, TmdbProvider};
pub use scanner::MediaScanner;

pub use tidyfin_model::{
    ConfidenceTier, MediaFile, MediaKind, ParsedMedia, RouteAction,
    RouteOutcome, RouteSummary, TmdbMatch,
};
