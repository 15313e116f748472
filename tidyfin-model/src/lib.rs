//! Data model for TidyFin.
//!
//! Plain serde types shared by the core library, the CLI and the server.
//! No I/O lives here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of media a file represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode,
    Unknown,
}

/// Confidence tier derived from a score.
///
/// High auto-processes, Medium auto-processes with a warning, Low goes to
/// manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Map a score in [0, 1] to its tier. This is the only place the tier
    /// boundaries live.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            ConfidenceTier::High
        } else if score >= 0.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Information extracted from a filename by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMedia {
    pub title: String,
    pub year: Option<u16>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_title: Option<String>,
    pub kind: MediaKind,
}

impl ParsedMedia {
    pub fn is_episode(&self) -> bool {
        self.season.is_some() && self.episode.is_some()
    }
}

/// A candidate match returned by the TMDB provider, with its blended
/// confidence score attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbMatch {
    pub tmdb_id: u64,
    pub title: String,
    pub original_title: String,
    pub year: Option<u16>,
    pub overview: String,
    pub poster_path: Option<String>,
    pub vote_average: f32,
    pub kind: MediaKind,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_title: Option<String>,
    /// Blended confidence in [0, 1].
    pub score: f32,
}

/// A media file moving through the identification pipeline.
///
/// Confidence changes exactly twice: once at construction (parser-only
/// signal) and once when a TMDB match is attached. Both are value
/// constructions, never in-place mutation, so a batch is trivially
/// replayable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub source: PathBuf,
    pub parsed: ParsedMedia,
    pub tmdb: Option<TmdbMatch>,
    pub score: f32,
    pub tier: ConfidenceTier,
}

impl MediaFile {
    pub fn new(source: PathBuf, parsed: ParsedMedia, score: f32) -> Self {
        Self {
            source,
            parsed,
            tmdb: None,
            tier: ConfidenceTier::from_score(score),
            score,
        }
    }

    /// Attach a TMDB match; its blended score supersedes the initial one.
    pub fn with_match(self, tmdb: TmdbMatch) -> Self {
        let score = tmdb.score.clamp(0.0, 1.0);
        Self {
            tmdb: Some(tmdb),
            tier: ConfidenceTier::from_score(score),
            score,
            ..self
        }
    }

    pub fn filename(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File extension with leading dot, lowercased. Empty when absent.
    pub fn extension(&self) -> String {
        self.source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    /// Effective media kind, preferring the TMDB match over the parse.
    pub fn kind(&self) -> MediaKind {
        match &self.tmdb {
            Some(m) => m.kind,
            None => self.parsed.kind,
        }
    }
}

/// Terminal action taken for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    Moved,
    ManualReview,
    Skipped,
    Error,
}

/// Outcome of routing a single file. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOutcome {
    pub file: MediaFile,
    pub action: RouteAction,
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
    pub dry_run: bool,
}

impl RouteOutcome {
    pub fn source(&self) -> &Path {
        &self.file.source
    }
}

/// Running tally over a batch of routing outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteSummary {
    pub total: usize,
    pub movies_moved: usize,
    pub shows_moved: usize,
    pub manual_review: usize,
    pub skipped: usize,
    pub errors: usize,
    pub outcomes: Vec<RouteOutcome>,
}

impl RouteSummary {
    pub fn record(&mut self, outcome: RouteOutcome) {
        self.total += 1;
        match outcome.action {
            RouteAction::Moved => match outcome.file.kind() {
                MediaKind::Episode => self.shows_moved += 1,
                _ => self.movies_moved += 1,
            },
            RouteAction::ManualReview => self.manual_review += 1,
            RouteAction::Skipped => self.skipped += 1,
            RouteAction::Error => self.errors += 1,
        }
        self.outcomes.push(outcome);
    }
}
