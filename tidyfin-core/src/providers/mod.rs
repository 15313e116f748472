//! Metadata lookup behind a trait seam.
//!
//! The routing policy only sees [`MetadataProvider`]; the TMDB transport
//! lives in [`tmdb`] and tests substitute canned implementations.

mod tmdb;

pub use tmdb::TmdbProvider;

use async_trait::async_trait;
use tidyfin_model::{ParsedMedia, TmdbMatch};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Looks up candidate matches for a parsed filename.
///
/// Every method may fail with a transport error; callers treat failure as
/// "no match", never as fatal.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Ranked movie candidates, best first.
    async fn search_movies(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<TmdbMatch>, ProviderError>;

    /// Ranked TV show candidates, best first.
    async fn search_tv(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<TmdbMatch>, ProviderError>;

    /// Canonical episode title, when the provider knows it.
    async fn episode_title(
        &self,
        tv_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<Option<String>, ProviderError>;

    /// Best match for a parsed candidate.
    ///
    /// Episodes carry the parsed season/episode numbering through and pick
    /// up the canonical episode title; a failed episode-title fetch
    /// degrades to the parsed fragment rather than failing the match.
    async fn identify(&self, parsed: &ParsedMedia) -> Result<Option<TmdbMatch>, ProviderError> {
        if parsed.is_episode() {
            let Some(mut best) = self
                .search_tv(&parsed.title, parsed.year)
                .await?
                .into_iter()
                .next()
            else {
                return Ok(None);
            };
            best.season = parsed.season;
            best.episode = parsed.episode;
            if let (Some(season), Some(episode)) = (parsed.season, parsed.episode) {
                match self.episode_title(best.tmdb_id, season, episode).await {
                    Ok(title) => best.episode_title = title,
                    Err(e) => {
                        warn!("Episode title lookup failed for {}: {}", best.title, e)
                    }
                }
            }
            Ok(Some(best))
        } else {
            Ok(self
                .search_movies(&parsed.title, parsed.year)
                .await?
                .into_iter()
                .next())
        }
    }
}
