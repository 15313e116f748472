use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tidyfin_model::{MediaKind, TmdbMatch};

use super::{MetadataProvider, ProviderError};
use crate::confidence::match_confidence;

const BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Candidates kept per search, best-scored first.
const MAX_RESULTS: usize = 5;

/// TMDB v3 REST client.
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for TmdbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbProvider").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    original_title: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: f32,
}

#[derive(Debug, Deserialize)]
struct TvResult {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    original_name: String,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: f32,
}

#[derive(Debug, Deserialize)]
struct EpisodeDetails {
    #[serde(default)]
    name: Option<String>,
}

impl TmdbProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{BASE_URL}{path}");
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ProviderError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
            status if !status.is_success() => Err(ProviderError::ApiError(format!(
                "{path} returned {status}"
            ))),
            _ => Ok(response.json::<T>().await?),
        }
    }

    /// Check whether the configured API key is accepted.
    pub async fn test_connection(&self) -> bool {
        self.get::<serde_json::Value>("/configuration", &[])
            .await
            .is_ok()
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_movies(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<TmdbMatch>, ProviderError> {
        let mut params = vec![("query", title.to_string())];
        if let Some(y) = year {
            params.push(("year", y.to_string()));
        }

        let data: SearchResponse<MovieResult> =
            self.get("/search/movie", &params).await?;

        let mut matches: Vec<TmdbMatch> = data
            .results
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| {
                let match_year = year_from_date(r.release_date.as_deref());
                TmdbMatch {
                    score: match_confidence(title, year, &r.title, match_year),
                    tmdb_id: r.id,
                    title: r.title,
                    original_title: r.original_title,
                    year: match_year,
                    overview: r.overview,
                    poster_path: r.poster_path,
                    vote_average: r.vote_average,
                    kind: MediaKind::Movie,
                    season: None,
                    episode: None,
                    episode_title: None,
                }
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    async fn search_tv(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<TmdbMatch>, ProviderError> {
        let mut params = vec![("query", title.to_string())];
        if let Some(y) = year {
            params.push(("first_air_date_year", y.to_string()));
        }

        let data: SearchResponse<TvResult> = self.get("/search/tv", &params).await?;

        let mut matches: Vec<TmdbMatch> = data
            .results
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| {
                let match_year = year_from_date(r.first_air_date.as_deref());
                TmdbMatch {
                    score: match_confidence(title, year, &r.name, match_year),
                    tmdb_id: r.id,
                    title: r.name,
                    original_title: r.original_name,
                    year: match_year,
                    overview: r.overview,
                    poster_path: r.poster_path,
                    vote_average: r.vote_average,
                    kind: MediaKind::Episode,
                    season: None,
                    episode: None,
                    episode_title: None,
                }
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    async fn episode_title(
        &self,
        tv_id: u64,
        season: u32,
        episode: u32,
    ) -> Result<Option<String>, ProviderError> {
        let details: EpisodeDetails = self
            .get(&format!("/tv/{tv_id}/season/{season}/episode/{episode}"), &[])
            .await?;
        Ok(details.name.filter(|n| !n.is_empty()))
    }
}

/// Year from a `YYYY-MM-DD` date string.
fn year_from_date(date: Option<&str>) -> Option<u16> {
    date?.get(..4)?.parse().ok()
}
