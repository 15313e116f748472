//! Jellyfin-compatible destination path synthesis.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tidyfin_model::{MediaFile, MediaKind};

/// Characters illegal in path components on common filesystems.
static ILLEGAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Longest sanitized path component; leaves headroom under the usual
/// 255-byte component limit.
const MAX_COMPONENT_LEN: usize = 200;

/// Destination roots for a Jellyfin library.
///
/// `resolve` is pure and fails closed: a file whose kind is unknown, or an
/// episode missing its numbering, yields `None` so the caller can route it
/// to manual review instead of guessing.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    pub movies_root: PathBuf,
    pub shows_root: PathBuf,
}

impl LibraryLayout {
    pub fn new(movies_root: impl Into<PathBuf>, shows_root: impl Into<PathBuf>) -> Self {
        Self {
            movies_root: movies_root.into(),
            shows_root: shows_root.into(),
        }
    }

    pub fn resolve(&self, file: &MediaFile) -> Option<PathBuf> {
        match file.kind() {
            MediaKind::Movie => Some(self.movie_path(file)),
            MediaKind::Episode => self.episode_path(file),
            MediaKind::Unknown => None,
        }
    }

    /// `{movies}/{Title (Year)}/{Title (Year)}{ext}`
    fn movie_path(&self, file: &MediaFile) -> PathBuf {
        let (title, year) = match &file.tmdb {
            Some(m) => (m.title.as_str(), m.year),
            None => (file.parsed.title.as_str(), file.parsed.year),
        };

        let title = sanitize(title);
        let folder = match year {
            Some(year) => format!("{title} ({year})"),
            None => title,
        };
        let filename = format!("{folder}{}", file.extension());

        self.movies_root.join(folder).join(filename)
    }

    /// `{shows}/{Title}/Season {s:02}/{Title} - S{s:02}E{e:02}[ - {Episode Title}]{ext}`
    fn episode_path(&self, file: &MediaFile) -> Option<PathBuf> {
        let (title, season, episode, episode_title) = match &file.tmdb {
            Some(m) => (
                m.title.as_str(),
                m.season.or(file.parsed.season),
                m.episode.or(file.parsed.episode),
                m.episode_title.as_deref().or(file.parsed.episode_title.as_deref()),
            ),
            None => (
                file.parsed.title.as_str(),
                file.parsed.season,
                file.parsed.episode,
                file.parsed.episode_title.as_deref(),
            ),
        };

        let (season, episode) = (season?, episode?);
        let title = sanitize(title);
        let season_folder = format!("Season {season:02}");

        let mut filename = format!("{title} - S{season:02}E{episode:02}");
        if let Some(ep_title) = episode_title {
            let ep_title = sanitize(ep_title);
            if !ep_title.is_empty() {
                filename.push_str(&format!(" - {ep_title}"));
            }
        }
        filename.push_str(&file.extension());

        Some(self.shows_root.join(title).join(season_folder).join(filename))
    }
}

/// Make a free-text name safe as a single path component.
pub fn sanitize(name: &str) -> String {
    let cleaned = ILLEGAL_RE.replace_all(name, "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == ' ' || c == '.');

    if trimmed.chars().count() <= MAX_COMPONENT_LEN {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(MAX_COMPONENT_LEN).collect();
    truncated.trim_end_matches(|c: char| c == ' ' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidyfin_model::{ConfidenceTier, ParsedMedia, TmdbMatch};

    fn movie_file(title: &str, year: Option<u16>) -> MediaFile {
        MediaFile::new(
            format!("/downloads/{title}.mkv").into(),
            ParsedMedia {
                title: title.to_string(),
                year,
                season: None,
                episode: None,
                episode_title: None,
                kind: MediaKind::Movie,
            },
            0.85,
        )
    }

    fn episode_file(
        title: &str,
        season: Option<u32>,
        episode: Option<u32>,
        episode_title: Option<&str>,
    ) -> MediaFile {
        MediaFile::new(
            format!("/downloads/{title}.mkv").into(),
            ParsedMedia {
                title: title.to_string(),
                year: None,
                season,
                episode,
                episode_title: episode_title.map(str::to_string),
                kind: if season.is_some() && episode.is_some() {
                    MediaKind::Episode
                } else {
                    MediaKind::Unknown
                },
            },
            0.85,
        )
    }

    fn layout() -> LibraryLayout {
        LibraryLayout::new("/library/Movies", "/library/Shows")
    }

    #[test]
    fn movie_layout_with_year() {
        let dest = layout().resolve(&movie_file("The Matrix", Some(1999))).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/library/Movies/The Matrix (1999)/The Matrix (1999).mkv")
        );
    }

    #[test]
    fn movie_layout_without_year() {
        let dest = layout().resolve(&movie_file("Some Film", None)).unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/library/Movies/Some Film/Some Film.mkv")
        );
    }

    #[test]
    fn episode_layout_with_episode_title() {
        let dest = layout()
            .resolve(&episode_file("Show Name", Some(2), Some(5), Some("Episode Title")))
            .unwrap();
        assert_eq!(
            dest,
            PathBuf::from(
                "/library/Shows/Show Name/Season 02/Show Name - S02E05 - Episode Title.mkv"
            )
        );
    }

    #[test]
    fn episode_layout_without_episode_title() {
        let dest = layout()
            .resolve(&episode_file("Show Name", Some(1), Some(1), None))
            .unwrap();
        assert_eq!(
            dest,
            PathBuf::from("/library/Shows/Show Name/Season 01/Show Name - S01E01.mkv")
        );
    }

    #[test]
    fn three_digit_episode_is_not_truncated() {
        let dest = layout()
            .resolve(&episode_file("Long Show", Some(1), Some(123), None))
            .unwrap();
        assert!(dest.to_string_lossy().contains("S01E123"));
    }

    #[test]
    fn unknown_kind_fails_closed() {
        let mut file = movie_file("Mystery", None);
        file.parsed.kind = MediaKind::Unknown;
        assert_eq!(layout().resolve(&file), None);
    }

    #[test]
    fn tmdb_match_preferred_over_parse() {
        let file = movie_file("teh matrix", Some(1999)).with_match(TmdbMatch {
            tmdb_id: 603,
            title: "The Matrix".to_string(),
            original_title: "The Matrix".to_string(),
            year: Some(1999),
            overview: String::new(),
            poster_path: None,
            vote_average: 8.2,
            kind: MediaKind::Movie,
            season: None,
            episode: None,
            episode_title: None,
            score: 0.95,
        });
        assert_eq!(file.tier, ConfidenceTier::High);
        let dest = layout().resolve(&file).unwrap();
        assert!(dest.to_string_lossy().contains("The Matrix (1999)"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let file = episode_file("Show", Some(3), Some(7), Some("Title"));
        let l = layout();
        assert_eq!(l.resolve(&file), l.resolve(&file));
    }

    #[test]
    fn sanitize_strips_illegal_chars_and_bounds_length() {
        assert_eq!(sanitize(r#"What? Is: This*"#), "What Is This");
        assert_eq!(sanitize("a/b\\c|d<e>f\"g"), "abcdefg");
        assert_eq!(sanitize("  spaced   out .."), "spaced out");

        let long = "a".repeat(500);
        assert_eq!(sanitize(&long).chars().count(), 200);
    }

    #[test]
    fn missing_season_fails_closed() {
        let file = episode_file("Show", None, Some(1), None);
        // kind Unknown because season missing; resolve declines.
        assert_eq!(layout().resolve(&file), None);
    }
}
