//! Confidence scoring for identified media.
//!
//! Two signals: an offline one derived purely from how well the filename
//! parsed, and a blended one computed once a TMDB match is in hand. The
//! blended score supersedes the initial one whenever a match exists.

use tidyfin_model::{ConfidenceTier, MediaKind, ParsedMedia};

// Calibration values, not derived from data. Tune here, nowhere else.
pub const SCORE_HIGH: f32 = 0.85;
pub const SCORE_MEDIUM: f32 = 0.6;
pub const SCORE_LOW: f32 = 0.3;

/// Files scoring below this go to manual review instead of being moved.
pub const AUTO_THRESHOLD: f32 = 0.5;

const TITLE_WEIGHT: f32 = 0.8;
const YEAR_EXACT_BONUS: f32 = 0.2;
const YEAR_ADJACENT_BONUS: f32 = 0.1;
const MISSING_YEAR_PENALTY: f32 = -0.1;

/// Score a parse with no external data.
///
/// Structurally well-formed filenames are rewarded even before any TMDB
/// round-trip: a cheap, offline signal.
pub fn initial_confidence(parsed: &ParsedMedia) -> (f32, ConfidenceTier) {
    let score = if parsed.is_episode() && !parsed.title.is_empty() {
        SCORE_HIGH
    } else if parsed.kind == MediaKind::Movie
        && parsed.year.is_some()
        && !parsed.title.is_empty()
    {
        SCORE_HIGH
    } else if parsed.title.chars().count() >= 2 {
        SCORE_MEDIUM
    } else {
        SCORE_LOW
    };
    (score, ConfidenceTier::from_score(score))
}

/// Blend title similarity with year agreement for a candidate match.
///
/// Similarity is a normalized ratio over lowercased titles, weighted by
/// 0.8; exact year agreement adds 0.2, off-by-one adds 0.1, and a query
/// with no year at all is penalized slightly for its ambiguity.
pub fn match_confidence(
    query_title: &str,
    query_year: Option<u16>,
    match_title: &str,
    match_year: Option<u16>,
) -> f32 {
    let similarity = strsim::normalized_levenshtein(
        &query_title.to_lowercase(),
        &match_title.to_lowercase(),
    ) as f32;

    let year_term = match (query_year, match_year) {
        (Some(q), Some(m)) if q == m => YEAR_EXACT_BONUS,
        (Some(q), Some(m)) if q.abs_diff(m) == 1 => YEAR_ADJACENT_BONUS,
        (None, _) => MISSING_YEAR_PENALTY,
        _ => 0.0,
    };

    (similarity * TITLE_WEIGHT + year_term).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(
        title: &str,
        year: Option<u16>,
        season: Option<u32>,
        episode: Option<u32>,
        kind: MediaKind,
    ) -> ParsedMedia {
        ParsedMedia {
            title: title.to_string(),
            year,
            season,
            episode,
            episode_title: None,
            kind,
        }
    }

    #[test]
    fn episode_with_title_is_high() {
        let p = parsed("Show Name", None, Some(1), Some(2), MediaKind::Episode);
        let (score, tier) = initial_confidence(&p);
        assert_eq!(score, SCORE_HIGH);
        assert_eq!(tier, ConfidenceTier::High);
    }

    #[test]
    fn movie_with_year_is_high() {
        let p = parsed("The Matrix", Some(1999), None, None, MediaKind::Movie);
        assert_eq!(initial_confidence(&p).0, SCORE_HIGH);
    }

    #[test]
    fn bare_title_is_medium() {
        let p = parsed("Some Movie", None, None, None, MediaKind::Unknown);
        let (score, tier) = initial_confidence(&p);
        assert_eq!(score, SCORE_MEDIUM);
        assert_eq!(tier, ConfidenceTier::Medium);
    }

    #[test]
    fn single_char_title_is_low() {
        let p = parsed("X", None, None, None, MediaKind::Unknown);
        let (score, tier) = initial_confidence(&p);
        assert_eq!(score, SCORE_LOW);
        assert_eq!(tier, ConfidenceTier::Low);
    }

    #[test]
    fn identical_title_and_year_scores_full() {
        let score = match_confidence("The Matrix", Some(1999), "The Matrix", Some(1999));
        assert!(score >= 0.9, "got {score}");
        assert!(score <= 1.0);
    }

    #[test]
    fn case_insensitive() {
        let a = match_confidence("the matrix", Some(1999), "THE MATRIX", Some(1999));
        let b = match_confidence("The Matrix", Some(1999), "The Matrix", Some(1999));
        assert!((a - b).abs() < f32::EPSILON);
    }

    #[test]
    fn year_off_by_one_scores_lower_than_exact() {
        let exact = match_confidence("Title", Some(2000), "Title", Some(2000));
        let adjacent = match_confidence("Title", Some(2000), "Title", Some(2001));
        let far = match_confidence("Title", Some(2000), "Title", Some(2010));
        assert!(exact > adjacent);
        assert!(adjacent > far);
    }

    #[test]
    fn missing_query_year_is_penalized() {
        let with_year = match_confidence("Title", Some(2000), "Title", Some(2000));
        let without = match_confidence("Title", None, "Title", Some(2000));
        assert!(without < with_year);
    }

    #[test]
    fn more_similar_titles_never_score_lower() {
        let close = match_confidence("The Matrix", None, "The Matrix", None);
        let mid = match_confidence("The Matrix", None, "The Matrix 2", None);
        let off = match_confidence("The Matrix", None, "Completely Different", None);
        assert!(close >= mid);
        assert!(mid >= off);
    }

    #[test]
    fn score_is_clamped() {
        let score = match_confidence("", None, "", None);
        assert!((0.0..=1.0).contains(&score));
    }
}
