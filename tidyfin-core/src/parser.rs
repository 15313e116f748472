use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tidyfin_model::{MediaKind, ParsedMedia};

/// TV episode patterns, tried in order; first match wins.
///
/// Kept as an explicit (name, pattern) table so the priority order is
/// visible and testable on its own.
static TV_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        // S01E01, S01E01E02, S01 E01, s1e3
        (
            "sxxexx",
            Regex::new(r"(?i)[.\s_-]S(\d{1,2})[\s._-]?E(\d{1,3})(?:[\s._-]?E(\d{1,3}))?")
                .unwrap(),
        ),
        // 1x01
        (
            "season_x_episode",
            Regex::new(r"(?i)[.\s_-](\d{1,2})x(\d{1,3})").unwrap(),
        ),
        // Season 1 Episode 1
        (
            "season_episode_words",
            Regex::new(
                r"(?i)[.\s_-]Season[\s._-]?(\d{1,2})[\s._-]?Episode[\s._-]?(\d{1,3})",
            )
            .unwrap(),
        ),
        // S01.E01
        (
            "sxx_dot_exx",
            Regex::new(r"(?i)[.\s_-]S(\d{1,2})\.E(\d{1,3})").unwrap(),
        ),
    ]
});

/// A 4-digit year in [1900, 2099], bounded by separators (or the string
/// edges) on both sides so resolution and bitrate numbers never read as
/// years.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\.\s_\(\[-])((?:19|20)\d{2})(?:[\.\s_\)\]-]|$)").unwrap()
});

static BRACKETS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());

static PARENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

static YEAR_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}$").unwrap());

/// Release-scene noise stripped from titles as whole words.
static NOISE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(720p|1080p|2160p|4k|uhd)\b",
        r"(?i)\b(bluray|bdrip|brrip|dvdrip|webrip|web-dl|hdtv|hdrip)\b",
        r"(?i)\b(x264|x265|h264|h265|hevc|avc|xvid|divx)\b",
        r"(?i)\b(aac|ac3|dts|truehd|atmos|flac|mp3)\b",
        r"(?i)\b(remux|repack|proper|extended|unrated|directors\.cut)\b",
        r"(?i)\b(yts|yify|rarbg|ettv|eztv|sparks|geckos|ntg)\b",
        r"(?i)\b(multi|dual|complete)\b",
        // -ReleaseGroup at the end
        r"-\w+$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._-]+").unwrap());

/// Parses media filenames into structured candidates.
///
/// Pure and total: the worst case is an `Unknown` candidate with a
/// best-effort title, never a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameParser;

impl FilenameParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, filename: &str) -> ParsedMedia {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);

        self.parse_episode(stem)
            .unwrap_or_else(|| self.parse_movie(stem))
    }

    /// TV patterns take absolute priority over the year heuristic: a
    /// filename matching both is an episode.
    fn parse_episode(&self, stem: &str) -> Option<ParsedMedia> {
        for (name, pattern) in TV_PATTERNS.iter() {
            let Some(caps) = pattern.captures(stem) else {
                continue;
            };
            let whole = caps.get(0)?;
            let season: u32 = caps[1].parse().ok()?;
            let episode: u32 = caps[2].parse().ok()?;

            let before = &stem[..whole.start()];
            let after = &stem[whole.end()..];

            let episode_title = match clean_title(after) {
                t if t.chars().count() < 2 => None,
                t => Some(t),
            };

            tracing::debug!(
                pattern = name,
                season,
                episode,
                "matched TV pattern in {stem:?}"
            );

            return Some(ParsedMedia {
                title: clean_title(before),
                year: extract_year(before),
                season: Some(season),
                episode: Some(episode),
                episode_title,
                kind: MediaKind::Episode,
            });
        }
        None
    }

    fn parse_movie(&self, stem: &str) -> ParsedMedia {
        let mut year = None;
        let mut title_part = stem;

        if let Some(caps) = YEAR_RE.captures(stem) {
            if let Ok(y) = caps[1].parse::<u16>() {
                year = Some(y);
                if let Some(whole) = caps.get(0) {
                    title_part = &stem[..whole.start()];
                }
            }
        }

        ParsedMedia {
            title: clean_title(title_part),
            year,
            season: None,
            episode: None,
            episode_title: None,
            kind: if year.is_some() {
                MediaKind::Movie
            } else {
                MediaKind::Unknown
            },
        }
    }
}

pub fn extract_year(text: &str) -> Option<u16> {
    let caps = YEAR_RE.captures(text)?;
    let year: u16 = caps[1].parse().ok()?;
    (1900..=2099).contains(&year).then_some(year)
}

/// Clean a raw title or episode-title fragment.
pub fn clean_title(raw: &str) -> String {
    let mut title = BRACKETS_RE.replace_all(raw, " ").into_owned();

    // Drop parenthesised text unless it is itself a year. The regex crate
    // has no lookahead, so this is a captures-closure replacement.
    title = PARENS_RE
        .replace_all(&title, |caps: &Captures| {
            if YEAR_ONLY_RE.is_match(caps[1].trim()) {
                caps[0].to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned();

    for pattern in NOISE_RES.iter() {
        title = pattern.replace_all(&title, " ").into_owned();
    }

    title = SEPARATOR_RE.replace_all(&title, " ").into_owned();

    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == ' ' || c == '.');

    normalize_case(trimmed)
}

/// Title-case only shouting or whispering titles; mixed case is treated as
/// intentional formatting and preserved.
fn normalize_case(title: &str) -> String {
    let mut cased = title.chars().filter(|c| c.is_alphabetic()).peekable();
    if cased.peek().is_none() {
        return title.to_string();
    }
    let all_upper = title
        .chars()
        .filter(|c| c.is_alphabetic())
        .all(|c| c.is_uppercase());
    let all_lower = title
        .chars()
        .filter(|c| c.is_alphabetic())
        .all(|c| c.is_lowercase());
    if !all_upper && !all_lower {
        return title.to_string();
    }

    title
        .split(' ')
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_movie_with_year_and_noise() {
        let parser = FilenameParser::new();
        let parsed = parser.parse("The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv");
        assert_eq!(parsed.title, "The Matrix");
        assert_eq!(parsed.year, Some(1999));
        assert_eq!(parsed.kind, MediaKind::Movie);
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.episode, None);
    }

    #[test]
    fn parses_episode_with_title_fragment() {
        let parser = FilenameParser::new();
        let parsed = parser.parse("Show.Name.S02E05.Episode.Title.720p.mkv");
        assert_eq!(parsed.title, "Show Name");
        assert_eq!(parsed.season, Some(2));
        assert_eq!(parsed.episode, Some(5));
        assert_eq!(parsed.episode_title.as_deref(), Some("Episode Title"));
        assert_eq!(parsed.kind, MediaKind::Episode);
    }

    #[test]
    fn all_tv_pattern_variants_parse() {
        let parser = FilenameParser::new();
        let cases = [
            ("Show.Name.S01E02.mkv", 1, 2),
            ("Show.Name.1x02.mkv", 1, 2),
            ("Show.Name.Season 1 Episode 2.mkv", 1, 2),
            ("Show.Name.S01.E02.mkv", 1, 2),
            ("Show.Name.S01E01E02.mkv", 1, 1),
        ];
        for (filename, season, episode) in cases {
            let parsed = parser.parse(filename);
            assert_eq!(parsed.kind, MediaKind::Episode, "{filename}");
            assert_eq!(parsed.season, Some(season), "{filename}");
            assert_eq!(parsed.episode, Some(episode), "{filename}");
            assert_eq!(parsed.title, "Show Name", "{filename}");
        }
    }

    #[test]
    fn tv_pattern_beats_year() {
        let parser = FilenameParser::new();
        let parsed = parser.parse("Show.Name.2019.S01E01.mkv");
        assert_eq!(parsed.kind, MediaKind::Episode);
        assert_eq!(parsed.year, Some(2019));
        assert_eq!(parsed.title, "Show Name 2019");
    }

    #[test]
    fn year_requires_separator_bounds() {
        // 1080 inside "1080p" is not a year, and neither is a bare number
        // glued to other digits.
        assert_eq!(extract_year("Movie.1080p.x264."), None);
        assert_eq!(extract_year("Movie.2008."), Some(2008));
        assert_eq!(extract_year("Movie.2008"), Some(2008));
        assert_eq!(extract_year("Movie (2008) stuff"), Some(2008));
        assert_eq!(extract_year("Movie.12008."), None);
    }

    #[test]
    fn no_year_no_pattern_is_unknown() {
        let parser = FilenameParser::new();
        let parsed = parser.parse("x.mkv");
        assert_eq!(parsed.kind, MediaKind::Unknown);
        assert_eq!(parsed.title, "X");
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn short_episode_title_fragment_is_dropped() {
        let parser = FilenameParser::new();
        let parsed = parser.parse("Show.S01E01.a.mkv");
        assert_eq!(parsed.episode_title, None);
    }

    #[test]
    fn bracketed_and_parenthesised_noise_removed_year_kept() {
        assert_eq!(clean_title("[Group] Some.Show (uncut)"), "Some Show");
        assert_eq!(clean_title("Some.Movie.(2019)"), "Some Movie (2019)");
    }

    #[test]
    fn casing_preserved_when_intentional() {
        assert_eq!(clean_title("the.lowercase.movie"), "The Lowercase Movie");
        assert_eq!(clean_title("SHOUTING.MOVIE"), "Shouting Movie");
        assert_eq!(clean_title("iZombie"), "iZombie");
    }

    #[test]
    fn parse_is_total_on_garbage() {
        let parser = FilenameParser::new();
        let parsed = parser.parse("....mkv");
        assert_eq!(parsed.kind, MediaKind::Unknown);
    }
}
