use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tidyfin_config::Settings;
use tidyfin_core::{
    FileOrganizer, LibraryLayout, MediaScanner, MetadataProvider, RouteAction,
    RouteOutcome, RouteSummary, TmdbProvider,
};
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Scan, identify, and sort media files into a Jellyfin library.
#[derive(Debug, Parser)]
#[command(name = "tidyfinctl", version, about)]
struct Args {
    /// Directory to scan for media files
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Destination directory for movies
    #[arg(short, long)]
    movies: Option<PathBuf>,

    /// Destination directory for TV shows
    #[arg(short = 't', long)]
    shows: Option<PathBuf>,

    /// Directory for files needing manual review
    #[arg(short, long)]
    review: Option<PathBuf>,

    /// Show what would happen without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Skip TMDB lookups and rely on filename parsing only
    #[arg(long)]
    no_tmdb: bool,

    /// TMDB API key (saved to the config file for next time)
    #[arg(long)]
    api_key: Option<String>,

    /// Path to the config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Only scan the top level of the source directory
    #[arg(long)]
    no_recursive: bool,

    /// Suppress per-file progress output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidyfinctl=info,tidyfin_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    // Flags win over the config file; a new API key is persisted.
    if let Some(key) = &args.api_key {
        settings.tmdb_api_key = Some(key.clone());
        if let Err(e) = settings.save(&args.config) {
            warn!("Could not save API key to config: {e}");
        }
    }

    let source = args
        .source
        .clone()
        .or_else(|| settings.source_dir.clone())
        .context("no source directory; pass --source or set it in the config file")?;
    if !source.is_dir() {
        bail!("source directory does not exist: {}", source.display());
    }
    let movies = args
        .movies
        .clone()
        .or_else(|| settings.movies_dir.clone())
        .unwrap_or_else(|| PathBuf::from("Movies"));
    let shows = args
        .shows
        .clone()
        .or_else(|| settings.shows_dir.clone())
        .unwrap_or_else(|| PathBuf::from("Shows"));
    let review = args.review.clone().or_else(|| settings.review_dir.clone());

    let provider = build_provider(&args, &settings)?;

    let mut scanner = MediaScanner::new();
    if args.no_recursive {
        scanner = scanner.with_max_depth(1);
    }
    let files = scanner.scan_directory(&source)?;
    if files.is_empty() {
        println!("No media files found in {}", source.display());
        return Ok(());
    }
    println!("Found {} media file(s) in {}\n", files.len(), source.display());

    let mut organizer = FileOrganizer::new(LibraryLayout::new(movies, shows))
        .dry_run(args.dry_run);
    if let Some(dir) = review {
        organizer = organizer.with_review_dir(dir);
    }
    if let Some(provider) = provider {
        organizer = organizer.with_provider(provider);
    }

    let summary = if args.quiet {
        organizer.organize(files).await
    } else {
        organizer
            .organize_with_progress(files, |current, total, file| {
                println!("[{current}/{total}] {}", file.filename());
            })
            .await
    };

    print_summary(&summary, args.dry_run);
    Ok(())
}

fn build_provider(
    args: &Args,
    settings: &Settings,
) -> anyhow::Result<Option<Arc<dyn MetadataProvider>>> {
    if args.no_tmdb {
        return Ok(None);
    }
    match settings.effective_api_key() {
        Some(key) => {
            let provider = TmdbProvider::new(key).context("building TMDB client")?;
            Ok(Some(Arc::new(provider)))
        }
        None => {
            println!(
                "No TMDB API key configured; matching on filenames only.\n\
                 Pass --api-key or set TMDB_API_KEY to enable lookups.\n"
            );
            Ok(None)
        }
    }
}

fn print_summary(summary: &RouteSummary, dry_run: bool) {
    if dry_run {
        println!("\nDry run; nothing was moved.\n");
        for outcome in &summary.outcomes {
            print_outcome(outcome);
        }
    }

    println!("\n=== Summary ===");
    println!("Total files:    {}", summary.total);
    println!("Movies moved:   {}", summary.movies_moved);
    println!("Episodes moved: {}", summary.shows_moved);
    println!("Manual review:  {}", summary.manual_review);
    println!("Skipped:        {}", summary.skipped);
    println!("Errors:         {}", summary.errors);

    if summary.errors > 0 {
        println!("\nErrors:");
        for outcome in &summary.outcomes {
            if outcome.action == RouteAction::Error {
                println!(
                    "  {}: {}",
                    outcome.file.filename(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

fn print_outcome(outcome: &RouteOutcome) {
    let file = &outcome.file;
    println!("  {}", file.source.display());
    if let Some(found) = &file.tmdb {
        let year = found
            .year
            .map(|y| format!(" ({y})"))
            .unwrap_or_default();
        println!("    matched: {}{year} [tmdb:{}]", found.title, found.tmdb_id);
    }
    match outcome.action {
        RouteAction::Moved => {
            if let Some(dest) = &outcome.destination {
                println!("    -> {}", dest.display());
            }
        }
        RouteAction::ManualReview => {
            if let Some(dest) = &outcome.destination {
                println!("    -> review: {}", dest.display());
            }
        }
        RouteAction::Skipped => {
            println!(
                "    skipped: {}",
                outcome.error.as_deref().unwrap_or("no destination")
            );
        }
        RouteAction::Error => {
            println!(
                "    error: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    println!(
        "    confidence: {} ({:.2})",
        file.tier.as_str(),
        file.score
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["tidyfinctl", "--source", "/downloads"]);
        assert_eq!(args.source, Some(PathBuf::from("/downloads")));
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(!args.dry_run);
        assert!(!args.no_tmdb);
    }

    #[test]
    fn short_flags_work() {
        let args = Args::parse_from([
            "tidyfinctl", "-s", "/in", "-m", "/movies", "-t", "/shows", "-r",
            "/review", "-q",
        ]);
        assert_eq!(args.movies, Some(PathBuf::from("/movies")));
        assert_eq!(args.shows, Some(PathBuf::from("/shows")));
        assert_eq!(args.review, Some(PathBuf::from("/review")));
        assert!(args.quiet);
    }
}
