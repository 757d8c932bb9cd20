use anyhow::Result;
use archive_search::history::SearchHistory;
use archive_search::models::format_file_size;
use archive_search::{ArchiveConfig, FileArchiveSystem, SearchQuery};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "archive-search",
    about = "Index and search metadata of PDF, JPEG, MP3 and PowerPoint archives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata from every supported file under a directory
    Index {
        /// Directory to scan (defaults to ARCHIVE_ROOT or the documents folder)
        dir: Option<PathBuf>,
    },

    /// Search indexed records
    Search {
        /// Free-text search term
        term: Option<String>,

        /// contains, equals, not_equals, greater_than or less_than
        #[arg(long, default_value = "contains")]
        operator: String,

        /// pdf, jpg, mp3, ppt or all
        #[arg(long)]
        kind: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// equals, greater_than, less_than, greater_than_lat or less_than_lat
        #[arg(long, default_value = "equals")]
        geo_op: String,

        /// Minimum size in KB
        #[arg(long)]
        min_size: Option<f64>,

        /// Maximum size in KB
        #[arg(long)]
        max_size: Option<f64>,

        /// YYYY-MM-DD or RFC 3339
        #[arg(long)]
        min_date: Option<String>,

        /// YYYY-MM-DD or RFC 3339
        #[arg(long)]
        max_date: Option<String>,

        /// relevance, title, size or date
        #[arg(long, default_value = "relevance")]
        sort: String,

        /// asc or desc
        #[arg(long)]
        order: Option<String>,

        /// Maximum number of results to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Manage favorite files
    Favorites {
        #[command(subcommand)]
        action: FavoriteAction,

        /// User the favorites belong to
        #[arg(long, global = true)]
        user: Option<String>,
    },

    /// Show recent searches
    History {
        /// Forget every saved search
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum FavoriteAction {
    Add { filename: String },
    Remove { filename: String },
    List,
}

fn history_path(config: &ArchiveConfig) -> PathBuf {
    PathBuf::from(format!("{}.history.json", config.db_path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();

    let cli = Cli::parse();
    let config = ArchiveConfig::from_env()?;

    if let Commands::History { clear } = cli.command {
        let path = history_path(&config);
        let mut history = SearchHistory::load(&path, config.history_capacity)?;
        if clear {
            history.clear();
            history.save(&path)?;
            println!("Search history cleared.");
            return Ok(());
        }
        if history.is_empty() {
            println!("No searches yet.");
        }
        for entry in history.entries() {
            println!(
                "{}  {} ({} results)",
                entry.at.format("%Y-%m-%d %H:%M:%S"),
                entry.term,
                entry.result_count
            );
        }
        return Ok(());
    }

    let system = FileArchiveSystem::open(config.clone()).await?;

    match cli.command {
        Commands::Index { dir } => {
            let dir = dir.unwrap_or_else(|| config.archive_root.clone());
            println!("Indexing files from {}...", dir.display());
            let report = system.index_directory(&dir).await?;
            println!(
                "Indexing complete! {} indexed, {} degraded, {} skipped.",
                report.indexed, report.degraded, report.skipped
            );
        }
        Commands::Search {
            term,
            operator,
            kind,
            lat,
            lon,
            geo_op,
            min_size,
            max_size,
            min_date,
            max_date,
            sort,
            order,
            limit,
        } => {
            let mut params: HashMap<String, String> = HashMap::new();
            let mut set = |key: &str, value: Option<String>| {
                if let Some(value) = value {
                    params.insert(key.to_string(), value);
                }
            };
            set("q", term);
            set("operator", Some(operator));
            set("fileType", kind);
            if lat.is_some() || lon.is_some() {
                set("gps", Some("true".to_string()));
                set("latitude", lat.map(|v| v.to_string()));
                set("longitude", lon.map(|v| v.to_string()));
                set("gpsOperator", Some(geo_op));
            }
            set("minSize", min_size.map(|v| v.to_string()));
            set("maxSize", max_size.map(|v| v.to_string()));
            set("minDate", min_date);
            set("maxDate", max_date);
            set("sortBy", Some(sort));
            set("sortOrder", order);
            let query = SearchQuery::from_params(&params);

            let path = history_path(&config);
            let mut history = SearchHistory::load(&path, config.history_capacity)?;
            let mut results = system.search(&query, Some(&mut history)).await?;
            history.save(&path)?;
            results.truncate(limit);

            if results.is_empty() {
                println!("No results found!");
            } else {
                println!("\nSearch Results:");
                println!("---------------");
                for (i, result) in results.iter().enumerate() {
                    let record = &result.record;
                    println!("{}. File: {}", i + 1, record.filename);
                    println!("   Path: {}", record.path);
                    println!(
                        "   Title: {}",
                        record.title.as_deref().unwrap_or("(untitled)")
                    );
                    println!(
                        "   Kind: {}  Size: {}",
                        record.file_kind(),
                        format_file_size(record.file_size_bytes)
                    );
                    if let Some(point) = record.coordinate() {
                        println!("   GPS: {:.4}, {:.4}", point.latitude, point.longitude);
                    }
                    if !record.keywords.is_empty() {
                        println!("   Keywords: {}", record.keyword_string());
                    }
                    println!("   Score: {}", result.score);
                    println!();
                }
            }
        }
        Commands::Favorites { action, user } => {
            let user = user.as_deref();
            match action {
                FavoriteAction::Add { filename } => {
                    if system.add_favorite(&filename, user).await? {
                        println!("Added {} to favorites", filename);
                    } else {
                        println!("{} is already a favorite", filename);
                    }
                }
                FavoriteAction::Remove { filename } => {
                    if system.remove_favorite(&filename, user).await? {
                        println!("Removed {} from favorites", filename);
                    } else {
                        println!("{} was not a favorite", filename);
                    }
                }
                FavoriteAction::List => {
                    for favorite in system.favorites(user).await? {
                        println!(
                            "{}  (added {})",
                            favorite.filename,
                            favorite.created_at.format("%Y-%m-%d")
                        );
                    }
                }
            }
        }
        Commands::History { .. } => {}
    }

    Ok(())
}
