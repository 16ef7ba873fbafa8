//! jam: browse collections and move companies between them.
//!
//! Configuration comes from the environment (and `.env`), with command-line
//! flags taking precedence.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jam_client::{ClientConfig, HttpCollectionClient};
use jam_core::{CollectionId, CompanyId, Error, MoveOutcome, PageWindow};
use jam_workflow::{BatchStrategy, CollectionSession, LoadOutcome, WorkflowConfig};

type Session = CollectionSession<HttpCollectionClient>;

#[derive(Parser, Debug)]
#[command(name = "jam")]
#[command(author, version, about = "Browse and move companies between collections")]
#[command(propagate_version = true)]
struct Cli {
    /// Collection store base URL (overrides JAM_API_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Per-request timeout in seconds (overrides JAM_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Maximum ids per move call (overrides JAM_BATCH_SIZE)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Rows per page (overrides JAM_PAGE_SIZE)
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Move calls allowed in flight at once; 1 sends batches one by one
    /// (overrides JAM_MAX_IN_FLIGHT)
    #[arg(long, global = true)]
    max_in_flight: Option<usize>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List selectable collections and their roles
    Collections,

    /// Show one page of a collection
    Show {
        /// Collection role (my-list, liked, default) or id; defaults to the
        /// first selectable collection
        collection: Option<String>,

        /// Zero-based page number
        #[arg(short, long, default_value_t = 0)]
        page: usize,
    },

    /// Move companies out of a collection
    Move {
        /// Source collection role or id
        #[arg(short, long)]
        from: String,

        /// Destination collection role or id; defaults to Liked when moving
        /// out of My List and to My List otherwise
        #[arg(short, long)]
        to: Option<String>,

        /// Company ids, in the order they should be sent
        #[arg(required = true, num_args = 1..)]
        ids: Vec<CompanyId>,
    },

    /// Move every company out of a collection in one call
    MoveAll {
        /// Source collection role or id
        #[arg(short, long)]
        from: String,

        /// Destination collection role or id
        #[arg(short, long)]
        to: Option<String>,
    },
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let env = ClientConfig::from_env();
        let mut config = match &self.url {
            Some(url) => ClientConfig::new(url.clone()).with_timeout_secs(env.timeout_secs),
            None => env,
        };
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        config
    }

    fn workflow_config(&self) -> WorkflowConfig {
        let mut config = WorkflowConfig::from_env();
        if let Some(size) = self.batch_size {
            config = config.with_batch_size(size);
        }
        if let Some(size) = self.page_size {
            config = config.with_page_size(size);
        }
        if let Some(max) = self.max_in_flight {
            config = config.with_strategy(BatchStrategy::from_max_in_flight(max));
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   RUST_LOG    - standard env filter (default: "jam=info")
///
/// Console logs go to stderr so command output stays clean.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jam=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("jam.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        None
    };

    debug!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client_config = cli.client_config();
    let workflow_config = cli.workflow_config();
    info!(
        base_url = %client_config.base_url,
        batch_size = workflow_config.batch_size,
        max_in_flight = workflow_config.strategy.max_in_flight(),
        "Connecting to collection store"
    );

    let client = HttpCollectionClient::new(client_config).context("invalid client configuration")?;
    let session = CollectionSession::open(Arc::new(client), workflow_config)
        .await
        .context("failed to open session")?;

    match cli.command {
        Commands::Collections => cmd_collections(&session, cli.json),
        Commands::Show { collection, page } => {
            cmd_show(&session, collection.as_deref(), page, cli.json).await
        }
        Commands::Move { from, to, ids } => {
            let (source, destination) = resolve_route(&session, &from, to.as_deref())?;
            let result = session
                .coordinator()
                .move_selected(source, destination, ids)
                .await;
            report_move(result, cli.json)
        }
        Commands::MoveAll { from, to } => {
            let (source, destination) = resolve_route(&session, &from, to.as_deref())?;
            let result = session.coordinator().move_all(source, destination).await;
            report_move(result, cli.json)
        }
    }
}

/// Resolve source and destination; an omitted destination follows the
/// collection-role policy and may be undefined.
fn resolve_route(
    session: &Session,
    from: &str,
    to: Option<&str>,
) -> anyhow::Result<(CollectionId, Option<CollectionId>)> {
    let source = session.lookup(from)?.id;
    let destination = match to {
        Some(key) => Some(session.lookup(key)?.id),
        None => session.directory().destination_for(source),
    };
    Ok((source, destination))
}

fn cmd_collections(session: &Session, json: bool) -> anyhow::Result<()> {
    let collections = session.directory().selectable();
    if json {
        println!("{}", serde_json::to_string_pretty(collections)?);
        return Ok(());
    }
    for collection in collections {
        println!(
            "{}  {:<8}  {}",
            collection.id,
            collection.role.to_string(),
            collection.name
        );
    }
    Ok(())
}

async fn cmd_show(
    session: &Session,
    collection: Option<&str>,
    page: usize,
    json: bool,
) -> anyhow::Result<()> {
    let (id, name) = match collection {
        Some(key) => {
            let found = session.lookup(key)?;
            (found.id, found.name.clone())
        }
        None => {
            let current = session
                .current()
                .await
                .context("no collection on view")?;
            (current.id, current.name.clone())
        }
    };

    let window = PageWindow::for_page(id, page, session.config().page_size);
    let snapshot = match session.view().load(window).await? {
        LoadOutcome::Applied(snapshot) => snapshot,
        LoadOutcome::Superseded { .. } => session.view().snapshot().await,
    };

    if json {
        let body = json!({
            "collection_id": id,
            "collection_name": name,
            "offset": snapshot.window.offset,
            "page_size": snapshot.window.page_size,
            "total": snapshot.total,
            "companies": snapshot.companies,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let pages = snapshot.total.div_ceil(window.page_size as u64).max(1);
    println!(
        "{}: page {} of {} ({} companies)",
        name,
        page + 1,
        pages,
        snapshot.total
    );
    for company in &snapshot.companies {
        let liked = if company.liked { "*" } else { " " };
        println!("{:>10} {} {}", company.id, liked, company.company_name);
    }
    Ok(())
}

fn report_move(result: jam_core::Result<MoveOutcome>, json: bool) -> anyhow::Result<()> {
    match result {
        Ok(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "Moved {} companies ({} batches)",
                    outcome.moved_count,
                    outcome.batches.len().max(1)
                );
            }
            Ok(())
        }
        Err(Error::PartialMove(failure)) => {
            if json {
                let body = json!({
                    "moved_count": failure.moved_count,
                    "not_moved": failure.not_moved,
                    "batches": failure.batches,
                    "error": failure.cause.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let not_moved: Vec<String> =
                    failure.not_moved.iter().map(ToString::to_string).collect();
                println!(
                    "Moved {} companies before a failure; {} not moved: {}",
                    failure.moved_count,
                    failure.not_moved.len(),
                    not_moved.join(" ")
                );
            }
            Err(Error::PartialMove(failure).into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move_with_ids_in_order() {
        let cli = Cli::try_parse_from(["jam", "move", "--from", "my-list", "7", "3", "9"]).unwrap();
        match cli.command {
            Commands::Move { from, to, ids } => {
                assert_eq!(from, "my-list");
                assert!(to.is_none());
                assert_eq!(ids, vec![7, 3, 9]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_move_requires_ids() {
        assert!(Cli::try_parse_from(["jam", "move", "--from", "liked"]).is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "jam",
            "move-all",
            "--from",
            "liked",
            "--to",
            "my-list",
            "--batch-size",
            "50",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.batch_size, Some(50));
        assert!(matches!(cli.command, Commands::MoveAll { .. }));
    }

    #[test]
    fn test_parse_show_defaults() {
        let cli = Cli::try_parse_from(["jam", "show"]).unwrap();
        match cli.command {
            Commands::Show { collection, page } => {
                assert!(collection.is_none());
                assert_eq!(page, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_workflow_config() {
        let cli = Cli::try_parse_from([
            "jam",
            "collections",
            "--batch-size",
            "10",
            "--page-size",
            "5",
            "--max-in-flight",
            "4",
        ])
        .unwrap();
        let config = cli.workflow_config();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.strategy, BatchStrategy::Bounded { max_in_flight: 4 });
    }

    #[test]
    fn test_url_flag_overrides_client_config() {
        let cli = Cli::try_parse_from([
            "jam",
            "collections",
            "--url",
            "http://store:9000/",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let config = cli.client_config();
        assert_eq!(config.base_url, "http://store:9000");
        assert_eq!(config.timeout_secs, 5);
    }
}
