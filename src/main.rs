mod cli;

use tmdb_backdrop::{
    config,
    host::{HostClient, StashClient},
    orchestrator::{CycleOutcome, Orchestrator},
    resolver::MediaResolver,
    route::{RouteWatcher, SharedLocation},
    settings::TokenProvider,
    style::{CssFileDocument, Document, MemoryDocument},
    tmdb::{BackdropSource, TmdbClient},
};
use tmdb_backdrop_common::{AccessToken, MediaKind, MediaReference};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tmdb_backdrop=trace,tmdb_backdrop_common=debug".to_string()
        } else {
            "tmdb_backdrop=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Resolve { group_id } => runtime()?.block_on(resolve(&group_id, config_path)),
        Commands::Backdrop { kind, id } => runtime()?.block_on(backdrop(kind, &id, config_path)),
        Commands::Render { path, output } => {
            runtime()?.block_on(render(&path, output, config_path))
        }
        Commands::Watch { output, start } => runtime()?.block_on(watch(output, start, config_path)),
        Commands::Validate { config } => {
            let path = config.or_else(|| cli.config.clone());
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tmdb-backdrop {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// The pipeline is cooperatively scheduled on a single thread.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

async fn resolve(group_id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = MediaResolver::new(Arc::new(StashClient::new(&config.stash)));

    match resolver.resolve(group_id).await {
        Some(reference) => println!("{}", reference),
        None => println!("Group {} has no TMDB reference", group_id),
    }
    Ok(())
}

async fn backdrop(kind: MediaKind, id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let host: Arc<dyn HostClient> = Arc::new(StashClient::new(&config.stash));
    let tokens = TokenProvider::new(host, config.stash.plugin_id.clone())
        .with_token(config.tmdb.api_key.clone().and_then(AccessToken::new));

    let token = tokens
        .access_token()
        .await
        .context("No TMDB API key in config or Stash plugin settings")?;

    let reference = MediaReference::new(kind, id);
    let client = TmdbClient::new(&config.tmdb);
    match client.fetch_backdrop(&reference, &token).await {
        Some(candidate) => println!("{}", candidate.image_url(&config.tmdb.image_base_url)),
        None => println!("No backdrop for {}", reference),
    }
    Ok(())
}

async fn render(path: &str, output: Option<PathBuf>, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let location = Arc::new(SharedLocation::new(path));

    let memory = Arc::new(MemoryDocument::new());
    memory.insert_element(config.page.container_id.clone());
    let document: Arc<dyn Document> = match &output {
        Some(file) => Arc::new(CssFileDocument::new(file)),
        None => memory.clone(),
    };

    let orchestrator = Orchestrator::from_config(&config, location, document);
    let outcome = orchestrator.handle_route_change().await;
    report(&outcome);

    if output.is_none() {
        if let Some(css) = memory.style(&config.page.style_id) {
            println!("{}", css);
        }
    }
    Ok(())
}

async fn watch(output: PathBuf, start: String, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let location = Arc::new(SharedLocation::new(start));
    let document = Arc::new(CssFileDocument::new(&output));
    let orchestrator = Arc::new(Orchestrator::from_config(
        &config,
        location.clone(),
        document,
    ));

    tracing::info!("Writing backdrop stylesheet to {:?}", output);

    // Each stdin line is one navigation followed by one mutation batch.
    let (mutations_tx, mutations_rx) = mpsc::channel::<()>(16);
    let reader_location = location.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    reader_location.set(line);
                    if mutations_tx.send(()).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read navigation from stdin: {}", e);
                    break;
                }
            }
        }
    });

    let changes = RouteWatcher::new(location).changes(ReceiverStream::new(mutations_rx));
    orchestrator.run(changes).await;
    Ok(())
}

fn report(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NotGroupPage => println!("Not a group page; nothing to do"),
        CycleOutcome::Abandoned => println!("Page container not found"),
        CycleOutcome::Cleared => println!("No TMDB reference; backdrop cleared"),
        CycleOutcome::Unchanged => println!("Backdrop unavailable; left unchanged"),
        CycleOutcome::Applied {
            reference,
            image_url,
        } => println!("Applied {} backdrop: {}", reference, image_url),
        CycleOutcome::Stale => println!("Superseded by a newer navigation"),
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;
    config::validate_config(&config)?;
    match path {
        Some(p) => println!("Configuration is valid: {:?}", p),
        None => println!("Configuration is valid"),
    }
    Ok(())
}
