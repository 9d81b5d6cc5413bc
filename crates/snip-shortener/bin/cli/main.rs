mod cli;

use crate::cli::{Command, CLI, DEFAULT_VALIDITY_MINUTES};
use anyhow::Context;
use clap::Parser;
use snip_core::{ClickEvent, Clock, LinkId, SystemClock};
use snip_generator::{Generator, RandomGenerator};
use snip_shortener::{
    MetadataProvider, Shortener, ShortenerSettings, SimulatedMetadata, SubmissionEntry,
};
use snip_storage::FileStore;
use snip_telemetry::{init_tracing, EventSink, HttpTransport, NoopSink, RemoteLogger};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    init_tracing(config.log_format.into(), "info")?;

    info!(
        data_dir = %config.data_dir.display(),
        base_url = %config.base_url,
        remote_logging = config.log_endpoint.is_some(),
        "starting snip"
    );

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;

    let remote = match &config.log_endpoint {
        Some(endpoint) => Some(Arc::new(RemoteLogger::new(HttpTransport::new(endpoint)?))),
        None => None,
    };
    let events: Arc<dyn EventSink> = match &remote {
        Some(logger) => Arc::clone(logger) as Arc<dyn EventSink>,
        None => Arc::new(NoopSink),
    };

    let settings = ShortenerSettings::builder()
        .base_url(config.base_url)
        .build();

    let shortener = Shortener::open(
        Arc::new(store),
        RandomGenerator::new(),
        SystemClock,
        SimulatedMetadata::new(),
        settings,
    )
    .with_event_sink(events);

    let outcome = run(&shortener, config.command).await;

    if let Some(err) = shortener.persistence_warning() {
        warn!(error = %err, "changes were not saved");
        eprintln!("warning: changes could not be saved: {err}");
    }

    if let Some(logger) = remote {
        logger.flush(LOG_FLUSH_TIMEOUT).await;
    }

    outcome
}

async fn run<G, C, M>(shortener: &Shortener<G, C, M>, command: Command) -> anyhow::Result<()>
where
    G: Generator,
    C: Clock + Clone,
    M: MetadataProvider,
{
    let base_url = shortener.settings().base_url.clone();

    match command {
        Command::Shorten {
            urls,
            validities,
            codes,
        } => {
            let entries = urls
                .into_iter()
                .enumerate()
                .map(|(i, url)| SubmissionEntry {
                    url,
                    validity_minutes: validities
                        .get(i)
                        .copied()
                        .unwrap_or(DEFAULT_VALIDITY_MINUTES),
                    custom_code: codes.get(i).cloned(),
                })
                .collect();

            let report = shortener.create_batch(entries).await?;
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(link) => println!(
                        "[{}] {} -> {} (expires {})",
                        outcome.slot,
                        link.original_url(),
                        link.short_url(&base_url),
                        link.expires_at()
                    ),
                    Err(err) => println!("[{}] error: {err}", outcome.slot),
                }
            }
            if let Some(summary) = report.summary() {
                println!("{summary}");
            }
        }
        Command::List => {
            for link in shortener.links() {
                println!(
                    "{}  {}  {}  clicks={}  {}",
                    link.id(),
                    link.short_url(&base_url),
                    link.original_url(),
                    link.click_count(),
                    if shortener.is_active(&link) { "active" } else { "expired" }
                );
            }
        }
        Command::Delete { id } => {
            if shortener.delete_link(&LinkId::from(id.as_str())) {
                println!("deleted {id}");
            } else {
                println!("no link with id {id}");
            }
        }
        Command::Click { id } => match shortener.simulate_click(&LinkId::from(id.as_str())) {
            Some(click) => print_click(&click),
            None => println!("no link with id {id}"),
        },
        Command::Follow { code } => {
            let redirect = shortener.follow(&code)?;
            println!("{}", redirect.target);
        }
        Command::Stats => {
            let summary = shortener.summary();
            println!("total links:  {}", summary.total_links);
            println!("active links: {}", summary.active_links);
            println!("total clicks: {}", summary.total_clicks);
            if let Some(link) = &summary.most_clicked {
                println!(
                    "most clicked: {} ({} clicks)",
                    link.short_url(&base_url),
                    link.click_count()
                );
            }
            println!("top locations:");
            for (location, count) in &summary.top_locations {
                println!("  {location}: {count}");
            }
            println!("recent clicks:");
            for click in &summary.recent_clicks {
                print_click(click);
            }
        }
    }

    Ok(())
}

fn print_click(click: &ClickEvent) {
    println!(
        "  {}  {}  {}  {}",
        click.timestamp, click.link_id, click.location, click.network_address
    );
}
