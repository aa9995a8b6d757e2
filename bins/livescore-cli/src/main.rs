//! Live Score CLI
//!
//! Commands:
//! - `sports`: List supported, active sports
//! - `events`: One-shot fetch of the reconciled event list for a sport
//! - `watch`: Follow a sport live; Enter retries after a failure
//! - `check`: Test connectivity and credential
//!
//! # Usage
//! ```bash
//! export ODDS_API_KEY=...
//!
//! livescore sports
//! livescore events --sport basketball_nba --status live --sort league
//! livescore events --sport soccer_epl --query arsenal --json
//! livescore watch --sport basketball_nba
//! livescore check
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use livescore_sync::{
    filter_events, sort_events, CanonicalEvent, EventStatus, OddsApiClient, SortKey,
    StatusFilter, SyncConfig, SyncController, SyncPhase, SyncSnapshot,
};

#[derive(Parser)]
#[command(name = "livescore")]
#[command(about = "Live odds and scores from The Odds API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported, active sports
    Sports,

    /// Fetch the event list for a sport once
    Events {
        /// Sport key (e.g. basketball_nba)
        #[arg(long)]
        sport: String,

        /// Status filter (all, live, finished, scheduled)
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Case-insensitive match on team or league
        #[arg(long, default_value = "")]
        query: String,

        /// Sort key (time, league, team)
        #[arg(long, default_value = "time")]
        sort: SortKey,

        /// Print events as JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Follow a sport, refreshing on the poll interval
    Watch {
        /// Sport key (e.g. basketball_nba)
        #[arg(long)]
        sport: String,

        /// Status filter (all, live, finished, scheduled)
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Case-insensitive match on team or league
        #[arg(long, default_value = "")]
        query: String,

        /// Sort key (time, league, team)
        #[arg(long, default_value = "time")]
        sort: SortKey,
    },

    /// Test connectivity and credential
    Check,
}

/// Presentation settings applied to every rendered snapshot
struct View {
    status: StatusFilter,
    query: String,
    sort: SortKey,
}

impl View {
    fn apply(&self, events: &[CanonicalEvent]) -> Vec<CanonicalEvent> {
        sort_events(&filter_events(events, self.status, &self.query), self.sort)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    let config = SyncConfig::from_env().context("Failed to load configuration")?;
    info!("Config: {:?}", config);

    match cli.command {
        Commands::Sports => run_sports(&config).await,
        Commands::Events { sport, status, query, sort, json } => {
            run_events(&config, &sport, View { status, query, sort }, json).await
        }
        Commands::Watch { sport, status, query, sort } => {
            run_watch(&config, &sport, View { status, query, sort }).await
        }
        Commands::Check => run_check(&config).await,
    }
}

async fn run_sports(config: &SyncConfig) -> Result<()> {
    let client = OddsApiClient::new(config)?;
    let sports = client.get_sports().await.map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if sports.is_empty() {
        warn!("No supported sports are active right now");
        return Ok(());
    }

    for sport in &sports {
        println!("{:<24} {:<8} {}", sport.key, sport.title, sport.description);
    }
    Ok(())
}

async fn run_events(config: &SyncConfig, sport: &str, view: View, json: bool) -> Result<()> {
    let controller = SyncController::from_config(config)?;
    let result = controller.select_sport(sport).await;
    controller.shutdown();

    if let Err(e) = result {
        let message = controller.snapshot().error.unwrap_or_else(|| e.user_message());
        error!("{}", message);
        anyhow::bail!("Failed to fetch events for {}", sport);
    }

    let events = view.apply(&controller.snapshot().events);
    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        print_events(&events);
    }
    Ok(())
}

async fn run_watch(config: &SyncConfig, sport: &str, view: View) -> Result<()> {
    info!("=== Watching {} ===", sport);
    info!("Poll interval: {:?}", config.poll_interval);
    info!("Press Enter to retry after a failure, Ctrl+C to stop");
    info!("");

    let controller = Arc::new(SyncController::from_config(config)?);
    let mut rx = controller.subscribe();

    // Catalogue failures are rendered from the snapshot like any other
    if let Err(e) = controller.load_sports().await {
        warn!("Sport catalogue unavailable: {}", e);
    }

    let initial = {
        let controller = controller.clone();
        let sport = sport.to_string();
        tokio::spawn(async move { controller.select_sport(&sport).await })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                render(&snapshot, &view);
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) if controller.phase() == SyncPhase::Suspended => {
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            if let Err(e) = controller.retry().await {
                                warn!("Retry failed: {}", e);
                            }
                        });
                    }
                    Ok(Some(_)) => {}
                    // stdin closed; keep following without retry input
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    initial.abort();
    controller.shutdown();
    Ok(())
}

async fn run_check(config: &SyncConfig) -> Result<()> {
    info!("=== Connectivity Check ===");
    info!("Base URL: {}", config.base_url);
    info!("");

    let client = OddsApiClient::new(config)?;
    match client.test_connectivity().await {
        Ok(count) => {
            info!("Connectivity: OK ({} supported sports active)", count);
            Ok(())
        }
        Err(e) => {
            error!("Connectivity failed: {}", e.user_message());
            if e.is_fatal() {
                error!("Set ODDS_API_KEY to a valid key and try again");
            }
            anyhow::bail!("Connectivity check failed")
        }
    }
}

fn render(snapshot: &SyncSnapshot, view: &View) {
    let updated = snapshot
        .last_updated
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!();
    println!(
        "[{:?}] {} | updated {}{}",
        snapshot.phase,
        snapshot.selected_sport.as_deref().unwrap_or("-"),
        updated,
        if snapshot.is_loading { " | loading..." } else { "" }
    );

    if let Some(error) = &snapshot.error {
        println!("! {}", error);
        if snapshot.phase == SyncPhase::Suspended {
            println!("  Polling paused. Press Enter to retry.");
        }
    }

    print_events(&view.apply(&snapshot.events));
}

fn print_events(events: &[CanonicalEvent]) {
    if events.is_empty() {
        println!("  (no events)");
        return;
    }

    for event in events {
        let score = match event.status {
            EventStatus::Scheduled => "vs".to_string(),
            _ => format!("{}-{}", event.score.home, event.score.away),
        };
        let odds = event
            .odds
            .as_ref()
            .map(|o| format!("{:.2} / {:.2}", o.home_win, o.away_win))
            .unwrap_or_default();
        println!(
            "  {:<9} {:<6} {:>24} {:^7} {:<24} {:<20} {}",
            event.status.as_str(),
            event.league,
            event.home_team.name,
            score,
            event.away_team.name,
            event.start_time,
            odds
        );
    }
}
