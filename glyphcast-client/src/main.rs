//! Headless runner: polls the feed and prints ranked prompts as they change.
//!
//! This is the thin collaborator around the sync core; all state lives in
//! the library components.

use glyphcast_client::api_client::ApiClient;
use glyphcast_client::config::ClientConfig;
use glyphcast_client::error::ClientError;
use glyphcast_client::events::ClientEvent;
use glyphcast_client::feed::{self, PollerIntervals};
use glyphcast_client::fingerprint::FingerprintStore;
use glyphcast_core::SortMode;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::load()?;
    let api = ApiClient::new(&config)?;

    let identity = FingerprintStore::new(config.fingerprint_path.clone());
    let fingerprint = identity.get()?;
    tracing::info!(%fingerprint, "anonymous identity ready");

    let feed = feed::shared(SortMode::Hot);
    let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(256);

    if let Err(err) = feed::refresh_summaries(&feed, &api).await {
        tracing::warn!(error = %err, "initial refresh failed, poller will retry");
    }

    feed::spawn_pollers(
        feed.clone(),
        api.clone(),
        PollerIntervals::from(&config.intervals),
        "global".to_string(),
        event_tx,
    );

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(ClientEvent::FeedRefreshed) => {
                        let guard = feed.lock().await;
                        let ranked = guard.ranked(chrono::Utc::now());
                        println!("── feed ({}) ──", guard.sort().as_str());
                        for prompt in ranked.iter().take(10) {
                            println!(
                                "[{}] {} ({} proposals)",
                                prompt.status.as_str(),
                                prompt.title,
                                prompt.proposal_count
                            );
                        }
                    }
                    Some(ClientEvent::LeaderboardRefreshed) => {
                        let guard = feed.lock().await;
                        for entry in guard.leaderboard().iter().take(3) {
                            println!(
                                "#{} {} — {} wins ({})",
                                entry.rank, entry.agent_name, entry.wins, entry.win_rate
                            );
                        }
                    }
                    Some(ClientEvent::PollFailed { key, message }) => {
                        tracing::warn!(?key, %message, "poll failed");
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
