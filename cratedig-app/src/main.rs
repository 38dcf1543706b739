mod marquee;
mod runtime;

use crate::marquee::Marquee;
use crate::runtime::Inbound;
use cratedig_core::{CoreError, CratedigConfig, MessageSink, Navigator, SceneBus, SceneEvent};
use cratedig_net::{CatalogClient, CatalogSource, NetworkChannel};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match CratedigConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                "Config file {} has a syntax error: {parse_error}",
                CratedigConfig::config_path().display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let catalog_client = match CatalogClient::new(&config.server) {
        Ok(client) => Arc::new(client) as Arc<dyn CatalogSource>,
        Err(e) => {
            error!("Failed to create catalog client: {e}");
            std::process::exit(1);
        }
    };

    let scene = SceneBus::new();
    let (sink, outbound) = MessageSink::channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    let mut channel = NetworkChannel::from_config(&config.server, Some(cancel_token.clone()));
    let server_tx = inbound_tx.clone();
    channel.subscribe(move |message| {
        let _ = server_tx.send(Inbound::Server(message.clone()));
    });
    let status_tx = inbound_tx.clone();
    channel.on_status(move |status| {
        let _ = status_tx.send(Inbound::Connection(status));
    });

    let (marquee, title_rx) = Marquee::new(
        config.ui.window_title.clone(),
        Duration::from_millis(config.ui.marquee_interval_ms),
    );

    let frame_interval = config.ui.frame_interval();
    let navigator = Navigator::new(config, sink, scene.clone());

    rt.block_on(async {
        let channel_handle = Arc::new(channel).start(outbound);
        tokio::spawn(runtime::load_catalog(catalog_client, inbound_tx));
        tokio::spawn(log_scene_events(scene.subscribe()));
        tokio::spawn(log_window_title(title_rx));
        tokio::spawn(marquee::follow_transport(
            marquee,
            scene.subscribe(),
            cancel_token.clone(),
        ));

        let navigator = runtime::run(navigator, inbound_rx, frame_interval, cancel_token).await;
        info!(
            "Session ended in {:?} with {} crates loaded",
            navigator.view(),
            navigator.library().len()
        );
        let _ = channel_handle.await;
    });
}

/// Log scene events to the console
async fn log_scene_events(mut rx: tokio::sync::broadcast::Receiver<SceneEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match &event {
                SceneEvent::ViewChanged { view, chrome } => {
                    info!("View changed: {view:?} (chrome: {chrome:?})");
                }
                SceneEvent::AffordancesChanged(affordances) => {
                    debug!("Affordances: {affordances:?}");
                }
                SceneEvent::OverviewRebuilt { labels } => {
                    info!("Overview: {} crates", labels.len());
                }
                SceneEvent::BrowseRebuilt {
                    label, item_count, ..
                } => {
                    info!("Browsing crate {label} ({item_count} items)");
                }
                SceneEvent::InspectRebuilt { album } => {
                    info!("Inspecting {} - {}", album.artist, album.title);
                }
                SceneEvent::DiscLoading {
                    disc_number,
                    instant,
                } => {
                    info!("Loading disc {disc_number} (instant: {instant})");
                }
                SceneEvent::AccentChanged(accent) => debug!("Accent color: {accent}"),
                SceneEvent::TitleChanged(title) => debug!("Header: {title}"),
                SceneEvent::Status(status) => info!("Status: {status}"),
                SceneEvent::Transport {
                    playing,
                    title,
                    artist,
                } => {
                    info!(
                        "Transport: {} {} - {}",
                        if *playing { "playing" } else { "idle" },
                        artist.as_deref().unwrap_or("?"),
                        title.as_deref().unwrap_or("?")
                    );
                }
                SceneEvent::LibraryRebuilt { crate_count } => {
                    debug!("Library rebuilt into {crate_count} crates");
                }
            },
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!("Scene event channel closed");
                break;
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                info!("Missed {} scene events", n);
            }
        }
    }
}

/// Trace the window title as the marquee scrolls it
async fn log_window_title(mut rx: tokio::sync::watch::Receiver<String>) {
    while rx.changed().await.is_ok() {
        debug!(target: "cratedig::title", "{}", *rx.borrow_and_update());
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = CratedigConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tungstenite=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = cratedig_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
