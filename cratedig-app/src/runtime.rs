//! The main loop: one task owns the [`Navigator`] and interleaves frame
//! steps with inbound network events, so no two mutations ever race.

use cratedig_core::{Catalog, Navigator, ServerMessage};
use cratedig_net::{CatalogSource, ConnectionStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const LOG_TARGET: &str = "cratedig::runtime";

/// Everything the network side hands to the main loop.
#[derive(Debug)]
pub enum Inbound {
    Server(ServerMessage),
    Connection(ConnectionStatus),
    CatalogLoaded(Catalog),
    CatalogFailed(String),
}

/// Apply one inbound event to the navigator.
pub fn apply(navigator: &mut Navigator, event: Inbound, now: Instant) {
    match event {
        Inbound::Server(message) => navigator.handle_server_message(message, now),
        Inbound::Connection(status) => navigator.on_connection_status(&status.to_string()),
        Inbound::CatalogLoaded(catalog) => navigator.on_catalog_loaded(catalog, now),
        Inbound::CatalogFailed(reason) => navigator.on_catalog_failed(&reason),
    }
}

/// Fetch the catalog once and report the outcome to the main loop.
pub async fn load_catalog(source: Arc<dyn CatalogSource>, tx: UnboundedSender<Inbound>) {
    let event = match source.fetch().await {
        Ok(catalog) => Inbound::CatalogLoaded(catalog),
        Err(e) => Inbound::CatalogFailed(e.to_string()),
    };
    if tx.send(event).is_err() {
        debug!(target: LOG_TARGET, "Main loop gone before catalog arrived");
    }
}

/// Step frames at `frame_interval` and apply inbound events as they arrive,
/// until cancelled. Returns the navigator for inspection.
pub async fn run(
    mut navigator: Navigator,
    mut inbound: UnboundedReceiver<Inbound>,
    frame_interval: Duration,
    cancel_token: CancellationToken,
) -> Navigator {
    info!(
        target: LOG_TARGET,
        "Starting frame loop ({}ms per frame)",
        frame_interval.as_millis()
    );
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            Some(event) = inbound.recv() => apply(&mut navigator, event, Instant::now()),
            _ = ticker.tick() => {
                let now = Instant::now();
                navigator.frame(now.saturating_duration_since(last_frame), now);
                last_frame = now;
            }
        }
    }

    info!(target: LOG_TARGET, "Frame loop stopped");
    navigator
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cratedig_core::{
        parse_catalog, CratedigConfig, MessageSink, NavSnapshot, SceneBus, ViewState,
    };
    use cratedig_net::NetError;
    use tokio::sync::mpsc;

    const CATALOG: &str = r#"[
        {"id":"k1","title":"Kind of Blue","artist":"Miles Davis",
         "discs":[{"disc_number":1,"tracks":[{"title":"So What","file_path":"/m/1.flac"}]}]},
        {"id":"b1","title":"Blue Train","artist":"John Coltrane",
         "discs":[{"disc_number":1,"tracks":[{"title":"Blue Train","file_path":"/m/2.flac"}]}]}
    ]"#;

    struct FixedCatalog(Option<Catalog>);

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn fetch(&self) -> cratedig_net::error::Result<Catalog> {
            self.0.clone().ok_or(NetError::Status {
                url: "http://test/api/library".into(),
                status: 500,
            })
        }
    }

    fn navigator() -> Navigator {
        let (sink, _) = MessageSink::channel();
        Navigator::new(CratedigConfig::default(), sink, SceneBus::new())
    }

    fn inspect_b1() -> Inbound {
        Inbound::Server(ServerMessage::Sync {
            playback: None,
            navigation: Some(NavSnapshot {
                album_id: Some("b1".into()),
                view_state: ViewState::Inspect,
                ..NavSnapshot::default()
            }),
        })
    }

    #[tokio::test]
    async fn test_load_catalog_reports_outcome() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let catalog = parse_catalog(CATALOG).unwrap();
        load_catalog(Arc::new(FixedCatalog(Some(catalog))), tx.clone()).await;
        assert!(matches!(rx.recv().await, Some(Inbound::CatalogLoaded(c)) if c.len() == 2));

        load_catalog(Arc::new(FixedCatalog(None)), tx).await;
        assert!(matches!(
            rx.recv().await,
            Some(Inbound::CatalogFailed(reason)) if reason.contains("500")
        ));
    }

    #[test]
    fn test_apply_buffers_sync_until_catalog() {
        let mut nav = navigator();
        let now = Instant::now();
        apply(&mut nav, Inbound::Connection(ConnectionStatus::Connected), now);
        apply(&mut nav, inspect_b1(), now);
        assert_eq!(nav.view(), ViewState::Overview);

        apply(&mut nav, Inbound::CatalogFailed("timed out".into()), now);
        assert!(!nav.is_library_loaded());

        let catalog = parse_catalog(CATALOG).unwrap();
        apply(&mut nav, Inbound::CatalogLoaded(catalog), now);
        assert_eq!(nav.view(), ViewState::Inspect);
        assert_eq!(nav.active_album().unwrap().id, "b1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_applies_events_until_cancelled() {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            navigator(),
            rx,
            Duration::from_millis(16),
            cancel.clone(),
        ));

        tx.send(inspect_b1()).unwrap();
        tx.send(Inbound::CatalogLoaded(parse_catalog(CATALOG).unwrap()))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let nav = task.await.unwrap();
        assert!(nav.is_library_loaded());
        assert_eq!(nav.view(), ViewState::Inspect);
    }
}
