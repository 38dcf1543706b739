//! Scrolling window title while a track is playing.

use cratedig_core::SceneEvent;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const LOG_TARGET: &str = "cratedig::marquee";

/// Appended to the scrolling text so the wrap-around reads cleanly.
const MARQUEE_TAIL: &str = "  *** ";

/// Move the first character to the end.
#[must_use]
pub fn rotate(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut rotated: String = chars.collect();
        rotated.push(first);
        rotated
    })
}

/// Owns at most one running marquee task and the published title.
pub struct Marquee {
    base_title: String,
    interval: Duration,
    title_tx: watch::Sender<String>,
    running: Option<Running>,
}

/// The task currently scrolling and the text it started from.
struct Running {
    token: CancellationToken,
    text: String,
}

impl Marquee {
    /// Create an idle marquee showing `base_title`.
    #[must_use]
    pub fn new(
        base_title: impl Into<String>,
        interval: Duration,
    ) -> (Self, watch::Receiver<String>) {
        let base_title = base_title.into();
        let (title_tx, title_rx) = watch::channel(base_title.clone());
        let marquee = Self {
            base_title,
            interval,
            title_tx,
            running: None,
        };
        (marquee, title_rx)
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start scrolling `"{title} - {artist}"`, replacing any running marquee.
    /// Already scrolling the same text is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, title: &str, artist: &str) {
        let text = format!("{title} - {artist}{MARQUEE_TAIL}");
        if self.running.as_ref().is_some_and(|r| r.text == text) {
            return;
        }
        self.cancel_running();

        let token = CancellationToken::new();
        let task_token = token.clone();
        let tx = self.title_tx.clone();
        let period = self.interval;
        let mut scrolling = text.clone();
        debug!(target: LOG_TARGET, "Starting marquee: {text}");
        self.running = Some(Running { token, text });

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        scrolling = rotate(&scrolling);
                        tx.send_if_modified(|current| {
                            if task_token.is_cancelled() {
                                return false;
                            }
                            current.clone_from(&scrolling);
                            true
                        });
                    }
                }
            }
        });
    }

    /// Stop scrolling and restore the plain window title.
    pub fn stop(&mut self) {
        if self.cancel_running() {
            debug!(target: LOG_TARGET, "Marquee stopped");
        }
        self.title_tx.send_replace(self.base_title.clone());
    }

    fn cancel_running(&mut self) -> bool {
        self.running.take().is_some_and(|running| {
            running.token.cancel();
            true
        })
    }
}

impl Drop for Marquee {
    fn drop(&mut self) {
        self.cancel_running();
    }
}

/// Drive the marquee from transport events until the stream closes or
/// shutdown is requested.
pub async fn follow_transport(
    mut marquee: Marquee,
    mut events: broadcast::Receiver<SceneEvent>,
    cancel_token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel_token.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(SceneEvent::Transport {
                playing: true,
                title: Some(title),
                artist,
            }) => marquee.start(&title, artist.as_deref().unwrap_or_default()),
            Ok(SceneEvent::Transport { playing: false, .. }) => marquee.stop(),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Closed) => {
                info!(target: LOG_TARGET, "Scene event channel closed");
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                info!(target: LOG_TARGET, "Missed {} scene events", n);
            }
        }
    }
    marquee.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cratedig_core::SceneBus;

    const INTERVAL: Duration = Duration::from_millis(200);

    #[test]
    fn test_rotate() {
        assert_eq!(rotate("abc"), "bca");
        assert_eq!(rotate("é-x"), "-xé");
        assert_eq!(rotate(""), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_marquee_scrolls_and_restores() {
        let (mut marquee, mut title) = Marquee::new("Cratedig", INTERVAL);
        marquee.start("So What", "Miles Davis");
        assert!(marquee.is_running());

        title.changed().await.unwrap();
        assert_eq!(*title.borrow_and_update(), "o What - Miles Davis  *** S");
        title.changed().await.unwrap();
        assert_eq!(*title.borrow_and_update(), " What - Miles Davis  *** So");

        marquee.stop();
        assert!(!marquee.is_running());
        assert_eq!(*title.borrow_and_update(), "Cratedig");

        // Nothing scrolls after stopping
        tokio::time::sleep(INTERVAL * 3).await;
        assert!(!title.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous() {
        let (mut marquee, mut title) = Marquee::new("Cratedig", INTERVAL);
        marquee.start("One", "A");
        marquee.start("Two", "B");

        tokio::time::sleep(INTERVAL * 3 + INTERVAL / 2).await;
        let current = title.borrow_and_update().clone();
        assert!(current.contains("Two"), "unexpected title {current:?}");
        assert!(!current.contains("One"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_track_keeps_scrolling() {
        let (mut marquee, mut title) = Marquee::new("Cratedig", INTERVAL);
        marquee.start("So What", "Miles Davis");
        title.changed().await.unwrap();
        title.changed().await.unwrap();
        assert_eq!(*title.borrow_and_update(), " What - Miles Davis  *** So");

        // A repeated transport update must not rewind the text
        marquee.start("So What", "Miles Davis");
        title.changed().await.unwrap();
        assert_eq!(*title.borrow_and_update(), "What - Miles Davis  *** So ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_transport_events() {
        let bus = SceneBus::new();
        let (marquee, mut title) = Marquee::new("Cratedig", INTERVAL);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(follow_transport(marquee, bus.subscribe(), cancel.clone()));

        bus.emit(SceneEvent::Transport {
            playing: true,
            title: Some("Blue Train".into()),
            artist: Some("John Coltrane".into()),
        });
        title.changed().await.unwrap();
        assert!(title.borrow_and_update().contains("John Coltrane"));

        bus.emit(SceneEvent::Transport {
            playing: false,
            title: Some("Blue Train".into()),
            artist: Some("John Coltrane".into()),
        });
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(*title.borrow_and_update(), "Cratedig");

        cancel.cancel();
        task.await.unwrap();
    }
}
