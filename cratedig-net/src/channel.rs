//! Persistent websocket connection to the media server.
//!
//! One task owns the socket. Outbound intents arrive on the receiver paired
//! with the navigator's [`MessageSink`](cratedig_core::MessageSink); while the
//! socket is down they are dropped, never queued. Inbound frames are parsed
//! into [`ServerMessage`]s and handed to every listener in subscription order.

use crate::error::{NetError, Result};
use cratedig_core::{ClientMessage, ServerConfig, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const LOG_TARGET: &str = "cratedig::channel";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Callback invoked for every parsed inbound message.
pub type MessageListener = Box<dyn Fn(&ServerMessage) + Send + Sync>;

/// Callback invoked whenever the connection opens or closes.
pub type StatusListener = Box<dyn Fn(ConnectionStatus) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    /// Closed or failed to open; a reconnect is scheduled
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("Connected"),
            Self::Disconnected => f.write_str("Disconnected. Reconnecting..."),
        }
    }
}

pub struct NetworkChannel {
    url: String,
    reconnect_delay: Duration,
    listeners: Vec<MessageListener>,
    status_listeners: Vec<StatusListener>,
    connected: AtomicBool,
    cancel_token: CancellationToken,
}

impl NetworkChannel {
    /// Create a channel for `url`.
    ///
    /// Listeners must be registered before the channel is started.
    pub fn new(
        url: impl Into<String>,
        reconnect_delay: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            listeners: Vec::new(),
            status_listeners: Vec::new(),
            connected: AtomicBool::new(false),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ServerConfig, cancel_token: Option<CancellationToken>) -> Self {
        Self::new(config.url.clone(), config.reconnect_delay(), cancel_token)
    }

    /// Add an inbound message listener. Listeners run in the order added.
    pub fn subscribe(&mut self, listener: impl Fn(&ServerMessage) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Add a connection status listener.
    pub fn on_status(&mut self, listener: impl Fn(ConnectionStatus) + Send + Sync + 'static) {
        self.status_listeners.push(Box::new(listener));
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Run the connection loop in a background task.
    #[must_use]
    pub fn start(
        self: Arc<Self>,
        outbound: UnboundedReceiver<ClientMessage>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run(outbound).await {
                error!(target: LOG_TARGET, "Network channel stopped with error: {e}");
            }
        })
    }

    /// Connect, serve the socket until it closes, wait the reconnect delay
    /// and repeat until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::ChannelStopped`] if every outbound sender has been
    /// dropped while connected.
    pub async fn run(&self, mut outbound: UnboundedReceiver<ClientMessage>) -> Result<()> {
        info!(target: LOG_TARGET, "Starting network channel for {}", self.url);

        loop {
            let Some(attempt) = self.connect(&mut outbound).await else {
                break;
            };

            match attempt {
                Ok(socket) => {
                    info!(target: LOG_TARGET, "Connected to {}", self.url);
                    self.set_status(ConnectionStatus::Connected);
                    let result = self.serve(socket, &mut outbound).await;
                    self.set_status(ConnectionStatus::Disconnected);
                    match result {
                        Ok(()) => info!(target: LOG_TARGET, "Connection closed"),
                        Err(NetError::ChannelStopped) => return Err(NetError::ChannelStopped),
                        Err(e) => warn!(target: LOG_TARGET, "Connection lost: {e}"),
                    }
                }
                Err(e) => {
                    warn!(target: LOG_TARGET, "Failed to connect to {}: {e}", self.url);
                    self.set_status(ConnectionStatus::Disconnected);
                }
            }

            if self.cancel_token.is_cancelled() {
                break;
            }
            if !self.wait_reconnect(&mut outbound).await {
                break;
            }
            debug!(target: LOG_TARGET, "Reconnecting to {}", self.url);
        }

        info!(target: LOG_TARGET, "Network channel shutting down gracefully");
        Ok(())
    }

    /// Open the socket, dropping anything sent while the handshake is pending.
    ///
    /// Returns `None` if cancelled.
    async fn connect(
        &self,
        outbound: &mut UnboundedReceiver<ClientMessage>,
    ) -> Option<std::result::Result<Socket, tungstenite::Error>> {
        let handshake = connect_async(self.url.as_str());
        tokio::pin!(handshake);
        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => return None,
                attempt = &mut handshake => return Some(attempt.map(|(socket, _)| socket)),
                Some(message) = outbound.recv() => drop_unsent(&message),
            }
        }
    }

    /// Sleep out the reconnect delay, dropping anything sent meanwhile.
    ///
    /// Returns `false` if cancelled.
    async fn wait_reconnect(&self, outbound: &mut UnboundedReceiver<ClientMessage>) -> bool {
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => return false,
                () = &mut delay => return true,
                Some(message) = outbound.recv() => drop_unsent(&message),
            }
        }
    }

    async fn serve(
        &self,
        socket: Socket,
        outbound: &mut UnboundedReceiver<ClientMessage>,
    ) -> Result<()> {
        let (mut write, mut read) = socket.split();
        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    let _ = write.close().await;
                    return Ok(());
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                },
                message = outbound.recv() => {
                    let Some(message) = message else {
                        let _ = write.close().await;
                        return Err(NetError::ChannelStopped);
                    };
                    match message.to_json() {
                        Ok(text) => {
                            debug!(target: LOG_TARGET, "Sending {}", message.action());
                            write.send(Message::Text(text.into())).await?;
                        }
                        Err(e) => warn!(
                            target: LOG_TARGET,
                            "Failed to encode {} message: {e}", message.action()
                        ),
                    }
                }
            }
        }
    }

    /// Parse one text frame and fan it out. Malformed frames are dropped.
    fn dispatch(&self, text: &str) {
        match ServerMessage::parse(text) {
            Ok(message) => {
                debug!(target: LOG_TARGET, "Received {message:?}");
                for listener in &self.listeners {
                    listener(&message);
                }
            }
            Err(e) => warn!(target: LOG_TARGET, "Dropping malformed server message: {e}"),
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.connected
            .store(status == ConnectionStatus::Connected, Ordering::Release);
        for listener in &self.status_listeners {
            listener(status);
        }
    }
}

fn drop_unsent(message: &ClientMessage) {
    warn!(
        target: LOG_TARGET,
        "Not connected, dropping {} message", message.action()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cratedig_core::MessageSink;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::{self, UnboundedSender};
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    const WAIT: Duration = Duration::from_secs(5);

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    }

    /// Next text frame from the client, as JSON.
    async fn next_json(socket: &mut WebSocketStream<TcpStream>) -> serde_json::Value {
        let frame = timeout(WAIT, socket.next()).await.unwrap().unwrap().unwrap();
        let Message::Text(text) = frame else {
            panic!("expected text frame, got {frame:?}");
        };
        serde_json::from_str(text.as_str()).unwrap()
    }

    fn status_feed(channel: &mut NetworkChannel) -> mpsc::UnboundedReceiver<ConnectionStatus> {
        let (tx, rx) = mpsc::unbounded_channel();
        channel.on_status(move |status| {
            let _ = tx.send(status);
        });
        rx
    }

    fn tagged(tx: &UnboundedSender<(u8, ServerMessage)>, tag: u8) -> impl Fn(&ServerMessage) {
        let tx = tx.clone();
        move |message| {
            let _ = tx.send((tag, message.clone()));
        }
    }

    #[tokio::test]
    async fn test_listeners_in_order_and_malformed_dropped() {
        let (server, url) = listener().await;
        let mut channel = NetworkChannel::new(url, Duration::from_millis(50), None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.subscribe(tagged(&tx, 1));
        channel.subscribe(tagged(&tx, 2));
        let channel = Arc::new(channel);
        let token = channel.cancel_token();
        let (_sink, outbound) = MessageSink::channel();
        let handle = Arc::clone(&channel).start(outbound);

        let mut socket = accept(&server).await;
        socket.send(Message::Text("{not json".into())).await.unwrap();
        socket
            .send(Message::Text(r#"{"status":"rewinding"}"#.into()))
            .await
            .unwrap();
        socket
            .send(Message::Text(r#"{"status":"paused"}"#.into()))
            .await
            .unwrap();

        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first, (1, ServerMessage::Paused));
        assert_eq!(second, (2, ServerMessage::Paused));
        assert!(channel.is_connected());

        token.cancel();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_outbound_reaches_server() {
        let (server, url) = listener().await;
        let mut channel = NetworkChannel::new(url, Duration::from_millis(50), None);
        let mut statuses = status_feed(&mut channel);
        let channel = Arc::new(channel);
        let token = channel.cancel_token();
        let (sink, outbound) = MessageSink::channel();
        let handle = Arc::clone(&channel).start(outbound);

        let mut socket = accept(&server).await;
        assert_eq!(
            timeout(WAIT, statuses.recv()).await.unwrap(),
            Some(ConnectionStatus::Connected)
        );
        sink.send(ClientMessage::Volume { value: 0.25 });

        let value = next_json(&mut socket).await;
        assert_eq!(value["action"], "VOLUME");
        assert_eq!(value["payload"]["value"], 0.25);

        token.cancel();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_reconnects_after_close() {
        let (server, url) = listener().await;
        let mut channel = NetworkChannel::new(url, Duration::from_millis(50), None);
        let mut statuses = status_feed(&mut channel);
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.subscribe(tagged(&tx, 1));
        let channel = Arc::new(channel);
        let token = channel.cancel_token();
        let (_sink, outbound) = MessageSink::channel();
        let handle = Arc::clone(&channel).start(outbound);

        let mut socket = accept(&server).await;
        socket.close(None).await.unwrap();
        drop(socket);

        // The server pushes a sync on every new connection
        let mut socket = accept(&server).await;
        socket
            .send(Message::Text(r#"{"status":"sync"}"#.into()))
            .await
            .unwrap();
        let (_, message) = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(matches!(message, ServerMessage::Sync { .. }));

        let mut seen = Vec::new();
        while let Ok(status) = statuses.try_recv() {
            seen.push(status);
        }
        assert_eq!(
            seen,
            [
                ConnectionStatus::Connected,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Connected
            ]
        );

        token.cancel();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_keeps_retrying() {
        let (server, url) = listener().await;
        drop(server);

        let mut channel = NetworkChannel::new(url, Duration::from_millis(20), None);
        let mut statuses = status_feed(&mut channel);
        let channel = Arc::new(channel);
        let token = channel.cancel_token();
        let (_sink, outbound) = MessageSink::channel();
        let handle = Arc::clone(&channel).start(outbound);

        for _ in 0..2 {
            assert_eq!(
                timeout(WAIT, statuses.recv()).await.unwrap(),
                Some(ConnectionStatus::Disconnected)
            );
        }
        assert!(!channel.is_connected());

        token.cancel();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_sends_dropped_while_handshake_pending() {
        let (server, url) = listener().await;
        let mut channel = NetworkChannel::new(url, Duration::from_millis(50), None);
        let mut statuses = status_feed(&mut channel);
        let channel = Arc::new(channel);
        let token = channel.cancel_token();
        let (sink, outbound) = MessageSink::channel();
        let handle = Arc::clone(&channel).start(outbound);

        // TCP is up but the upgrade request is left unanswered for now
        let (stream, _) = server.accept().await.unwrap();
        sink.send(ClientMessage::Volume { value: 0.9 });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!channel.is_connected());

        let mut socket = accept_async(stream).await.unwrap();
        assert_eq!(
            timeout(WAIT, statuses.recv()).await.unwrap(),
            Some(ConnectionStatus::Connected)
        );
        sink.send(ClientMessage::Volume { value: 0.25 });

        let value = next_json(&mut socket).await;
        assert_eq!(value["action"], "VOLUME");
        assert_eq!(value["payload"]["value"], 0.25);

        token.cancel();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_sends_dropped_between_connections() {
        let (server, url) = listener().await;
        let mut channel = NetworkChannel::new(url, Duration::from_millis(100), None);
        let mut statuses = status_feed(&mut channel);
        let channel = Arc::new(channel);
        let token = channel.cancel_token();
        let (sink, outbound) = MessageSink::channel();
        let handle = Arc::clone(&channel).start(outbound);

        let mut socket = accept(&server).await;
        assert_eq!(
            timeout(WAIT, statuses.recv()).await.unwrap(),
            Some(ConnectionStatus::Connected)
        );
        socket.close(None).await.unwrap();
        drop(socket);
        assert_eq!(
            timeout(WAIT, statuses.recv()).await.unwrap(),
            Some(ConnectionStatus::Disconnected)
        );
        sink.send(ClientMessage::stop());

        let mut socket = accept(&server).await;
        assert_eq!(
            timeout(WAIT, statuses.recv()).await.unwrap(),
            Some(ConnectionStatus::Connected)
        );
        sink.send(ClientMessage::Volume { value: 0.5 });

        let value = next_json(&mut socket).await;
        assert_eq!(value["action"], "VOLUME");

        token.cancel();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }

    #[test]
    fn test_status_text() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
        assert_eq!(
            ConnectionStatus::Disconnected.to_string(),
            "Disconnected. Reconnecting..."
        );
    }
}
