use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;

use super::EVENT_SOCKET_PATH;
use shoji_ipc::{EventFilter, StateEvent, SubscribeRequest};

/// Streams state events to subscribers. Each connection sends one
/// `SubscribeRequest` line, then receives matching events as JSON lines.
pub struct EventServer {
    socket_path: PathBuf,
    event_rx: broadcast::Receiver<StateEvent>,
}

impl EventServer {
    pub fn new(event_rx: broadcast::Receiver<StateEvent>) -> Self {
        Self {
            socket_path: PathBuf::from(EVENT_SOCKET_PATH),
            event_rx,
        }
    }

    pub async fn run(self) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Event server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let event_rx = self.event_rx.resubscribe();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, event_rx).await {
                            tracing::debug!("Event subscriber disconnected: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Event server accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        mut event_rx: broadcast::Receiver<StateEvent>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let filter = parse_filter(&line);
        tracing::debug!("New event subscriber with filter: {:?}", filter);

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if filter.matches(&event) {
                        let json = serde_json::to_string(&event)?;
                        writer.write_all(json.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event subscriber lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        Ok(())
    }
}

/// A malformed request subscribes to everything.
fn parse_filter(line: &str) -> EventFilter {
    serde_json::from_str::<SubscribeRequest>(line.trim())
        .unwrap_or_default()
        .effective_filter()
}

impl Drop for EventServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Sender side of the state event broadcast.
#[derive(Clone)]
pub struct EventBroadcaster {
    event_tx: broadcast::Sender<StateEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    /// Sending without subscribers is not an error.
    pub fn send(&self, event: StateEvent) {
        let _ = self.event_tx.send(event);
    }
}
