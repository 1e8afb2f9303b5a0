//! CDP WebSocket connection implementation
//!
//! One background task owns the read half of the socket and routes every response to the
//! oneshot channel registered by `send_command`. Writes go through a mutex-guarded sink.
//! Events are not consumed by the harness and are dropped after a debug log.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, PendingCommand>>>;

/// CDP timeout configuration
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    /// Default timeout for most commands (seconds)
    default_timeout_secs: u64,
    /// Timeout for screenshot commands (seconds)
    screenshot_timeout_secs: u64,
    /// Timeout for page navigation commands (seconds)
    navigation_timeout_secs: u64,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            screenshot_timeout_secs: 90,
            navigation_timeout_secs: 60,
        }
    }
}

impl CdpTimeoutConfig {
    /// Get timeout duration for a specific command method
    fn get_timeout_for_command(&self, method: &str) -> Duration {
        match method {
            "Page.captureScreenshot" => Duration::from_secs(self.screenshot_timeout_secs),
            "Page.navigate" | "Page.reload" => Duration::from_secs(self.navigation_timeout_secs),
            _ => Duration::from_secs(self.default_timeout_secs),
        }
    }
}

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    /// Response channel sender
    sender: oneshot::Sender<CdpResponse>,
    /// Command method (for logging)
    method: String,
}

/// CDP WebSocket connection implementation
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the socket
    sink: Mutex<Option<SplitSink<WsStream, Message>>>,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending_commands: PendingMap,
    /// Is connection active
    is_active: Arc<AtomicBool>,
    /// Reader task
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
    /// Timeout configuration
    timeout_config: CdpTimeoutConfig,
}

impl std::fmt::Debug for CdpWebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpWebSocketConnection")
            .field("url", &self.url)
            .field("is_active", &self.is_active.load(Ordering::SeqCst))
            .finish()
    }
}

impl CdpWebSocketConnection {
    /// Create a new CDP WebSocket connection
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn new<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP target {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;

        let (sink, stream) = ws_stream.split();

        let connection = Arc::new(Self {
            url,
            sink: Mutex::new(Some(sink)),
            next_id: AtomicU64::new(1),
            pending_commands: Arc::new(Mutex::new(HashMap::new())),
            is_active: Arc::new(AtomicBool::new(true)),
            reader: std::sync::Mutex::new(None),
            timeout_config: CdpTimeoutConfig::default(),
        });

        let handle = tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&connection.pending_commands),
            Arc::clone(&connection.is_active),
        ));
        if let Ok(mut reader) = connection.reader.lock() {
            *reader = Some(handle);
        }

        debug!("WebSocket connection established");
        Ok(connection)
    }

    /// Target URL this connection talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Receive frames until the socket closes, dispatching responses to their waiters.
    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        pending_commands: PendingMap,
        is_active: Arc<AtomicBool>,
    ) {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    Self::handle_message(&text, &pending_commands).await;
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);

        // Dropping the senders wakes every waiter with a closed-channel error.
        let abandoned = {
            let mut pending = pending_commands.lock().await;
            pending.drain().count()
        };
        if abandoned > 0 {
            warn!("CDP connection closed with {} pending commands", abandoned);
        }
        debug!("CDP read loop exited");
    }

    /// Route one text frame
    async fn handle_message(text: &str, pending_commands: &PendingMap) {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            let waiter = pending_commands.lock().await.remove(&response.id);
            match waiter {
                Some(pending_cmd) => {
                    debug!("Response for command {} ({})", response.id, pending_cmd.method);
                    let cdp_response = CdpResponse {
                        id: response.id,
                        result: Some(response.result),
                        error: response.error.map(|e| CdpErrorResponse {
                            code: e.code,
                            message: e.message,
                            data: e.data,
                        }),
                    };
                    let _ = pending_cmd.sender.send(cdp_response);
                }
                None => warn!("Received response for unknown command ID: {}", response.id),
            }
            return;
        }

        if let Ok(notification) = serde_json::from_str::<CdpNotification>(text) {
            debug!("Ignoring event {}", notification.method);
            return;
        }

        warn!("Unknown message format: {}", text);
    }

    /// Send WebSocket message
    async fn send_message(&self, message: Message) -> Result<(), Error> {
        let mut sink_guard = self.sink.lock().await;
        let sink = sink_guard
            .as_mut()
            .ok_or_else(|| Error::websocket("WebSocket stream not available"))?;

        sink.send(message)
            .await
            .map_err(|e| Error::websocket(format!("Failed to send message: {}", e)))
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
        };

        let json = serde_json::to_string(&request)
            .map_err(|e| Error::cdp(format!("Failed to serialize request: {}", e)))?;

        debug!("Sending CDP command {}: {}", id, method);

        let (sender, receiver) = oneshot::channel();
        self.pending_commands.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        if let Err(e) = self.send_message(Message::Text(json)).await {
            self.pending_commands.lock().await.remove(&id);
            return Err(e);
        }

        let timeout_duration = self.timeout_config.get_timeout_for_command(method);

        match tokio::time::timeout(timeout_duration, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{}: {} (code: {})",
                        method, error.message, error.code
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed before command {} ({}) completed",
                id, method
            ))),
            Err(_) => {
                self.pending_commands.lock().await.remove(&id);
                Err(Error::timeout(format!("Command {} ({}) timed out", id, method)))
            }
        }
    }

    async fn close(&self) -> Result<(), Error> {
        info!("Closing CDP WebSocket connection to {}", self.url);

        self.is_active.store(false, Ordering::SeqCst);

        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                warn!("Failed to close WebSocket cleanly: {}", e);
            }
        }

        if let Ok(mut reader) = self.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
