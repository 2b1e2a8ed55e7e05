use crate::controller::{Controller, LogEntry};
use crate::state::StoreUpdate;
use crate::subscription::protocol::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Manages a single observer WebSocket connection
pub struct ConnectionManager {
    id: Uuid,
    controller: Arc<Controller>,
}

impl ConnectionManager {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            id: Uuid::new_v4(),
            controller,
        }
    }

    /// Handle WebSocket connection lifecycle
    pub async fn handle(self, mut socket: WebSocket) {
        // Subscribe before announcing so this observer sees its own connect entry
        let mut update_rx = self.controller.store().subscribe();
        let mut log_rx = self.controller.log().subscribe();

        info!(connection = %self.id, "Observer connected");
        let snapshot = self.controller.observer_connected();
        if let Err(e) = send(&mut socket, &ServerMessage::StatusUpdate { devices: snapshot }).await {
            error!(connection = %self.id, error = %e, "Failed to send initial snapshot");
            self.controller.observer_disconnected();
            return;
        }

        loop {
            tokio::select! {
                // Handle incoming client messages
                msg = socket.recv() => {
                    match msg {
                        None => {
                            info!(connection = %self.id, "Observer connection dropped");
                            break;
                        }
                        Some(Ok(Message::Text(text))) => {
                            self.handle_client_text(&text).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!(connection = %self.id, "Observer disconnected");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(_)) => {
                            // Ignore binary, pong messages
                        }
                        Some(Err(e)) => {
                            warn!(connection = %self.id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                result = update_rx.recv() => {
                    match self.on_store_update(result) {
                        Ok(Some(msg)) => {
                            if let Err(e) = send(&mut socket, &msg).await {
                                error!(error = %e, "Failed to send status update");
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(()) => break,
                    }
                }

                result = log_rx.recv() => {
                    match on_log_entry(result) {
                        Ok(Some(msg)) => {
                            if let Err(e) = send(&mut socket, &msg).await {
                                error!(error = %e, "Failed to send log entry");
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(()) => break,
                    }
                }

            }
        }

        self.controller.observer_disconnected();
        info!(connection = %self.id, "WebSocket connection closed");
    }

    /// Handle one text frame from the observer.
    ///
    /// Unparseable frames are logged and ignored.
    pub async fn handle_client_text(&self, text: &str) {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(connection = %self.id, error = %e, "Ignoring unparseable client message");
                return;
            }
        };

        match msg {
            ClientMessage::ProcessCommand { text: Some(text) } if !text.trim().is_empty() => {
                self.controller.handle_text_command(&text).await;
            }
            ClientMessage::ProcessCommand { .. } => {
                debug!(connection = %self.id, "Empty command ignored");
            }
        }
    }

    /// Any store change is pushed as a full snapshot.
    ///
    /// Lagging only means intermediate snapshots were skipped; the next
    /// one sent is current.
    fn on_store_update(
        &self,
        result: Result<StoreUpdate, broadcast::error::RecvError>,
    ) -> Result<Option<ServerMessage>, ()> {
        match result {
            Ok(_) => Ok(Some(ServerMessage::StatusUpdate {
                devices: self.controller.store().get_all(),
            })),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "Observer lagged, sending fresh snapshot");
                Ok(Some(ServerMessage::StatusUpdate {
                    devices: self.controller.store().get_all(),
                }))
            }
            Err(broadcast::error::RecvError::Closed) => {
                error!("Store update channel closed");
                Err(())
            }
        }
    }
}

fn on_log_entry(
    result: Result<LogEntry, broadcast::error::RecvError>,
) -> Result<Option<ServerMessage>, ()> {
    match result {
        Ok(entry) => Ok(Some(ServerMessage::LogEvent { log: entry.log })),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            warn!(skipped = skipped, "Observer lagged, skipped log entries");
            Ok(None)
        }
        Err(broadcast::error::RecvError::Closed) => {
            error!("Event log channel closed");
            Err(())
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
