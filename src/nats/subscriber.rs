use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Drain a NATS subscription into a channel.
///
/// Decouples the transport's receive loop from domain dispatch: the consumer
/// owns the receiver and handles payloads at its own pace. Returns when the
/// subscription ends or the consumer goes away.
pub async fn forward_payloads<S>(mut messages: S, tx: mpsc::Sender<Vec<u8>>)
where
    S: Stream<Item = async_nats::Message> + Unpin,
{
    while let Some(msg) = messages.next().await {
        if tx.send(msg.payload.to_vec()).await.is_err() {
            info!(subject = %msg.subject, "Payload consumer closed, stopping forwarder");
            return;
        }
    }

    warn!("NATS subscription ended");
}
