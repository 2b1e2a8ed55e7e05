// NATS transport: connection, publishing seam, inbound pump

mod client;
mod publisher;
mod subscriber;

pub use client::{NatsClient, NatsConfig};
pub use publisher::{NatsPublisher, Publisher, UnavailablePublisher};
pub use subscriber::forward_payloads;

#[cfg(test)]
pub(crate) mod testing;
