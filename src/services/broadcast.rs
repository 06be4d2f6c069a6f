//! Broadcast service: fan one event out to every registered channel.
//!
//! DESIGN
//! ======
//! The event is serialized once into a shared `Arc<str>` and the same buffer
//! is queued on every channel. Queueing never awaits, so a slow peer cannot
//! hold up the store lock.
//!
//! A closed channel is skipped. A channel whose queue is full has missed an
//! event and can no longer converge, so it is unregistered after the fan-out.
//! Dropping its sender ends that session once it drains what was queued; the
//! participant resyncs by reconnecting and receiving a fresh `init`.

use protocol::Event;
use tokio::sync::RwLock;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::registry::{Outbound, Registry};

/// Queue `event` on every registered channel. Returns how many accepted it.
///
/// Channels whose queue was full are unregistered before returning.
pub async fn publish(registry_lock: &RwLock<Registry>, event: &Event) -> usize {
    let registry = registry_lock.read().await;
    if registry.is_empty() {
        return 0;
    }

    let frame: Outbound = match protocol::encode_event(event) {
        Ok(text) => text.into(),
        Err(e) => {
            error!(error = %e, kind = event.kind(), "broadcast: failed to encode event");
            return 0;
        }
    };

    let mut delivered = 0;
    let mut lagging = Vec::new();
    for (conn_id, tx) in registry.all() {
        match tx.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => lagging.push(conn_id),
            Err(TrySendError::Closed(_)) => {
                debug!(%conn_id, kind = event.kind(), "broadcast: channel closed, skipping");
            }
        }
    }
    debug!(kind = event.kind(), delivered, clients = registry.len(), "broadcast: published");
    drop(registry);

    if !lagging.is_empty() {
        evict(registry_lock, &lagging, event).await;
    }
    delivered
}

/// Unregister sessions that missed an event because their queue was full.
async fn evict(registry: &RwLock<Registry>, lagging: &[Uuid], event: &Event) {
    let mut registry = registry.write().await;
    for conn_id in lagging {
        if registry.unregister(*conn_id) {
            warn!(%conn_id, kind = event.kind(), "broadcast: queue full, dropping lagging session");
        }
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
