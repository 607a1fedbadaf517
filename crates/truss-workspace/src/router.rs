//! Fan-out of engine diagnostics to per-document subscribers.
//!
//! The router consumes the engine's update stream for the whole workspace
//! and forwards each update to the callback registered for its document,
//! if any. Registration is owned by the workspace's open/close
//! transitions; the router only reads the table.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::engine::DiagnosticsUpdate;
use crate::DocumentId;

pub type DiagnosticsCallback = Arc<dyn Fn(DocumentId, &DiagnosticsUpdate) + Send + Sync>;

/// Wrap a closure as a [`DiagnosticsCallback`].
pub fn callback<F>(f: F) -> DiagnosticsCallback
where
    F: Fn(DocumentId, &DiagnosticsUpdate) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Per-open-document callback registry.
///
/// Shared between the workspace (writes on open/close) and the router
/// task (reads on every update), so lookups must not block graph
/// mutation; `DashMap` keeps the hot path lock-light.
#[derive(Clone, Default)]
pub struct SubscriptionTable {
    inner: Arc<DashMap<DocumentId, DiagnosticsCallback>>,
}

impl SubscriptionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `callback` for `document`, replacing any prior one.
    pub(crate) fn subscribe(&self, document: DocumentId, callback: DiagnosticsCallback) {
        self.inner.insert(document, callback);
    }

    pub(crate) fn unsubscribe(&self, document: DocumentId) {
        self.inner.remove(&document);
    }

    #[must_use]
    pub fn is_subscribed(&self, document: DocumentId) -> bool {
        self.inner.contains_key(&document)
    }

    pub(crate) fn get(&self, document: DocumentId) -> Option<DiagnosticsCallback> {
        // Clone the Arc out so no shard guard is held while the callback
        // runs; a callback is allowed to trigger open/close.
        self.inner.get(&document).map(|entry| entry.value().clone())
    }
}

/// Task that drains the engine's update stream for the session.
#[derive(Debug)]
pub struct DiagnosticsRouter {
    handle: JoinHandle<()>,
}

impl DiagnosticsRouter {
    /// Spawn the routing task. It runs until the engine side of the
    /// stream is dropped.
    #[must_use]
    pub fn spawn(
        mut updates: UnboundedReceiver<DiagnosticsUpdate>,
        table: SubscriptionTable,
    ) -> Self {
        let handle = tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                route(&table, &update);
            }
            tracing::debug!("diagnostics stream closed, router stopping");
        });

        Self { handle }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DiagnosticsRouter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn route(table: &SubscriptionTable, update: &DiagnosticsUpdate) {
    let Some(document) = update.document else {
        tracing::trace!("dropping unaddressable diagnostics update");
        return;
    };

    match table.get(document) {
        Some(callback) => callback(document, update),
        None => {
            // Not open (or closed since the update was queued). Only open
            // documents need live diagnostics.
            tracing::trace!(?document, "dropping diagnostics for unsubscribed document");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use super::*;
    use crate::engine::Diagnostic;
    use crate::engine::DiagnosticSeverity;

    fn update(document: Option<DocumentId>, message: &str) -> DiagnosticsUpdate {
        DiagnosticsUpdate {
            document,
            diagnostics: vec![Diagnostic {
                severity: DiagnosticSeverity::Warning,
                message: message.to_string(),
                range: None,
                code: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_routes_to_subscriber() {
        let table = SubscriptionTable::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let _router = DiagnosticsRouter::spawn(rx, table.clone());

        let document = DocumentId::from_raw(1);
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        table.subscribe(
            document,
            callback(move |id, update| {
                seen_tx.send((id, update.diagnostics.len())).ok();
            }),
        );

        tx.send(update(Some(document), "unused field")).unwrap();

        let (id, count) = timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, document);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unsubscribed_updates_dropped_without_affecting_others() {
        let table = SubscriptionTable::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let _router = DiagnosticsRouter::spawn(rx, table.clone());

        let subscribed = DocumentId::from_raw(1);
        let unsubscribed = DocumentId::from_raw(2);
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        table.subscribe(
            subscribed,
            callback(move |id, _| {
                seen_tx.send(id).ok();
            }),
        );

        tx.send(update(Some(unsubscribed), "nobody listening")).unwrap();
        tx.send(update(None, "not addressable")).unwrap();
        tx.send(update(Some(subscribed), "for the listener")).unwrap();

        // Only the subscribed document's update arrives; the dropped ones
        // did not stall or kill the router.
        let id = timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, subscribed);
        assert!(seen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_router_stops_when_stream_closes() {
        let table = SubscriptionTable::new();
        let (tx, rx) = mpsc::unbounded_channel::<DiagnosticsUpdate>();
        let router = DiagnosticsRouter::spawn(rx, table);

        drop(tx);
        timeout(Duration::from_secs(1), async {
            while !router.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}
