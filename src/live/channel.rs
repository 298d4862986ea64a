//! Live visitor result channel

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::{
    error::{AppError, AppResult},
    models::visitor::VisitorSnapshot,
    query::Constraint,
    repository::projection::project_snapshot,
    store::{DocumentStore, SnapshotEvent, Unsubscribe},
};

/// Projected snapshots of one live query.
///
/// Yields one item per backend push. A backend error is yielded once,
/// classified, and ends the stream.
pub struct SnapshotStream {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    finished: bool,
}

impl Stream for SnapshotStream {
    type Item = AppResult<VisitorSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.events.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Ok(docs))) => Poll::Ready(Some(Ok(project_snapshot(&docs)))),
            Poll::Ready(Some(Err(err))) => {
                self.finished = true;
                let err = AppError::from(err);
                tracing::warn!(error = %err, "Live visitor query failed");
                Poll::Ready(Some(Err(err)))
            }
        }
    }
}

/// Owns one live subscription; dropping it unsubscribes
pub struct SubscriptionGuard {
    unsubscribe: Option<Unsubscribe>,
}

impl SubscriptionGuard {
    fn new(unsubscribe: Unsubscribe) -> Self {
        Self {
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Unsubscribe now
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
            tracing::debug!("Live visitor subscription cancelled");
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Opens live visitor queries against one collection
#[derive(Clone)]
pub struct LiveResultChannel {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl LiveResultChannel {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Open a live query. The stream stays open until the guard is dropped
    /// or the backend reports an error.
    pub fn subscribe(
        &self,
        constraints: &[Constraint],
    ) -> AppResult<(SnapshotStream, SubscriptionGuard)> {
        let subscription = self.store.subscribe(&self.collection, constraints)?;
        tracing::debug!(
            collection = %self.collection,
            constraints = constraints.len(),
            "Live visitor subscription opened"
        );
        Ok((
            SnapshotStream {
                events: subscription.events,
                finished: false,
            },
            SubscriptionGuard::new(subscription.unsubscribe),
        ))
    }
}
