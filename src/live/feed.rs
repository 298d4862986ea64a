//! Per-screen owner of the live visitor list

use tokio_stream::StreamExt;

use super::channel::{LiveResultChannel, SnapshotStream, SubscriptionGuard};
use crate::{
    error::AppError,
    models::{filter::FilterState, visitor::Visitor},
    query::build_constraints,
    services::search::refine,
};

/// What the visitor list currently shows
#[derive(Debug)]
pub enum FeedState {
    /// Waiting for the first snapshot of the current subscription
    Loading,
    Ready(Vec<Visitor>),
    /// Stopped until [`VisitorFeed::retry`]
    Failed(AppError),
}

/// Holds the visitor list of one screen and the single live subscription
/// feeding it.
///
/// Changing the filter cancels the current subscription before opening the
/// next one, so two snapshot streams never race to update the same list.
/// Each snapshot replaces the visible list wholesale.
pub struct VisitorFeed {
    channel: LiveResultChannel,
    filter: FilterState,
    active: Option<(SnapshotStream, SubscriptionGuard)>,
    state: FeedState,
}

impl VisitorFeed {
    /// Create a feed and open its first subscription
    pub fn open(channel: LiveResultChannel, filter: FilterState) -> Self {
        let mut feed = Self {
            channel,
            filter,
            active: None,
            state: FeedState::Loading,
        };
        feed.resubscribe();
        feed
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Visitors currently shown, empty while loading or failed
    pub fn visitors(&self) -> &[Visitor] {
        match &self.state {
            FeedState::Ready(visitors) => visitors,
            FeedState::Loading | FeedState::Failed(_) => &[],
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// Apply a new filter. An equal filter keeps the current subscription.
    pub fn set_filter(&mut self, filter: FilterState) {
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.resubscribe();
    }

    /// Re-open the subscription with the current filter
    pub fn retry(&mut self) {
        tracing::info!("Retrying live visitor query");
        self.resubscribe();
    }

    /// Cancel the subscription; the last state stays visible
    pub fn close(&mut self) {
        self.release();
    }

    /// Wait for the next snapshot or error and apply it. Returns `None` once
    /// there is no open subscription.
    pub async fn next_update(&mut self) -> Option<&FeedState> {
        let (stream, _) = self.active.as_mut()?;
        let event = stream.next().await;
        match event {
            Some(Ok(snapshot)) => {
                if snapshot.dropped > 0 {
                    tracing::warn!(dropped = snapshot.dropped, "Snapshot contained malformed visitors");
                }
                let visible = refine(snapshot.visitors, self.filter.search_text());
                self.state = FeedState::Ready(visible);
            }
            Some(Err(err)) => {
                self.release();
                self.state = FeedState::Failed(err);
            }
            None => {
                self.release();
                return None;
            }
        }
        Some(&self.state)
    }

    fn release(&mut self) {
        if let Some((_, guard)) = self.active.take() {
            guard.cancel();
        }
    }

    fn resubscribe(&mut self) {
        self.release();
        self.state = FeedState::Loading;
        let constraints = build_constraints(&self.filter);
        match self.channel.subscribe(&constraints) {
            Ok(active) => self.active = Some(active),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to open live visitor query");
                self.state = FeedState::Failed(err);
            }
        }
    }
}
