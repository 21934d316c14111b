//! In-process change feed and debounced report invalidation.
//!
//! Write handlers publish a `ChangeEvent` after every successful mutation.
//! The invalidator task coalesces bursts with a trailing-edge debounce and
//! evicts the affected cached reports once per burst.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::reports::ReportCache;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Restaurants,
    Templates,
    Assignments,
    Submissions,
    Notifications,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
}

impl ChangeEvent {
    pub fn new(table: ChangeTable, kind: ChangeKind, restaurant_id: Option<&str>) -> Self {
        Self {
            table,
            kind,
            restaurant_id: restaurant_id.map(str::to_string),
        }
    }
}

/// Broadcast channel carrying change events to any number of listeners.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Having no listeners is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::trace!("Change event: {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

/// What a burst of events invalidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub everything: bool,
    pub restaurants: HashSet<String>,
    pub events: usize,
}

impl Invalidation {
    pub fn add(&mut self, event: &ChangeEvent) {
        self.events += 1;
        match (event.table, &event.restaurant_id) {
            (ChangeTable::Notifications, _) => {}
            (ChangeTable::Templates, _) => self.everything = true,
            (_, Some(restaurant_id)) => {
                self.restaurants.insert(restaurant_id.clone());
            }
            (_, None) => self.everything = true,
        }
    }

    /// True when the burst touched nothing reports depend on.
    pub fn is_noop(&self) -> bool {
        !self.everything && self.restaurants.is_empty()
    }
}

/// Spawn the task that turns change events into cache evictions.
pub fn spawn_invalidator(
    feed: &ChangeFeed,
    cache: Arc<ReportCache>,
    window: Duration,
) -> JoinHandle<()> {
    let mut receiver = feed.subscribe();
    tokio::spawn(async move {
        while let Some(invalidation) = next_burst(&mut receiver, window).await {
            if invalidation.is_noop() {
                continue;
            }
            let evicted = cache.invalidate(&invalidation).await;
            tracing::debug!(
                "Coalesced {} change events, evicted {} cached reports",
                invalidation.events,
                evicted
            );
        }
        tracing::debug!("Change feed closed, invalidator stopping");
    })
}

/// Wait for the next event, then keep absorbing events until `window` passes
/// without one. Returns `None` once the feed is closed and drained.
pub async fn next_burst(
    receiver: &mut broadcast::Receiver<ChangeEvent>,
    window: Duration,
) -> Option<Invalidation> {
    let mut invalidation = Invalidation::default();

    match receiver.recv().await {
        Ok(event) => invalidation.add(&event),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!("Invalidator lagged by {} events, clearing all reports", skipped);
            invalidation.everything = true;
            invalidation.events += skipped as usize;
        }
        Err(RecvError::Closed) => return None,
    }

    let deadline = sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return Some(invalidation),
            received = receiver.recv() => match received {
                Ok(event) => {
                    invalidation.add(&event);
                    deadline.as_mut().reset(Instant::now() + window);
                }
                Err(RecvError::Lagged(skipped)) => {
                    invalidation.everything = true;
                    invalidation.events += skipped as usize;
                }
                Err(RecvError::Closed) => return Some(invalidation),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission_event(restaurant_id: &str) -> ChangeEvent {
        ChangeEvent::new(ChangeTable::Submissions, ChangeKind::Insert, Some(restaurant_id))
    }

    #[test]
    fn test_invalidation_scopes() {
        let mut invalidation = Invalidation::default();
        invalidation.add(&ChangeEvent::new(
            ChangeTable::Notifications,
            ChangeKind::Update,
            Some("r1"),
        ));
        assert!(invalidation.is_noop());

        invalidation.add(&submission_event("r1"));
        invalidation.add(&submission_event("r2"));
        assert!(!invalidation.everything);
        assert_eq!(invalidation.restaurants.len(), 2);

        invalidation.add(&ChangeEvent::new(ChangeTable::Templates, ChangeKind::Update, None));
        assert!(invalidation.everything);
        assert_eq!(invalidation.events, 4);
    }

    #[tokio::test]
    async fn test_burst_is_coalesced_into_one_invalidation() {
        let feed = ChangeFeed::new(64);
        let mut receiver = feed.subscribe();

        for _ in 0..5 {
            feed.publish(submission_event("r1"));
        }
        feed.publish(submission_event("r2"));

        let burst = next_burst(&mut receiver, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(burst.events, 6);
        assert_eq!(burst.restaurants.len(), 2);
    }

    #[tokio::test]
    async fn test_closed_feed_ends_bursts() {
        let feed = ChangeFeed::new(8);
        let mut receiver = feed.subscribe();
        feed.publish(submission_event("r1"));
        drop(feed);

        let burst = next_burst(&mut receiver, Duration::from_millis(10)).await;
        assert_eq!(burst.map(|b| b.events), Some(1));
        assert!(next_burst(&mut receiver, Duration::from_millis(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_invalidates_everything() {
        let feed = ChangeFeed::new(2);
        let mut receiver = feed.subscribe();
        for _ in 0..5 {
            feed.publish(submission_event("r1"));
        }

        let burst = next_burst(&mut receiver, Duration::from_millis(10))
            .await
            .unwrap();
        assert!(burst.everything);
    }
}
