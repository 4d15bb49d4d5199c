//! In-process live-update hub.
//!
//! # Purpose
//! Stands in for the external push channel: after a notification batch is
//! durably written, the fan-out publishes one event to every in-process
//! subscriber of the affected band. Each subscriber has a bounded queue and
//! publish never waits: a full queue drops the event (counted), a closed
//! queue unregisters the subscriber. No delivery guarantee is implied; the
//! durable notification rows are the record.
use crate::model::NotificationKind;
use encore_common::ids::{BandId, RehearsalId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::mpsc;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// One event as pushed to live subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalEvent {
    pub band_id: BandId,
    pub rehearsal_id: RehearsalId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Default)]
struct BandChannel {
    next_id: u64,
    senders: HashMap<u64, mpsc::Sender<RehearsalEvent>>,
}

type BandChannels = RwLock<HashMap<BandId, BandChannel>>;

pub struct LiveUpdates {
    bands: Arc<BandChannels>,
    queue_capacity: usize,
}

impl Default for LiveUpdates {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveUpdates {
    pub fn new() -> Self {
        Self {
            bands: Arc::new(RwLock::new(HashMap::new())),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    // `mpsc::channel` requires a non-zero capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Registers a subscriber for one band. The subscription unregisters
    /// itself when dropped.
    pub fn subscribe(&self, band_id: BandId) -> LiveSubscription {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let subscriber_id = match self.bands.write() {
            Ok(mut guard) => {
                let channel = guard.entry(band_id).or_default();
                let id = channel.next_id;
                channel.next_id += 1;
                channel.senders.insert(id, tx);
                id
            }
            Err(_) => 0,
        };
        LiveSubscription {
            receiver: rx,
            guard: SubscriptionGuard {
                bands: Arc::downgrade(&self.bands),
                band_id,
                subscriber_id,
            },
        }
    }

    /// Delivers the event to current subscribers of its band.
    ///
    /// Returns how many queues accepted it. Full queues drop the event and
    /// bump `encore_live_events_dropped_total`; closed queues are pruned.
    pub fn publish(&self, event: RehearsalEvent) -> usize {
        // Snapshot the senders so no lock is held while enqueuing.
        let senders: Vec<(u64, mpsc::Sender<RehearsalEvent>)> = match self.bands.read() {
            Ok(guard) => match guard.get(&event.band_id) {
                Some(channel) => channel
                    .senders
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return 0,
            },
            Err(_) => return 0,
        };

        let mut sent = 0usize;
        let mut closed = Vec::new();
        for (id, tx) in &senders {
            match tx.try_send(event.clone()) {
                Ok(()) => sent += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    metrics::counter!("encore_live_events_dropped_total").increment(1);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        if !closed.is_empty() {
            if let Ok(mut guard) = self.bands.write() {
                if let Some(channel) = guard.get_mut(&event.band_id) {
                    for id in &closed {
                        channel.senders.remove(id);
                    }
                    if channel.senders.is_empty() {
                        guard.remove(&event.band_id);
                    }
                }
            }
        }
        sent
    }

    #[cfg(test)]
    fn subscriber_count(&self, band_id: BandId) -> usize {
        self.bands
            .read()
            .map(|guard| guard.get(&band_id).map_or(0, |c| c.senders.len()))
            .unwrap_or(0)
    }
}

/// Receiver handle; unregisters its sender when dropped.
pub struct LiveSubscription {
    receiver: mpsc::Receiver<RehearsalEvent>,
    #[allow(dead_code)]
    guard: SubscriptionGuard,
}

impl LiveSubscription {
    pub async fn recv(&mut self) -> Option<RehearsalEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<RehearsalEvent, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

struct SubscriptionGuard {
    bands: Weak<BandChannels>,
    band_id: BandId,
    subscriber_id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let Some(bands) = self.bands.upgrade() else {
            return;
        };
        if let Ok(mut guard) = bands.write() {
            if let Some(channel) = guard.get_mut(&self.band_id) {
                channel.senders.remove(&self.subscriber_id);
                if channel.senders.is_empty() {
                    guard.remove(&self.band_id);
                }
            }
        };
    }
}
