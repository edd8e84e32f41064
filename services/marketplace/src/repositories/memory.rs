//! In-process marketplace store for tests and local runs
//!
//! All four collections share one mutex, so an acceptance commit is a single
//! critical section exactly like the PostgreSQL transaction.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{AcceptOutcome, BidStore, NotificationStore, RequestStore, WorkerStore};
use crate::models::{Bid, BidStatus, NewBid, NewNotification, Notification, UserRequest, Worker};

#[derive(Default)]
struct Market {
    requests: HashMap<Uuid, UserRequest>,
    /// Insertion order doubles as submission order
    bids: Vec<Bid>,
    notifications: Vec<Notification>,
    workers: HashMap<Uuid, Worker>,
}

impl Market {
    fn bid_mut(&mut self, id: Uuid) -> Option<&mut Bid> {
        self.bids.iter_mut().find(|bid| bid.id == id)
    }
}

/// Marketplace store held in memory
#[derive(Clone, Default)]
pub struct MemoryMarketStore {
    inner: Arc<Mutex<Market>>,
}

impl MemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a request
    pub fn put_request(&self, request: UserRequest) {
        self.inner.lock().requests.insert(request.id, request);
    }

    /// Insert or replace a worker profile
    pub fn put_worker(&self, worker: Worker) {
        self.inner.lock().workers.insert(worker.id, worker);
    }

    pub fn request(&self, id: Uuid) -> Option<UserRequest> {
        self.inner.lock().requests.get(&id).cloned()
    }

    pub fn bid(&self, id: Uuid) -> Option<Bid> {
        self.inner.lock().bids.iter().find(|bid| bid.id == id).cloned()
    }

    /// Every stored notification, oldest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().notifications.clone()
    }
}

#[async_trait]
impl BidStore for MemoryMarketStore {
    async fn create(&self, new_bid: NewBid) -> Result<Bid> {
        let bid = Bid {
            id: Uuid::new_v4(),
            user_id: new_bid.user_id,
            request_id: new_bid.request_id,
            info: new_bid.info,
            proposed_budget: new_bid.proposed_budget,
            proposed_time: new_bid.proposed_time,
            status: BidStatus::Pending,
            created_at: Utc::now(),
        };

        self.inner.lock().bids.push(bid.clone());
        Ok(bid)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Bid>> {
        Ok(self.bid(id))
    }

    async fn find_owned(&self, id: Uuid, worker_id: Uuid) -> Result<Option<Bid>> {
        Ok(self.bid(id).filter(|bid| bid.user_id == worker_id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut market = self.inner.lock();
        let before = market.bids.len();
        market.bids.retain(|bid| bid.id != id);
        Ok(market.bids.len() != before)
    }

    async fn list_for_request(&self, request_id: Uuid) -> Result<Vec<Bid>> {
        Ok(self
            .inner
            .lock()
            .bids
            .iter()
            .filter(|bid| bid.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn reject_pending(&self, id: Uuid) -> Result<bool> {
        let mut market = self.inner.lock();
        let request_id = match market.bids.iter().find(|bid| bid.id == id) {
            Some(bid) => bid.request_id,
            None => return Ok(false),
        };
        let open = market
            .requests
            .get(&request_id)
            .is_some_and(|request| !request.is_stopped);

        match market.bid_mut(id) {
            Some(bid) if open && bid.status == BidStatus::Pending => {
                bid.status = BidStatus::Rejected;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl RequestStore for MemoryMarketStore {
    async fn find(&self, id: Uuid) -> Result<Option<UserRequest>> {
        Ok(self.request(id))
    }

    async fn append_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<bool> {
        let mut market = self.inner.lock();
        match market.requests.get_mut(&request_id) {
            Some(request) if !request.is_stopped => {
                request.bids.push(bid_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<()> {
        if let Some(request) = self.inner.lock().requests.get_mut(&request_id) {
            request.bids.retain(|id| *id != bid_id);
        }
        Ok(())
    }

    async fn stop(&self, request_id: Uuid) -> Result<Option<UserRequest>> {
        let mut market = self.inner.lock();
        Ok(market.requests.get_mut(&request_id).map(|request| {
            request.is_stopped = true;
            request.clone()
        }))
    }

    async fn accept_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<AcceptOutcome> {
        let mut market = self.inner.lock();

        let snapshot = match market.requests.get(&request_id) {
            Some(request) if !request.is_stopped => request.bids.clone(),
            _ => return Ok(AcceptOutcome::RequestStopped),
        };

        match market.bid_mut(bid_id) {
            Some(bid) if bid.request_id == request_id && bid.status == BidStatus::Pending => {
                bid.status = BidStatus::Accepted;
            }
            _ => return Ok(AcceptOutcome::BidNotPending),
        }

        let mut rejected = Vec::new();
        for bid in market.bids.iter_mut() {
            let sibling = bid.request_id == request_id || snapshot.contains(&bid.id);
            if sibling && bid.id != bid_id && bid.status == BidStatus::Pending {
                bid.status = BidStatus::Rejected;
                rejected.push(bid.id);
            }
        }

        if let Some(request) = market.requests.get_mut(&request_id) {
            request.is_stopped = true;
        }

        Ok(AcceptOutcome::Committed { rejected })
    }
}

#[async_trait]
impl NotificationStore for MemoryMarketStore {
    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: new.recipient_id,
            title: new.title,
            description: new.description,
            avatar: new.avatar,
            kind: new.kind,
            url: new.url,
            user_request_id: new.user_request_id,
            is_read: false,
            created_at: Utc::now(),
        };

        self.inner.lock().notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self
            .inner
            .lock()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> Result<u64> {
        let mut market = self.inner.lock();
        let mut flipped = 0;
        for notification in market.notifications.iter_mut() {
            if notification.recipient_id == recipient_id
                && !notification.is_read
                && ids.contains(&notification.id)
            {
                notification.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }
}

#[async_trait]
impl WorkerStore for MemoryMarketStore {
    async fn find(&self, id: Uuid) -> Result<Option<Worker>> {
        Ok(self.inner.lock().workers.get(&id).cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Option<Worker>> {
        let mut market = self.inner.lock();
        Ok(market.workers.get_mut(&id).map(|worker| {
            worker.is_verified = true;
            worker.clone()
        }))
    }
}
