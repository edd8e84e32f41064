//! Persistence seams for the marketplace collections
//!
//! Each collection is reached through a trait so the ledger can run against
//! PostgreSQL in production and against [`memory::MemoryMarketStore`] in
//! tests. Implementations must be strongly consistent per document.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Bid, NewBid, NewNotification, Notification, UserRequest, Worker};

pub mod bid;
pub mod memory;
pub mod notification;
pub mod request;
pub mod worker;

pub use bid::PgBidRepository;
pub use memory::MemoryMarketStore;
pub use notification::PgNotificationRepository;
pub use request::PgRequestRepository;
pub use worker::PgWorkerRepository;

/// Result of an acceptance commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Bid accepted, request stopped, listed siblings swept to Rejected
    Committed { rejected: Vec<Uuid> },
    /// Another transition stopped the request first
    RequestStopped,
    /// The bid is gone, belongs elsewhere or has left Pending
    BidNotPending,
}

/// Bid collection
#[async_trait]
pub trait BidStore: Send + Sync {
    /// Insert a Pending bid
    async fn create(&self, new_bid: NewBid) -> Result<Bid>;

    /// Find a bid by ID
    async fn find(&self, id: Uuid) -> Result<Option<Bid>>;

    /// Find a bid by ID only if `worker_id` placed it
    async fn find_owned(&self, id: Uuid, worker_id: Uuid) -> Result<Option<Bid>>;

    /// Delete a bid, returning whether it existed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Bids on a request in submission order
    async fn list_for_request(&self, request_id: Uuid) -> Result<Vec<Bid>>;

    /// Move a bid from Pending to Rejected while its request is still open
    ///
    /// False if the bid was not Pending or the request has been stopped.
    async fn reject_pending(&self, id: Uuid) -> Result<bool>;
}

/// User request collection
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Find a request by ID
    async fn find(&self, id: Uuid) -> Result<Option<UserRequest>>;

    /// Append a bid to a request that is still open; false if stopped or missing
    async fn append_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<bool>;

    /// Drop a bid from a request's collection
    async fn remove_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<()>;

    /// Stop a request, returning the updated record
    async fn stop(&self, request_id: Uuid) -> Result<Option<UserRequest>>;

    /// Accept `bid_id`, reject every sibling and stop the request as one unit
    ///
    /// Succeeds only while the request is not stopped at commit time.
    async fn accept_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<AcceptOutcome>;
}

/// Notification collection
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a notification on its recipient's list
    async fn create(&self, new_notification: NewNotification) -> Result<Notification>;

    /// Recipient's notifications, newest first
    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;

    /// Flip unread notifications owned by `recipient_id` to read
    ///
    /// Unknown or foreign identifiers are skipped. Returns how many flipped.
    async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> Result<u64>;
}

/// Worker profile collection
#[async_trait]
pub trait WorkerStore: Send + Sync {
    /// Find a worker by ID
    async fn find(&self, id: Uuid) -> Result<Option<Worker>>;

    /// Mark a worker verified, returning the updated record
    async fn mark_verified(&self, id: Uuid) -> Result<Option<Worker>>;
}
