//! Bid ledger
//!
//! Owns every bid transition. For any request at most one bid is ever
//! Accepted, and accepting it rejects all siblings and stops the request in
//! one commit that only succeeds while the request is still open.

use std::sync::Arc;
use std::time::Duration;

use auth::models::User;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Bid, BidInput, BidStatus, NewNotification, Resolution, UserRequest},
    notifications::NotificationHub,
    repositories::{AcceptOutcome, BidStore, RequestStore},
};

/// Attempts made at the acceptance commit before giving up
const ACCEPT_ATTEMPTS: u32 = 3;
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Clone)]
pub struct BidLedger {
    bids: Arc<dyn BidStore>,
    requests: Arc<dyn RequestStore>,
    notifications: NotificationHub,
}

impl BidLedger {
    pub fn new(
        bids: Arc<dyn BidStore>,
        requests: Arc<dyn RequestStore>,
        notifications: NotificationHub,
    ) -> Self {
        Self {
            bids,
            requests,
            notifications,
        }
    }

    /// Place a Pending bid on an open request and notify its owner
    ///
    /// Returns the request with the new bid appended.
    pub async fn submit(&self, bidder: &User, input: BidInput) -> ApiResult<UserRequest> {
        input.validate().map_err(ApiError::BadRequest)?;

        let request = self.open_request(input.request_id).await?;
        if request.user_id == bidder.id {
            return Err(ApiError::Conflict(
                "You cannot bid on your own request".to_string(),
            ));
        }

        let bid = self.bids.create(input.into_new_bid(bidder.id)).await?;

        // The request may have been stopped since it was read
        if !self.requests.append_bid(request.id, bid.id).await? {
            self.bids.delete(bid.id).await?;
            return Err(request_closed());
        }

        let updated = self
            .requests
            .find(request.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        info!("Bid {} placed on request {} by {}", bid.id, request.id, bidder.id);
        self.notify(NewNotification::new_bid(&updated, bidder)).await;

        Ok(updated)
    }

    /// Delete a bid its creator no longer stands by, whatever its status
    pub async fn withdraw(&self, bid_id: Uuid, requester: &User) -> ApiResult<()> {
        let bid = self
            .bids
            .find_owned(bid_id, requester.id)
            .await?
            .ok_or_else(bid_not_found)?;

        self.requests.remove_bid(bid.request_id, bid.id).await?;
        self.bids.delete(bid.id).await?;

        info!("Bid {} ({}) withdrawn by {}", bid.id, bid.status, requester.id);
        Ok(())
    }

    /// Accept or reject a Pending bid on behalf of the request owner
    pub async fn resolve(
        &self,
        bid_id: Uuid,
        resolution: Resolution,
        owner: &User,
    ) -> ApiResult<Bid> {
        let bid = self.bids.find(bid_id).await?.ok_or_else(bid_not_found)?;
        let request = self
            .requests
            .find(bid.request_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        if request.user_id != owner.id {
            return Err(ApiError::Forbidden(
                "Only the request owner can resolve its bids".to_string(),
            ));
        }
        if request.is_stopped {
            return Err(request_closed());
        }
        if bid.status.is_terminal() {
            return Err(bid_settled(bid.status));
        }

        match resolution {
            Resolution::Accepted => {
                let rejected = self.commit_acceptance(request.id, bid.id).await?;
                info!(
                    "Bid {} accepted, request {} stopped, {} siblings rejected",
                    bid.id,
                    request.id,
                    rejected.len()
                );
            }
            Resolution::Rejected => {
                // Re-checks both the bid and its request at write time
                if !self.bids.reject_pending(bid.id).await? {
                    return Err(ApiError::Conflict(
                        "Bid can no longer be rejected".to_string(),
                    ));
                }
                info!("Bid {} rejected on request {}", bid.id, request.id);
            }
        }

        let resolved = self.bids.find(bid.id).await?.ok_or_else(bid_not_found)?;
        self.notify(NewNotification::bid_status_changed(&resolved, owner))
            .await;

        Ok(resolved)
    }

    /// Stop a request so it takes no further bid transitions
    pub async fn stop_request(&self, request_id: Uuid, owner: &User) -> ApiResult<UserRequest> {
        let request = self
            .requests
            .find(request_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        if request.user_id != owner.id {
            return Err(ApiError::Forbidden(
                "Only the request owner can stop it".to_string(),
            ));
        }

        let stopped = self
            .requests
            .stop(request_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        info!("Request {} stopped by its owner", request_id);
        Ok(stopped)
    }

    /// Bids on a request in submission order
    pub async fn bids_for_request(&self, request_id: Uuid) -> ApiResult<Vec<Bid>> {
        if self.requests.find(request_id).await?.is_none() {
            return Err(ApiError::NotFound("Request not found".to_string()));
        }

        Ok(self.bids.list_for_request(request_id).await?)
    }

    async fn open_request(&self, request_id: Uuid) -> ApiResult<UserRequest> {
        let request = self
            .requests
            .find(request_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        if request.is_stopped {
            return Err(request_closed());
        }

        Ok(request)
    }

    /// Run the acceptance commit, retrying transient storage failures
    ///
    /// The commit is all-or-nothing, so a retry never sees a partial sweep.
    /// A failed attempt may still have committed; a later `RequestStopped`
    /// is then checked against the bid itself.
    async fn commit_acceptance(&self, request_id: Uuid, bid_id: Uuid) -> ApiResult<Vec<Uuid>> {
        let mut attempt = 1;

        loop {
            match self.requests.accept_bid(request_id, bid_id).await {
                Ok(AcceptOutcome::Committed { rejected }) => return Ok(rejected),
                Ok(AcceptOutcome::RequestStopped) => {
                    if attempt > 1 && self.is_accepted(bid_id).await? {
                        warn!("Acceptance of bid {} committed on an earlier attempt", bid_id);
                        return Ok(Vec::new());
                    }
                    warn!("Lost acceptance race on request {} for bid {}", request_id, bid_id);
                    return Err(request_closed());
                }
                Ok(AcceptOutcome::BidNotPending) => {
                    return Err(ApiError::Conflict("Bid is no longer pending".to_string()));
                }
                Err(e) if attempt < ACCEPT_ATTEMPTS => {
                    warn!(
                        "Acceptance commit for bid {} failed (attempt {}/{}): {}",
                        bid_id, attempt, ACCEPT_ATTEMPTS, e
                    );
                    tokio::time::sleep(ACCEPT_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(ApiError::Storage(e)),
            }
        }
    }

    async fn is_accepted(&self, bid_id: Uuid) -> ApiResult<bool> {
        Ok(matches!(
            self.bids.find(bid_id).await?,
            Some(bid) if bid.status == BidStatus::Accepted
        ))
    }

    /// Fan out a notification; the transition already committed
    async fn notify(&self, notification: NewNotification) {
        let recipient = notification.recipient_id;
        if let Err(e) = self.notifications.emit(notification).await {
            error!("Failed to record notification for {}: {:#}", recipient, e);
        }
    }
}

fn bid_not_found() -> ApiError {
    ApiError::NotFound("Bid not found".to_string())
}

fn request_closed() -> ApiError {
    ApiError::Conflict("Request is no longer accepting bids".to_string())
}

fn bid_settled(status: BidStatus) -> ApiError {
    ApiError::Conflict(format!("Bid is already {}", status))
}
