//! Notification records

use std::str::FromStr;

use auth::models::{Admin, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Bid, UserRequest, Worker};

/// Event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewBid,
    BidStatusChanged,
    WorkerVerified,
    ChatMessage,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewBid => "new_bid",
            NotificationKind::BidStatusChanged => "bid_status_changed",
            NotificationKind::WorkerVerified => "worker_verified",
            NotificationKind::ChatMessage => "chat_message",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_bid" => Ok(NotificationKind::NewBid),
            "bid_status_changed" => Ok(NotificationKind::BidStatusChanged),
            "worker_verified" => Ok(NotificationKind::WorkerVerified),
            "chat_message" => Ok(NotificationKind::ChatMessage),
            other => Err(anyhow::anyhow!("unknown notification kind: {}", other)),
        }
    }
}

/// Notification entity
///
/// Owned by exactly one recipient. Only `is_read` ever changes, and only
/// from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub description: String,
    pub avatar: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Client-side navigation target
    pub url: String,
    pub user_request_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// New notification creation payload
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub avatar: Option<String>,
    pub url: String,
    pub user_request_id: Option<Uuid>,
}

impl NewNotification {
    /// Tell a request owner that `bidder` placed a bid
    pub fn new_bid(request: &UserRequest, bidder: &User) -> Self {
        Self {
            recipient_id: request.user_id,
            kind: NotificationKind::NewBid,
            title: "New Bidding Request !".to_string(),
            description: format!("Made By {}", bidder.name),
            avatar: bidder.image_url.clone(),
            url: format!("/smurf-app/user-request/{}", request.id),
            user_request_id: Some(request.id),
        }
    }

    /// Tell a worker that the request owner resolved their bid
    pub fn bid_status_changed(bid: &Bid, owner: &User) -> Self {
        Self {
            recipient_id: bid.user_id,
            kind: NotificationKind::BidStatusChanged,
            title: format!("Your bidding request got {}", bid.status),
            description: format!("Made By {}", owner.name),
            avatar: owner.image_url.clone(),
            url: format!("/user-request/{}", bid.request_id),
            user_request_id: Some(bid.request_id),
        }
    }

    /// Tell a worker that an admin verified their profile
    pub fn worker_verified(worker: &Worker, admin: &Admin) -> Self {
        Self {
            recipient_id: worker.user_id,
            kind: NotificationKind::WorkerVerified,
            title: "You are Verified as Worker".to_string(),
            description: format!("You can now use this app as worker (by {})", admin.name),
            avatar: worker.image_url.clone(),
            url: "/FREELANCERWORKPLACE".to_string(),
            user_request_id: None,
        }
    }
}
