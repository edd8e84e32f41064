//! Bids and their lifecycle states

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bid lifecycle state
///
/// `Pending` moves to exactly one of the two terminal states and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Pending => "Pending",
            BidStatus::Accepted => "Accepted",
            BidStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BidStatus::Pending)
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BidStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BidStatus::Pending),
            "Accepted" => Ok(BidStatus::Accepted),
            "Rejected" => Ok(BidStatus::Rejected),
            other => Err(anyhow::anyhow!("unknown bid status: {}", other)),
        }
    }
}

/// Outcome a request owner can give a pending bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Accepted,
    Rejected,
}

impl From<Resolution> for BidStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Accepted => BidStatus::Accepted,
            Resolution::Rejected => BidStatus::Rejected,
        }
    }
}

/// Bid entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    /// Worker who placed the bid
    pub user_id: Uuid,
    /// Request the bid targets; fixed at creation
    pub request_id: Uuid,
    pub info: String,
    pub proposed_budget: String,
    pub proposed_time: Option<String>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
}

/// New bid creation payload
#[derive(Debug, Clone)]
pub struct NewBid {
    pub user_id: Uuid,
    pub request_id: Uuid,
    pub info: String,
    pub proposed_budget: String,
    pub proposed_time: Option<String>,
}

/// Request body for placing a bid
#[derive(Debug, Clone, Deserialize)]
pub struct BidInput {
    pub request_id: Uuid,
    pub info: String,
    pub proposed_budget: String,
    pub proposed_time: Option<String>,
}

impl BidInput {
    /// Check field bounds, returning a caller-facing message on failure
    pub fn validate(&self) -> Result<(), String> {
        let info_len = self.info.trim().chars().count();
        if !(3..=500).contains(&info_len) {
            return Err("info must be between 3 and 500 characters".to_string());
        }

        if self.proposed_budget.trim().is_empty() {
            return Err("proposed_budget is required".to_string());
        }

        Ok(())
    }

    pub fn into_new_bid(self, user_id: Uuid) -> NewBid {
        NewBid {
            user_id,
            request_id: self.request_id,
            info: self.info.trim().to_string(),
            proposed_budget: self.proposed_budget.trim().to_string(),
            proposed_time: self.proposed_time,
        }
    }
}
