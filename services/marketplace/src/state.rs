//! Application state shared across handlers

use auth::IdentityGate;

use crate::{
    ledger::BidLedger, notifications::NotificationHub, realtime::LocalHub, workers::WorkerDesk,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: IdentityGate,
    pub ledger: BidLedger,
    pub notifications: NotificationHub,
    pub workers: WorkerDesk,
    /// Live connections held by this instance
    pub hub: LocalHub,
}
