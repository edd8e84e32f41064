//! Marketplace core
//!
//! The bid ledger and the notification fan-out, behind the identity gate
//! from the `auth` crate.

pub mod error;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod workers;

pub use error::{ApiError, ApiResult};
pub use ledger::BidLedger;
pub use notifications::NotificationHub;
pub use state::AppState;
pub use workers::WorkerDesk;
