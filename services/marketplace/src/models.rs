//! Marketplace models

pub mod bid;
pub mod notification;
pub mod request;
pub mod worker;

pub use bid::{Bid, BidInput, BidStatus, NewBid, Resolution};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use request::UserRequest;
pub use worker::Worker;
