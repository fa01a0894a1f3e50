//! Inbound notification handling.

pub mod receiver;

pub use receiver::{Disposition, NotificationReceiver};
