#![allow(clippy::module_inception)]

pub mod notification;

pub use notification::{Notification, NotificationKind};
