#![allow(clippy::module_inception)]

pub mod call;

pub use call::{Call, CallOutcome, CallStatus};
