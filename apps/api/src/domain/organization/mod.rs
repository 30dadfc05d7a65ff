#![allow(clippy::module_inception)]

pub mod organization;

pub use organization::{MemberRole, Membership, Organization};
