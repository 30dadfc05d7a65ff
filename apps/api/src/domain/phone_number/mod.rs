#![allow(clippy::module_inception)]

pub mod phone_number;

pub use phone_number::ProvisionedNumber;
