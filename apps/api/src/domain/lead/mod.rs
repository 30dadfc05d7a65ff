// Lead domain module
// Contains the lead aggregate, phone normalization, and value objects

#![allow(clippy::module_inception)]

pub mod lead;
pub mod phone;
pub mod value_objects;

pub use lead::Lead;
pub use phone::{PhoneError, PhoneNumber};
pub use value_objects::{Email, LeadStatus};
