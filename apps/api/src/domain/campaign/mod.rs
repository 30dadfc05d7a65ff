// Campaign domain module
// Contains campaign aggregate root, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod campaign;
pub mod events;
pub mod value_objects;

// Re-export main types for convenience
pub use campaign::{Campaign, CampaignChanges};
pub use events::CampaignEvent;
pub use value_objects::CampaignStatus;
