// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod call;
pub mod campaign;
pub mod errors;
pub mod lead;
pub mod notification;
pub mod organization;
pub mod phone_number;
pub mod repositories;
pub mod voice;
