// Request extractors for authentication and tenant scoping

pub mod auth;
pub mod tenant;

pub use auth::JwtAuth;
pub use tenant::OrgMember;
