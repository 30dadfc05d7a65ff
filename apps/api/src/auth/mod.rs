// Authentication helpers
// Tokens are issued by the identity provider and verified here

pub mod jwt;
