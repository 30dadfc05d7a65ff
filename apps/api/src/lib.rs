//! Dialwave API Library
//!
//! Backend for outbound voice-AI calling campaigns: organizations import
//! leads from CSV, provision caller numbers, and run campaigns that dial
//! each lead through the Vapi voice API.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
