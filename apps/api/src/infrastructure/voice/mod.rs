// Voice provider adapters

pub mod vapi_client;

pub use vapi_client::VapiClient;
