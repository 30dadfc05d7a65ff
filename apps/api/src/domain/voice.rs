//! Port for the third-party voice-AI calling provider.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Voice provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Voice provider request failed: {0}")]
    Request(String),

    #[error("Voice provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response from voice provider: {0}")]
    InvalidResponse(String),
}

impl VoiceError {
    /// Whether retrying the same request later could succeed
    ///
    /// Network failures, rate limiting and provider-side errors are transient;
    /// rejected requests and missing configuration are not.
    pub fn is_transient(&self) -> bool {
        match self {
            VoiceError::Request(_) => true,
            VoiceError::Api { status, .. } => *status == 429 || *status >= 500,
            VoiceError::NotConfigured(_) | VoiceError::InvalidResponse(_) => false,
        }
    }
}

pub type VoiceResult<T> = Result<T, VoiceError>;

/// Everything the provider needs to dial one lead
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCallRequest {
    pub assistant_id: String,
    pub phone_number_provider_id: String,
    pub customer_number: String,
    pub customer_name: Option<String>,
    /// Passed to the assistant as template variables
    pub variables: Map<String, Value>,
}

/// Provider acknowledgement of a placed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
    pub provider_call_id: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberRequest {
    pub area_code: Option<String>,
    pub label: Option<String>,
}

/// A number the provider has allocated to the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberGrant {
    pub provider_id: String,
    pub number: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Asks the provider to dial a customer
    async fn place_call(&self, request: &OutboundCallRequest) -> VoiceResult<PlacedCall>;

    /// Buys a new number for outbound calls
    async fn provision_number(&self, request: &NumberRequest) -> VoiceResult<NumberGrant>;

    /// Releases a number back to the provider
    async fn release_number(&self, provider_id: &str) -> VoiceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_transient() {
        assert!(VoiceError::Request("connection reset".to_string()).is_transient());
    }

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        let api = |status| VoiceError::Api {
            status,
            body: String::new(),
        };
        assert!(api(429).is_transient());
        assert!(api(500).is_transient());
        assert!(api(503).is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        let api = |status| VoiceError::Api {
            status,
            body: String::new(),
        };
        assert!(!api(400).is_transient());
        assert!(!api(404).is_transient());
        assert!(!VoiceError::NotConfigured("VAPI_API_KEY".to_string()).is_transient());
        assert!(!VoiceError::InvalidResponse("missing id".to_string()).is_transient());
    }
}
