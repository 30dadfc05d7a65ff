//! Vapi REST client implementing the voice gateway port

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::VoiceSettings;
use crate::domain::voice::{
    NumberGrant, NumberRequest, OutboundCallRequest, PlacedCall, VoiceError, VoiceGateway,
    VoiceResult,
};

/// Client for the Vapi outbound calling API
#[derive(Clone)]
pub struct VapiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl VapiClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_settings(settings: &VoiceSettings) -> Self {
        Self::new(&settings.base_url, settings.api_key.clone(), settings.timeout)
    }

    fn authorized(&self, builder: RequestBuilder) -> VoiceResult<RequestBuilder> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VoiceError::NotConfigured("VAPI_API_KEY is not set".to_string()))?;
        Ok(builder.bearer_auth(key))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> VoiceResult<T> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| VoiceError::InvalidResponse(e.to_string()))
    }

    async fn send(&self, builder: RequestBuilder) -> VoiceResult<Response> {
        let response = self
            .authorized(builder)?
            .send()
            .await
            .map_err(|e| VoiceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl VoiceGateway for VapiClient {
    async fn place_call(&self, request: &OutboundCallRequest) -> VoiceResult<PlacedCall> {
        let body = CreateCallBody::from(request);
        let created: CreatedCall = self
            .send_json(self.client.post(format!("{}/call", self.base_url)).json(&body))
            .await?;

        tracing::debug!(provider_call_id = %created.id, status = ?created.status, "Vapi call created");

        Ok(PlacedCall {
            provider_call_id: created.id,
            status: created.status,
        })
    }

    async fn provision_number(&self, request: &NumberRequest) -> VoiceResult<NumberGrant> {
        let body = CreatePhoneNumberBody {
            provider: "vapi",
            number_desired_area_code: request.area_code.as_deref(),
            name: request.label.as_deref(),
        };
        let created: CreatedPhoneNumber = self
            .send_json(
                self.client
                    .post(format!("{}/phone-number", self.base_url))
                    .json(&body),
            )
            .await?;

        let number = created.number.ok_or_else(|| {
            VoiceError::InvalidResponse(format!("phone number {} has no number", created.id))
        })?;

        Ok(NumberGrant {
            provider_id: created.id,
            number,
        })
    }

    async fn release_number(&self, provider_id: &str) -> VoiceResult<()> {
        self.send(
            self.client
                .delete(format!("{}/phone-number/{}", self.base_url, provider_id)),
        )
        .await?;
        Ok(())
    }
}

// ============================================================================
// Vapi wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCallBody<'a> {
    assistant_id: &'a str,
    phone_number_id: &'a str,
    customer: Customer<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assistant_overrides: Option<AssistantOverrides<'a>>,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
    number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssistantOverrides<'a> {
    variable_values: &'a Map<String, Value>,
}

impl<'a> From<&'a OutboundCallRequest> for CreateCallBody<'a> {
    fn from(request: &'a OutboundCallRequest) -> Self {
        Self {
            assistant_id: &request.assistant_id,
            phone_number_id: &request.phone_number_provider_id,
            customer: Customer {
                number: &request.customer_number,
                name: request.customer_name.as_deref(),
            },
            assistant_overrides: (!request.variables.is_empty()).then(|| AssistantOverrides {
                variable_values: &request.variables,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedCall {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePhoneNumberBody<'a> {
    provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_desired_area_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreatedPhoneNumber {
    id: String,
    #[serde(default)]
    number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(variables: Map<String, Value>) -> OutboundCallRequest {
        OutboundCallRequest {
            assistant_id: "asst_1".to_string(),
            phone_number_provider_id: "pn_1".to_string(),
            customer_number: "+447946145678".to_string(),
            customer_name: Some("Jane Doe".to_string()),
            variables,
        }
    }

    #[test]
    fn call_body_uses_vapi_field_names() {
        let req = request(Map::new());
        let body = serde_json::to_value(CreateCallBody::from(&req)).unwrap();

        assert_eq!(
            body,
            json!({
                "assistantId": "asst_1",
                "phoneNumberId": "pn_1",
                "customer": { "number": "+447946145678", "name": "Jane Doe" }
            })
        );
    }

    #[test]
    fn call_body_passes_variables_as_overrides() {
        let mut variables = Map::new();
        variables.insert("company".to_string(), json!("Acme"));
        let req = request(variables);

        let body = serde_json::to_value(CreateCallBody::from(&req)).unwrap();
        assert_eq!(
            body["assistantOverrides"]["variableValues"]["company"],
            json!("Acme")
        );
    }

    #[test]
    fn phone_number_body_skips_missing_fields() {
        let body = serde_json::to_value(CreatePhoneNumberBody {
            provider: "vapi",
            number_desired_area_code: Some("415"),
            name: None,
        })
        .unwrap();

        assert_eq!(body, json!({ "provider": "vapi", "numberDesiredAreaCode": "415" }));
    }

    #[test]
    fn created_call_tolerates_extra_fields() {
        let created: CreatedCall = serde_json::from_value(json!({
            "id": "call_1",
            "status": "queued",
            "orgId": "org_1",
            "type": "outboundPhoneCall"
        }))
        .unwrap();

        assert_eq!(created.id, "call_1");
        assert_eq!(created.status.as_deref(), Some("queued"));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = VapiClient::new("http://localhost:9000/", None, Duration::from_secs(1));
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = VapiClient::new("http://127.0.0.1:9", None, Duration::from_secs(1));

        let err = client.place_call(&request(Map::new())).await.unwrap_err();
        assert!(matches!(err, VoiceError::NotConfigured(_)));
        assert!(!err.is_transient());
    }
}
