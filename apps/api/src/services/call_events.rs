//! Voice provider call events (status updates and end-of-call reports)

use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::call::{CallOutcome, CallStatus};
use crate::domain::repositories::{CallRepository, LeadRepository, RepoResult};

/// Envelope of every provider webhook
#[derive(Debug, Deserialize)]
pub struct VoiceEvent {
    pub message: EventMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub call: Option<EventCall>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ended_reason: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventCall {
    pub id: String,
}

impl EventMessage {
    fn outcome(&self) -> CallOutcome {
        CallOutcome {
            ended_reason: self.ended_reason.clone(),
            duration_seconds: self.duration_seconds.map(|s| s.round() as i32),
            cost: self
                .cost
                .and_then(Decimal::from_f64_retain)
                .map(|c| c.round_dp(4)),
            summary: self.summary.clone(),
            recording_url: self.recording_url.clone(),
        }
    }
}

/// What happened to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// Unknown call, unknown type, or an update that changes nothing
    Ignored,
}

/// Applies provider call events to stored calls and their leads
pub struct CallEventProcessor {
    calls: Arc<dyn CallRepository>,
    leads: Arc<dyn LeadRepository>,
}

impl CallEventProcessor {
    pub fn new(calls: Arc<dyn CallRepository>, leads: Arc<dyn LeadRepository>) -> Self {
        Self { calls, leads }
    }

    #[instrument(skip(self, event), fields(kind = %event.message.kind))]
    pub async fn handle(&self, event: VoiceEvent) -> RepoResult<EventOutcome> {
        let message = event.message;
        let Some(provider_call_id) = message.call.as_ref().map(|c| c.id.as_str()) else {
            tracing::debug!("Event without call id ignored");
            return Ok(EventOutcome::Ignored);
        };

        match message.kind.as_str() {
            "status-update" => self.status_update(provider_call_id, &message).await,
            "end-of-call-report" => self.end_of_call(provider_call_id, &message).await,
            other => {
                tracing::debug!(kind = other, "Unhandled event type");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    async fn status_update(
        &self,
        provider_call_id: &str,
        message: &EventMessage,
    ) -> RepoResult<EventOutcome> {
        let Some(status) = message.status.as_deref().and_then(CallStatus::from_provider) else {
            return Ok(EventOutcome::Ignored);
        };
        let Some(mut call) = self.calls.find_by_provider_id(provider_call_id).await? else {
            tracing::debug!(provider_call_id, "Status update for unknown call");
            return Ok(EventOutcome::Ignored);
        };

        if !call.advance_to(status) {
            return Ok(EventOutcome::Ignored);
        }
        self.calls.save(&call).await?;
        tracing::debug!(provider_call_id, ?status, "Call status updated");
        Ok(EventOutcome::Applied)
    }

    async fn end_of_call(
        &self,
        provider_call_id: &str,
        message: &EventMessage,
    ) -> RepoResult<EventOutcome> {
        let Some(mut call) = self.calls.find_by_provider_id(provider_call_id).await? else {
            tracing::debug!(provider_call_id, "End-of-call report for unknown call");
            return Ok(EventOutcome::Ignored);
        };

        let outcome = message.outcome();
        let unreachable = outcome.customer_unreachable();
        if !call.finish(outcome) {
            return Ok(EventOutcome::Ignored);
        }
        self.calls.save(&call).await?;

        if unreachable {
            if let Some(mut lead) = self.leads.find_by_id(call.lead_id()).await? {
                let reason = message.ended_reason.as_deref().unwrap_or("unreachable");
                let previous = lead.status();
                match lead.mark_failed(reason) {
                    Ok(()) => {
                        if !self.leads.save_if_status(&lead, previous).await? {
                            tracing::debug!(lead_id = %lead.id(), "Lead changed concurrently, not marked failed");
                        }
                    }
                    Err(e) => tracing::debug!(lead_id = %lead.id(), error = %e, "Lead not marked failed"),
                }
            }
        }

        tracing::info!(
            provider_call_id,
            status = ?call.status(),
            ended_reason = ?message.ended_reason,
            "Call ended"
        );
        Ok(EventOutcome::Applied)
    }
}
