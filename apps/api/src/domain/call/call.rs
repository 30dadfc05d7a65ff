use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a single outbound call as reported by the voice provider
///
/// Statuses are ordered; a call only ever moves forward.
/// ```text
/// Queued -> Ringing -> InProgress -> Ended
///    `---------`------------`------> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "call_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Ended,
    Failed,
}

impl CallStatus {
    /// Maps a provider status string (`in-progress`, `forwarding`, ...)
    pub fn from_provider(status: &str) -> Option<Self> {
        match status {
            "scheduled" | "queued" => Some(CallStatus::Queued),
            "ringing" => Some(CallStatus::Ringing),
            "in-progress" | "forwarding" => Some(CallStatus::InProgress),
            "ended" => Some(CallStatus::Ended),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, CallStatus::Ended | CallStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            CallStatus::Queued => 0,
            CallStatus::Ringing => 1,
            CallStatus::InProgress => 2,
            CallStatus::Ended | CallStatus::Failed => 3,
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallStatus::Queued => write!(f, "queued"),
            CallStatus::Ringing => write!(f, "ringing"),
            CallStatus::InProgress => write!(f, "in_progress"),
            CallStatus::Ended => write!(f, "ended"),
            CallStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Final report for a call, delivered by the provider when it hangs up
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOutcome {
    pub ended_reason: Option<String>,
    pub duration_seconds: Option<i32>,
    pub cost: Option<Decimal>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
}

impl CallOutcome {
    /// True when the customer was never reached, so the lead may be retried
    pub fn customer_unreachable(&self) -> bool {
        match self.ended_reason.as_deref() {
            Some("customer-did-not-answer") | Some("customer-busy") => true,
            Some(reason) => reason.contains("error") || reason.contains("failed"),
            None => false,
        }
    }
}

/// Record of one outbound call placed for a lead
#[derive(Debug, Clone)]
pub struct Call {
    id: Uuid,
    organization_id: Uuid,
    campaign_id: Uuid,
    lead_id: Uuid,
    provider_call_id: String,
    status: CallStatus,
    outcome: CallOutcome,
    created_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    /// When the end-of-call report was applied; set at most once
    reported_at: Option<DateTime<Utc>>,
}

impl Call {
    /// Records a call the provider has just accepted
    pub fn placed(
        organization_id: Uuid,
        campaign_id: Uuid,
        lead_id: Uuid,
        provider_call_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            campaign_id,
            lead_id,
            provider_call_id,
            status: CallStatus::Queued,
            outcome: CallOutcome::default(),
            created_at: Utc::now(),
            ended_at: None,
            reported_at: None,
        }
    }

    /// Moves the call forward; stale or repeated updates are ignored
    ///
    /// Returns whether the status changed.
    pub fn advance_to(&mut self, next: CallStatus) -> bool {
        if self.status.is_final() || next.rank() <= self.status.rank() {
            return false;
        }
        self.status = next;
        if next.is_final() {
            self.ended_at = Some(Utc::now());
        }
        true
    }

    /// Records the end-of-call report
    ///
    /// The report is applied once; repeats are ignored. It decides between
    /// Ended and Failed only while the call is still open. A call that a
    /// status update already finished keeps its status and gains the report
    /// details.
    pub fn finish(&mut self, outcome: CallOutcome) -> bool {
        if self.reported_at.is_some() {
            return false;
        }
        if !self.status.is_final() {
            let failed = outcome
                .ended_reason
                .as_deref()
                .map(|reason| reason.contains("error") || reason.contains("failed"))
                .unwrap_or(false);
            self.status = if failed {
                CallStatus::Failed
            } else {
                CallStatus::Ended
            };
        }
        self.outcome = outcome;
        let now = Utc::now();
        self.ended_at.get_or_insert(now);
        self.reported_at = Some(now);
        true
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }

    pub fn lead_id(&self) -> Uuid {
        self.lead_id
    }

    pub fn provider_call_id(&self) -> &str {
        &self.provider_call_id
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn outcome(&self) -> &CallOutcome {
        &self.outcome
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        self.reported_at
    }

    /// Reconstructs a Call from persistence layer data
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        organization_id: Uuid,
        campaign_id: Uuid,
        lead_id: Uuid,
        provider_call_id: String,
        status: CallStatus,
        outcome: CallOutcome,
        created_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        reported_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            organization_id,
            campaign_id,
            lead_id,
            provider_call_id,
            status,
            outcome,
            created_at,
            ended_at,
            reported_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> Call {
        Call::placed(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "call_abc".to_string(),
        )
    }

    #[test]
    fn placed_call_is_queued() {
        let call = call();
        assert_eq!(call.status(), CallStatus::Queued);
        assert!(call.ended_at().is_none());
    }

    #[test]
    fn provider_status_mapping() {
        assert_eq!(CallStatus::from_provider("in-progress"), Some(CallStatus::InProgress));
        assert_eq!(CallStatus::from_provider("forwarding"), Some(CallStatus::InProgress));
        assert_eq!(CallStatus::from_provider("ringing"), Some(CallStatus::Ringing));
        assert_eq!(CallStatus::from_provider("ended"), Some(CallStatus::Ended));
        assert_eq!(CallStatus::from_provider("bogus"), None);
    }

    #[test]
    fn call_moves_forward_only() {
        let mut call = call();
        assert!(call.advance_to(CallStatus::InProgress));
        assert!(!call.advance_to(CallStatus::Ringing));
        assert!(!call.advance_to(CallStatus::InProgress));
        assert_eq!(call.status(), CallStatus::InProgress);
    }

    #[test]
    fn ended_call_ignores_updates() {
        let mut call = call();
        assert!(call.advance_to(CallStatus::Ended));
        assert!(call.ended_at().is_some());
        assert!(!call.advance_to(CallStatus::Failed));
        assert_eq!(call.status(), CallStatus::Ended);
    }

    #[test]
    fn finish_records_outcome() {
        let mut call = call();
        let outcome = CallOutcome {
            ended_reason: Some("customer-ended-call".to_string()),
            duration_seconds: Some(42),
            cost: Some(Decimal::new(125, 3)),
            summary: Some("Interested".to_string()),
            recording_url: None,
        };

        assert!(call.finish(outcome.clone()));
        assert_eq!(call.status(), CallStatus::Ended);
        assert_eq!(call.outcome(), &outcome);
    }

    #[test]
    fn finish_after_status_ended_still_records_report() {
        let mut call = call();
        call.advance_to(CallStatus::Ended);
        assert!(call.finish(CallOutcome {
            ended_reason: Some("assistant-ended-call".to_string()),
            ..Default::default()
        }));
        assert!(call.reported_at().is_some());
        assert!(!call.finish(CallOutcome::default()));
    }

    #[test]
    fn report_does_not_reopen_ended_call() {
        let mut call = call();
        call.advance_to(CallStatus::Ended);
        let outcome = CallOutcome {
            ended_reason: Some("pipeline-error-openai-llm-failed".to_string()),
            duration_seconds: Some(3),
            ..Default::default()
        };

        assert!(call.finish(outcome.clone()));
        assert_eq!(call.status(), CallStatus::Ended);
        assert_eq!(call.outcome(), &outcome);
    }

    #[test]
    fn empty_report_is_applied_once() {
        let mut call = call();
        assert!(call.finish(CallOutcome::default()));
        assert_eq!(call.status(), CallStatus::Ended);
        assert!(!call.finish(CallOutcome::default()));
        assert!(!call.finish(CallOutcome {
            ended_reason: Some("customer-busy".to_string()),
            ..Default::default()
        }));
        assert_eq!(call.outcome(), &CallOutcome::default());
    }

    #[test]
    fn error_reason_marks_call_failed() {
        let mut call = call();
        call.finish(CallOutcome {
            ended_reason: Some("pipeline-error-openai-llm-failed".to_string()),
            ..Default::default()
        });
        assert_eq!(call.status(), CallStatus::Failed);
    }

    #[test]
    fn unreachable_reasons() {
        let outcome = |reason: &str| CallOutcome {
            ended_reason: Some(reason.to_string()),
            ..Default::default()
        };
        assert!(outcome("customer-did-not-answer").customer_unreachable());
        assert!(outcome("customer-busy").customer_unreachable());
        assert!(outcome("twilio-failed-to-connect-call").customer_unreachable());
        assert!(!outcome("customer-ended-call").customer_unreachable());
        assert!(!CallOutcome::default().customer_unreachable());
    }
}
