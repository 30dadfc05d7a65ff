//! Outbound call dispatcher
//!
//! Works through an active campaign's leads in small batches, placing one
//! call at a time through the voice gateway:
//!
//! ```text
//!   pending leads? ──no──> assign unassigned ──none──> reset failed ──none──> complete
//!        │ yes                  │ some                     │ some
//!        └──────────────────────┴──────────────────────────┴──> dial batch ──> re-check status
//! ```
//!
//! Each run carries the `run_id` issued when the campaign was started. The
//! campaign is re-read before every call and the run stops as soon as the
//! campaign is no longer active under that id, so a pause followed by a
//! resume retires the old dispatcher. Leads are claimed with a conditional
//! status write; a lead some other writer already moved is skipped.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::config::DispatchSettings;
use crate::domain::call::{Call, CallStatus};
use crate::domain::campaign::Campaign;
use crate::domain::errors::DomainError;
use crate::domain::lead::{Lead, LeadStatus};
use crate::domain::notification::Notification;
use crate::domain::repositories::{
    CallRepository, CampaignRepository, LeadRepository, NotificationRepository,
    PhoneNumberRepository, RepoError,
};
use crate::domain::voice::{OutboundCallRequest, VoiceError, VoiceGateway};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Voice(#[from] VoiceError),
}

/// What one dispatcher run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub batches: u32,
    pub placed: u32,
    pub failed: u32,
    pub invalid: u32,
    pub completed: bool,
}

/// Repositories the dispatcher reads and writes
#[derive(Clone)]
pub struct DispatchRepositories {
    pub campaigns: Arc<dyn CampaignRepository>,
    pub leads: Arc<dyn LeadRepository>,
    pub calls: Arc<dyn CallRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub phone_numbers: Arc<dyn PhoneNumberRepository>,
}

pub struct OutboundDispatcher {
    repos: DispatchRepositories,
    voice: Arc<dyn VoiceGateway>,
    settings: DispatchSettings,
}

/// Campaign settings resolved once per batch
struct Dialing<'a> {
    campaign: &'a Campaign,
    assistant_id: String,
    caller_id: String,
}

impl OutboundDispatcher {
    pub fn new(
        repos: DispatchRepositories,
        voice: Arc<dyn VoiceGateway>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            repos,
            voice,
            settings,
        }
    }

    /// Dials the campaign's leads until none are left or `run_id` stops
    /// being the campaign's active run
    ///
    /// Per-lead failures are recorded on the lead and do not stop the run.
    /// Storage errors and a missing provider configuration do.
    #[instrument(skip(self), fields(campaign_id = %campaign_id, run_id = %run_id))]
    pub async fn run_campaign(
        &self,
        campaign_id: Uuid,
        run_id: Uuid,
    ) -> Result<DispatchSummary, DispatchError> {
        let mut summary = DispatchSummary::default();

        loop {
            let Some(campaign) = self.running_campaign(campaign_id, run_id).await? else {
                return Ok(summary);
            };
            let Some(dialing) = self.resolve(&campaign).await? else {
                return Ok(summary);
            };

            let leads = self.next_batch(&campaign).await?;
            if leads.is_empty() {
                summary.completed = self.complete(&campaign, run_id).await?;
                tracing::info!(?summary, "Dispatch finished");
                return Ok(summary);
            }

            summary.batches += 1;
            tracing::debug!(batch = summary.batches, size = leads.len(), "Dialing batch");

            for (i, lead) in leads.into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.settings.call_delay).await;
                    if self.running_campaign(campaign_id, run_id).await?.is_none() {
                        return Ok(summary);
                    }
                }
                self.dial(&dialing, lead, &mut summary).await?;
            }
        }
    }

    /// The campaign, as long as this run still owns it
    async fn running_campaign(
        &self,
        campaign_id: Uuid,
        run_id: Uuid,
    ) -> Result<Option<Campaign>, DispatchError> {
        match self.repos.campaigns.find_by_id(campaign_id).await? {
            None => {
                tracing::warn!("Campaign disappeared, stopping dispatch");
                Ok(None)
            }
            Some(campaign) if !campaign.is_running(run_id) => {
                tracing::info!(
                    status = %campaign.status(),
                    "Campaign no longer active for this run, stopping dispatch"
                );
                Ok(None)
            }
            Some(campaign) => Ok(Some(campaign)),
        }
    }

    /// Assistant and provider number for the campaign, or None when it
    /// cannot place calls
    async fn resolve<'a>(
        &self,
        campaign: &'a Campaign,
    ) -> Result<Option<Dialing<'a>>, DispatchError> {
        let (assistant_id, phone_number_id) = match campaign.ensure_ready() {
            Ok(ready) => ready,
            Err(e) => {
                tracing::warn!(error = %e, "Campaign cannot place calls");
                return Ok(None);
            }
        };

        let number = self.repos.phone_numbers.find_by_id(phone_number_id).await?;
        match number {
            Some(number) if number.organization_id() == campaign.organization_id() => {
                Ok(Some(Dialing {
                    campaign,
                    assistant_id: assistant_id.to_string(),
                    caller_id: number.provider_id().to_string(),
                }))
            }
            _ => {
                tracing::warn!(%phone_number_id, "Campaign phone number not found");
                Ok(None)
            }
        }
    }

    /// Pending leads, topped up from unassigned leads and then from
    /// retryable failures
    async fn next_batch(&self, campaign: &Campaign) -> Result<Vec<Lead>, DispatchError> {
        let limit = self.settings.batch_size;
        let leads = &self.repos.leads;

        let pending = leads.find_pending(campaign.id(), limit).await?;
        if !pending.is_empty() {
            return Ok(pending);
        }

        let assigned = leads
            .assign_unassigned(campaign.organization_id(), campaign.id(), limit)
            .await?;
        if assigned > 0 {
            tracing::info!(assigned, "Assigned unassigned leads to campaign");
            let pending = leads.find_pending(campaign.id(), limit).await?;
            if !pending.is_empty() {
                return Ok(pending);
            }
        }

        let reset = leads
            .reset_failed(campaign.id(), self.settings.max_call_attempts)
            .await?;
        if reset > 0 {
            tracing::info!(reset, "Retrying failed leads");
            return Ok(leads.find_pending(campaign.id(), limit).await?);
        }

        Ok(Vec::new())
    }

    async fn dial(
        &self,
        dialing: &Dialing<'_>,
        mut lead: Lead,
        summary: &mut DispatchSummary,
    ) -> Result<(), DispatchError> {
        let campaign = dialing.campaign;
        let number = match lead.dialable_number() {
            Ok(number) => number,
            Err(e) => {
                tracing::warn!(lead_id = %lead.id(), error = %e, "Lead phone is not dialable");
                lead.mark_invalid(e.to_string())?;
                if self.repos.leads.save_if_status(&lead, LeadStatus::Pending).await? {
                    summary.invalid += 1;
                }
                return Ok(());
            }
        };

        lead.begin_call()?;
        if !self.repos.leads.save_if_status(&lead, LeadStatus::Pending).await? {
            tracing::debug!(lead_id = %lead.id(), "Lead already claimed, skipping");
            return Ok(());
        }

        let request = OutboundCallRequest {
            assistant_id: dialing.assistant_id.clone(),
            phone_number_provider_id: dialing.caller_id.clone(),
            customer_number: number.into(),
            customer_name: lead.full_name(),
            variables: lead.custom_fields().clone(),
        };

        match self.voice.place_call(&request).await {
            Ok(placed) => {
                let mut call = Call::placed(
                    campaign.organization_id(),
                    campaign.id(),
                    lead.id(),
                    placed.provider_call_id,
                );
                if let Some(status) = placed.status.as_deref().and_then(CallStatus::from_provider) {
                    call.advance_to(status);
                }
                self.repos.calls.save(&call).await?;
                lead.mark_called()?;
                // an early end-of-call report may already have failed the lead
                if !self.repos.leads.save_if_status(&lead, LeadStatus::Calling).await? {
                    tracing::debug!(lead_id = %lead.id(), "Lead updated by call events, keeping it");
                }
                summary.placed += 1;
                tracing::info!(
                    lead_id = %lead.id(),
                    provider_call_id = %call.provider_call_id(),
                    "Call placed"
                );
            }
            Err(VoiceError::NotConfigured(reason)) => {
                // the lead is not at fault, leave it retryable
                lead.mark_failed(reason.clone())?;
                self.repos.leads.save_if_status(&lead, LeadStatus::Calling).await?;
                summary.failed += 1;
                return Err(VoiceError::NotConfigured(reason).into());
            }
            Err(err) => {
                let reason = err.to_string();
                if err.is_transient() {
                    lead.mark_failed(reason.clone())?;
                    summary.failed += 1;
                } else {
                    lead.mark_invalid(reason.clone())?;
                    summary.invalid += 1;
                }
                self.repos.leads.save_if_status(&lead, LeadStatus::Calling).await?;
                tracing::warn!(
                    lead_id = %lead.id(),
                    transient = err.is_transient(),
                    error = %err,
                    "Call failed"
                );
                self.notify(Notification::call_failed(campaign, lead.phone(), &reason))
                    .await;
            }
        }

        Ok(())
    }

    /// Returns whether this run moved the campaign to completed
    async fn complete(&self, campaign: &Campaign, run_id: Uuid) -> Result<bool, DispatchError> {
        let mut campaign = campaign.clone();
        let event = campaign.complete()?;
        if !self
            .repos
            .campaigns
            .save_if_running(&campaign, run_id)
            .await?
        {
            tracing::info!("Campaign changed while completing, leaving it as is");
            return Ok(false);
        }

        if let Some(notification) = Notification::for_campaign_event(&campaign, &event) {
            self.notify(notification).await;
        }
        Ok(true)
    }

    /// Notifications are best effort
    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.repos.notifications.save(&notification).await {
            tracing::warn!(error = %e, kind = ?notification.kind(), "Failed to store notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::campaign::CampaignStatus;
    use crate::domain::lead::PhoneNumber;
    use crate::domain::phone_number::ProvisionedNumber;
    use crate::domain::repositories::{
        MockCallRepository, MockCampaignRepository, MockLeadRepository,
        MockNotificationRepository, MockPhoneNumberRepository,
    };
    use crate::domain::voice::{MockVoiceGateway, PlacedCall};
    use chrono::Utc;
    use serde_json::Map;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Fixture {
        org: Uuid,
        campaign: Campaign,
        number: ProvisionedNumber,
        campaigns: MockCampaignRepository,
        leads: MockLeadRepository,
        calls: MockCallRepository,
        notifications: MockNotificationRepository,
        phone_numbers: MockPhoneNumberRepository,
        voice: MockVoiceGateway,
    }

    impl Fixture {
        fn new() -> Self {
            let org = Uuid::new_v4();
            let number = ProvisionedNumber::new(
                org,
                "pn_1".to_string(),
                PhoneNumber::parse("+14155550100").unwrap(),
                None,
            );
            let (mut campaign, _) = Campaign::new(
                org,
                "Spring outreach".to_string(),
                None,
                Some("asst_1".to_string()),
                Some(number.id()),
                Uuid::new_v4(),
            )
            .unwrap();
            campaign.start().unwrap();

            Self::with_campaign(org, campaign, number)
        }

        /// Second set of mocks over the same active campaign
        fn with_campaign(org: Uuid, campaign: Campaign, number: ProvisionedNumber) -> Self {
            let mut phone_numbers = MockPhoneNumberRepository::new();
            let stored = number.clone();
            phone_numbers
                .expect_find_by_id()
                .returning(move |_| Ok(Some(stored.clone())));

            Self {
                org,
                campaign,
                number,
                campaigns: MockCampaignRepository::new(),
                leads: MockLeadRepository::new(),
                calls: MockCallRepository::new(),
                notifications: MockNotificationRepository::new(),
                phone_numbers,
                voice: MockVoiceGateway::new(),
            }
        }

        fn run_id(&self) -> Uuid {
            self.campaign.run_id().unwrap()
        }

        fn lead(&self, phone: &str) -> Lead {
            Lead::new(
                self.org,
                Some(self.campaign.id()),
                PhoneNumber::parse(phone).unwrap(),
                Some("Jane".to_string()),
                None,
                None,
                Map::new(),
            )
        }

        fn campaign_stays_active(&mut self) {
            let campaign = self.campaign.clone();
            self.campaigns
                .expect_find_by_id()
                .returning(move |_| Ok(Some(campaign.clone())));
        }

        /// Successive `find_pending` results; empty once exhausted
        fn pending_batches(&mut self, batches: Vec<Vec<Lead>>) {
            let mut batches = batches.into_iter();
            self.leads
                .expect_find_pending()
                .returning(move |_, _| Ok(batches.next().unwrap_or_default()));
        }

        fn leads_always_claimable(&mut self) {
            self.leads
                .expect_save_if_status()
                .returning(|_, _| Ok(true));
        }

        fn expect_completion(&mut self) {
            let run_id = self.run_id();
            self.leads.expect_assign_unassigned().returning(|_, _, _| Ok(0));
            self.leads.expect_reset_failed().returning(|_, _| Ok(0));
            self.campaigns
                .expect_save_if_running()
                .withf(move |c, run| c.status() == CampaignStatus::Completed && *run == run_id)
                .times(1)
                .returning(|_, _| Ok(true));
            self.notifications.expect_save().returning(|_| Ok(()));
        }

        fn dispatcher(self, call_delay: Duration) -> OutboundDispatcher {
            OutboundDispatcher::new(
                DispatchRepositories {
                    campaigns: Arc::new(self.campaigns),
                    leads: Arc::new(self.leads),
                    calls: Arc::new(self.calls),
                    notifications: Arc::new(self.notifications),
                    phone_numbers: Arc::new(self.phone_numbers),
                },
                Arc::new(self.voice),
                DispatchSettings {
                    call_delay,
                    ..DispatchSettings::default()
                },
            )
        }

        async fn run(self) -> Result<DispatchSummary, DispatchError> {
            let (campaign_id, run_id) = (self.campaign.id(), self.run_id());
            self.dispatcher(Duration::ZERO)
                .run_campaign(campaign_id, run_id)
                .await
        }
    }

    fn accepted(provider_call_id: &str) -> Result<PlacedCall, VoiceError> {
        Ok(PlacedCall {
            provider_call_id: provider_call_id.to_string(),
            status: None,
        })
    }

    #[tokio::test]
    async fn completes_campaign_without_leads() {
        let mut fx = Fixture::new();
        fx.campaign_stays_active();
        fx.pending_batches(vec![]);
        fx.expect_completion();
        fx.voice.expect_place_call().never();

        let summary = fx.run().await.unwrap();

        assert!(summary.completed);
        assert_eq!(summary.batches, 0);
    }

    #[tokio::test]
    async fn places_calls_for_pending_leads() {
        let mut fx = Fixture::new();
        let batch = vec![fx.lead("+14155550123"), fx.lead("+14155550124")];
        let campaign_id = fx.campaign.id();
        let caller = fx.number.provider_id().to_string();
        fx.campaign_stays_active();
        fx.pending_batches(vec![batch]);
        fx.expect_completion();

        fx.voice
            .expect_place_call()
            .withf(move |req| {
                req.assistant_id == "asst_1"
                    && req.phone_number_provider_id == caller
                    && req.customer_name.as_deref() == Some("Jane")
            })
            .times(2)
            .returning(|req| {
                Ok(PlacedCall {
                    provider_call_id: format!("call-{}", req.customer_number),
                    status: Some("queued".to_string()),
                })
            });
        fx.calls
            .expect_save()
            .withf(move |call| {
                call.campaign_id() == campaign_id && call.status() == CallStatus::Queued
            })
            .times(2)
            .returning(|_| Ok(()));

        let called = Arc::new(AtomicU32::new(0));
        let counter = called.clone();
        fx.leads.expect_save_if_status().returning(move |lead, expected| {
            match lead.status() {
                LeadStatus::Calling => assert_eq!(expected, LeadStatus::Pending),
                LeadStatus::Called => {
                    assert_eq!(expected, LeadStatus::Calling);
                    assert_eq!(lead.call_attempts(), 1);
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                other => panic!("unexpected lead status {other}"),
            }
            Ok(true)
        });

        let summary = fx.run().await.unwrap();

        assert_eq!(
            summary,
            DispatchSummary {
                batches: 1,
                placed: 2,
                failed: 0,
                invalid: 0,
                completed: true,
            }
        );
        assert_eq!(called.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transient_errors_fail_and_permanent_errors_invalidate() {
        let mut fx = Fixture::new();
        let batch = vec![fx.lead("+14155550123"), fx.lead("+14155550124")];
        fx.campaign_stays_active();
        fx.pending_batches(vec![batch]);
        fx.expect_completion();

        fx.voice.expect_place_call().returning(|req| {
            if req.customer_number.ends_with("123") {
                Err(VoiceError::Api {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Err(VoiceError::Api {
                    status: 400,
                    body: "bad number".to_string(),
                })
            }
        });
        fx.calls.expect_save().never();
        fx.leads.expect_save_if_status().returning(|lead, _| {
            match lead.phone() {
                "+14155550123" if lead.status() != LeadStatus::Calling => {
                    assert_eq!(lead.status(), LeadStatus::Failed)
                }
                "+14155550124" if lead.status() != LeadStatus::Calling => {
                    assert_eq!(lead.status(), LeadStatus::Invalid);
                    assert!(lead.last_error().unwrap().contains("bad number"));
                }
                _ => {}
            }
            Ok(true)
        });

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.invalid, 1);
        assert!(summary.completed);
    }

    #[tokio::test]
    async fn assigns_unassigned_leads_before_completing() {
        let mut fx = Fixture::new();
        let lead = fx.lead("+14155550123");
        fx.campaign_stays_active();
        // first fetch empty, refetch after assignment finds the lead
        fx.pending_batches(vec![vec![], vec![lead]]);

        let assigned = Arc::new(AtomicU32::new(0));
        let counter = assigned.clone();
        fx.leads.expect_assign_unassigned().returning(move |_, _, limit| {
            assert_eq!(limit, 5);
            Ok(if counter.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 0 })
        });
        fx.leads.expect_reset_failed().returning(|_, _| Ok(0));
        fx.leads_always_claimable();
        fx.campaigns.expect_save_if_running().returning(|_, _| Ok(true));
        fx.notifications.expect_save().returning(|_| Ok(()));
        fx.calls.expect_save().returning(|_| Ok(()));
        fx.voice
            .expect_place_call()
            .times(1)
            .returning(|_| accepted("call_1"));

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.placed, 1);
        assert!(summary.completed);
    }

    #[tokio::test]
    async fn resets_failed_leads_with_attempts_left() {
        let mut fx = Fixture::new();
        let lead = fx.lead("+14155550123");
        fx.campaign_stays_active();
        fx.pending_batches(vec![vec![], vec![lead]]);
        fx.leads.expect_assign_unassigned().returning(|_, _, _| Ok(0));

        let resets = Arc::new(AtomicU32::new(0));
        let counter = resets.clone();
        fx.leads.expect_reset_failed().returning(move |_, max_attempts| {
            assert_eq!(max_attempts, 3);
            Ok(if counter.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 0 })
        });
        fx.leads_always_claimable();
        fx.campaigns.expect_save_if_running().returning(|_, _| Ok(true));
        fx.notifications.expect_save().returning(|_| Ok(()));
        fx.calls.expect_save().returning(|_| Ok(()));
        fx.voice
            .expect_place_call()
            .times(1)
            .returning(|_| accepted("call_1"));

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(resets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_when_campaign_is_paused_between_batches() {
        let mut fx = Fixture::new();
        let first = vec![fx.lead("+14155550123")];
        let second = vec![fx.lead("+14155550124")];

        let active = fx.campaign.clone();
        let mut paused = fx.campaign.clone();
        paused.pause().unwrap();
        let loads = Arc::new(AtomicU32::new(0));
        let counter = loads.clone();
        fx.campaigns.expect_find_by_id().returning(move |_| {
            let campaign = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                active.clone()
            } else {
                paused.clone()
            };
            Ok(Some(campaign))
        });
        fx.pending_batches(vec![first, second]);
        fx.campaigns.expect_save_if_running().never();
        fx.leads_always_claimable();
        fx.calls.expect_save().returning(|_| Ok(()));
        fx.voice
            .expect_place_call()
            .times(1)
            .returning(|_| accepted("call_1"));

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.placed, 1);
        assert!(!summary.completed);
    }

    #[tokio::test]
    async fn resumed_campaign_retires_previous_run_mid_batch() {
        let mut fx = Fixture::new();
        let batch = vec![fx.lead("+14155550123"), fx.lead("+14155550124")];

        // paused and resumed while the first call was in flight
        let current = fx.campaign.clone();
        let mut resumed = fx.campaign.clone();
        resumed.pause().unwrap();
        resumed.start().unwrap();
        let loads = Arc::new(AtomicU32::new(0));
        let counter = loads.clone();
        fx.campaigns.expect_find_by_id().returning(move |_| {
            let campaign = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                current.clone()
            } else {
                resumed.clone()
            };
            Ok(Some(campaign))
        });
        fx.pending_batches(vec![batch]);
        fx.campaigns.expect_save_if_running().never();
        fx.leads_always_claimable();
        fx.calls.expect_save().returning(|_| Ok(()));
        fx.voice
            .expect_place_call()
            .withf(|req| req.customer_number == "+14155550123")
            .times(1)
            .returning(|_| accepted("call_1"));

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.placed, 1);
        assert!(!summary.completed);
    }

    #[tokio::test]
    async fn lead_claimed_elsewhere_is_skipped() {
        let mut fx = Fixture::new();
        let batch = vec![fx.lead("+14155550123")];
        fx.campaign_stays_active();
        fx.pending_batches(vec![batch]);
        fx.expect_completion();
        fx.leads
            .expect_save_if_status()
            .withf(|lead, expected| {
                lead.status() == LeadStatus::Calling && *expected == LeadStatus::Pending
            })
            .times(1)
            .returning(|_, _| Ok(false));
        fx.voice.expect_place_call().never();

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.placed, 0);
        assert_eq!(summary.batches, 1);
        assert!(summary.completed);
    }

    #[tokio::test]
    async fn overlapping_runs_dial_each_lead_once() {
        let first = Fixture::new();
        let second =
            Fixture::with_campaign(first.org, first.campaign.clone(), first.number.clone());
        let batch = vec![first.lead("+14155550123"), first.lead("+14155550124")];

        let stored: Arc<Mutex<HashMap<Uuid, LeadStatus>>> = Arc::new(Mutex::new(
            batch.iter().map(|lead| (lead.id(), lead.status())).collect(),
        ));
        let dials: Arc<Mutex<HashMap<String, u32>>> = Arc::default();

        let sharing = |mut fx: Fixture| {
            fx.campaign_stays_active();
            // both runs work from the same stale snapshot
            fx.pending_batches(vec![batch.clone()]);
            fx.leads.expect_assign_unassigned().returning(|_, _, _| Ok(0));
            fx.leads.expect_reset_failed().returning(|_, _| Ok(0));
            let stored = stored.clone();
            fx.leads.expect_save_if_status().returning(move |lead, expected| {
                let mut stored = stored.lock().unwrap();
                let status = stored.get_mut(&lead.id()).expect("known lead");
                if *status != expected {
                    return Ok(false);
                }
                *status = lead.status();
                Ok(true)
            });
            fx.calls.expect_save().returning(|_| Ok(()));
            fx.campaigns.expect_save_if_running().returning(|_, _| Ok(true));
            fx.notifications.expect_save().returning(|_| Ok(()));
            let dials = dials.clone();
            fx.voice.expect_place_call().returning(move |req| {
                *dials
                    .lock()
                    .unwrap()
                    .entry(req.customer_number.clone())
                    .or_default() += 1;
                accepted(&format!("call-{}", Uuid::new_v4()))
            });
            fx.dispatcher(Duration::from_millis(20))
        };

        let (campaign_id, run_id) = (first.campaign.id(), first.run_id());
        let a = sharing(first);
        let b = sharing(second);
        let (ra, rb) = tokio::join!(
            a.run_campaign(campaign_id, run_id),
            b.run_campaign(campaign_id, run_id)
        );

        assert_eq!(ra.unwrap().placed + rb.unwrap().placed, 2);
        let dials = dials.lock().unwrap();
        assert_eq!(dials.get("+14155550123"), Some(&1));
        assert_eq!(dials.get("+14155550124"), Some(&1));
    }

    #[tokio::test]
    async fn undialable_stored_phone_is_marked_invalid() {
        let mut fx = Fixture::new();
        let now = Utc::now();
        let broken = Lead::from_persistence(
            Uuid::new_v4(),
            fx.org,
            Some(fx.campaign.id()),
            "12".to_string(),
            None,
            None,
            None,
            LeadStatus::Pending,
            0,
            None,
            None,
            Map::new(),
            now,
            now,
        );
        fx.campaign_stays_active();
        fx.pending_batches(vec![vec![broken]]);
        fx.expect_completion();
        fx.voice.expect_place_call().never();
        fx.leads
            .expect_save_if_status()
            .withf(|lead, expected| {
                lead.status() == LeadStatus::Invalid
                    && lead.call_attempts() == 0
                    && *expected == LeadStatus::Pending
            })
            .times(1)
            .returning(|_, _| Ok(true));

        let summary = fx.run().await.unwrap();

        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.placed, 0);
    }

    #[tokio::test]
    async fn missing_provider_key_aborts_and_keeps_lead_retryable() {
        let mut fx = Fixture::new();
        let batch = vec![fx.lead("+14155550123"), fx.lead("+14155550124")];
        fx.campaign_stays_active();
        fx.pending_batches(vec![batch]);
        fx.voice
            .expect_place_call()
            .times(1)
            .returning(|_| Err(VoiceError::NotConfigured("VAPI_API_KEY is not set".into())));
        fx.leads_always_claimable();

        let err = fx.run().await.unwrap_err();

        assert!(matches!(err, DispatchError::Voice(VoiceError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn inactive_campaign_is_left_alone() {
        let mut fx = Fixture::new();
        let mut paused = fx.campaign.clone();
        paused.pause().unwrap();
        fx.campaigns
            .expect_find_by_id()
            .returning(move |_| Ok(Some(paused.clone())));
        fx.leads.expect_find_pending().never();

        let summary = fx.run().await.unwrap();

        assert_eq!(summary, DispatchSummary::default());
    }
}
