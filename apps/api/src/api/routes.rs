use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    campaigns, health, leads, notifications, organizations, phone_numbers, webhooks,
};
use super::state::AppState;

/// Builds the full HTTP router
pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Onboarding
        .route(
            "/api/organizations/setup",
            post(organizations::setup_organization),
        )
        .route("/api/organizations/me", get(organizations::get_my_organization))
        // Campaigns
        .route(
            "/api/campaigns",
            post(campaigns::create_campaign).get(campaigns::list_campaigns),
        )
        .route(
            "/api/campaigns/:id",
            get(campaigns::get_campaign)
                .patch(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route("/api/campaigns/:id/start", post(campaigns::start_campaign))
        .route("/api/campaigns/:id/pause", post(campaigns::pause_campaign))
        .route("/api/campaigns/:id/stats", get(campaigns::get_campaign_stats))
        // Leads and calls
        .route("/api/campaigns/:id/leads/import", post(leads::import_leads))
        .route("/api/campaigns/:id/leads", get(leads::list_leads))
        .route("/api/campaigns/:id/calls", get(leads::list_calls))
        // Phone numbers
        .route(
            "/api/phone-numbers",
            post(phone_numbers::provision_phone_number).get(phone_numbers::list_phone_numbers),
        )
        .route(
            "/api/phone-numbers/:id",
            delete(phone_numbers::delete_phone_number),
        )
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route(
            "/api/notifications/:id",
            delete(notifications::delete_notification),
        )
        // Provider webhooks
        .route("/api/webhooks/voice", post(webhooks::voice_webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
