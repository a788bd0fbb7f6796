use axum::routing::{delete, get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    catalog_handlers,
    entitlement_handlers,
    event_handlers,
    ops_handlers,
    redemption_handlers,
    schedule_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/participants/:participant_id/seed",
            put(entitlement_handlers::seed_participant),
        )
        .route(
            "/v1/participants/:participant_id/entitlements",
            get(entitlement_handlers::list_participant_entitlements),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key",
            get(entitlement_handlers::get_entitlement).delete(entitlement_handlers::remove_entitlement),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key/seed",
            post(entitlement_handlers::seed_entitlement),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key/quantity",
            put(entitlement_handlers::set_quantity),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key/redeem",
            post(redemption_handlers::redeem),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key/redeemed",
            put(redemption_handlers::set_redeemed),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key/finalized",
            put(redemption_handlers::set_finalized),
        )
        .route(
            "/v1/entitlements/:participant_id/:event_key/reopen",
            post(redemption_handlers::reopen),
        )
        .route(
            "/v1/events/:event_key/entitlements",
            delete(entitlement_handlers::remove_event_entitlements),
        )
        .route("/v1/events/stats", get(event_handlers::list_event_stats))
        .route(
            "/v1/events/:event_key/stats",
            get(event_handlers::get_event_stats),
        )
        .route(
            "/v1/events/:event_key/stats/rebuild",
            post(event_handlers::rebuild_event_stats),
        )
        .route(
            "/v1/events/:event_key/log",
            get(event_handlers::list_redemption_log),
        )
        .route(
            "/v1/events/:event_key/log/:participant_id",
            delete(event_handlers::clear_redemption_log),
        )
        .route(
            "/v1/events/:event_key/redeemed",
            get(event_handlers::list_redeemed),
        )
        .route(
            "/v1/events/:event_key/schedule",
            get(schedule_handlers::get_schedule).put(schedule_handlers::put_schedule),
        )
        .route(
            "/v1/events/:event_key/window",
            get(schedule_handlers::get_window_status),
        )
        .route(
            "/v1/schedules/defaults",
            post(schedule_handlers::apply_default_schedules),
        )
        .route(
            "/v1/catalog/events",
            get(catalog_handlers::list_event_catalog).put(catalog_handlers::update_event_catalog),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
