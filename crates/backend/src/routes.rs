use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers;
use crate::api::state::AppState;

/// Application routes
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // D402 Sales Panel Dashboard
        .route(
            "/api/d402/metadata",
            get(handlers::d402_sales_panel::get_metadata),
        )
        .route(
            "/api/d402/sessions",
            post(handlers::d402_sales_panel::create_session),
        )
        .route(
            "/api/d402/sessions/:id",
            get(handlers::d402_sales_panel::get_view)
                .delete(handlers::d402_sales_panel::delete_session),
        )
        .route(
            "/api/d402/sessions/:id/actions",
            post(handlers::d402_sales_panel::apply_action),
        )
        .with_state(state)
}
