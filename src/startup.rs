use axum::{
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{handlers, openapi::ApiDoc};

pub fn build_router(state: Arc<crate::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let shift_routes = Router::new()
        .route("/", get(handlers::shifts_handler::get_shifts_for_month))
        .route("/week", get(handlers::shifts_handler::get_shifts_for_week));

    let replacement_routes = Router::new()
        .route("/", post(handlers::replacements_handler::create_replacements))
        .route(
            "/{id}/respond",
            post(handlers::replacements_handler::respond_to_replacement),
        )
        .route("/sent", get(handlers::replacements_handler::get_sent_replacements))
        .route(
            "/received",
            get(handlers::replacements_handler::get_received_replacements),
        )
        .route("/ack", post(handlers::replacements_handler::acknowledge_replacements));

    let payroll_routes = Router::new().route(
        "/{user_id}",
        get(handlers::payroll_handler::get_monthly_payroll),
    );

    let reference_routes = Router::new()
        .route("/users", get(handlers::references_handler::get_users))
        .route(
            "/courses/types",
            get(handlers::references_handler::get_course_types),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/shifts", shift_routes)
        .nest("/api/replacements", replacement_routes)
        .nest("/api/payroll", payroll_routes)
        .nest("/api", reference_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        // The Scalar router is state-less; merge it after the state is applied.
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
