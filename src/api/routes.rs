use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        // Recommendations
        .route(
            "/recommendations",
            get(handlers::list_recommendations).post(handlers::create_recommendation),
        )
        .route(
            "/recommendations/:id",
            get(handlers::get_recommendation)
                .put(handlers::update_recommendation)
                .delete(handlers::delete_recommendation),
        )
        // The static segment takes priority over the `:value` capture below
        .route(
            "/recommendations/:id/restock",
            put(handlers::restock_recommendation),
        )
        .route(
            "/recommendations/:id/:value",
            put(handlers::update_recommendation_field),
        )
        .fallback(handlers::not_found)
        .layer(middleware::map_response(handlers::method_not_allowed_as_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost, so the trace span can read the request id
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
