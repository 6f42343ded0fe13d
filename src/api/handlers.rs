use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};

use super::{query, AppState};
use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{DataValidationError, Recommendation},
};

pub const JSON_CONTENT_TYPE: &str = "application/json";

// Helpers

/// Rejects writes whose `Content-Type` is missing or not exactly `expected`
pub fn check_content_type(headers: &HeaderMap, expected: &str) -> AppResult<()> {
    let unsupported = || AppError::UnsupportedMediaType(format!("Content-Type must be {}", expected));

    match headers.get(header::CONTENT_TYPE) {
        None => {
            tracing::error!("No Content-Type specified.");
            Err(unsupported())
        }
        Some(value) if value.as_bytes() == expected.as_bytes() => Ok(()),
        Some(value) => {
            tracing::error!(content_type = ?value, "Invalid Content-Type");
            Err(unsupported())
        }
    }
}

/// Content-type check followed by JSON parsing of the raw body
fn parse_json_body(headers: &HeaderMap, body: &Bytes) -> AppResult<Value> {
    check_content_type(headers, JSON_CONTENT_TYPE)?;
    serde_json::from_slice(body)
        .map_err(|e| AppError::from(DataValidationError::BadData(e.to_string())))
}

/// Path ids must be plain unsigned digits that fit an `i32`; anything else names no record
fn parse_id(raw: &str) -> AppResult<i32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::recommendation_not_found(raw));
    }
    raw.parse::<i32>()
        .map_err(|_| AppError::recommendation_not_found(raw))
}

/// Target of `PUT /recommendations/:id/:value`
#[derive(Debug, PartialEq)]
enum FieldUpdate {
    RecommendationId(i32),
    RecommendationName(String),
}

/// A segment of digits, optionally signed, is a `recommendation_id`; anything else is a name
fn classify_segment(value: String) -> AppResult<FieldUpdate> {
    let digits = value.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(value.as_str());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(FieldUpdate::RecommendationName(value));
    }

    value.parse::<i32>().map(FieldUpdate::RecommendationId).map_err(|_| {
        AppError::BadRequest(format!("recommendation_id '{}' is out of range", value))
    })
}

async fn find_or_404(store: &dyn RecommendationStore, id: i32) -> AppResult<Recommendation> {
    Recommendation::find(store, id)
        .await?
        .ok_or_else(|| AppError::recommendation_not_found(id))
}

// Handlers

/// Landing page: `index.html` from the static dir when configured, otherwise a JSON banner
pub async fn index(State(state): State<AppState>) -> Response {
    if let Some(dir) = state.static_dir() {
        let path = dir.join("index.html");
        match tokio::fs::read_to_string(&path).await {
            Ok(page) => return Html(page).into_response(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Landing page unavailable, serving banner");
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "name": "Recommendation REST API Service",
            "version": env!("CARGO_PKG_VERSION"),
            "paths": "/recommendations",
        })),
    )
        .into_response()
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "OK" })))
}

/// POST /recommendations
pub async fn create_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    tracing::info!(request_id = %request_id, "Request to create a Recommendation");
    let data = parse_json_body(&headers, &body)?;

    let mut recommendation = Recommendation::default();
    recommendation.deserialize(&data)?;
    recommendation.create(state.store()).await?;

    let id = recommendation
        .id
        .ok_or_else(|| AppError::Internal("created recommendation has no id".to_string()))?;
    let location = format!("/recommendations/{}", id);

    tracing::info!(request_id = %request_id, id, "Recommendation created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(recommendation.serialize()),
    )
        .into_response())
}

/// GET /recommendations/:id
pub async fn get_recommendation(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    tracing::info!(id, "Request for Recommendation");
    let recommendation = find_or_404(state.store(), id).await?;

    tracing::info!(id, name = %recommendation.name, "Returning Recommendation");
    Ok(Json(recommendation.serialize()))
}

/// GET /recommendations, optionally filtered by one query parameter
pub async fn list_recommendations(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<Value>>> {
    tracing::info!("Request for Recommendation list");
    let store = state.store();

    let recommendations = match query::select_filter(&params)? {
        Some(filter) => Recommendation::find_by(store, &filter).await?,
        None => Recommendation::all(store).await?,
    };

    let results: Vec<Value> = recommendations.iter().map(Recommendation::serialize).collect();
    tracing::info!(count = results.len(), "Returning Recommendations");
    Ok(Json(results))
}

/// PUT /recommendations/:id
///
/// Any `id` in the body is ignored; the path id always identifies the record.
pub async fn update_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    tracing::info!(request_id = %request_id, id, "Request to update Recommendation");
    let data = parse_json_body(&headers, &body)?;
    let store = state.store();

    let mut recommendation = find_or_404(store, id).await?;
    recommendation.deserialize(&data)?;
    recommendation.id = Some(id);
    recommendation.update(store).await?;

    tracing::info!(request_id = %request_id, id, "Recommendation updated");
    Ok(Json(recommendation.serialize()))
}

/// PUT /recommendations/:id/:value
///
/// An integer segment replaces `recommendation_id`; anything else replaces
/// `recommendation_name`.
pub async fn update_recommendation_field(
    State(state): State<AppState>,
    Path((raw_id, value)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    let store = state.store();
    let mut recommendation = find_or_404(store, id).await?;

    match classify_segment(value)? {
        FieldUpdate::RecommendationId(sub_id) => {
            tracing::info!(id, sub_id, "Request to set recommendation_id");
            recommendation.recommendation_id = sub_id;
        }
        FieldUpdate::RecommendationName(name) => {
            tracing::info!(id, name = %name, "Request to set recommendation_name");
            recommendation.recommendation_name = name;
        }
    }
    recommendation.update(store).await?;

    Ok(Json(recommendation.serialize()))
}

/// PUT /recommendations/:id/restock
pub async fn restock_recommendation(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&raw_id)?;
    tracing::info!(id, "Request to restock Recommendation");
    let store = state.store();
    let mut recommendation = find_or_404(store, id).await?;

    if recommendation.is_in_stock() {
        return Err(AppError::Conflict(format!(
            "Recommendation with id '{}' is already in stock.",
            id
        )));
    }

    recommendation.recommendation_in_stock = Some(true);
    recommendation.update(store).await?;

    tracing::info!(id, "Recommendation restocked");
    Ok(Json(recommendation.serialize()))
}

/// DELETE /recommendations/:id, answering 204 whether or not the record existed.
/// An id that is not an integer is a 404.
pub async fn delete_recommendation(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&raw_id)?;
    tracing::info!(id, "Request to delete Recommendation");
    let store = state.store();

    if let Some(recommendation) = Recommendation::find(store, id).await? {
        recommendation.delete(store).await?;
    }

    tracing::info!(id, "Recommendation delete complete");
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for unknown paths
pub async fn not_found() -> AppError {
    AppError::NotFound("The requested resource was not found on this server.".to_string())
}

/// Gives axum's bare 405 responses the same JSON error body as every other failure
pub async fn method_not_allowed_as_json(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut json_response =
        AppError::MethodNotAllowed("The method is not allowed for the requested URL.".to_string())
            .into_response();
    if let Some(allow) = allow {
        json_response.headers_mut().insert(header::ALLOW, allow);
    }
    json_response
}
