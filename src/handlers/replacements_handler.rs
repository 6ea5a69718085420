use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    models::{
        AckResponse, CreateReplacementInput, CreateReplacementResponse, ReplacementListResponse,
        RespondInput, RespondResponse,
    },
    AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SentQuery {
    pub user_id: i32,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReceivedQuery {
    pub user_id: i32,
    #[serde(default)]
    pub only_pending: bool,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AckQuery {
    pub user_id: i32,
}

/// POST /api/replacements - fan a cover offer out to a list of candidates
#[utoipa::path(
    post,
    path = "/api/replacements",
    request_body = CreateReplacementInput,
    responses(
        (status = 200, description = "Requests created", body = CreateReplacementResponse),
        (status = 400, description = "Requester does not hold the shift, or no targets"),
        (status = 404, description = "Shift not found"),
        (status = 422, description = "Invalid partial window")
    ),
    tag = "replacements"
)]
pub async fn create_replacements(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateReplacementInput>,
) -> AppResult<Json<CreateReplacementResponse>> {
    let created = state.replacements.create_requests(input).await?;
    Ok(Json(CreateReplacementResponse {
        request_ids: created.into_iter().map(|r| r.id).collect(),
    }))
}

/// POST /api/replacements/{id}/respond - accept or reject a pending request
#[utoipa::path(
    post,
    path = "/api/replacements/{id}/respond",
    params(
        ("id" = i64, Path, description = "Replacement request ID")
    ),
    request_body = RespondInput,
    responses(
        (status = 200, description = "Request resolved", body = RespondResponse),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already resolved, possibly by a raced sibling accept")
    ),
    tag = "replacements"
)]
pub async fn respond_to_replacement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<RespondInput>,
) -> AppResult<Json<RespondResponse>> {
    let resolved = state.replacements.respond(id, input.action).await?;
    Ok(Json(RespondResponse {
        request_id: resolved.id,
        status: resolved.status,
    }))
}

/// GET /api/replacements/sent?user_id=&year=&month=
#[utoipa::path(
    get,
    path = "/api/replacements/sent",
    params(SentQuery),
    responses(
        (status = 200, description = "Requests created by the user, newest first", body = ReplacementListResponse)
    ),
    tag = "replacements"
)]
pub async fn get_sent_replacements(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SentQuery>,
) -> AppResult<Json<ReplacementListResponse>> {
    if let Some(month) = query.month {
        super::check_month(month)?;
    }
    let listing = state
        .replacements
        .list_sent(query.user_id, query.year, query.month)
        .await?;
    Ok(Json(listing))
}

/// GET /api/replacements/received?user_id=&only_pending=&year=&month=
#[utoipa::path(
    get,
    path = "/api/replacements/received",
    params(ReceivedQuery),
    responses(
        (status = 200, description = "Requests targeting the user, newest first, with the acknowledgement marker", body = ReplacementListResponse)
    ),
    tag = "replacements"
)]
pub async fn get_received_replacements(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReceivedQuery>,
) -> AppResult<Json<ReplacementListResponse>> {
    if let Some(month) = query.month {
        super::check_month(month)?;
    }
    let listing = state
        .replacements
        .list_received(query.user_id, query.only_pending, query.year, query.month)
        .await?;
    Ok(Json(listing))
}

/// POST /api/replacements/ack?user_id= - mark the inbox as seen
#[utoipa::path(
    post,
    path = "/api/replacements/ack",
    params(AckQuery),
    responses(
        (status = 200, description = "Acknowledgement marker updated", body = AckResponse)
    ),
    tag = "replacements"
)]
pub async fn acknowledge_replacements(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AckQuery>,
) -> AppResult<Json<AckResponse>> {
    let ack = state.replacements.acknowledge(query.user_id).await?;
    Ok(Json(ack))
}
