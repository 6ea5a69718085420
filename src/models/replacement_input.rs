use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ReplacementRequestView, RequestAction, RequestStatus};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateReplacementInput {
    pub shift_id: Uuid,
    pub requester_id: i32,
    pub target_users: Vec<i32>,
    #[serde(default)]
    pub partial: bool,
    pub partial_start: Option<NaiveTime>,
    pub partial_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateReplacementResponse {
    pub request_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RespondInput {
    pub action: RequestAction,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RespondResponse {
    pub request_id: i64,
    pub status: RequestStatus,
}

/// Listing response: the rows plus the server-tracked acknowledgement marker
/// so clients can highlight updates without local state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplacementListResponse {
    pub requests: Vec<ReplacementRequestView>,
    pub last_acknowledged: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AckResponse {
    pub user_id: i32,
    pub last_acknowledged: DateTime<Utc>,
}
