use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Role;

/// Lifecycle of a replacement request. `Pending` is the only non-terminal
/// state; `Cancelled` is reachable solely via the cascade that follows a
/// sibling's acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

/// What a target user can do with a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Accept,
    Reject,
}

/// An offer from a shift's current holder to one candidate to cover all or
/// part of that shift.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplacementRequest {
    pub id: i64,
    pub shift_id: Uuid,
    pub requester_id: i32,
    pub target_user_id: i32,
    pub partial: bool,
    pub partial_start: Option<NaiveTime>,
    pub partial_end: Option<NaiveTime>,
    /// Shift bounds captured at creation time, so the offer stays legible
    /// even if the shift record later changes.
    pub original_start: NaiveTime,
    pub original_end: NaiveTime,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The user whose acceptance cascade-cancelled this request. Set only on
    /// the cancelled siblings, never on the accepted request itself.
    pub closed_by: Option<i32>,
}

/// Denormalized shift data embedded in request listings so the presentation
/// layer can render without further joins.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShiftSnapshot {
    pub shift_id: Uuid,
    pub date: NaiveDate,
    pub role: Role,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: i32,
    pub course_type_id: Option<i32>,
    pub course_name: Option<String>,
}

/// One row of a sent/received listing: the request plus everything needed to
/// display it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplacementRequestView {
    #[serde(flatten)]
    pub request: ReplacementRequest,
    pub requester_name: String,
    pub target_user_name: String,
    pub closed_by_name: Option<String>,
    pub shift: ShiftSnapshot,
}
