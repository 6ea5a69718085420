use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Role;

/// A scheduled work interval for one user, one role, one date. Owned by the
/// Shift Store; the core reads and annotates it, never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Shift {
    pub id: Uuid,
    pub date: NaiveDate,
    pub role: Role,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: i32,
    /// Only meaningful when `role` is instructor.
    pub course_type_id: Option<i32>,
}

impl Shift {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Read projection attached to a shift once a replacement request against it
/// has been accepted. Computed on read, never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplacementInfo {
    pub accepted: bool,
    pub requester_id: i32,
    pub requester_name: String,
    pub accepted_by_id: i32,
    pub accepted_by_name: String,
    pub partial: bool,
    pub partial_start: Option<NaiveTime>,
    pub partial_end: Option<NaiveTime>,
    pub original_start: NaiveTime,
    pub original_end: NaiveTime,
}

/// Shift as served to the presentation layer: the raw record plus the
/// replacement overlay when one exists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShiftView {
    #[serde(flatten)]
    pub shift: Shift,
    pub user_name: Option<String>,
    pub replacement_info: Option<ReplacementInfo>,
}

/// Display-only aggregation of back-to-back same-role (and, for instructors,
/// same-course) shifts. Produced by the contiguity merger.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DisplayBlock {
    pub role: Role,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub course_type_id: Option<i32>,
    /// Common course name, populated for merged instructor blocks.
    pub merged_course: Option<String>,
    pub merged_count: usize,
    pub is_merged: bool,
}
