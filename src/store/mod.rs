use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    CourseType, ReplacementRequest, RequestAction, Role, Shift, User,
};
use crate::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Durable shift records. Owned elsewhere; the core only reads.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    async fn get_shift(&self, id: Uuid) -> AppResult<Option<Shift>>;

    async fn get_shifts(&self, ids: &[Uuid]) -> AppResult<Vec<Shift>>;

    /// Shifts for one month, optionally narrowed to one user. Ordered by
    /// date, then start time.
    async fn list_shifts_for_month(
        &self,
        user_id: Option<i32>,
        year: i32,
        month: u32,
    ) -> AppResult<Vec<Shift>>;

    /// Shifts with `start <= date <= end`, all users. Ordered by date, then
    /// start time.
    async fn list_shifts_in_range(&self, start: NaiveDate, end: NaiveDate)
        -> AppResult<Vec<Shift>>;
}

/// Users, the course catalog and the rate tables. Read-only.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn list_course_types(&self) -> AppResult<Vec<CourseType>>;

    async fn get_course_type(&self, id: i32) -> AppResult<Option<CourseType>>;

    async fn category_base_rate(&self, role: Role) -> AppResult<Option<Decimal>>;

    async fn user_hourly_override(&self, user_id: i32) -> AppResult<Option<Decimal>>;

    async fn instructor_course_override(
        &self,
        user_id: i32,
        course_type_id: i32,
    ) -> AppResult<Option<Decimal>>;
}

/// Input for one request of a batch create. The batch shares one partial
/// window and one original-bounds snapshot.
#[derive(Debug, Clone)]
pub struct NewReplacementRequest {
    pub shift_id: Uuid,
    pub requester_id: i32,
    pub target_user_id: i32,
    pub partial: bool,
    pub partial_start: Option<NaiveTime>,
    pub partial_end: Option<NaiveTime>,
    pub original_start: NaiveTime,
    pub original_end: NaiveTime,
}

/// Replacement request persistence. `resolve` is the single race-sensitive
/// operation: each backend supplies its own serialization point scoped to
/// the request's shift.
#[async_trait]
pub trait ReplacementStore: Send + Sync {
    async fn create_batch(
        &self,
        requests: Vec<NewReplacementRequest>,
    ) -> AppResult<Vec<ReplacementRequest>>;

    async fn get(&self, id: i64) -> AppResult<Option<ReplacementRequest>>;

    /// Atomically apply `action` to a pending request. Accepting also
    /// cascade-cancels every still-pending sibling on the same shift, with
    /// `closed_by` set to the accepting user — all in the same atomic unit.
    /// Fails with `RequestNotPending` when the request is already terminal.
    async fn resolve(&self, id: i64, action: RequestAction) -> AppResult<ReplacementRequest>;

    /// Requests created by `user_id`, newest first (created_at, then id).
    async fn list_sent(&self, user_id: i32) -> AppResult<Vec<ReplacementRequest>>;

    /// Requests targeted at `user_id`, newest first (created_at, then id).
    async fn list_received(
        &self,
        user_id: i32,
        only_pending: bool,
    ) -> AppResult<Vec<ReplacementRequest>>;

    /// Newest accepted request per shift, for the replacement-info overlay.
    async fn accepted_for_shifts(
        &self,
        shift_ids: &[Uuid],
    ) -> AppResult<Vec<ReplacementRequest>>;

    async fn last_acknowledged(&self, user_id: i32) -> AppResult<Option<DateTime<Utc>>>;

    async fn acknowledge(&self, user_id: i32, at: DateTime<Utc>) -> AppResult<()>;
}
