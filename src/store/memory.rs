//! In-memory backend. Used for tests and for local runs without a database.
//!
//! The accept serialization point is a per-shift mutex: `resolve` takes the
//! lock for the request's shift before re-reading the status, so two
//! concurrent accepts on the same shift are applied one after the other and
//! the loser observes the no-longer-pending state.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Directory, NewReplacementRequest, ReplacementStore, ShiftStore};
use crate::models::{
    CourseType, ReplacementRequest, RequestAction, RequestStatus, Role, Shift, User,
};
use crate::{AppError, AppResult};

#[derive(Default)]
pub struct MemoryStore {
    shifts: RwLock<HashMap<Uuid, Shift>>,
    users: RwLock<HashMap<i32, User>>,
    courses: RwLock<HashMap<i32, CourseType>>,
    category_rates: RwLock<HashMap<Role, Decimal>>,
    user_overrides: RwLock<HashMap<i32, Decimal>>,
    course_overrides: RwLock<HashMap<(i32, i32), Decimal>>,
    requests: RwLock<HashMap<i64, ReplacementRequest>>,
    acks: RwLock<HashMap<i32, DateTime<Utc>>>,
    next_request_id: AtomicI64,
    shift_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_request_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }

    pub fn insert_shift(&self, shift: Shift) {
        self.shifts.write().unwrap().insert(shift.id, shift);
    }

    pub fn insert_course_type(&self, course: CourseType) {
        self.courses.write().unwrap().insert(course.id, course);
    }

    pub fn set_category_rate(&self, role: Role, rate: Decimal) {
        self.category_rates.write().unwrap().insert(role, rate);
    }

    pub fn set_user_override(&self, user_id: i32, rate: Decimal) {
        self.user_overrides.write().unwrap().insert(user_id, rate);
    }

    pub fn set_course_override(&self, user_id: i32, course_type_id: i32, rate: Decimal) {
        self.course_overrides
            .write()
            .unwrap()
            .insert((user_id, course_type_id), rate);
    }

    async fn lock_for_shift(&self, shift_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.shift_locks.lock().await;
        locks
            .entry(shift_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn sort_newest_first(mut requests: Vec<ReplacementRequest>) -> Vec<ReplacementRequest> {
        requests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        requests
    }
}

#[async_trait]
impl ShiftStore for MemoryStore {
    async fn get_shift(&self, id: Uuid) -> AppResult<Option<Shift>> {
        Ok(self.shifts.read().unwrap().get(&id).cloned())
    }

    async fn get_shifts(&self, ids: &[Uuid]) -> AppResult<Vec<Shift>> {
        let shifts = self.shifts.read().unwrap();
        Ok(ids.iter().filter_map(|id| shifts.get(id).cloned()).collect())
    }

    async fn list_shifts_for_month(
        &self,
        user_id: Option<i32>,
        year: i32,
        month: u32,
    ) -> AppResult<Vec<Shift>> {
        let mut shifts: Vec<Shift> = self
            .shifts
            .read()
            .unwrap()
            .values()
            .filter(|s| {
                use chrono::Datelike;
                s.date.year() == year
                    && s.date.month() == month
                    && user_id.map_or(true, |u| s.user_id == u)
            })
            .cloned()
            .collect();
        shifts.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(shifts)
    }

    async fn list_shifts_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>> {
        let mut shifts: Vec<Shift> = self
            .shifts
            .read()
            .unwrap()
            .values()
            .filter(|s| s.date >= start && s.date <= end)
            .cloned()
            .collect();
        shifts.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(shifts)
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn list_course_types(&self) -> AppResult<Vec<CourseType>> {
        let mut courses: Vec<CourseType> = self.courses.read().unwrap().values().cloned().collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(courses)
    }

    async fn get_course_type(&self, id: i32) -> AppResult<Option<CourseType>> {
        Ok(self.courses.read().unwrap().get(&id).cloned())
    }

    async fn category_base_rate(&self, role: Role) -> AppResult<Option<Decimal>> {
        Ok(self.category_rates.read().unwrap().get(&role).copied())
    }

    async fn user_hourly_override(&self, user_id: i32) -> AppResult<Option<Decimal>> {
        Ok(self.user_overrides.read().unwrap().get(&user_id).copied())
    }

    async fn instructor_course_override(
        &self,
        user_id: i32,
        course_type_id: i32,
    ) -> AppResult<Option<Decimal>> {
        Ok(self
            .course_overrides
            .read()
            .unwrap()
            .get(&(user_id, course_type_id))
            .copied())
    }
}

#[async_trait]
impl ReplacementStore for MemoryStore {
    async fn create_batch(
        &self,
        new_requests: Vec<NewReplacementRequest>,
    ) -> AppResult<Vec<ReplacementRequest>> {
        let now = Utc::now();
        let mut requests = self.requests.write().unwrap();
        let mut created = Vec::with_capacity(new_requests.len());

        for input in new_requests {
            let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
            let request = ReplacementRequest {
                id,
                shift_id: input.shift_id,
                requester_id: input.requester_id,
                target_user_id: input.target_user_id,
                partial: input.partial,
                partial_start: input.partial_start,
                partial_end: input.partial_end,
                original_start: input.original_start,
                original_end: input.original_end,
                status: RequestStatus::Pending,
                created_at: now,
                updated_at: now,
                closed_by: None,
            };
            requests.insert(id, request.clone());
            created.push(request);
        }

        Ok(created)
    }

    async fn get(&self, id: i64) -> AppResult<Option<ReplacementRequest>> {
        Ok(self.requests.read().unwrap().get(&id).cloned())
    }

    async fn resolve(&self, id: i64, action: RequestAction) -> AppResult<ReplacementRequest> {
        let shift_id = self
            .requests
            .read()
            .unwrap()
            .get(&id)
            .map(|r| r.shift_id)
            .ok_or(AppError::RequestNotFound(id))?;

        let lock = self.lock_for_shift(shift_id).await;
        let _guard = lock.lock().await;

        // Status re-checked under the shift lock: a raced sibling accept may
        // have resolved this request between the lookup above and here.
        let mut requests = self.requests.write().unwrap();
        let current = requests
            .get(&id)
            .cloned()
            .ok_or(AppError::RequestNotFound(id))?;

        if current.status.is_terminal() {
            return Err(AppError::RequestNotPending {
                id,
                status: current.status,
            });
        }

        let now = Utc::now();
        let new_status = match action {
            RequestAction::Accept => RequestStatus::Accepted,
            RequestAction::Reject => RequestStatus::Rejected,
        };

        let entry = requests.get_mut(&id).expect("request present");
        entry.status = new_status;
        entry.updated_at = now;
        let resolved = entry.clone();

        if action == RequestAction::Accept {
            let winner = resolved.target_user_id;
            for sibling in requests.values_mut() {
                if sibling.shift_id == shift_id
                    && sibling.id != id
                    && sibling.status == RequestStatus::Pending
                {
                    sibling.status = RequestStatus::Cancelled;
                    sibling.closed_by = Some(winner);
                    sibling.updated_at = now;
                }
            }
        }

        Ok(resolved)
    }

    async fn list_sent(&self, user_id: i32) -> AppResult<Vec<ReplacementRequest>> {
        let requests: Vec<ReplacementRequest> = self
            .requests
            .read()
            .unwrap()
            .values()
            .filter(|r| r.requester_id == user_id)
            .cloned()
            .collect();
        Ok(Self::sort_newest_first(requests))
    }

    async fn list_received(
        &self,
        user_id: i32,
        only_pending: bool,
    ) -> AppResult<Vec<ReplacementRequest>> {
        let requests: Vec<ReplacementRequest> = self
            .requests
            .read()
            .unwrap()
            .values()
            .filter(|r| {
                r.target_user_id == user_id
                    && (!only_pending || r.status == RequestStatus::Pending)
            })
            .cloned()
            .collect();
        Ok(Self::sort_newest_first(requests))
    }

    async fn accepted_for_shifts(
        &self,
        shift_ids: &[Uuid],
    ) -> AppResult<Vec<ReplacementRequest>> {
        let requests = self.requests.read().unwrap();
        let mut newest: HashMap<Uuid, ReplacementRequest> = HashMap::new();
        for request in requests.values() {
            if request.status != RequestStatus::Accepted || !shift_ids.contains(&request.shift_id)
            {
                continue;
            }
            match newest.get(&request.shift_id) {
                Some(existing) if existing.id >= request.id => {}
                _ => {
                    newest.insert(request.shift_id, request.clone());
                }
            }
        }
        Ok(newest.into_values().collect())
    }

    async fn last_acknowledged(&self, user_id: i32) -> AppResult<Option<DateTime<Utc>>> {
        Ok(self.acks.read().unwrap().get(&user_id).copied())
    }

    async fn acknowledge(&self, user_id: i32, at: DateTime<Utc>) -> AppResult<()> {
        self.acks.write().unwrap().insert(user_id, at);
        Ok(())
    }
}
