//! Replacement request workflow: creation fan-out, accept/reject resolution,
//! listings and the accepted-replacement overlay for shift views.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::models::{
    AckResponse, CreateReplacementInput, ReplacementInfo, ReplacementListResponse,
    ReplacementRequest, ReplacementRequestView, RequestAction, Shift, ShiftSnapshot,
};
use crate::store::{Directory, NewReplacementRequest, ReplacementStore, ShiftStore};
use crate::{AppError, AppResult};

pub struct ReplacementService {
    shifts: Arc<dyn ShiftStore>,
    directory: Arc<dyn Directory>,
    requests: Arc<dyn ReplacementStore>,
}

impl ReplacementService {
    pub fn new(
        shifts: Arc<dyn ShiftStore>,
        directory: Arc<dyn Directory>,
        requests: Arc<dyn ReplacementStore>,
    ) -> Self {
        Self {
            shifts,
            directory,
            requests,
        }
    }

    /// Fan a cover offer out to a list of candidates, one pending request per
    /// target. Targets equal to the requester are silently skipped. The
    /// shift's bounds are snapshotted onto every request at creation.
    pub async fn create_requests(
        &self,
        input: CreateReplacementInput,
    ) -> AppResult<Vec<ReplacementRequest>> {
        let shift = self
            .shifts
            .get_shift(input.shift_id)
            .await?
            .ok_or(AppError::ShiftNotFound(input.shift_id))?;

        if shift.user_id != input.requester_id {
            return Err(AppError::BadRequest(
                "only the shift's current holder can request a replacement".to_string(),
            ));
        }
        if input.target_users.is_empty() {
            return Err(AppError::BadRequest(
                "target_users must not be empty".to_string(),
            ));
        }

        let (partial_start, partial_end) = if input.partial {
            let (Some(start), Some(end)) = (input.partial_start, input.partial_end) else {
                return Err(AppError::InvalidPartialRange(
                    "partial requests need both partial_start and partial_end".to_string(),
                ));
            };
            if start >= end {
                return Err(AppError::InvalidPartialRange(
                    "partial_start must come before partial_end".to_string(),
                ));
            }
            if start < shift.start_time || end > shift.end_time {
                return Err(AppError::InvalidPartialRange(
                    "partial window must lie within the shift".to_string(),
                ));
            }
            (Some(start), Some(end))
        } else {
            // Bounds on a full request are ignored, not stored.
            (None, None)
        };

        let new_requests: Vec<NewReplacementRequest> = input
            .target_users
            .iter()
            .copied()
            .filter(|&target| target != input.requester_id)
            .map(|target| NewReplacementRequest {
                shift_id: shift.id,
                requester_id: input.requester_id,
                target_user_id: target,
                partial: input.partial,
                partial_start,
                partial_end,
                original_start: shift.start_time,
                original_end: shift.end_time,
            })
            .collect();

        let created = self.requests.create_batch(new_requests).await?;
        tracing::info!(
            shift_id = %shift.id,
            requester_id = input.requester_id,
            count = created.len(),
            "Created replacement requests"
        );
        Ok(created)
    }

    /// Apply an accept or reject to a pending request. The store guarantees
    /// at most one accept wins per shift and cascade-cancels the rest.
    pub async fn respond(&self, id: i64, action: RequestAction) -> AppResult<ReplacementRequest> {
        let resolved = self.requests.resolve(id, action).await?;
        tracing::info!(
            request_id = id,
            status = %resolved.status,
            "Resolved replacement request"
        );
        Ok(resolved)
    }

    /// Requests created by `user_id`, optionally narrowed to one shift month.
    pub async fn list_sent(
        &self,
        user_id: i32,
        year: Option<i32>,
        month: Option<u32>,
    ) -> AppResult<ReplacementListResponse> {
        let requests = self.requests.list_sent(user_id).await?;
        self.build_listing(user_id, requests, year, month).await
    }

    /// Requests targeted at `user_id`, optionally pending-only and narrowed
    /// to one shift month.
    pub async fn list_received(
        &self,
        user_id: i32,
        only_pending: bool,
        year: Option<i32>,
        month: Option<u32>,
    ) -> AppResult<ReplacementListResponse> {
        let requests = self.requests.list_received(user_id, only_pending).await?;
        self.build_listing(user_id, requests, year, month).await
    }

    /// Record that `user_id` has seen their inbox as of now.
    pub async fn acknowledge(&self, user_id: i32) -> AppResult<AckResponse> {
        let at = Utc::now();
        self.requests.acknowledge(user_id, at).await?;
        Ok(AckResponse {
            user_id,
            last_acknowledged: at,
        })
    }

    /// Overlay map for shift views: the newest accepted request per shift,
    /// turned into presentation info. Assignment itself never changes.
    pub async fn replacement_info_for(
        &self,
        shifts: &[Shift],
    ) -> AppResult<HashMap<Uuid, ReplacementInfo>> {
        let ids: Vec<Uuid> = shifts.iter().map(|s| s.id).collect();
        let accepted = self.requests.accepted_for_shifts(&ids).await?;
        if accepted.is_empty() {
            return Ok(HashMap::new());
        }

        let names = self.user_names().await?;
        let mut overlay = HashMap::new();
        for request in accepted {
            overlay.insert(
                request.shift_id,
                ReplacementInfo {
                    accepted: true,
                    requester_id: request.requester_id,
                    requester_name: name_of(&names, request.requester_id),
                    accepted_by_id: request.target_user_id,
                    accepted_by_name: name_of(&names, request.target_user_id),
                    partial: request.partial,
                    partial_start: request.partial_start,
                    partial_end: request.partial_end,
                    original_start: request.original_start,
                    original_end: request.original_end,
                },
            );
        }
        Ok(overlay)
    }

    async fn build_listing(
        &self,
        user_id: i32,
        requests: Vec<ReplacementRequest>,
        year: Option<i32>,
        month: Option<u32>,
    ) -> AppResult<ReplacementListResponse> {
        let shift_ids: Vec<Uuid> = {
            let mut ids: Vec<Uuid> = requests.iter().map(|r| r.shift_id).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let shifts: HashMap<Uuid, Shift> = self
            .shifts
            .get_shifts(&shift_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let names = self.user_names().await?;
        let course_names: HashMap<i32, String> = self
            .directory
            .list_course_types()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut views = Vec::new();
        for request in requests {
            let Some(shift) = shifts.get(&request.shift_id) else {
                // The shift was deleted out from under the request.
                tracing::warn!(
                    request_id = request.id,
                    shift_id = %request.shift_id,
                    "Dropping request whose shift no longer exists"
                );
                continue;
            };

            if let (Some(y), Some(m)) = (year, month) {
                if shift.date.year() != y || shift.date.month() != m {
                    continue;
                }
            }

            views.push(ReplacementRequestView {
                requester_name: name_of(&names, request.requester_id),
                target_user_name: name_of(&names, request.target_user_id),
                closed_by_name: request.closed_by.map(|id| name_of(&names, id)),
                shift: ShiftSnapshot {
                    shift_id: shift.id,
                    date: shift.date,
                    role: shift.role,
                    start_time: shift.start_time,
                    end_time: shift.end_time,
                    user_id: shift.user_id,
                    course_type_id: shift.course_type_id,
                    course_name: shift
                        .course_type_id
                        .and_then(|id| course_names.get(&id).cloned()),
                },
                request,
            });
        }

        let last_acknowledged = self.requests.last_acknowledged(user_id).await?;
        Ok(ReplacementListResponse {
            requests: views,
            last_acknowledged,
        })
    }

    async fn user_names(&self) -> AppResult<HashMap<i32, String>> {
        Ok(self
            .directory
            .list_users()
            .await?
            .iter()
            .map(|u| (u.id, u.display_name()))
            .collect())
    }
}

fn name_of(names: &HashMap<i32, String>, id: i32) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("user {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestStatus, Role, User};
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn user(id: i32, first: &str, last: &str) -> User {
        User {
            id,
            username: format!("u{id}"),
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    fn seeded() -> (Arc<MemoryStore>, ReplacementService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(user(1, "Anna", "Rossi"));
        store.insert_user(user(2, "Luca", "Bianchi"));
        store.insert_user(user(3, "Sara", "Verdi"));

        let shift_id = Uuid::new_v4();
        store.insert_shift(Shift {
            id: shift_id,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            role: Role::Lifeguard,
            start_time: t(8, 0),
            end_time: t(12, 0),
            user_id: 1,
            course_type_id: None,
        });

        let service = ReplacementService::new(store.clone(), store.clone(), store.clone());
        (store, service, shift_id)
    }

    fn full_request(shift_id: Uuid, requester: i32, targets: Vec<i32>) -> CreateReplacementInput {
        CreateReplacementInput {
            shift_id,
            requester_id: requester,
            target_users: targets,
            partial: false,
            partial_start: None,
            partial_end: None,
        }
    }

    #[tokio::test]
    async fn create_fans_out_one_request_per_target() {
        let (_store, service, shift_id) = seeded();

        let created = service
            .create_requests(full_request(shift_id, 1, vec![2, 3]))
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|r| r.status == RequestStatus::Pending));
        assert!(created.iter().all(|r| r.original_start == t(8, 0)));
        assert!(created.iter().all(|r| r.original_end == t(12, 0)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_shift() {
        let (_store, service, _shift_id) = seeded();

        let err = service
            .create_requests(full_request(Uuid::new_v4(), 1, vec![2]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ShiftNotFound(_)));
    }

    #[tokio::test]
    async fn create_rejects_non_holder_requester() {
        let (_store, service, shift_id) = seeded();

        let err = service
            .create_requests(full_request(shift_id, 2, vec![3]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_rejects_empty_target_list() {
        let (_store, service, shift_id) = seeded();

        let err = service
            .create_requests(full_request(shift_id, 1, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn self_targets_are_skipped() {
        let (_store, service, shift_id) = seeded();

        let created = service
            .create_requests(full_request(shift_id, 1, vec![1, 2]))
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].target_user_id, 2);
    }

    #[tokio::test]
    async fn partial_requires_both_bounds_in_order_within_shift() {
        let (_store, service, shift_id) = seeded();

        let mut input = full_request(shift_id, 1, vec![2]);
        input.partial = true;
        input.partial_start = Some(t(9, 0));
        input.partial_end = None;
        let err = service.create_requests(input.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPartialRange(_)));

        input.partial_end = Some(t(9, 0));
        let err = service.create_requests(input.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPartialRange(_)));

        input.partial_start = Some(t(7, 0));
        input.partial_end = Some(t(10, 0));
        let err = service.create_requests(input.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPartialRange(_)));

        input.partial_start = Some(t(9, 0));
        input.partial_end = Some(t(11, 0));
        let created = service.create_requests(input).await.unwrap();
        assert_eq!(created[0].partial_start, Some(t(9, 0)));
        assert_eq!(created[0].partial_end, Some(t(11, 0)));
    }

    #[tokio::test]
    async fn bounds_on_full_requests_are_dropped() {
        let (_store, service, shift_id) = seeded();

        let mut input = full_request(shift_id, 1, vec![2]);
        input.partial_start = Some(t(9, 0));
        input.partial_end = Some(t(10, 0));

        let created = service.create_requests(input).await.unwrap();
        assert!(created[0].partial_start.is_none());
        assert!(created[0].partial_end.is_none());
    }

    #[tokio::test]
    async fn failed_validation_creates_nothing() {
        let (store, service, shift_id) = seeded();

        let mut input = full_request(shift_id, 1, vec![2, 3]);
        input.partial = true;
        let _ = service.create_requests(input).await.unwrap_err();

        assert!(store.list_sent(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_cascades_cancel_with_closed_by() {
        let (store, service, shift_id) = seeded();
        let created = service
            .create_requests(full_request(shift_id, 1, vec![2, 3]))
            .await
            .unwrap();
        let (to_accept, sibling) = (created[0].id, created[1].id);

        let accepted = service
            .respond(to_accept, RequestAction::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(accepted.closed_by.is_none());

        let cancelled = store.get(sibling).await.unwrap().unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert_eq!(cancelled.closed_by, Some(accepted.target_user_id));
    }

    #[tokio::test]
    async fn reject_leaves_siblings_pending() {
        let (store, service, shift_id) = seeded();
        let created = service
            .create_requests(full_request(shift_id, 1, vec![2, 3]))
            .await
            .unwrap();

        let rejected = service
            .respond(created[0].id, RequestAction::Reject)
            .await
            .unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);

        let sibling = store.get(created[1].id).await.unwrap().unwrap();
        assert_eq!(sibling.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn responding_twice_conflicts() {
        let (_store, service, shift_id) = seeded();
        let created = service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();

        service
            .respond(created[0].id, RequestAction::Reject)
            .await
            .unwrap();
        let err = service
            .respond(created[0].id, RequestAction::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RequestNotPending { .. }));
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let (_store, service, _shift_id) = seeded();

        let err = service.respond(999, RequestAction::Accept).await.unwrap_err();
        assert!(matches!(err, AppError::RequestNotFound(999)));
    }

    #[tokio::test]
    async fn concurrent_accepts_have_exactly_one_winner() {
        let (store, service, shift_id) = seeded();
        let service = Arc::new(service);
        let created = service
            .create_requests(full_request(shift_id, 1, vec![2, 3]))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for request in &created {
            let service = service.clone();
            let id = request.id;
            handles.push(tokio::spawn(async move {
                service.respond(id, RequestAction::Accept).await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(r) => {
                    assert_eq!(r.status, RequestStatus::Accepted);
                    wins += 1;
                }
                Err(AppError::RequestNotPending { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);

        let accepted = store
            .accepted_for_shifts(&[shift_id])
            .await
            .unwrap();
        assert_eq!(accepted.len(), 1);
    }

    #[tokio::test]
    async fn listings_carry_names_and_snapshot() {
        let (_store, service, shift_id) = seeded();
        service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();

        let received = service.list_received(2, false, None, None).await.unwrap();
        assert_eq!(received.requests.len(), 1);
        let view = &received.requests[0];
        assert_eq!(view.requester_name, "Anna Rossi");
        assert_eq!(view.target_user_name, "Luca Bianchi");
        assert_eq!(view.shift.shift_id, shift_id);
        assert_eq!(view.shift.start_time, t(8, 0));
        assert!(received.last_acknowledged.is_none());

        let sent = service.list_sent(1, None, None).await.unwrap();
        assert_eq!(sent.requests.len(), 1);
    }

    #[tokio::test]
    async fn month_filter_narrows_listings() {
        let (store, service, shift_id) = seeded();
        let other_shift = Uuid::new_v4();
        store.insert_shift(Shift {
            id: other_shift,
            date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            role: Role::Lifeguard,
            start_time: t(8, 0),
            end_time: t(12, 0),
            user_id: 1,
            course_type_id: None,
        });
        service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();
        service
            .create_requests(full_request(other_shift, 1, vec![2]))
            .await
            .unwrap();

        let march = service
            .list_received(2, false, Some(2025), Some(3))
            .await
            .unwrap();
        assert_eq!(march.requests.len(), 1);
        assert_eq!(march.requests[0].request.shift_id, shift_id);

        let all = service.list_received(2, false, None, None).await.unwrap();
        assert_eq!(all.requests.len(), 2);
    }

    #[tokio::test]
    async fn only_pending_filter_hides_resolved_requests() {
        let (_store, service, shift_id) = seeded();
        let created = service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();
        service
            .respond(created[0].id, RequestAction::Reject)
            .await
            .unwrap();

        let pending = service.list_received(2, true, None, None).await.unwrap();
        assert!(pending.requests.is_empty());

        let all = service.list_received(2, false, None, None).await.unwrap();
        assert_eq!(all.requests.len(), 1);
    }

    #[tokio::test]
    async fn acknowledge_sets_and_returns_marker() {
        let (_store, service, shift_id) = seeded();
        service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();

        let ack = service.acknowledge(2).await.unwrap();
        assert_eq!(ack.user_id, 2);

        let listing = service.list_received(2, false, None, None).await.unwrap();
        assert_eq!(listing.last_acknowledged, Some(ack.last_acknowledged));
    }

    #[tokio::test]
    async fn overlay_reports_newest_accepted_request() {
        let (store, service, shift_id) = seeded();
        let created = service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();
        service
            .respond(created[0].id, RequestAction::Accept)
            .await
            .unwrap();

        let shift = store.get_shift(shift_id).await.unwrap().unwrap();
        let overlay = service.replacement_info_for(&[shift]).await.unwrap();

        let info = overlay.get(&shift_id).unwrap();
        assert!(info.accepted);
        assert_eq!(info.requester_name, "Anna Rossi");
        assert_eq!(info.accepted_by_id, 2);
        assert_eq!(info.accepted_by_name, "Luca Bianchi");
        assert!(!info.partial);
        assert_eq!(info.original_start, t(8, 0));
    }

    #[tokio::test]
    async fn overlay_is_empty_without_accepted_requests() {
        let (store, service, shift_id) = seeded();
        service
            .create_requests(full_request(shift_id, 1, vec![2]))
            .await
            .unwrap();

        let shift = store.get_shift(shift_id).await.unwrap().unwrap();
        let overlay = service.replacement_info_for(&[shift]).await.unwrap();
        assert!(overlay.is_empty());
    }
}
