//! Postgres backend. The accept serialization point is a transaction that
//! first locks the request's shift row (`SELECT ... FOR UPDATE`) and then
//! applies a conditional `UPDATE ... WHERE status = 'pending'`: a concurrent
//! accept on a sibling request waits on the shift lock, after which its own
//! conditional update matches zero rows and the caller gets
//! `RequestNotPending`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Directory, NewReplacementRequest, ReplacementStore, ShiftStore};
use crate::models::{
    BillingMode, CourseType, ReplacementRequest, RequestAction, RequestStatus, Role, Shift, User,
};
use crate::{AppError, AppResult};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ShiftRow {
    id: Uuid,
    date: NaiveDate,
    role: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    user_id: i32,
    course_type_id: Option<i32>,
}

impl ShiftRow {
    fn into_shift(self) -> AppResult<Shift> {
        Ok(Shift {
            id: self.id,
            date: self.date,
            role: parse_role(&self.role)?,
            start_time: self.start_time,
            end_time: self.end_time,
            user_id: self.user_id,
            course_type_id: self.course_type_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct RequestRow {
    id: i64,
    shift_id: Uuid,
    requester_id: i32,
    target_user_id: i32,
    partial: bool,
    partial_start: Option<NaiveTime>,
    partial_end: Option<NaiveTime>,
    original_start: NaiveTime,
    original_end: NaiveTime,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_by: Option<i32>,
}

impl RequestRow {
    fn into_request(self) -> AppResult<ReplacementRequest> {
        Ok(ReplacementRequest {
            id: self.id,
            shift_id: self.shift_id,
            requester_id: self.requester_id,
            target_user_id: self.target_user_id,
            partial: self.partial,
            partial_start: self.partial_start,
            partial_end: self.partial_end,
            original_start: self.original_start,
            original_end: self.original_end,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            closed_by: self.closed_by,
        })
    }
}

#[derive(Debug, FromRow)]
struct CourseTypeRow {
    id: i32,
    name: String,
    default_minutes: Option<i32>,
    base_rate: Decimal,
    billing: String,
}

impl CourseTypeRow {
    fn into_course(self) -> AppResult<CourseType> {
        let billing = self
            .billing
            .parse::<BillingMode>()
            .map_err(AppError::Internal)?;
        Ok(CourseType {
            id: self.id,
            name: self.name,
            default_minutes: self.default_minutes,
            base_rate: self.base_rate,
            billing,
        })
    }
}

fn parse_role(s: &str) -> AppResult<Role> {
    s.parse::<Role>().map_err(AppError::Internal)
}

fn parse_status(s: &str) -> AppResult<RequestStatus> {
    s.parse::<RequestStatus>().map_err(AppError::Internal)
}

const SHIFT_COLUMNS: &str = r#"
    id, date, role, start_time, end_time, user_id, course_type_id
"#;

const REQUEST_COLUMNS: &str = r#"
    id, shift_id, requester_id, target_user_id, partial, partial_start,
    partial_end, original_start, original_end, status, created_at,
    updated_at, closed_by
"#;

#[async_trait]
impl ShiftStore for PgStore {
    async fn get_shift(&self, id: Uuid) -> AppResult<Option<Shift>> {
        let row: Option<ShiftRow> = sqlx::query_as(&format!(
            r#"SELECT {SHIFT_COLUMNS} FROM "Shifts" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ShiftRow::into_shift).transpose()
    }

    async fn get_shifts(&self, ids: &[Uuid]) -> AppResult<Vec<Shift>> {
        let rows: Vec<ShiftRow> = sqlx::query_as(&format!(
            r#"SELECT {SHIFT_COLUMNS} FROM "Shifts" WHERE id = ANY($1)"#
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ShiftRow::into_shift).collect()
    }

    async fn list_shifts_for_month(
        &self,
        user_id: Option<i32>,
        year: i32,
        month: u32,
    ) -> AppResult<Vec<Shift>> {
        let base = format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM "Shifts"
            WHERE EXTRACT(YEAR FROM date) = $1
            AND EXTRACT(MONTH FROM date) = $2
            "#
        );

        let rows: Vec<ShiftRow> = if let Some(user_id) = user_id {
            sqlx::query_as(&format!("{base} AND user_id = $3 ORDER BY date, start_time"))
                .bind(year)
                .bind(month as i32)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query_as(&format!("{base} ORDER BY date, start_time"))
                .bind(year)
                .bind(month as i32)
                .fetch_all(&self.pool)
                .await?
        };

        rows.into_iter().map(ShiftRow::into_shift).collect()
    }

    async fn list_shifts_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>> {
        let rows: Vec<ShiftRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SHIFT_COLUMNS}
            FROM "Shifts"
            WHERE date BETWEEN $1 AND $2
            ORDER BY date, start_time
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ShiftRow::into_shift).collect()
    }
}

#[async_trait]
impl Directory for PgStore {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users: Vec<User> = sqlx::query_as::<_, (i32, String, String, String)>(
            r#"SELECT id, username, first_name, last_name FROM "Users" ORDER BY username"#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(id, username, first_name, last_name)| User {
            id,
            username,
            first_name,
            last_name,
        })
        .collect();
        Ok(users)
    }

    async fn list_course_types(&self) -> AppResult<Vec<CourseType>> {
        let rows: Vec<CourseTypeRow> = sqlx::query_as(
            r#"
            SELECT id, name, default_minutes, base_rate, billing
            FROM "CourseTypes"
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CourseTypeRow::into_course).collect()
    }

    async fn get_course_type(&self, id: i32) -> AppResult<Option<CourseType>> {
        let row: Option<CourseTypeRow> = sqlx::query_as(
            r#"
            SELECT id, name, default_minutes, base_rate, billing
            FROM "CourseTypes"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CourseTypeRow::into_course).transpose()
    }

    async fn category_base_rate(&self, role: Role) -> AppResult<Option<Decimal>> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"SELECT base_rate FROM "CategoryBaseRates" WHERE role = $1"#,
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(rate,)| rate))
    }

    async fn user_hourly_override(&self, user_id: i32) -> AppResult<Option<Decimal>> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"SELECT rate FROM "UserHourlyRates" WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(rate,)| rate))
    }

    async fn instructor_course_override(
        &self,
        user_id: i32,
        course_type_id: i32,
    ) -> AppResult<Option<Decimal>> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            SELECT rate FROM "InstructorCourseRates"
            WHERE instructor_id = $1 AND course_type_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_type_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(rate,)| rate))
    }
}

#[async_trait]
impl ReplacementStore for PgStore {
    async fn create_batch(
        &self,
        new_requests: Vec<NewReplacementRequest>,
    ) -> AppResult<Vec<ReplacementRequest>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(new_requests.len());

        for input in new_requests {
            let row: RequestRow = sqlx::query_as(&format!(
                r#"
                INSERT INTO "ReplacementRequests" (
                    shift_id, requester_id, target_user_id, partial,
                    partial_start, partial_end, original_start, original_end,
                    status, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', NOW(), NOW())
                RETURNING {REQUEST_COLUMNS}
                "#
            ))
            .bind(input.shift_id)
            .bind(input.requester_id)
            .bind(input.target_user_id)
            .bind(input.partial)
            .bind(input.partial_start)
            .bind(input.partial_end)
            .bind(input.original_start)
            .bind(input.original_end)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row.into_request()?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn get(&self, id: i64) -> AppResult<Option<ReplacementRequest>> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            r#"SELECT {REQUEST_COLUMNS} FROM "ReplacementRequests" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RequestRow::into_request).transpose()
    }

    async fn resolve(&self, id: i64, action: RequestAction) -> AppResult<ReplacementRequest> {
        let new_status = match action {
            RequestAction::Accept => RequestStatus::Accepted,
            RequestAction::Reject => RequestStatus::Rejected,
        };

        let mut tx = self.pool.begin().await?;

        // Serialization point scoped to the shift: lock the shift row before
        // touching any request rows. Concurrent accepts on sibling requests
        // queue on this lock instead of deadlocking on each other's cascade
        // updates, and the loser's conditional update then matches zero rows.
        let shift: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT shift_id FROM "ReplacementRequests" WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((shift_id,)) = shift else {
            tx.rollback().await?;
            return Err(AppError::RequestNotFound(id));
        };
        sqlx::query(r#"SELECT id FROM "Shifts" WHERE id = $1 FOR UPDATE"#)
            .bind(shift_id)
            .execute(&mut *tx)
            .await?;

        let updated: Option<RequestRow> = sqlx::query_as(&format!(
            r#"
            UPDATE "ReplacementRequests"
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            // Either the request never existed or a raced response got there
            // first; report which.
            let current: Option<(String,)> = sqlx::query_as(
                r#"SELECT status FROM "ReplacementRequests" WHERE id = $1"#,
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Err(match current {
                None => AppError::RequestNotFound(id),
                Some((status,)) => AppError::RequestNotPending {
                    id,
                    status: parse_status(&status)?,
                },
            });
        };

        let resolved = row.into_request()?;

        if action == RequestAction::Accept {
            sqlx::query(
                r#"
                UPDATE "ReplacementRequests"
                SET status = 'cancelled', closed_by = $1, updated_at = NOW()
                WHERE shift_id = $2 AND id <> $3 AND status = 'pending'
                "#,
            )
            .bind(resolved.target_user_id)
            .bind(resolved.shift_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, request_id = id, "Failed to commit resolve transaction");
            AppError::Database(e)
        })?;

        Ok(resolved)
    }

    async fn list_sent(&self, user_id: i32) -> AppResult<Vec<ReplacementRequest>> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM "ReplacementRequests"
            WHERE requester_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RequestRow::into_request).collect()
    }

    async fn list_received(
        &self,
        user_id: i32,
        only_pending: bool,
    ) -> AppResult<Vec<ReplacementRequest>> {
        let mut sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM "ReplacementRequests"
            WHERE target_user_id = $1
            "#
        );
        if only_pending {
            sql.push_str(" AND status = 'pending'");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<RequestRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(RequestRow::into_request).collect()
    }

    async fn accepted_for_shifts(
        &self,
        shift_ids: &[Uuid],
    ) -> AppResult<Vec<ReplacementRequest>> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            r#"
            SELECT DISTINCT ON (shift_id) {REQUEST_COLUMNS}
            FROM "ReplacementRequests"
            WHERE status = 'accepted' AND shift_id = ANY($1)
            ORDER BY shift_id, id DESC
            "#
        ))
        .bind(shift_ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RequestRow::into_request).collect()
    }

    async fn last_acknowledged(&self, user_id: i32) -> AppResult<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"SELECT last_acknowledged FROM "ReplacementAcks" WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(at,)| at))
    }

    async fn acknowledge(&self, user_id: i32, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO "ReplacementAcks" (user_id, last_acknowledged)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET last_acknowledged = EXCLUDED.last_acknowledged
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
