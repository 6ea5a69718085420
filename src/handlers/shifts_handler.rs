use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    models::{Shift, ShiftView},
    AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetShiftsQuery {
    pub user_id: Option<i32>,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetWeekQuery {
    pub start_date: NaiveDate,
}

/// GET /api/shifts?user_id=&year=&month=
#[utoipa::path(
    get,
    path = "/api/shifts",
    params(GetShiftsQuery),
    responses(
        (status = 200, description = "Shifts for the month with replacement overlay", body = Vec<ShiftView>),
        (status = 400, description = "Invalid month")
    ),
    tag = "shifts"
)]
pub async fn get_shifts_for_month(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GetShiftsQuery>,
) -> AppResult<Json<Vec<ShiftView>>> {
    super::check_month(query.month)?;

    let shifts = state
        .shifts
        .list_shifts_for_month(query.user_id, query.year, query.month)
        .await?;

    let views = annotate(&state, shifts).await?;
    Ok(Json(views))
}

/// GET /api/shifts/week?start_date=
#[utoipa::path(
    get,
    path = "/api/shifts/week",
    params(GetWeekQuery),
    responses(
        (status = 200, description = "All users' shifts for the seven days starting at start_date", body = Vec<ShiftView>)
    ),
    tag = "shifts"
)]
pub async fn get_shifts_for_week(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GetWeekQuery>,
) -> AppResult<Json<Vec<ShiftView>>> {
    let start = query.start_date;
    let end = start
        .checked_add_days(Days::new(6))
        .ok_or_else(|| crate::AppError::BadRequest("start_date out of range".to_string()))?;

    let shifts = state.shifts.list_shifts_in_range(start, end).await?;

    let views = annotate(&state, shifts).await?;
    Ok(Json(views))
}

/// Attach user names and the accepted-replacement overlay to raw shifts.
async fn annotate(state: &AppState, shifts: Vec<Shift>) -> AppResult<Vec<ShiftView>> {
    let names: HashMap<i32, String> = state
        .directory
        .list_users()
        .await?
        .iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    let mut overlay = state.replacements.replacement_info_for(&shifts).await?;

    Ok(shifts
        .into_iter()
        .map(|shift| ShiftView {
            user_name: names.get(&shift.user_id).cloned(),
            replacement_info: overlay.remove(&shift.id),
            shift,
        })
        .collect())
}
