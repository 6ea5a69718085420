use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{models::MonthlyBreakdown, AppResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PayrollQuery {
    pub year: i32,
    pub month: u32,
}

/// GET /api/payroll/{user_id}?year=&month=
#[utoipa::path(
    get,
    path = "/api/payroll/{user_id}",
    params(
        ("user_id" = i32, Path, description = "User whose month to aggregate"),
        PayrollQuery
    ),
    responses(
        (status = 200, description = "Itemized monthly compensation breakdown", body = MonthlyBreakdown),
        (status = 400, description = "Invalid month"),
        (status = 422, description = "A rate is unconfigured and strict mode is on"),
        (status = 500, description = "An instructor shift could not be classified")
    ),
    tag = "payroll"
)]
pub async fn get_monthly_payroll(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Query(query): Query<PayrollQuery>,
) -> AppResult<Json<MonthlyBreakdown>> {
    super::check_month(query.month)?;

    let breakdown = state
        .payroll
        .monthly_breakdown(user_id, query.year, query.month)
        .await?;
    Ok(Json(breakdown))
}
