use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    models::{CourseType, User},
    AppResult, AppState,
};

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All staff members", body = Vec<User>)
    ),
    tag = "references"
)]
pub async fn get_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    let users = state.directory.list_users().await?;
    Ok(Json(users))
}

/// GET /api/courses/types
#[utoipa::path(
    get,
    path = "/api/courses/types",
    responses(
        (status = 200, description = "Course catalog with billing modes and base rates", body = Vec<CourseType>)
    ),
    tag = "references"
)]
pub async fn get_course_types(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<CourseType>>> {
    let courses = state.directory.list_course_types().await?;
    Ok(Json(courses))
}
