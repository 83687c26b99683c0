use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;

use super::error::ApiError;
use super::state::AppState;
use crate::models::{Course, CourseFilter, CreateCourse, UpdateCourse};

/// List courses, optionally filtered by `id`, `name` (substring) and windowed by `limit`/`offset`
pub async fn list_courses(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<CourseFilter>, ApiError>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = state.courses.list_courses(filter).await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(state): State<AppState>,
    WithRejection(Path(course_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Course>, ApiError> {
    let course = state.courses.get_course(course_id).await?;
    Ok(Json(course))
}

pub async fn create_course(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<CreateCourse>, ApiError>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let course = state.courses.create_course(request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Replace a course; `students` defaults to empty when omitted
pub async fn update_course(
    State(state): State<AppState>,
    WithRejection(Path(course_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<CreateCourse>, ApiError>,
) -> Result<Json<Course>, ApiError> {
    let course = state.courses.update_course(course_id, request).await?;
    Ok(Json(course))
}

pub async fn partial_update_course(
    State(state): State<AppState>,
    WithRejection(Path(course_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateCourse>, ApiError>,
) -> Result<Json<Course>, ApiError> {
    let course = state.courses.partial_update_course(course_id, request).await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<AppState>,
    WithRejection(Path(course_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.courses.delete_course(course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
