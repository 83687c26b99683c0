use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;

use super::error::ApiError;
use super::state::AppState;
use crate::models::{CreateStudent, Student};

pub async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, ApiError> {
    let students = state.students.list_students().await?;
    Ok(Json(students))
}

pub async fn get_student(
    State(state): State<AppState>,
    WithRejection(Path(student_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Student>, ApiError> {
    let student = state.students.get_student(student_id).await?;
    Ok(Json(student))
}

pub async fn create_student(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<CreateStudent>, ApiError>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let student = state.students.create_student(request).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Delete a student; courses keep existing without it
pub async fn delete_student(
    State(state): State<AppState>,
    WithRejection(Path(student_id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.students.delete_student(student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
