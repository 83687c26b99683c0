use axum::{
    http::Uri,
    routing::{get, MethodRouter},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::courses::{
    create_course, delete_course, get_course, list_courses, partial_update_course, update_course,
};
use super::error::ApiError;
use super::health::health_check;
use super::state::AppState;
use super::students::{create_student, delete_student, get_student, list_students};

pub const API_PREFIX: &str = "/api/v1";

/// Registers `path` both with and without its trailing slash.
fn resource(router: Router<AppState>, path: &str, methods: MethodRouter<AppState>) -> Router<AppState> {
    let trimmed = path.trim_end_matches('/');
    router
        .route(&format!("{}/", trimmed), methods.clone())
        .route(trimmed, methods)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

pub fn create_routes(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(health_check));

    router = resource(
        router,
        &format!("{}/courses/", API_PREFIX),
        get(list_courses).post(create_course),
    );
    router = resource(
        router,
        &format!("{}/courses/:course_id/", API_PREFIX),
        get(get_course)
            .put(update_course)
            .patch(partial_update_course)
            .delete(delete_course),
    );
    router = resource(
        router,
        &format!("{}/students/", API_PREFIX),
        get(list_students).post(create_student),
    );
    router = resource(
        router,
        &format!("{}/students/:student_id/", API_PREFIX),
        get(get_student).delete(delete_student),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
