use crate::config::AppConfig;
use crate::services::{CourseService, StudentService};
use crate::storage::Storage;

/// Shared by every handler; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub courses: CourseService,
    pub students: StudentService,
    pub storage: Storage,
}

impl AppState {
    pub fn new(storage: Storage, config: &AppConfig) -> Self {
        Self {
            courses: CourseService::new(&storage, config.max_students_per_course),
            students: StudentService::new(&storage),
            storage,
        }
    }
}
