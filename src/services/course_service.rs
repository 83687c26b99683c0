use std::sync::Arc;

use crate::models::{
    normalize_student_ids, validate_name, Course, CourseFilter, CreateCourse, NewCourse,
    UpdateCourse,
};
use crate::storage::{CourseRepository, RepositoryError, Storage, StudentRepository};

use super::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    students: Arc<dyn StudentRepository>,
    max_students: usize,
}

impl CourseService {
    pub fn new(storage: &Storage, max_students: usize) -> Self {
        Self::with_repositories(storage.courses.clone(), storage.students.clone(), max_students)
    }

    pub fn with_repositories(
        courses: Arc<dyn CourseRepository>,
        students: Arc<dyn StudentRepository>,
        max_students: usize,
    ) -> Self {
        Self {
            courses,
            students,
            max_students,
        }
    }

    pub async fn list_courses(&self, filter: CourseFilter) -> ServiceResult<Vec<Course>> {
        if filter.limit.is_some_and(|limit| limit < 0) {
            return Err(ServiceError::Validation("limit cannot be negative".to_string()));
        }
        if filter.offset.is_some_and(|offset| offset < 0) {
            return Err(ServiceError::Validation("offset cannot be negative".to_string()));
        }

        Ok(self.courses.list(&filter).await?)
    }

    pub async fn get_course(&self, course_id: i64) -> ServiceResult<Course> {
        Ok(self.courses.get(course_id).await?)
    }

    pub async fn create_course(&self, request: CreateCourse) -> ServiceResult<Course> {
        let course = self.prepare(&request.name, request.students).await?;
        let created = self.courses.insert(&course).await?;

        tracing::info!("Created course {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Full replacement, as for `PUT`.
    pub async fn update_course(&self, course_id: i64, request: CreateCourse) -> ServiceResult<Course> {
        self.courses.get(course_id).await?;
        let course = self.prepare(&request.name, request.students).await?;
        let updated = self.courses.replace(course_id, &course).await?;

        tracing::info!("Updated course {}", course_id);
        Ok(updated)
    }

    /// Only the provided fields change, as for `PATCH`.
    pub async fn partial_update_course(
        &self,
        course_id: i64,
        request: UpdateCourse,
    ) -> ServiceResult<Course> {
        let current = self.courses.get(course_id).await?;

        let name = request.name.unwrap_or(current.name);
        let students = request.students.unwrap_or(current.students);
        let course = self.prepare(&name, students).await?;

        let updated = self.courses.replace(course_id, &course).await?;
        tracing::info!("Partially updated course {}", course_id);
        Ok(updated)
    }

    pub async fn delete_course(&self, course_id: i64) -> ServiceResult<()> {
        self.courses.delete(course_id).await?;
        tracing::info!("Deleted course {}", course_id);
        Ok(())
    }

    async fn prepare(&self, name: &str, students: Vec<i64>) -> ServiceResult<NewCourse> {
        validate_name(name, "Course name").map_err(ServiceError::validation)?;
        let students =
            normalize_student_ids(students, self.max_students).map_err(ServiceError::validation)?;

        let missing = self.students.missing_ids(&students).await?;
        if !missing.is_empty() {
            return Err(RepositoryError::UnknownStudents(missing).into());
        }

        Ok(NewCourse {
            name: name.trim().to_string(),
            students,
        })
    }
}
