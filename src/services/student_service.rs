use std::sync::Arc;

use chrono::Utc;

use crate::models::{validate_birth_date, validate_name, CreateStudent, Student};
use crate::storage::{Storage, StudentRepository};

use super::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct StudentService {
    students: Arc<dyn StudentRepository>,
}

impl StudentService {
    pub fn new(storage: &Storage) -> Self {
        Self {
            students: storage.students.clone(),
        }
    }

    pub async fn list_students(&self) -> ServiceResult<Vec<Student>> {
        Ok(self.students.list().await?)
    }

    pub async fn get_student(&self, student_id: i64) -> ServiceResult<Student> {
        Ok(self.students.get(student_id).await?)
    }

    pub async fn create_student(&self, request: CreateStudent) -> ServiceResult<Student> {
        validate_name(&request.name, "Student name").map_err(ServiceError::validation)?;
        validate_birth_date(request.birth_date, Utc::now().date_naive())
            .map_err(ServiceError::validation)?;

        let student = self
            .students
            .insert(&CreateStudent {
                name: request.name.trim().to_string(),
                birth_date: request.birth_date,
            })
            .await?;

        tracing::info!("Created student {}", student.id);
        Ok(student)
    }

    pub async fn delete_student(&self, student_id: i64) -> ServiceResult<()> {
        self.students.delete(student_id).await?;
        tracing::info!("Deleted student {}", student_id);
        Ok(())
    }
}
