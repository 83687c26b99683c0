use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CourseRepository, RepositoryError, StudentRepository};
use crate::models::{Course, CourseFilter, CreateStudent, NewCourse, Student};

#[derive(Debug)]
struct CourseRecord {
    name: String,
    students: BTreeSet<i64>,
}

#[derive(Debug, Default)]
struct Tables {
    courses: BTreeMap<i64, CourseRecord>,
    students: BTreeMap<i64, Student>,
    last_course_id: i64,
    last_student_id: i64,
}

impl Tables {
    fn course(&self, id: i64) -> Result<Course, RepositoryError> {
        self.courses
            .get(&id)
            .map(|record| to_course(id, record))
            .ok_or_else(|| RepositoryError::course_not_found(id))
    }

    fn missing_students(&self, ids: &[i64]) -> Vec<i64> {
        let missing: BTreeSet<i64> = ids
            .iter()
            .copied()
            .filter(|id| !self.students.contains_key(id))
            .collect();
        missing.into_iter().collect()
    }

    fn ensure_students_exist(&self, ids: &[i64]) -> Result<(), RepositoryError> {
        let missing = self.missing_students(ids);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::UnknownStudents(missing))
        }
    }
}

fn to_course(id: i64, record: &CourseRecord) -> Course {
    Course {
        id,
        name: record.name.clone(),
        students: record.students.iter().copied().collect(),
    }
}

/// Process-local store with the same observable behavior as [`super::PgStore`].
///
/// Ids are monotonically increasing and never reused.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn list(&self, filter: &CourseFilter) -> Result<Vec<Course>, RepositoryError> {
        let tables = self.tables.read().await;
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |limit| limit.max(0) as usize);

        Ok(tables
            .courses
            .iter()
            .filter(|(id, record)| filter.matches(**id, &record.name))
            .skip(offset)
            .take(limit)
            .map(|(id, record)| to_course(*id, record))
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Course, RepositoryError> {
        self.tables.read().await.course(id)
    }

    async fn insert(&self, course: &NewCourse) -> Result<Course, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.ensure_students_exist(&course.students)?;

        tables.last_course_id += 1;
        let id = tables.last_course_id;
        tables.courses.insert(
            id,
            CourseRecord {
                name: course.name.clone(),
                students: course.students.iter().copied().collect(),
            },
        );

        tables.course(id)
    }

    async fn replace(&self, id: i64, course: &NewCourse) -> Result<Course, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&id) {
            return Err(RepositoryError::course_not_found(id));
        }
        tables.ensure_students_exist(&course.students)?;

        if let Some(record) = tables.courses.get_mut(&id) {
            record.name = course.name.clone();
            record.students = course.students.iter().copied().collect();
        }

        tables.course(id)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        self.tables
            .write()
            .await
            .courses
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::course_not_found(id))
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.tables.read().await.courses.len() as i64)
    }
}

#[async_trait]
impl StudentRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(self.tables.read().await.students.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Student, RepositoryError> {
        self.tables
            .read()
            .await
            .students
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::student_not_found(id))
    }

    async fn insert(&self, student: &CreateStudent) -> Result<Student, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.last_student_id += 1;

        let student = Student {
            id: tables.last_student_id,
            name: student.name.clone(),
            birth_date: student.birth_date,
        };
        tables.students.insert(student.id, student.clone());

        Ok(student)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.students.remove(&id).is_none() {
            return Err(RepositoryError::student_not_found(id));
        }

        for record in tables.courses.values_mut() {
            record.students.remove(&id);
        }

        Ok(())
    }

    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, RepositoryError> {
        Ok(self.tables.read().await.missing_students(ids))
    }
}
