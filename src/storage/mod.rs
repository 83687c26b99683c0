//! Persistence for courses and students.
//!
//! Handlers and services only see the repository traits; the concrete
//! store is picked once at startup from [`StorageBackend`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::{Course, CourseFilter, CreateStudent, NewCourse, Student};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Unknown student ids: {0:?}")]
    UnknownStudents(Vec<i64>),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn course_not_found(id: i64) -> Self {
        RepositoryError::NotFound { entity: "Course", id }
    }

    pub fn student_not_found(id: i64) -> Self {
        RepositoryError::NotFound { entity: "Student", id }
    }
}

/// CRUD over courses and their student memberships.
///
/// Implementations reject memberships that point at unknown students with
/// [`RepositoryError::UnknownStudents`] and return `students` sorted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Courses matching the filter, ordered by id.
    async fn list(&self, filter: &CourseFilter) -> Result<Vec<Course>, RepositoryError>;

    async fn get(&self, id: i64) -> Result<Course, RepositoryError>;

    async fn insert(&self, course: &NewCourse) -> Result<Course, RepositoryError>;

    /// Overwrites name and memberships of an existing course.
    async fn replace(&self, id: i64, course: &NewCourse) -> Result<Course, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Student>, RepositoryError>;

    async fn get(&self, id: i64) -> Result<Student, RepositoryError>;

    async fn insert(&self, student: &CreateStudent) -> Result<Student, RepositoryError>;

    /// Deletes the student and detaches it from every course.
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    /// The subset of `ids` with no matching student, sorted.
    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, RepositoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown storage backend '{}', expected 'postgres' or 'memory'",
                other
            )),
        }
    }
}

/// Repository handles shared by every request.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub students: Arc<dyn StudentRepository>,
    backend: StorageBackend,
    pool: Option<PgPool>,
}

impl Storage {
    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            courses: Arc::new(store.clone()),
            students: Arc::new(store),
            backend: StorageBackend::Memory,
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = PgStore::new(pool.clone());
        Self {
            courses: Arc::new(store.clone()),
            students: Arc::new(store),
            backend: StorageBackend::Postgres,
            pool: Some(pool),
        }
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
