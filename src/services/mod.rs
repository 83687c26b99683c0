// Business logic between the HTTP handlers and storage

pub mod course_service;
pub mod student_service;

pub use course_service::*;
pub use student_service::*;

use thiserror::Error;

use crate::storage::RepositoryError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn validation(err: anyhow::Error) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
