//! REST service for courses and their enrolled students.
//!
//! The HTTP layer lives in [`api`], business rules in [`services`] and
//! persistence behind the repository traits in [`storage`].

pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod storage;
