// API routes and handlers

pub mod courses;
pub mod error;
pub mod health;
pub mod routes;
pub mod state;
pub mod students;

pub use error::ApiError;
pub use routes::create_routes;
pub use state::AppState;
