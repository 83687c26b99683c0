// Resource models and request bodies

pub mod course;
pub mod student;
pub mod validation;

pub use course::*;
pub use student::*;
pub use validation::*;
