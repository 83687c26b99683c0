use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub students: Vec<i64>,
}

/// A `courses` row without its memberships.
#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: i64,
    pub name: String,
}

impl CourseRow {
    pub fn into_course(self, students: Vec<i64>) -> Course {
        Course {
            id: self.id,
            name: self.name,
            students,
        }
    }
}

/// Body of `POST /courses/` and `PUT /courses/{id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourse {
    pub name: String,
    #[serde(default)]
    pub students: Vec<i64>,
}

/// Body of `PATCH /courses/{id}/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub students: Option<Vec<i64>>,
}

/// Validated course data handed to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub students: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<i64>,
}

/// Query values such as `?id=` count as absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

impl CourseFilter {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Case-insensitive substring match on the name, `true` when no name filter is set.
    pub fn matches_name(&self, name: &str) -> bool {
        match self.name.as_deref() {
            Some(needle) if !needle.is_empty() => {
                name.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => true,
        }
    }

    pub fn matches(&self, course_id: i64, name: &str) -> bool {
        self.id.map_or(true, |id| id == course_id) && self.matches_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let filter = CourseFilter::by_name("django");

        assert!(filter.matches_name("Django Course"));
        assert!(filter.matches_name("Advanced DJANGO"));
        assert!(!filter.matches_name("Flask Course"));
    }

    #[test]
    fn empty_name_filter_matches_everything() {
        let filter = CourseFilter::by_name("");
        assert!(filter.matches_name("Anything"));
        assert!(CourseFilter::default().matches(7, "Anything"));
    }

    #[test]
    fn id_and_name_filters_combine() {
        let filter = CourseFilter {
            id: Some(2),
            name: Some("Course".to_string()),
            ..CourseFilter::default()
        };

        assert!(filter.matches(2, "Course 2"));
        assert!(!filter.matches(1, "Course 1"));
        assert!(!filter.matches(2, "Workshop"));
    }

    #[test]
    fn create_course_students_default_to_empty() {
        let body: CreateCourse = serde_json::from_str(r#"{"name": "Rust"}"#).unwrap();
        assert!(body.students.is_empty());
    }
}
