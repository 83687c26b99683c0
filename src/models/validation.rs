use anyhow::{anyhow, Result};
use chrono::NaiveDate;

pub const MAX_NAME_LENGTH: usize = 255;

/// Course and student names share the same rules.
pub fn validate_name(name: &str, field_name: &str) -> Result<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(anyhow!("{} cannot be empty", field_name));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(anyhow!(
            "{} cannot be longer than {} characters",
            field_name,
            MAX_NAME_LENGTH
        ));
    }

    Ok(())
}

/// Sorts and deduplicates the ids, then checks the course capacity.
pub fn normalize_student_ids(mut ids: Vec<i64>, max_students: usize) -> Result<Vec<i64>> {
    ids.sort_unstable();
    ids.dedup();

    if ids.len() > max_students {
        return Err(anyhow!(
            "A course cannot have more than {} students",
            max_students
        ));
    }

    Ok(ids)
}

pub fn validate_birth_date(birth_date: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    match birth_date {
        Some(date) if date > today => Err(anyhow!("Birth date cannot be in the future")),
        _ => Ok(()),
    }
}
