use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::{CourseRepository, RepositoryError, StudentRepository};
use crate::models::{Course, CourseFilter, CourseRow, CreateStudent, NewCourse, Student};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes `%`, `_` and `\` so user input is matched literally by `ILIKE`.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn memberships(
    conn: &mut PgConnection,
    course_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, sqlx::Error> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT course_id, student_id FROM course_students WHERE course_id = ANY($1) ORDER BY course_id, student_id",
    )
    .bind(course_ids)
    .fetch_all(conn)
    .await?;

    let mut by_course: HashMap<i64, Vec<i64>> = HashMap::new();
    for (course_id, student_id) in rows {
        by_course.entry(course_id).or_default().push(student_id);
    }
    Ok(by_course)
}

async fn missing_students(conn: &mut PgConnection, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT DISTINCT requested.id
        FROM UNNEST($1::BIGINT[]) AS requested(id)
        LEFT JOIN students ON students.id = requested.id
        WHERE students.id IS NULL
        ORDER BY requested.id
        "#,
    )
    .bind(ids)
    .fetch_all(conn)
    .await
}

/// Rewrites the membership rows of one course.
async fn set_memberships(
    conn: &mut PgConnection,
    course_id: i64,
    students: &[i64],
) -> Result<(), RepositoryError> {
    let missing = missing_students(&mut *conn, students).await?;
    if !missing.is_empty() {
        return Err(RepositoryError::UnknownStudents(missing));
    }

    sqlx::query("DELETE FROM course_students WHERE course_id = $1")
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    if !students.is_empty() {
        sqlx::query(
            "INSERT INTO course_students (course_id, student_id) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        )
        .bind(course_id)
        .bind(students)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            // a student deleted between the check and the insert
            let dangling = matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation());
            if dangling {
                RepositoryError::UnknownStudents(students.to_vec())
            } else {
                RepositoryError::Database(e)
            }
        })?;
    }

    Ok(())
}

#[async_trait]
impl CourseRepository for PgStore {
    async fn list(&self, filter: &CourseFilter) -> Result<Vec<Course>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT id, name FROM courses WHERE TRUE");

        if let Some(id) = filter.id {
            query.push(" AND id = ").push_bind(id);
        }

        if let Some(name) = filter.name.as_deref().filter(|name| !name.is_empty()) {
            query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(name)));
        }

        query.push(" ORDER BY id");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit.max(0));
        }
        if let Some(offset) = filter.offset {
            query.push(" OFFSET ").push_bind(offset.max(0));
        }

        let mut conn = self.db.acquire().await?;
        let rows: Vec<CourseRow> = query.build_query_as::<CourseRow>().fetch_all(&mut *conn).await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut by_course = memberships(&mut conn, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let students = by_course.remove(&row.id).unwrap_or_default();
                row.into_course(students)
            })
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Course, RepositoryError> {
        let mut conn = self.db.acquire().await?;

        let row: CourseRow = sqlx::query_as("SELECT id, name FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| RepositoryError::course_not_found(id))?;

        let students = memberships(&mut conn, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(row.into_course(students))
    }

    async fn insert(&self, course: &NewCourse) -> Result<Course, RepositoryError> {
        let mut tx = self.db.begin().await?;

        let row: CourseRow =
            sqlx::query_as("INSERT INTO courses (name) VALUES ($1) RETURNING id, name")
                .bind(&course.name)
                .fetch_one(&mut *tx)
                .await?;

        set_memberships(&mut tx, row.id, &course.students).await?;
        tx.commit().await?;

        tracing::debug!("Inserted course {} with {} students", row.id, course.students.len());
        Ok(row.into_course(course.students.clone()))
    }

    async fn replace(&self, id: i64, course: &NewCourse) -> Result<Course, RepositoryError> {
        let mut tx = self.db.begin().await?;

        let row: CourseRow =
            sqlx::query_as("UPDATE courses SET name = $2 WHERE id = $1 RETURNING id, name")
                .bind(id)
                .bind(&course.name)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| RepositoryError::course_not_found(id))?;

        set_memberships(&mut tx, id, &course.students).await?;
        tx.commit().await?;

        Ok(row.into_course(course.students.clone()))
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::course_not_found(id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl StudentRepository for PgStore {
    async fn list(&self) -> Result<Vec<Student>, RepositoryError> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT id, name, birth_date FROM students ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(students)
    }

    async fn get(&self, id: i64) -> Result<Student, RepositoryError> {
        sqlx::query_as::<_, Student>("SELECT id, name, birth_date FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RepositoryError::student_not_found(id))
    }

    async fn insert(&self, student: &CreateStudent) -> Result<Student, RepositoryError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (name, birth_date)
            VALUES ($1, $2)
            RETURNING id, name, birth_date
            "#,
        )
        .bind(&student.name)
        .bind(student.birth_date)
        .fetch_one(&self.db)
        .await?;
        Ok(student)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::student_not_found(id));
        }
        Ok(())
    }

    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        Ok(missing_students(&mut conn, ids).await?)
    }
}
