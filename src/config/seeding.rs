use anyhow::Result;
use chrono::NaiveDate;

use crate::models::{CreateCourse, CreateStudent};
use crate::services::{CourseService, StudentService};
use crate::storage::Storage;

pub struct DatabaseSeeder {
    storage: Storage,
    max_students_per_course: usize,
}

impl DatabaseSeeder {
    pub fn new(storage: Storage, max_students_per_course: usize) -> Self {
        Self {
            storage,
            max_students_per_course,
        }
    }

    /// Inserts demo students and courses into an empty store; a no-op otherwise.
    pub async fn seed_all(&self) -> Result<()> {
        if self.storage.courses.count().await? > 0 {
            tracing::info!("Courses already present, skipping seeding");
            return Ok(());
        }

        tracing::info!("Starting database seeding...");

        let student_ids = self.seed_students().await?;
        self.seed_courses(&student_ids).await?;

        tracing::info!("Database seeding completed!");
        Ok(())
    }

    async fn seed_students(&self) -> Result<Vec<i64>> {
        let student_service = StudentService::new(&self.storage);

        let demo_students = vec![
            ("Alice Johnson", NaiveDate::from_ymd_opt(2001, 3, 14)),
            ("Boris Petrov", NaiveDate::from_ymd_opt(1999, 11, 2)),
            ("Chen Wei", None),
        ];

        let mut ids = Vec::with_capacity(demo_students.len());
        for (name, birth_date) in demo_students {
            let student = student_service
                .create_student(CreateStudent {
                    name: name.to_string(),
                    birth_date,
                })
                .await?;
            ids.push(student.id);
        }

        tracing::info!("Created {} demo students", ids.len());
        Ok(ids)
    }

    async fn seed_courses(&self, student_ids: &[i64]) -> Result<()> {
        let course_service = CourseService::new(&self.storage, self.max_students_per_course);
        let capacity = self.max_students_per_course.min(student_ids.len());

        let demo_courses = vec![
            ("Python Basics", student_ids[..capacity].to_vec()),
            ("Django Course", student_ids[..capacity.min(2)].to_vec()),
            ("Flask Course", Vec::new()),
        ];

        for (name, students) in demo_courses {
            course_service
                .create_course(CreateCourse {
                    name: name.to_string(),
                    students,
                })
                .await?;
        }

        tracing::info!("Created demo courses");
        Ok(())
    }
}
