#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use course_api::api::{create_routes, AppState};
use course_api::config::{run_migrations, AppConfig};
use course_api::models::{Course, CreateStudent, NewCourse, Student};
use course_api::storage::Storage;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool};
use std::sync::Once;
use tower::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("course_api=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Status and decoded JSON body of one request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub data: Value,
}

impl TestResponse {
    pub fn items(&self) -> &Vec<Value> {
        self.data.as_array().expect("response body is not a JSON array")
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items()
            .iter()
            .map(|item| item["id"].as_i64().expect("item without integer id"))
            .collect()
    }
}

/// Issues requests against the router in-process.
#[derive(Clone)]
pub struct ApiClient {
    router: Router,
}

impl ApiClient {
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// `GET` with url-encoded query parameters appended to `uri`.
    pub async fn get_with_query(&self, uri: &str, params: &[(&str, String)]) -> TestResponse {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        self.get(&format!("{}?{}", uri, query)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);

        let request = match body {
            Some(body_data) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body_data.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.raw(request).await
    }

    /// Sends a prebuilt request, for cases the verb helpers cannot express.
    pub async fn raw(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse { status, data }
    }
}

/// Field overrides for [`CourseFactory`]; unset fields get random values.
#[derive(Debug, Clone, Default)]
pub struct CourseOverrides {
    pub name: Option<String>,
    pub students: Option<Vec<i64>>,
}

/// Persists courses straight through the repository, bypassing the API.
#[derive(Clone)]
pub struct CourseFactory {
    storage: Storage,
}

impl CourseFactory {
    pub async fn make(&self) -> Course {
        self.make_with(CourseOverrides::default()).await
    }

    pub async fn make_named(&self, name: &str) -> Course {
        self.make_with(CourseOverrides {
            name: Some(name.to_string()),
            ..CourseOverrides::default()
        })
        .await
    }

    pub async fn make_with(&self, overrides: CourseOverrides) -> Course {
        let name = overrides.name.unwrap_or_else(random_course_name);
        let mut students = overrides.students.unwrap_or_default();
        students.sort_unstable();
        students.dedup();

        self.storage
            .courses
            .insert(&NewCourse { name, students })
            .await
            .expect("Failed to persist course")
    }

    pub async fn make_many(&self, quantity: usize) -> Vec<Course> {
        let mut courses = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            courses.push(self.make().await);
        }
        courses
    }
}

/// Persists students straight through the repository, bypassing the API.
#[derive(Clone)]
pub struct StudentFactory {
    storage: Storage,
}

impl StudentFactory {
    pub async fn make(&self) -> Student {
        let age_days: i64 = (18 * 365..40 * 365).fake();
        self.make_with(CreateStudent {
            name: Name().fake(),
            birth_date: Some(Utc::now().date_naive() - Duration::days(age_days)),
        })
        .await
    }

    pub async fn make_with(&self, student: CreateStudent) -> Student {
        self.storage
            .students
            .insert(&student)
            .await
            .expect("Failed to persist student")
    }

    pub async fn make_many(&self, quantity: usize) -> Vec<Student> {
        let mut students = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            students.push(self.make().await);
        }
        students
    }
}

fn random_course_name() -> String {
    let words: Vec<String> = Words(1..3).fake();
    format!("{} {}", words.join(" "), (1..1000).fake::<u32>())
}

/// PostgreSQL schema owned by one test, dropped with it even when the test panics.
struct TestSchema {
    database_url: String,
    name: String,
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        let database_url = self.database_url.clone();
        let statement = format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name);

        // Drop cannot await; run the cleanup on a runtime of its own.
        let cleanup = std::thread::spawn(move || -> Result<(), sqlx::Error> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async {
                let mut conn = PgConnection::connect(&database_url).await?;
                sqlx::query(&statement).execute(&mut conn).await?;
                conn.close().await
            })
        });

        match cleanup.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Failed to drop test schema {}: {}", self.name, e),
            Err(_) => eprintln!("Failed to drop test schema {}", self.name),
        }
    }
}

/// An application over its own, empty store.
pub struct TestApp {
    pub storage: Storage,
    router: Router,
    pool: Option<PgPool>,
    schema: Option<TestSchema>,
}

impl TestApp {
    pub fn in_memory() -> Self {
        Self::with_config(Storage::in_memory(), &AppConfig::default())
    }

    pub fn with_config(storage: Storage, config: &AppConfig) -> Self {
        init_test_logging();
        let router = create_routes(AppState::new(storage.clone(), config));
        Self {
            storage,
            router,
            pool: None,
            schema: None,
        }
    }

    /// A fresh schema in `TEST_DATABASE_URL`, or `None` when no database is available.
    pub async fn postgres() -> Option<Self> {
        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
                return None;
            }
        };

        let admin = match PgPool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(_) => {
                println!("Test database not available, skipping PostgreSQL test");
                return None;
            }
        };

        let schema = format!("course_api_test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .expect("Failed to create test schema");
        admin.close().await;
        let guard = TestSchema {
            database_url: database_url.clone(),
            name: schema.clone(),
        };

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    sqlx::query(&search_path).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        run_migrations(&pool).await.expect("Failed to run migrations");

        let mut app = Self::with_config(Storage::postgres(pool.clone()), &AppConfig::default());
        app.pool = Some(pool);
        app.schema = Some(guard);
        Some(app)
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_ref().map(|schema| schema.name.as_str())
    }

    pub fn client(&self) -> ApiClient {
        ApiClient {
            router: self.router.clone(),
        }
    }

    pub fn courses(&self) -> CourseFactory {
        CourseFactory {
            storage: self.storage.clone(),
        }
    }

    pub fn students(&self) -> StudentFactory {
        StudentFactory {
            storage: self.storage.clone(),
        }
    }

    /// Closes the pool and drops the PostgreSQL schema; a no-op for in-memory apps.
    pub async fn teardown(self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

pub fn course_url(id: i64) -> String {
    format!("/api/v1/courses/{}/", id)
}

pub fn student_url(id: i64) -> String {
    format!("/api/v1/students/{}/", id)
}

pub const COURSES_URL: &str = "/api/v1/courses/";
pub const STUDENTS_URL: &str = "/api/v1/students/";
