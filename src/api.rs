//! HTTP surface for the student registry.
//!
//! - `POST /students` – Create a student from `{name, age, email}`; any `id` in the body is ignored.
//! - `GET /students` – List every stored student.
//! - `GET /students/:id` – Fetch one student.
//! - `PUT /students/:id` – Merge the supplied fields into an existing student.
//! - `DELETE /students/:id` – Remove a student (`204 No Content`).
//! - `GET /students/:id/summary` – Ask the generator for a summary of the student.
//! - `GET /metrics` – Activity counters and the number of stored students.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Identifiers that are not unsigned integers are treated like unknown ids and answer `404`.
//! Error responses carry a short plain-text message.

use crate::metrics::MetricsSnapshot;
use crate::registry::{Student, StudentDraft, StudentId, StudentPatch};
use crate::service::{StudentApi, StudentError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the registry operations.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: StudentApi + 'static,
{
    Router::new()
        .route(
            "/students",
            get(list_students::<S>).post(create_student::<S>),
        )
        .route(
            "/students/:id",
            get(get_student::<S>)
                .put(update_student::<S>)
                .delete(delete_student::<S>),
        )
        .route("/students/:id/summary", get(get_summary::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Interpret a path segment as a student id. Anything unparsable is a lookup miss.
fn parse_student_id(raw: &str) -> Result<StudentId, StudentError> {
    raw.parse().map_err(|_| {
        tracing::debug!(raw, "Unparsable student id treated as missing");
        StudentError::NotFound
    })
}

/// Decode the first JSON value in `body`. Bytes after that value are ignored.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, StudentError> {
    match serde_json::Deserializer::from_slice(body).into_iter::<T>().next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(error)) => {
            tracing::debug!(%error, "Rejected request body");
            Err(StudentError::InvalidInput)
        }
        None => {
            tracing::debug!("Rejected empty request body");
            Err(StudentError::InvalidInput)
        }
    }
}

/// Create a student. The body's `Content-Type` is not enforced.
async fn create_student<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<Student>, AppError>
where
    S: StudentApi,
{
    let draft: StudentDraft = decode_body(&body)?;
    Ok(Json(service.create(draft).await?))
}

async fn list_students<S>(State(service): State<Arc<S>>) -> Json<Vec<Student>>
where
    S: StudentApi,
{
    Json(service.list().await)
}

async fn get_student<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Student>, AppError>
where
    S: StudentApi,
{
    let id = parse_student_id(&id)?;
    Ok(Json(service.get(id).await?))
}

/// Merge the body's fields into an existing student.
///
/// An empty or undecodable body changes nothing: the stored record is returned as is, and
/// unknown ids still answer `404`.
async fn update_student<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Student>, AppError>
where
    S: StudentApi,
{
    let id = parse_student_id(&id)?;
    let patch: StudentPatch = decode_body(&body).unwrap_or_default();
    Ok(Json(service.update(id, patch).await?))
}

async fn delete_student<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: StudentApi,
{
    let id = parse_student_id(&id)?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response body for `GET /students/:id/summary`.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

async fn get_summary<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: StudentApi,
{
    let id = parse_student_id(&id)?;
    let summary = service.summarize(id).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    #[serde(flatten)]
    counters: MetricsSnapshot,
    students_stored: usize,
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: StudentApi,
{
    let (counters, students_stored) = service.metrics().await;
    Json(MetricsResponse {
        counters,
        students_stored,
    })
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "create_student",
                method: "POST",
                path: "/students",
                description: "Store a new student. Response returns the record with its assigned id.",
                request_example: Some(json!({
                    "name": "Ann",
                    "age": 20,
                    "email": "a@x.com"
                })),
            },
            CommandDescriptor {
                name: "list_students",
                method: "GET",
                path: "/students",
                description: "Return every stored student.",
                request_example: None,
            },
            CommandDescriptor {
                name: "get_student",
                method: "GET",
                path: "/students/{id}",
                description: "Return one student, or 404 when the id is unknown.",
                request_example: None,
            },
            CommandDescriptor {
                name: "update_student",
                method: "PUT",
                path: "/students/{id}",
                description: "Overwrite the supplied fields of a student; omitted fields are kept.",
                request_example: Some(json!({ "age": 21 })),
            },
            CommandDescriptor {
                name: "delete_student",
                method: "DELETE",
                path: "/students/{id}",
                description: "Remove a student. Responds 204 with no body.",
                request_example: None,
            },
            CommandDescriptor {
                name: "student_summary",
                method: "GET",
                path: "/students/{id}/summary",
                description: "Generate a natural-language summary of a student. Response returns { \"summary\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return registry and summary counters.",
                request_example: None,
            },
        ],
    })
}

struct AppError(StudentError);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            StudentError::InvalidInput => StatusCode::BAD_REQUEST,
            StudentError::NotFound => StatusCode::NOT_FOUND,
            StudentError::Upstream(_) | StudentError::EmptyUpstreamResult => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.0.to_string()).into_response()
    }
}

impl From<StudentError> for AppError {
    fn from(inner: StudentError) -> Self {
        Self(inner)
    }
}
