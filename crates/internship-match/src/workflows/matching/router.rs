use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::batch::recompute_all_parallel;
use super::domain::{
    Actor, AdminId, ApplicationId, ApplicationSubmission, DepartmentId, InternshipId, MatchId,
    StudentId, TransitionRequest,
};
use super::error::EngineError;
use super::repository::{
    ApplicationRepository, MatchRepository, ProfileDirectory, RepositoryError,
};
use super::service::MatchingService;

pub const ACTOR_KIND_HEADER: &str = "x-actor-kind";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

pub struct MatchingState<D, M, A> {
    service: Arc<MatchingService<D, M, A>>,
    batch_concurrency: usize,
}

impl<D, M, A> Clone for MatchingState<D, M, A> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            batch_concurrency: self.batch_concurrency,
        }
    }
}

/// Router builder exposing the matching operations over HTTP.
pub fn matching_router<D, M, A>(
    service: Arc<MatchingService<D, M, A>>,
    batch_concurrency: usize,
) -> Router
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    Router::new()
        .route("/api/v1/matching/recompute", post(recompute_all_handler::<D, M, A>))
        .route(
            "/api/v1/matching/students/:student_id/recompute",
            post(recompute_student_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/students/:student_id/matches",
            get(student_matches_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/students/:student_id/completeness",
            get(completeness_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/students/:student_id/applications",
            get(student_applications_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/internships/:internship_id/recompute",
            post(recompute_posting_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/internships/:internship_id/candidates",
            get(candidates_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/matches/:match_id/accept",
            post(accept_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/matches/:match_id/decline",
            post(decline_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/applications",
            post(submit_application_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/applications/:application_id/transitions",
            post(transition_handler::<D, M, A>),
        )
        .route(
            "/api/v1/matching/offers/expire",
            post(expire_offers_handler::<D, M, A>),
        )
        .with_state(MatchingState {
            service,
            batch_concurrency: batch_concurrency.max(1),
        })
}

/// Resolve the caller from the trusted actor headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let kind = headers.get(ACTOR_KIND_HEADER)?.to_str().ok()?;
    let id = headers
        .get(ACTOR_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;

    match kind.trim().to_ascii_lowercase().as_str() {
        "student" => Some(Actor::Student(StudentId(id))),
        "department" => Some(Actor::Department(DepartmentId(id))),
        "admin" => Some(Actor::Admin(AdminId(id))),
        _ => None,
    }
}

fn unauthenticated() -> Response {
    let payload = json!({
        "error": "missing or malformed actor headers",
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn forbidden(action: &str) -> Response {
    error_response(EngineError::Forbidden(action.to_string()))
}

/// Map an engine failure onto a status code and JSON error body.
pub fn error_response(error: EngineError) -> Response {
    let status = match &error {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::InvalidTransition(_)
        | EngineError::ConcurrencyConflict { .. }
        | EngineError::DuplicateApplication { .. }
        | EngineError::Repository(RepositoryError::Conflict)
        | EngineError::Repository(RepositoryError::Stale) => StatusCode::CONFLICT,
        EngineError::NotFound(_) | EngineError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::Repository(RepositoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
    };

    let payload = json!({
        "error": error.to_string(),
        "retryable": error.is_retryable(),
    });
    (status, axum::Json(payload)).into_response()
}

/// Run a synchronous service call on the blocking pool; store access takes locks.
async fn blocking<D, M, A, T, F>(state: &MatchingState<D, M, A>, call: F) -> Result<T, EngineError>
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
    T: Send + 'static,
    F: FnOnce(&MatchingService<D, M, A>) -> Result<T, EngineError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(service.as_ref()))
        .await
        .unwrap_or_else(|join_error| {
            Err(EngineError::Repository(RepositoryError::Unavailable(
                join_error.to_string(),
            )))
        })
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, EngineError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recompute_all_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    match actor_from_headers(&headers) {
        Some(Actor::Admin(_)) => {}
        Some(_) => return forbidden("run a full recompute"),
        None => return unauthenticated(),
    }

    let result = recompute_all_parallel(Arc::clone(&state.service), state.batch_concurrency).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn recompute_student_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
    Path(student_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let student_id = StudentId(student_id);
    match actor_from_headers(&headers) {
        Some(Actor::Student(id)) if id != student_id => {
            return forbidden("recompute another student's matches")
        }
        Some(_) => {}
        None => return unauthenticated(),
    }

    let result = blocking(&state, move |service| service.recompute_for_student(student_id)).await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn recompute_posting_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
    Path(internship_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    match actor_from_headers(&headers) {
        Some(Actor::Student(_)) => return forbidden("recompute a posting"),
        Some(_) => {}
        None => return unauthenticated(),
    }

    let internship_id = InternshipId(internship_id);
    let result = blocking(&state, move |service| {
        service.recompute_for_posting(internship_id)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn student_matches_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    Path(student_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let student_id = StudentId(student_id);
    let result = blocking(&state, move |service| {
        service.list_matches_for_student(student_id)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn completeness_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    Path(student_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let threshold = state.service.config().completeness_threshold;
    let result = blocking(&state, move |service| {
        service.evaluate_completeness(StudentId(student_id))
    })
    .await;
    match result {
        Ok(report) => {
            let meets_threshold = report.meets(threshold);
            let payload = json!({
                "student_id": student_id,
                "score": report.score,
                "missing": report.missing,
                "meets_threshold": meets_threshold,
                "threshold": threshold,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_applications_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    Path(student_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let student_id = StudentId(student_id);
    let result = blocking(&state, move |service| {
        service.applications_for_student(student_id)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn candidates_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    Path(internship_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let internship_id = InternshipId(internship_id);
    let result = blocking(&state, move |service| {
        service.list_candidates_for_posting(internship_id)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn accept_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
    Path(match_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return unauthenticated();
    };
    let result = blocking(&state, move |service| {
        service.accept_offer(MatchId(match_id), actor)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn decline_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
    Path(match_id): Path<u64>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return unauthenticated();
    };
    let result = blocking(&state, move |service| {
        service.decline_offer(MatchId(match_id), actor)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_application_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return unauthenticated();
    };
    let result = blocking(&state, move |service| {
        service.submit_application(submission, actor)
    })
    .await;
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn transition_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return unauthenticated();
    };
    let application_id = ApplicationId(application_id);
    let result = blocking(&state, move |service| {
        service.record_application_transition(application_id, request, actor)
    })
    .await;
    respond(StatusCode::OK, result)
}

pub(crate) async fn expire_offers_handler<D, M, A>(
    State(state): State<MatchingState<D, M, A>>,
    headers: HeaderMap,
) -> Response
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    match actor_from_headers(&headers) {
        Some(Actor::Admin(_)) => {}
        Some(_) => return forbidden("expire lapsed offers"),
        None => return unauthenticated(),
    }

    match blocking(&state, |service| service.expire_lapsed_offers()).await {
        Ok(expired) => (StatusCode::OK, axum::Json(json!({ "expired": expired }))).into_response(),
        Err(error) => error_response(error),
    }
}
