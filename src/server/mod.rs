//! HTTP front end
//!
//! Serves the single-page UI plus a small JSON API the page calls:
//!
//! - `GET /` the page
//! - `POST /api/explain` and `POST /api/comic` with `{"concept": "..."}`
//! - `GET /api/images/{id}` panel art
//! - `GET /health` and `GET /live` for probes

use crate::error::{EduToonError, ErrorBody, ErrorCode};
use crate::pipeline::{EduToon, UpstreamStatus};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use uuid::Uuid;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const PAGE: &str = include_str!("page.html");

/// Request bodies larger than this are rejected before parsing
const MAX_BODY_BYTES: u64 = 4 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptRequest {
    pub concept: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub upstreams: UpstreamStatus,
    pub timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub alive: bool,
    pub timestamp: u64,
}

/// All routes, with rejection handling and request tracing
pub fn routes(
    app: Arc<EduToon>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(PAGE));

    let explain = warp::path!("api" / "explain")
        .and(warp::post())
        .and(concept_body())
        .and(with_app(app.clone()))
        .and_then(handle_explain);

    let comic = warp::path!("api" / "comic")
        .and(warp::post())
        .and(concept_body())
        .and(with_app(app.clone()))
        .and_then(handle_comic);

    let image = warp::path!("api" / "images" / Uuid)
        .and(warp::get())
        .and(with_app(app.clone()))
        .and_then(handle_image);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_app(app))
        .map(|app: Arc<EduToon>| {
            warp::reply::json(&HealthResponse {
                status: "healthy".to_string(),
                upstreams: app.upstream_status().clone(),
                timestamp: current_timestamp(),
            })
        });

    let live = warp::path("live")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&LivenessResponse {
                alive: true,
                timestamp: current_timestamp(),
            })
        });

    index
        .or(explain)
        .or(comic)
        .or(image)
        .or(health)
        .or(live)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// Bind and serve until `shutdown` resolves
pub async fn serve(
    app: Arc<EduToon>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), EduToonError> {
    let (bound, server) = warp::serve(routes(app))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| EduToonError::internal_error(format!("Failed to bind {addr}: {e}")))?;

    info!("EduToon listening on http://{}", bound);
    server.await;
    info!("Server stopped");
    Ok(())
}

fn with_app(app: Arc<EduToon>) -> impl Filter<Extract = (Arc<EduToon>,), Error = Infallible> + Clone {
    warp::any().map(move || app.clone())
}

fn concept_body() -> impl Filter<Extract = (ConceptRequest,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

async fn handle_explain(
    request: ConceptRequest,
    app: Arc<EduToon>,
) -> Result<Response, Infallible> {
    Ok(match app.explain(&request.concept).await {
        Ok(explanation) => warp::reply::json(&explanation).into_response(),
        Err(e) => error_reply(&e),
    })
}

async fn handle_comic(request: ConceptRequest, app: Arc<EduToon>) -> Result<Response, Infallible> {
    Ok(match app.comic(&request.concept).await {
        Ok(comic) => warp::reply::json(&comic).into_response(),
        Err(e) => error_reply(&e),
    })
}

async fn handle_image(id: Uuid, app: Arc<EduToon>) -> Result<Response, Infallible> {
    let image = match app.image(&id).await {
        Ok(image) => image,
        Err(e) => return Ok(error_reply(&e)),
    };

    let content_type = HeaderValue::from_str(&image.mime)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = Response::new(image.bytes.into());
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("private, max-age=3600"));
    Ok(response)
}

fn error_reply(error: &EduToonError) -> Response {
    if error.status_code() >= 500 {
        warn!("Request failed: {}", error);
    }

    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(warp::reply::json(&error.to_error_body()), status).into_response()
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, code, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorCode::NotFound, "Not found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInput,
            format!("Expected a JSON body like {{\"concept\": \"...\"}}: {e}"),
        )
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InvalidInput,
            "Request body too large".to_string(),
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::InvalidInput,
            "Method not allowed".to_string(),
        )
    } else {
        warn!("Unhandled rejection: {:?}", rejection);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            "Unhandled request".to_string(),
        )
    };

    let body = ErrorBody {
        code,
        message,
        options: Vec::new(),
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
