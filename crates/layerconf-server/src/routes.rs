//! HTTP routes
//!
//! ```text
//! GET  /settings?location=&role=&user=&device=   effective configuration
//! PUT  /settings                                 scoped write
//! GET  /settings/stored                          raw stored document
//! GET  /health                                   diagnostics
//! ```
//!
//! Storage failures answer `503` with a plain-text body naming every backend
//! that was tried. Malformed requests answer `400`, also plain text.

use layerconf_core::{SettingsError, SettingsService, WriteRequest};
use layerconf_document::ResolutionContext;
use layerconf_resolve::{EffectiveConfiguration, SchemaViolation};
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

/// Largest accepted write body
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Serialize)]
struct EffectiveBody<'a> {
    effective: &'a EffectiveConfiguration,
    warnings: &'a [SchemaViolation],
}

/// All routes over one shared service
pub fn routes(service: Arc<SettingsService>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_service = warp::any().map(move || Arc::clone(&service));

    let effective = warp::path!("settings")
        .and(warp::get())
        .and(warp::query::<ResolutionContext>())
        .and(with_service.clone())
        .and_then(get_effective);

    let write = warp::path!("settings")
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<Value>())
        .and(with_service.clone())
        .and_then(put_settings);

    let stored = warp::path!("settings" / "stored")
        .and(warp::get())
        .and(with_service.clone())
        .and_then(get_stored);

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_service)
        .and_then(get_health);

    effective
        .or(write)
        .or(stored)
        .or(health)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

async fn get_effective(context: ResolutionContext, service: Arc<SettingsService>) -> Result<Response, Infallible> {
    Ok(match service.effective(&context).await {
        Ok(resolution) => warp::reply::json(&EffectiveBody {
            effective: &resolution.effective,
            warnings: &resolution.warnings,
        })
        .into_response(),
        Err(error) => error_reply(&error),
    })
}

async fn put_settings(body: Value, service: Arc<SettingsService>) -> Result<Response, Infallible> {
    let request = match WriteRequest::from_json(body) {
        Ok(request) => request,
        Err(error) => return Ok(error_reply(&error)),
    };

    Ok(match service.write(&request).await {
        Ok(outcome) => warp::reply::json(&outcome).into_response(),
        Err(error) => error_reply(&error),
    })
}

async fn get_stored(service: Arc<SettingsService>) -> Result<Response, Infallible> {
    Ok(match service.stored().await {
        Ok(stored) => warp::reply::json(&stored).into_response(),
        Err(error) => error_reply(&error),
    })
}

async fn get_health(service: Arc<SettingsService>) -> Result<Response, Infallible> {
    Ok(warp::reply::json(&service.health().await).into_response())
}

/// Plain-text reply for a service error
#[must_use]
pub fn error_reply(error: &SettingsError) -> Response {
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    text_reply(status, error.to_string())
}

fn text_reply(status: StatusCode, body: String) -> Response {
    warp::reply::with_status(body, status).into_response()
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("invalid request body: {e}"))
    } else if let Some(e) = rejection.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected application/json".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::warn!(?rejection, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };
    Ok(text_reply(status, message))
}
