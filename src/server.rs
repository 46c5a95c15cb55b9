use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    error::ServiceError,
    labels::Severity,
    model::{ModelMetadata, ModelRegistry},
    upload::{self, Upload},
    views,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ModelRegistry>,
}

#[derive(Serialize)]
struct ClassResponse {
    index: usize,
    severity: Severity,
    description: &'static str,
}

#[derive(Serialize)]
struct MetadataResponse {
    model: ModelMetadata,
    classes: Vec<ClassResponse>,
}

pub fn build_router(config: Arc<AppConfig>, registry: Arc<ModelRegistry>) -> Router {
    let body_limit = config.upload_limit_bytes;
    let state = AppState { registry, config };

    Router::new()
        .route("/", get(index).post(predict))
        .route("/result", get(result))
        .route("/health", get(health))
        .route("/metadata", get(metadata))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn index() -> Html<String> {
    Html(views::index())
}

async fn result() -> Html<String> {
    Html(views::result(None))
}

async fn metadata(State(state): State<AppState>) -> Json<MetadataResponse> {
    let classes = Severity::ALL
        .iter()
        .map(|s| ClassResponse {
            index: s.index(),
            severity: *s,
            description: s.description(),
        })
        .collect();

    Json(MetadataResponse {
        model: state.registry.metadata(),
        classes,
    })
}

async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServiceError> {
    let Ok(multipart) = multipart else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(upload) = read_file_field(multipart).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    if upload.file_name.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }
    if !upload::allowed_file(&upload.file_name) {
        debug!(file_name = %upload.file_name, "ignoring upload with disallowed extension");
        return Ok(Html(views::index()).into_response());
    }

    let path = upload::persist(&state.config.upload_dir, &upload).await?;
    info!(path = %path.display(), size = upload.bytes.len(), "classifying upload");

    // Classify the bytes this request received; the stored file may be
    // overwritten by a concurrent upload with the same name.
    let prediction = state.registry.classify(upload.bytes).await?;
    Ok(Html(views::result(Some(&prediction))).into_response())
}

/// Pulls the `file` part out of the form. A `file` field sent as a plain
/// value, without a filename, counts as absent.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<Upload>, ServiceError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            return Ok(None);
        };
        let bytes = field.bytes().await?;
        return Ok(Some(Upload { file_name, bytes }));
    }
    Ok(None)
}
