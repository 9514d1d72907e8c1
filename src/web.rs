use crate::{
    errors::AppError,
    papers::PaperIndex,
    registry::UserRegistry,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fmt::Debug, sync::Arc};
use tokio::signal;
use tower_http::cors::CorsLayer;

pub struct SharedState {
    pub registry: Arc<dyn UserRegistry>,
    pub papers: PaperIndex,
}

async fn start_app(state: Arc<SharedState>, bind_addr: &str) {
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind api address");
    log::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("api server failed");
}

pub fn start_daemon(state: Arc<SharedState>, bind_addr: &str) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(async { start_app(state, bind_addr).await });
}

pub fn router(state: Arc<SharedState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/topics/:email", get(list_topics))
        .route("/topics", post(add_topic).delete(delete_topic))
        .route("/papers/:topic", get(get_papers))
        .route("/admin/data", get(admin_data))
        .layer(CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

// Make our own error that wraps `AppError`.
#[derive(Debug)]
struct HttpError(AppError);

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            AppError::UserNotFound | AppError::TopicNotFound | AppError::ArtifactMissing(_) => {
                axum::http::StatusCode::NOT_FOUND
            }
            // the documented api answers 400 for a duplicate registration
            AppError::AlreadyExists | AppError::InvalidInput(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => axum::http::StatusCode::UNAUTHORIZED,
            AppError::Csv(_) | AppError::IO(_) | AppError::Json(_) | AppError::Other(_) => {
                log::error!("{self:?}");
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, json!({"error": self.0.to_string()}).to_string()).into_response()
    }
}

// This enables using `?` on functions that return `Result<_, AppError>` to
// turn them into `Result<_, HttpError>` without doing it manually.
impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({"message": "paperfeed topic api"}))
}

#[derive(Deserialize, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CredentialsRequest {{ email: {:?}, password: [REDACTED] }}",
            self.email
        )
    }
}

async fn register(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        state.registry.register(&payload.email, &payload.password)?;
        Ok(Json(json!({"message": "User registered successfully"})))
    })
}

async fn login(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        let email = state.registry.login(&payload.email, &payload.password)?;
        Ok(Json(json!({"message": "Login successful", "email": email})))
    })
}

async fn list_topics(
    State(state): State<Arc<SharedState>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<String>>, HttpError> {
    tokio::task::block_in_place(move || {
        state.registry.topics(&email).map(Json).map_err(Into::into)
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopicRequest {
    pub email: String,
    pub topic: String,
}

async fn add_topic(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<TopicRequest>,
) -> Result<Json<serde_json::Value>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        state.registry.add_topic(&payload.email, &payload.topic)?;
        Ok(Json(json!({"message": "Topic added successfully"})))
    })
}

async fn delete_topic(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<TopicRequest>,
) -> Result<Json<serde_json::Value>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        state.registry.delete_topic(&payload.email, &payload.topic)?;
        Ok(Json(json!({"message": "Topic deleted successfully"})))
    })
}

async fn get_papers(
    State(state): State<Arc<SharedState>>,
    Path(topic): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    tokio::task::block_in_place(move || {
        state.papers.get(&topic).map(Json).map_err(Into::into)
    })
}

/// Dumps every stored row. Read failures come back in a 200 body with an
/// `error` key; this endpoint never answers with a failure status.
async fn admin_data(State(state): State<Arc<SharedState>>) -> Json<serde_json::Value> {
    tokio::task::block_in_place(move || match state.registry.dump() {
        Ok(rows) => Json(json!(rows)),
        Err(err) => {
            log::error!("admin dump failed: {err:?}");
            Json(json!({"error": err.to_string()}))
        }
    })
}
