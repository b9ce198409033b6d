//! Scoreboard HTTP service plus static hosting of the built game.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::scoreboard::{ScoreStore, ScoreboardError};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_file: PathBuf,
    pub dist_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Failure inside a scoreboard request. Always answered with a 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] ScoreboardError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        log::error!("scoreboard request failed: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

pub fn router(store: Arc<ScoreStore>, dist_dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/scoreboard/{action}", get(scoreboard).post(scoreboard))
        .with_state(store)
        .fallback_service(ServeDir::new(dist_dir.into()))
}

fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn empty() -> Value {
    Value::Object(Default::default())
}

/// `get` returns the whole board, `post` appends the body and returns the
/// updated board. Anything else answers `{}`.
pub async fn scoreboard(
    State(store): State<Arc<ScoreStore>>,
    Path(action): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    // No schema: any JSON document is a payload, unless it is empty or falsy.
    let payload: Option<Value> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice::<Value>(&body)?).filter(|v| !is_falsy(v))
    };

    let data = match action.as_str() {
        "get" => serde_json::to_value(store.load().await?)?,
        "post" => match payload {
            Some(payload) => serde_json::to_value(store.append(payload).await?)?,
            None => {
                log::warn!("post without payload");
                empty()
            }
        },
        other => {
            log::debug!("unknown scoreboard action {other:?}");
            empty()
        }
    };
    Ok(Json(data))
}

pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let store = Arc::new(ScoreStore::new(&config.data_file));
    let app = router(store, &config.dist_dir);

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;

    log::info!("listening on http://{}", config.bind);
    log::info!(
        "scores in {}, static files from {}",
        config.data_file.display(),
        config.dist_dir.display()
    );

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
