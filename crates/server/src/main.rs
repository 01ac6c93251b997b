use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::ProjectId,
    error::{ApiError, ErrorCode},
    protocol::{CreatePrivateLinkRequest, NodeTreeResponse, PrivateLinkSummary},
};
use tracing::{info, warn};

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::{load_project, load_settings};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let project = load_project(&settings)?;
    info!(
        project_id = %project.project_id,
        node_count = project.children.len(),
        "serving project hierarchy"
    );

    let state = AppState {
        api: ApiContext::new(project),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "link service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/projects/:project_id/nodes", get(http_node_tree))
        .route(
            "/projects/:project_id/private_link/",
            post(http_create_private_link),
        )
        .route(
            "/projects/:project_id/private_links",
            get(http_list_private_links),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_node_tree(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> ApiResult<NodeTreeResponse> {
    api::node_tree(&state.api, &ProjectId(project_id))
        .map(Json)
        .map_err(reject)
}

async fn http_create_private_link(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Json(req): Json<CreatePrivateLinkRequest>,
) -> ApiResult<PrivateLinkSummary> {
    api::create_private_link(&state.api, &ProjectId(project_id), req)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_list_private_links(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> ApiResult<Vec<PrivateLinkSummary>> {
    api::list_private_links(&state.api, &ProjectId(project_id))
        .await
        .map(Json)
        .map_err(reject)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%status, message = %err.message, "request rejected");
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
