use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::domain::NodeId;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use crate::{
    config::ControllerConfig,
    controller::SelectionController,
    types::{ControllerEvent, Phase},
};

#[derive(Clone)]
struct ServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<(Option<String>, CreatePrivateLinkRequest)>>>>,
}

async fn handle_nodes() -> Json<serde_json::Value> {
    Json(json!({
        "node": { "title": "Reproducibility Project" },
        "children": [
            { "id": 1, "title": "A", "indent": 0 },
            { "id": "b2x", "title": "B", "indent": 1 }
        ]
    }))
}

async fn handle_create_link(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePrivateLinkRequest>,
) -> Json<serde_json::Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let node_count = payload.node_ids.len();
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send((content_type, payload));
    }
    Json(json!({ "key": "abc", "node_count": node_count }))
}

async fn handle_rejected_link() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::validation("at least one node must be selected")),
    )
}

async fn handle_empty_success() -> StatusCode {
    StatusCode::OK
}

async fn spawn_link_server() -> anyhow::Result<(
    String,
    oneshot::Receiver<(Option<String>, CreatePrivateLinkRequest)>,
)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/projects/demo/nodes", get(handle_nodes))
        .route("/projects/demo/private_link/", post(handle_create_link))
        .route("/projects/locked/private_link/", post(handle_rejected_link))
        .route("/projects/quiet/private_link/", post(handle_empty_success))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("url")
}

#[tokio::test]
async fn fetch_nodes_decodes_tree() {
    let (base, _rx) = spawn_link_server().await.expect("server");
    let tree = HttpTransport::new()
        .fetch_nodes(&url(&format!("{base}/projects/demo/nodes")))
        .await
        .expect("fetch");

    assert_eq!(tree.node.title, "Reproducibility Project");
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[1].id, NodeId::Key("b2x".into()));
    assert_eq!(tree.children[1].indent, 1);
}

#[tokio::test]
async fn fetch_nodes_fails_on_missing_route() {
    let (base, _rx) = spawn_link_server().await.expect("server");
    let err = HttpTransport::new()
        .fetch_nodes(&url(&format!("{base}/projects/unknown/nodes")))
        .await
        .expect_err("404 should fail");

    match err.downcast_ref::<TransportError>() {
        Some(TransportError::Status { status, .. }) => assert_eq!(*status, 404),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_link_posts_json_body() {
    let (base, rx) = spawn_link_server().await.expect("server");
    let request = CreatePrivateLinkRequest {
        node_ids: vec![NodeId::Numeric(1), NodeId::Key("b2x".into())],
        name: Some("My Link".to_string()),
        anonymous: true,
    };

    let response = HttpTransport::new()
        .create_link(&url(&format!("{base}/projects/demo/private_link/")), &request)
        .await
        .expect("create");
    assert_eq!(response, json!({ "key": "abc", "node_count": 2 }));

    let (content_type, received) = rx.await.expect("payload");
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(received, request);
}

#[tokio::test]
async fn create_link_surfaces_api_error_message() {
    let (base, _rx) = spawn_link_server().await.expect("server");
    let request = CreatePrivateLinkRequest {
        node_ids: Vec::new(),
        name: None,
        anonymous: false,
    };

    let err = HttpTransport::new()
        .create_link(&url(&format!("{base}/projects/locked/private_link/")), &request)
        .await
        .expect_err("400 should fail");
    match err.downcast_ref::<TransportError>() {
        Some(TransportError::Status { status, message }) => {
            assert_eq!(*status, 400);
            assert_eq!(message, "at least one node must be selected");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_link_requires_json_response() {
    let (base, _rx) = spawn_link_server().await.expect("server");
    let request = CreatePrivateLinkRequest {
        node_ids: vec![NodeId::Numeric(1)],
        name: None,
        anonymous: false,
    };

    let result = HttpTransport::new()
        .create_link(&url(&format!("{base}/projects/quiet/private_link/")), &request)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn controller_round_trip_over_http() {
    let (base, rx) = spawn_link_server().await.expect("server");
    let config = ControllerConfig::for_node_api(
        &format!("{base}/projects/demo/nodes"),
        &format!("{base}/projects/demo"),
    )
    .expect("config");
    let transport = Arc::new(HttpTransport::new());
    let controller = SelectionController::new(config, transport.clone(), transport);

    let state = controller.loaded().await.expect("load");
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.nodes[1].display_offset(), 50);

    controller
        .toggle(&NodeId::Key("b2x".into()))
        .expect("toggle");
    let mut events = controller.subscribe_events();
    controller.submit("Reviewers", false).expect("submit");

    let state = controller.submission_settled().await.expect("settled");
    assert_eq!(state.phase, Phase::Completed);
    assert!(matches!(
        events.recv().await.expect("event"),
        ControllerEvent::ReloadRequested { .. }
    ));

    let (_, received) = rx.await.expect("payload");
    assert_eq!(received.node_ids, vec![NodeId::Key("b2x".into())]);
    assert_eq!(received.name.as_deref(), Some("Reviewers"));
}

#[tokio::test]
async fn controller_reports_unreachable_source() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let config = ControllerConfig::new(
        &format!("http://{addr}/projects/demo/nodes"),
        &format!("http://{addr}/projects/demo/private_link/"),
    )
    .expect("config");
    let transport = Arc::new(HttpTransport::new());
    let controller = SelectionController::new(config, transport.clone(), transport);

    let state = controller.loaded().await.expect("load settles");
    assert_eq!(state.phase, Phase::FetchFailed);
    assert!(state
        .error_message
        .as_deref()
        .is_some_and(|message| message.starts_with("Could not retrieve projects")));
}
