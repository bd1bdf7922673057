//! In-memory stand-in for the PolyAnalyst project API.
//!
//! Serves the project endpoints the client uses, records every request it
//! receives and can be told to answer a path with a canned status/body.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::{Body, Bytes},
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sid";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub status: String,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
}

impl Node {
    pub fn new(id: i64, node_type: &str, name: &str) -> Self {
        Self {
            id,
            node_type: node_type.to_string(),
            name: name.to_string(),
            status: "new".to_string(),
            err_msg: String::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Project {
    pub nodes: Vec<Node>,
    pub executions: u32,
    pub aborted: bool,
}

impl Project {
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }
}

/// A request as the server saw it.
#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub sid: Option<String>,
    pub body: String,
}

/// Fixed answer for every request to one path.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct StubState {
    pub projects: HashMap<Uuid, Project>,
    /// When set, requests with any other `sid` cookie are rejected with 403.
    pub sid: Option<String>,
    pub captured: Vec<CapturedRequest>,
    pub replies: HashMap<String, Reply>,
}

impl StubState {
    pub fn reply(&mut self, path: &str, status: u16, body: &str) {
        self.replies.insert(
            path.to_string(),
            Reply {
                status,
                body: body.to_string(),
            },
        );
    }
}

pub type Db = Arc<RwLock<StubState>>;

#[derive(Deserialize)]
struct ProjectQuery {
    #[serde(rename = "prjUUID")]
    prj_uuid: Uuid,
}

#[derive(Deserialize)]
struct ExecuteBody {
    #[serde(default)]
    nodes: Vec<NodeSelector>,
}

#[derive(Deserialize)]
struct NodeSelector {
    name: String,
    #[serde(rename = "type")]
    node_type: String,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn app() -> Router {
    app_with_state(Db::default())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/project/nodes", get(project_nodes))
        .route("/project/execution-statistics", get(execution_statistics))
        .route("/project/execute", post(execute))
        .route("/project/global-abort", post(global_abort))
        .layer(middleware::from_fn_with_state(db.clone(), capture))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app_with_state(db)).await
}

/// Extract the `sid` cookie value from request headers.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

async fn capture(State(db): State<Db>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let captured = CapturedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        sid: session_id(&parts.headers),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    debug!(method = %captured.method, path = %captured.path, "captured request");

    let canned = {
        let mut state = db.write().await;
        let canned = state.replies.get(&captured.path).cloned();
        state.captured.push(captured);
        canned
    };
    if let Some(reply) = canned {
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, reply.body).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn authorize(state: &StubState, headers: &HeaderMap) -> ApiResult<()> {
    match (&state.sid, session_id(headers)) {
        (None, Some(_)) => Ok(()),
        (Some(expected), Some(sid)) if *expected == sid => Ok(()),
        _ => Err((StatusCode::FORBIDDEN, "session is not valid".to_string())),
    }
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "project not found".to_string())
}

async fn project_nodes(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<Json<Value>> {
    let state = db.read().await;
    authorize(&state, &headers)?;
    let project = state.projects.get(&query.prj_uuid).ok_or_else(not_found)?;
    Ok(Json(json!({ "nodes": project.nodes })))
}

async fn execution_statistics(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<Json<Value>> {
    let state = db.read().await;
    authorize(&state, &headers)?;
    let project = state.projects.get(&query.prj_uuid).ok_or_else(not_found)?;
    let nodes: Vec<Value> = project
        .nodes
        .iter()
        .map(|n| json!({ "id": n.id, "name": n.name, "status": n.status }))
        .collect();
    Ok(Json(json!({
        "executions": project.executions,
        "aborted": project.aborted,
        "nodesStatistics": nodes,
    })))
}

async fn execute(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let selectors = if body.is_empty() {
        Vec::new()
    } else {
        let body: ExecuteBody = serde_json::from_slice(&body)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        body.nodes
    };

    let mut state = db.write().await;
    authorize(&state, &headers)?;
    let project = state.projects.get_mut(&query.prj_uuid).ok_or_else(not_found)?;
    for node in &mut project.nodes {
        let selected = selectors.is_empty()
            || selectors
                .iter()
                .any(|s| s.name == node.name && s.node_type == node.node_type);
        if selected {
            node.status = "synchronized".to_string();
        }
    }
    project.executions += 1;
    project.aborted = false;
    Ok(StatusCode::ACCEPTED)
}

async fn global_abort(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<StatusCode> {
    let mut state = db.write().await;
    authorize(&state, &headers)?;
    let project = state.projects.get_mut(&query.prj_uuid).ok_or_else(not_found)?;
    project.aborted = true;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn node_serializes_with_wire_keys() {
        let json = serde_json::to_value(Node::new(7, "DataSource", "CSV")).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["type"], "DataSource");
        assert_eq!(json["status"], "new");
        assert_eq!(json["errMsg"], "");
    }

    #[test]
    fn session_id_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; sid=abc; lang=en"));
        assert_eq!(session_id(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn session_id_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sidx=1"));
        assert_eq!(session_id(&headers), None);
    }

    #[test]
    fn authorize_requires_matching_sid_when_configured() {
        let state = StubState {
            sid: Some("good".to_string()),
            ..StubState::default()
        };
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sid=bad"));
        assert!(authorize(&state, &headers).is_err());
        headers.insert(header::COOKIE, HeaderValue::from_static("sid=good"));
        assert!(authorize(&state, &headers).is_ok());
    }

    #[test]
    fn execute_body_nodes_default_to_empty() {
        let body: ExecuteBody = serde_json::from_str(r#"{"prjUUID":"x"}"#).unwrap();
        assert!(body.nodes.is_empty());
    }
}
