use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, Db, Node, Project};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

const PRJ: &str = "11111111-2222-4333-8444-555555555555";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, sid: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::COOKIE, format!("sid={sid}"))
        .body(body.to_string())
        .unwrap()
}

async fn seeded() -> Db {
    let db = Db::default();
    {
        let mut state = db.write().await;
        state.sid = Some("secret".to_string());
        state.projects.insert(
            PRJ.parse().unwrap(),
            Project::with_nodes(vec![
                Node::new(1, "DataSource", "Customers"),
                Node::new(2, "Writer", "Export"),
            ]),
        );
    }
    db
}

// --- nodes ---

#[tokio::test]
async fn nodes_of_seeded_project() {
    let resp = app_with_state(seeded().await)
        .oneshot(request("GET", &format!("/project/nodes?prjUUID={PRJ}"), "secret", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    let nodes: Vec<Node> = serde_json::from_value(body["nodes"].clone()).unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].name, "Customers");
    assert_eq!(nodes[1].node_type, "Writer");
}

#[tokio::test]
async fn nodes_unknown_project_returns_404() {
    let resp = app()
        .oneshot(request("GET", &format!("/project/nodes?prjUUID={}", Uuid::nil()), "any", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await, "project not found");
}

#[tokio::test]
async fn nodes_missing_uuid_returns_400() {
    let resp = app()
        .oneshot(request("GET", "/project/nodes", "any", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_session_returns_403() {
    let resp = app_with_state(seeded().await)
        .oneshot(request("GET", &format!("/project/nodes?prjUUID={PRJ}"), "stale", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_cookie_returns_403() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(format!("/project/nodes?prjUUID={PRJ}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// --- canned replies ---

#[tokio::test]
async fn canned_reply_overrides_handler() {
    let db = seeded().await;
    db.write().await.reply("/project/nodes", 404, "not found");

    let resp = app_with_state(db.clone())
        .oneshot(request("GET", &format!("/project/nodes?prjUUID={PRJ}"), "secret", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await, "not found");
    assert_eq!(db.read().await.captured.len(), 1);
}

// --- execute / abort / statistics ---

#[tokio::test]
async fn execute_abort_and_statistics() {
    use tower::Service;

    let db = seeded().await;
    let mut app = app_with_state(db.clone()).into_service();

    // execute only the writer
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "POST",
            &format!("/project/execute?prjUUID={PRJ}"),
            "secret",
            r#"{"prjUUID":"11111111-2222-4333-8444-555555555555","nodes":[{"name":"Export","type":"Writer"}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(body_bytes(resp).await.is_empty());

    // statistics reflect the run
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "GET",
            &format!("/project/execution-statistics?prjUUID={PRJ}"),
            "secret",
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats: Value = body_json(resp).await;
    assert_eq!(stats["executions"], 1);
    assert_eq!(stats["aborted"], false);
    assert_eq!(stats["nodesStatistics"][0]["status"], "new");
    assert_eq!(stats["nodesStatistics"][1]["status"], "synchronized");

    // abort
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request(
            "POST",
            &format!("/project/global-abort?prjUUID={PRJ}"),
            "secret",
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let state = db.read().await;
    let project = &state.projects[&PRJ.parse::<Uuid>().unwrap()];
    assert!(project.aborted);
    assert_eq!(project.executions, 1);

    let paths: Vec<&str> = state.captured.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(
        paths,
        ["/project/execute", "/project/execution-statistics", "/project/global-abort"]
    );
    assert!(state.captured.iter().all(|c| c.sid.as_deref() == Some("secret")));
    assert!(state.captured[0].body.contains("Export"));
}

#[tokio::test]
async fn execute_without_body_runs_every_node() {
    let db = seeded().await;
    let resp = app_with_state(db.clone())
        .oneshot(request("POST", &format!("/project/execute?prjUUID={PRJ}"), "secret", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let state = db.read().await;
    let project = &state.projects[&PRJ.parse::<Uuid>().unwrap()];
    assert!(project.nodes.iter().all(|n| n.status == "synchronized"));
}

#[tokio::test]
async fn execute_malformed_body_returns_400() {
    let resp = app_with_state(seeded().await)
        .oneshot(request("POST", &format!("/project/execute?prjUUID={PRJ}"), "secret", "{nope"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
