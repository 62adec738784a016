// Once clippy takes `clippy.toml` into account (for `tests` targets),
// we can remove these.
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use dbgrelay_server::{AppState, CreatedSession, ServerConfig, router};
use test_log::test;
use tower::ServiceExt;

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(&ServerConfig::default()));
    (router(state.clone()), state)
}

fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[test(tokio::test)]
async fn missing_index_streams_not_found() {
    let (app, _) = app();

    let req = Request::get("/debugger/7/event").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let body = body_text(res).await;
    assert_eq!(
        body,
        "event: notFound\ndata: Cannot find debugger at index 7\n\n"
    );
}

#[test(tokio::test)]
async fn malformed_index_streams_not_found() {
    let (app, _) = app();

    let req = Request::get("/debugger/abc/event").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();

    let body = body_text(res).await;
    assert_eq!(
        body,
        "event: notFound\ndata: Cannot find debugger at index abc\n\n"
    );
}

#[test(tokio::test)]
async fn failed_spawn_is_unprocessable() {
    let (app, state) = app();

    let req = json_request(
        Method::POST,
        "/debugger",
        r#"{"spawn":{"path":"/nonexistent/dbgrelay-test"}}"#,
    );
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["code"], 2);
    assert!(body["error"].as_str().unwrap().contains("/nonexistent/dbgrelay-test"));

    assert!(state.registry.is_empty());
}

#[test(tokio::test)]
async fn unknown_index_is_not_found() {
    let (app, _) = app();

    let req = Request::delete("/debugger/3").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = json_request(
        Method::POST,
        "/debugger/3/continue",
        r#"{"decision":"autoContinue"}"#,
    );
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["error"], "Cannot find debugger at index 3");
}

#[test(tokio::test)]
async fn spawned_session_lifecycle() {
    let (app, state) = app();

    let req = json_request(
        Method::POST,
        "/debugger",
        r#"{"spawn":{"path":"/bin/sh","args":["-c","exit 4"]}}"#,
    );
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let created: CreatedSession = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(created.index, 0);

    let req = Request::get("/debugger/0/event").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let body = body_text(res).await;

    assert!(body.starts_with("event: createProcess\n"));
    assert!(body.ends_with(&format!(
        "event: exitProcess\ndata: {{\"processId\":{pid},\"threadId\":{pid},\"exitCode\":4}}\n\n",
        pid = created.pid
    )));

    let req = Request::get("/debugger").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let list: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(list[0]["index"], 0);
    assert_eq!(list[0]["pid"], created.pid);
    assert_eq!(list[0]["state"], "terminated");

    let req = Request::delete("/debugger/0").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert!(state.registry.is_empty());
}
