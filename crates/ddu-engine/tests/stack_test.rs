//! Integration tests for option layers and nested sessions.

mod common;

use common::{harness, opts};
use ddu_core::{DduEvent, Error};
use ddu_engine::SessionStatus;
use serde_json::json;

fn script_source(word: &str) -> serde_json::Value {
    json!([{"name": "script", "params": {"batches": [[word]]}}])
}

#[tokio::test]
async fn test_push_pop_round_trip() {
    let h = harness();
    let d = &h.dispatcher;

    d.start(opts(json!({
        "ui": "mock",
        "input": "foo",
        "sources": script_source("a"),
    })))
    .await
    .unwrap();
    let bottom = d.session("default");

    d.start(opts(json!({"push": true, "input": "bar"})))
        .await
        .unwrap();
    assert_eq!(d.depth("default"), 2);
    let top = d.session("default");
    assert!(!top.same_session(&bottom));
    assert_eq!(top.options().input, "bar");
    // Inherited from the session below
    assert_eq!(top.options().ui, "mock");
    assert_eq!(top.options().sources.len(), 1);

    d.pop("default").await.unwrap();
    assert_eq!(d.depth("default"), 1);
    assert_eq!(top.status(), SessionStatus::Terminated);

    let current = d.session("default");
    assert!(current.same_session(&bottom));
    assert_eq!(current.options().input, "foo");
    assert_eq!(current.status(), SessionStatus::Ready);
    assert_eq!(current.items().len(), 1);
}

#[tokio::test]
async fn test_pop_last_session_repeatedly() {
    let h = harness();
    let d = &h.dispatcher;

    d.start(opts(json!({"ui": "mock", "sources": script_source("a")})))
        .await
        .unwrap();
    let first = d.session("default");

    for _ in 0..3 {
        d.pop("default").await.unwrap();
        assert_eq!(d.depth("default"), 1);
    }
    assert_eq!(first.status(), SessionStatus::Terminated);

    // The next access gets a fresh session in the same slot
    d.start(opts(json!({"ui": "mock", "sources": script_source("b")})))
        .await
        .unwrap();
    let second = d.session("default");
    assert!(!second.same_session(&first));
    assert_eq!(second.status(), SessionStatus::Ready);
    assert_eq!(d.depth("default"), 1);
}

#[tokio::test]
async fn test_names_are_independent() {
    let h = harness();
    let d = &h.dispatcher;

    d.set_local("files", opts(json!({"input": "local"}))).unwrap();
    let files = d
        .start(opts(json!({"name": "files", "ui": "mock", "sources": script_source("a")})))
        .await
        .unwrap();
    assert!(files.same_session(&d.session("files")));
    d.start(opts(json!({"name": "other", "ui": "mock", "sources": script_source("b")})))
        .await
        .unwrap();

    assert_eq!(d.session("files").options().input, "local");
    assert_eq!(d.session("other").options().input, "");

    d.event("files", DduEvent::Cancel).await.unwrap();
    assert_eq!(d.session("other").status(), SessionStatus::Ready);
}

#[tokio::test]
async fn test_pushed_options_are_a_copy() {
    let h = harness();
    let d = &h.dispatcher;

    d.start(opts(json!({"ui": "mock", "input": "foo", "sources": script_source("a")})))
        .await
        .unwrap();
    let bottom = d.session("default");

    d.start(opts(json!({"push": true, "input": "bar"})))
        .await
        .unwrap();
    assert_eq!(bottom.user_options()["input"], json!("foo"));
    assert_eq!(d.session("default").user_options()["input"], json!("bar"));
}

#[tokio::test]
async fn test_invalid_options_rejected() {
    let h = harness();
    let result = h.dispatcher.start(opts(json!({"sources": 42}))).await;
    assert!(matches!(result, Err(Error::InvalidOptions(_))));

    let result = h
        .dispatcher
        .start(opts(json!({"sources": script_source("a")})))
        .await;
    assert!(matches!(result, Err(Error::InvalidOptions(_))));
}

#[tokio::test]
async fn test_dispatch_start_and_actions() {
    let h = harness();
    let d = &h.dispatcher;

    d.dispatch(
        "start",
        vec![json!({"ui": "mock", "sources": script_source("a")})],
    )
    .await
    .unwrap();

    let actions = d
        .dispatch("getItemActions", vec![json!("default"), json!([{"word": "a", "index": 0}])])
        .await
        .unwrap();
    assert_eq!(actions, json!(["delete", "open"]));

    d.dispatch(
        "itemAction",
        vec![json!("default"), json!("open"), json!([{"word": "a"}]), json!({})],
    )
    .await
    .unwrap();
    assert_eq!(h.log(), vec!["kind:file:open:a"]);

    d.dispatch("event", vec![json!("default"), json!("close")])
        .await
        .unwrap();
}
