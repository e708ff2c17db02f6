//! Route selection: ordering, fallthrough, verbs and parameter merging.

use std::sync::Arc;

use serde_json::{Value, json};
use servicemux::testing::{PassHandler, RecordingHandler, StaticHandler};
use servicemux::{Context, DynHandler, Endpoint, Outcome, Requester, Router, Verb};

mod common;
use common::{echo, value};

#[tokio::test]
async fn registration_order_beats_specificity() {
    let mut router = Router::new();
    router.add("/:anything", value(json!("wildcard"))).unwrap();
    router.add("/users", value(json!("exact"))).unwrap();

    let mut ctx = Context::new("/users");
    assert_eq!(
        router.request(&mut ctx).await.unwrap(),
        Some(json!("wildcard")),
        "an earlier, less specific route must win"
    );
}

#[tokio::test]
async fn pass_tries_later_routes_and_null_terminates() {
    let mut router = Router::new();
    router.add("/x", Endpoint::handler(PassHandler)).unwrap();
    router
        .add("/x", Endpoint::handler(StaticHandler::new(Value::Null)))
        .unwrap();
    router.add("/x", value(json!("unreached"))).unwrap();

    let mut ctx = Context::new("/x");
    assert_eq!(
        router.request(&mut ctx).await.unwrap(),
        Some(Value::Null),
        "a null result is defined and terminates dispatch"
    );
}

#[tokio::test]
async fn exhausted_routes_resolve_to_none() {
    let mut router = Router::new();
    router.add("/x", Endpoint::handler(PassHandler)).unwrap();
    router.add("/x", Endpoint::handler(PassHandler)).unwrap();

    let mut ctx = Context::new("/x");
    assert_eq!(router.request(&mut ctx).await.unwrap(), None);
}

#[tokio::test]
async fn chain_first_defined_result_short_circuits() {
    let first = RecordingHandler::new();
    let second = RecordingHandler::with_outcome(Outcome::Handled(json!("second")));
    let third = RecordingHandler::with_outcome(Outcome::Handled(json!("third")));

    let handlers: Vec<Arc<dyn DynHandler>> = vec![
        Arc::new(first.clone()),
        Arc::new(second.clone()),
        Arc::new(third.clone()),
    ];
    let mut router = Router::new();
    router.add("/x", Endpoint::chain(handlers)).unwrap();

    let mut ctx = Context::new("/x");
    assert_eq!(router.request(&mut ctx).await.unwrap(), Some(json!("second")));
    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 1);
    assert_eq!(third.count(), 0, "the chain must stop at the first result");
}

#[tokio::test]
async fn verb_filter_is_independent_of_uri() {
    let mut router = Router::new();
    router.add_verb(Verb::Get, "/users", value(json!("list"))).unwrap();
    router.add_verb(Verb::Post, "/users", value(json!("create"))).unwrap();
    router.add("/users", value(json!("any"))).unwrap();

    let mut get = Context::get("/users");
    assert_eq!(router.request(&mut get).await.unwrap(), Some(json!("list")));

    let mut post = Context::post("/users");
    assert_eq!(router.request(&mut post).await.unwrap(), Some(json!("create")));

    // No verb on the call: verb-filtered routes don't match, the open one does.
    let mut bare = Context::new("/users");
    assert_eq!(router.request(&mut bare).await.unwrap(), Some(json!("any")));
}

#[tokio::test]
async fn matched_params_win_over_inherited() {
    let mut inner = Router::new();
    inner.add("/:tenant", echo()).unwrap();

    let mut router = Router::new();
    router.mount("/orgs/:tenant", inner).unwrap();

    let mut ctx = Context::new("/orgs/acme/globex");
    let result = router.request(&mut ctx).await.unwrap().unwrap();
    assert_eq!(
        result["params"]["tenant"], "globex",
        "the child match must override the parent's value"
    );
}

#[tokio::test]
async fn params_merge_across_levels() {
    let mut inner = Router::new();
    inner.add("/users/:id", echo()).unwrap();

    let mut router = Router::new();
    router.mount("/orgs/:tenant", inner).unwrap();

    let mut ctx = Context::new("/orgs/acme/users/5");
    let result = router.request(&mut ctx).await.unwrap().unwrap();
    assert_eq!(result["params"]["tenant"], "acme");
    assert_eq!(result["params"]["id"], "5");
}

#[tokio::test]
async fn verb_shorthands_build_the_context() {
    let mut router = Router::new();
    router.add_verb(Verb::Delete, "/users/:id", echo()).unwrap();

    let result = router.delete("/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["type"], "delete");
    assert_eq!(result["params"]["id"], "5");
}

#[tokio::test]
async fn clear_discards_every_route() {
    let mut router = Router::new();
    router.add("/x", value(json!(1))).unwrap();
    router.clear();

    let mut ctx = Context::new("/x");
    assert_eq!(router.request(&mut ctx).await.unwrap(), None);
}
