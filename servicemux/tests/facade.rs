//! The facade end to end: registry, servers, clients and proxies over the
//! in-process loopback transport.

use std::sync::{Arc, Mutex};

use serde_json::json;
use servicemux::testing::Loopback;
use servicemux::{
    ClientOptions, MuxError, Notice, Requester, Root, RouterOptions, Topic, Verb,
};

mod common;
use common::{echo, value};

fn serve_echo(root: &Root, authority: &str) -> impl std::future::Future<Output = ()> {
    let mut users = root.router();
    users.add("/users/:id", echo()).unwrap();
    users.add_verb(Verb::Post, "/users", value(json!("created"))).unwrap();
    let uri = format!("loop://{authority}/");
    let registry = root.registry().clone();
    async move {
        registry.server(users, uri.as_str()).await.unwrap();
    }
}

#[tokio::test]
async fn client_reaches_a_served_router() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let client = root.client("loop://users/").await.unwrap();
    let result = client.get("/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["uri"], "/users/5");
    assert_eq!(result["params"]["id"], "5");
    assert_eq!(result["type"], "get");
}

#[tokio::test]
async fn mounted_client_gets_mount_rewriting() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let client = root.client("loop://users/").await.unwrap();
    let mut app = root.router();
    app.mount("/people", client).unwrap();

    let result = app.get("/people/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["uri"], "/users/5", "the mount prefix must be stripped");
    assert_eq!(result["baseUri"], "/people");
}

#[tokio::test]
async fn verb_travels_the_wire() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let client = root.client("loop://users/").await.unwrap();
    assert_eq!(
        client.post("/users", json!({"name": "ada"})).await.unwrap(),
        Some(json!("created"))
    );
}

#[tokio::test]
async fn client_default_timeout_applies_when_unset() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let options = ClientOptions {
        timeout: Some(250),
        ..ClientOptions::uri("loop://users/")
    };
    let client = root.client(options).await.unwrap();

    let result = client.get("/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["timeout"], 250);

    let mut ctx = servicemux::Context::get("/users/5").timeout(90);
    let result = client.request(&mut ctx).await.unwrap().unwrap();
    assert_eq!(result["timeout"], 90, "an explicit timeout must not be overridden");
}

#[tokio::test]
async fn proxy_without_change_origin_strips_the_prefix() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let mut app = root.router();
    app.proxy("/svc", "loop://users/", false).await.unwrap();

    let result = app.get("/svc/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["uri"], "/users/5");
}

#[tokio::test]
async fn proxy_with_change_origin_keeps_the_full_uri() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));

    let mut remote = root.router();
    remote.add("/svc/users/:id", echo()).unwrap();
    root.registry()
        .server(remote, "loop://remote/")
        .await
        .unwrap();

    let mut app = root.router();
    app.proxy("/svc", "loop://remote/", true).await.unwrap();

    let result = app.get("/svc/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["uri"], "/svc/users/5");
}

#[tokio::test]
async fn proxy_notice_reports_mount_and_target() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let seen: Arc<Mutex<Vec<(String, String)>>> = Default::default();
    let sink = seen.clone();

    let mut app = root.router();
    app.on(Topic::Proxy, move |notice| {
        if let Notice::Proxy { uri, target } = notice {
            sink.lock().unwrap().push(((*uri).to_string(), (*target).to_string()));
        }
        None
    });
    app.proxy("/svc", "loop://users/", false).await.unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [("/svc".to_string(), "loop://users/".to_string())]
    );
}

#[tokio::test]
async fn server_notice_fires_before_the_factory() {
    let root = Root::new();
    let loopback = Loopback::new();
    root.register(loopback.module("loop"));

    let seen: Arc<Mutex<Vec<String>>> = Default::default();
    let sink = seen.clone();

    let mut app = root.router();
    app.add("/ping", value(json!("pong"))).unwrap();
    app.on(Topic::Server, move |notice| {
        if let Notice::Server { scheme, .. } = notice {
            sink.lock().unwrap().push((*scheme).to_string());
        }
        None
    });

    root.server(app, "loop://ping/").await.unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), ["loop"]);
    assert_eq!(loopback.served(), ["ping"]);
}

#[tokio::test]
async fn closing_a_server_unpublishes_it() {
    let root = Root::new();
    let loopback = Loopback::new();
    root.register(loopback.module("loop"));
    serve_echo(&root, "users").await;

    let mut ping = root.router();
    ping.add("/ping", value(json!("pong"))).unwrap();
    let handle = root.server(ping, "loop://ping/").await.unwrap();

    assert_eq!(loopback.served(), ["ping", "users"]);
    handle.close().await.unwrap();
    assert_eq!(loopback.served(), ["users"]);
}

#[tokio::test]
async fn standalone_proxy_forwards_everything() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let proxy = root.proxy("loop://users/").await.unwrap();
    let result = proxy.get("/users/5", None).await.unwrap().unwrap();
    assert_eq!(result["uri"], "/users/5");
    assert_eq!(proxy.client().target(), Some("loop://users/"));
}

#[tokio::test]
async fn unregister_removes_the_transport() {
    let root = Root::new();
    let registration = root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    assert!(root.client("loop://users/").await.is_ok());
    registration.unregister();
    assert!(matches!(
        root.client("loop://users/").await,
        Err(MuxError::UnsupportedType(_))
    ));
}

#[tokio::test]
async fn reregistering_a_name_replaces_the_factories() {
    let root = Root::new();
    let first = Loopback::new();
    let second = Loopback::new();
    root.register(first.module("loop"));
    root.register(second.module("loop"));

    let mut app = root.router();
    app.add("/ping", value(json!("pong"))).unwrap();
    root.server(app, "loop://ping/").await.unwrap();

    assert_eq!(first.served(), Vec::<String>::new());
    assert_eq!(second.served(), ["ping"]);
}

#[tokio::test]
async fn notify_and_ready_have_usable_defaults() {
    let root = Root::new();
    root.register(Loopback::new().module("loop"));
    serve_echo(&root, "users").await;

    let client = root.client("loop://users/").await.unwrap();
    assert!(client.ready());

    let ctx = servicemux::Context::post("/users").data(json!({"name": "ada"}));
    client.notify(&ctx).await.unwrap();
}

#[tokio::test]
async fn root_defaults_flow_into_routers() {
    let root = Root::with_options(servicemux::RootOptions {
        logging: true,
        timing: true,
    });
    let mut app = root.router_with(RouterOptions {
        name: Some("edge".into()),
        ..RouterOptions::default()
    });
    app.add("/ping", value(json!("pong"))).unwrap();

    assert_eq!(app.name(), Some("edge"));
    assert_eq!(app.get("/ping", None).await.unwrap(), Some(json!("pong")));
}
