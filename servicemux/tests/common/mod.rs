#![allow(dead_code)]

use std::future::Future;

use serde_json::{Value, json};
use servicemux::testing::StaticHandler;
use servicemux::{BoxError, Context, Endpoint, Handler, Outcome};

/// Answers with a snapshot of the context it was called with, so tests can
/// assert what a handler observed after mounts rewrote the call.
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn call(&self, ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send {
        let snapshot = json!({
            "uri": ctx.uri,
            "baseUri": ctx.base_uri,
            "originalUri": ctx.original_uri,
            "params": ctx.params,
            "type": ctx.verb.map(|v| v.as_str()),
            "timeout": ctx.timeout,
        });
        async move { Ok(Outcome::Handled(snapshot)) }
    }
}

pub fn echo() -> Endpoint {
    Endpoint::handler(EchoHandler)
}

pub fn value(v: Value) -> Endpoint {
    Endpoint::handler(StaticHandler::new(v))
}
