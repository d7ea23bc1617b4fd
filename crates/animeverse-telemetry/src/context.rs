//! Per-invocation request context.
//!
//! # Design
//! - A request identifier and the command name live in task-local storage for
//!   the duration of one CLI command, so every outgoing request can carry the
//!   same `x-request-id` and every log line can be correlated.
//! - Outside a scope the accessors return `None`.

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::init::build_sha;

#[derive(Clone)]
struct RequestContext {
    request_id: Arc<str>,
    command: Arc<str>,
}

tokio::task_local! {
    static ACTIVE_REQUEST_CONTEXT: RequestContext;
}

/// Generate a fresh request identifier.
#[must_use]
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Run `fut` with `request_id` and `command` visible to downstream code.
pub async fn with_request_context<Fut, T>(
    request_id: impl Into<String>,
    command: impl Into<String>,
    fut: Fut,
) -> T
where
    Fut: Future<Output = T>,
{
    let context = RequestContext {
        request_id: Arc::from(request_id.into()),
        command: Arc::from(command.into()),
    };
    let span = tracing::info_span!(
        "command",
        command = %context.command,
        request_id = %context.request_id,
        build_sha = %build_sha(),
    );
    ACTIVE_REQUEST_CONTEXT
        .scope(context, fut.instrument(span))
        .await
}

/// The request identifier of the enclosing scope, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    ACTIVE_REQUEST_CONTEXT
        .try_with(|ctx| ctx.request_id.as_ref().to_string())
        .ok()
}

/// The command name of the enclosing scope, if any.
#[must_use]
pub fn current_command() -> Option<String> {
    ACTIVE_REQUEST_CONTEXT
        .try_with(|ctx| ctx.command.as_ref().to_string())
        .ok()
}
