// src/server/routes.rs

use std::convert::Infallible;
use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::services::ServeDir;
use tracing::warn;

use crate::server::reload::{ReloadEvent, ReloadSignal};

pub const EVENTS_PATH: &str = "/__assetflow/events";
pub const CLIENT_PATH: &str = "/__assetflow/client.js";

/// Pages larger than this are served without the reload client.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

const CLIENT_TAG: &str = r#"<script src="/__assetflow/client.js"></script>"#;

const CLIENT_JS: &str = r#"(function () {
  var source = new EventSource("/__assetflow/events");
  source.addEventListener("reload", function () {
    window.location.reload();
  });
  source.addEventListener("build-error", function (e) {
    console.error("[assetflow] " + e.data);
  });
})();
"#;

#[derive(Clone)]
struct ServerState {
    reload: ReloadSignal,
}

/// Dev server routes: the reload stream, the reload client, and the output
/// tree with the client injected into every HTML page.
pub fn build_router(output_root: &Path, reload: ReloadSignal) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(reload_events))
        .route(CLIENT_PATH, get(client_js))
        .with_state(ServerState { reload })
        .fallback_service(ServeDir::new(output_root))
        .layer(middleware::from_fn(inject_client))
}

/// GET /__assetflow/events: `reload` after a successful task, `build-error`
/// (`<task>: <message>`) after a failed one.
async fn reload_events(State(state): State<ServerState>) -> impl IntoResponse {
    let rx = state.reload.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        msg.ok().map(|event| Ok::<Event, Infallible>(to_sse(&event)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: &ReloadEvent) -> Event {
    match event {
        ReloadEvent::Changed => Event::default().event("reload").data("reload"),
        ReloadEvent::Failed { task, message } => Event::default()
            .event("build-error")
            .data(format!("{task}: {}", message.replace('\r', ""))),
    }
}

async fn client_js() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_JS,
    )
}

async fn inject_client(req: Request, next: Next) -> Response {
    let res = next.run(req).await;

    let is_html = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if res.status() != StatusCode::OK || !is_html {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(page))
}

/// Insert the reload client before the last `</body>`, or append it.
pub fn inject_script(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => format!("{}{CLIENT_TAG}{}", &html[..at], &html[at..]),
        None => format!("{html}{CLIENT_TAG}"),
    }
}
