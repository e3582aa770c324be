//! Site server with preview mode and on-demand post generation

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{PreviewContext, PREVIEW_COOKIE};
use crate::generator::{is_safe_uid, Generator};
use crate::helpers::post_path;
use crate::prismic::ContentSource;
use crate::Blog;

/// How long a uid found missing answers 404 without asking the repository again
const MISSING_TTL: Duration = Duration::from_secs(60);

/// Upper bound on remembered missing uids
const MISSING_CAPACITY: usize = 1024;

/// Uids with a generation in flight, and uids recently found not to exist
#[derive(Debug, Default)]
struct Fallback {
    pending: HashSet<String>,
    missing: HashMap<String, Instant>,
}

impl Fallback {
    /// Whether `uid` was found missing less than [`MISSING_TTL`] ago
    fn is_missing(&mut self, uid: &str, now: Instant) -> bool {
        match self.missing.get(uid) {
            Some(&at) if now.saturating_duration_since(at) < MISSING_TTL => true,
            Some(_) => {
                self.missing.remove(uid);
                false
            }
            None => false,
        }
    }

    fn mark_missing(&mut self, uid: String, now: Instant) {
        if self.missing.len() >= MISSING_CAPACITY {
            self.missing
                .retain(|_, at| now.saturating_duration_since(*at) < MISSING_TTL);
        }
        if self.missing.len() >= MISSING_CAPACITY {
            let oldest = self
                .missing
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(uid, _)| uid.clone());
            if let Some(oldest) = oldest {
                self.missing.remove(&oldest);
            }
        }
        self.missing.insert(uid, now);
    }
}

/// Server state
struct ServerState<C> {
    generator: Generator<C>,
    public_dir: PathBuf,
    fallback: Mutex<Fallback>,
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Start the server
///
/// With `revalidate` set the site is regenerated in the background every
/// `revalidate` seconds from the configuration.
pub async fn start(blog: &Blog, ip: &str, port: u16, revalidate: bool, open: bool) -> Result<()> {
    let state = Arc::new(ServerState {
        generator: blog.generator()?,
        public_dir: blog.public_dir.clone(),
        fallback: Mutex::new(Fallback::default()),
    });

    let app = router(state.clone(), &blog.config.exit_preview_path);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);

    if revalidate && blog.config.revalidate > 0 {
        let period = Duration::from_secs(blog.config.revalidate);
        println!("Revalidating every {}s", period.as_secs());
        spawn_revalidation(state, period);
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router<C: ContentSource + 'static>(state: Arc<ServerState<C>>, exit_preview_path: &str) -> Router {
    let public_dir = state.public_dir.clone();

    Router::new()
        .route("/", get(home_handler::<C>))
        .route("/post/:uid", get(post_handler::<C>))
        .route("/api/preview", get(preview_handler::<C>))
        .route(exit_preview_path, get(exit_preview_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Regenerate the published site periodically
fn spawn_revalidation<C: ContentSource + 'static>(state: Arc<ServerState<C>>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately and the site was just built
        interval.tick().await;

        loop {
            interval.tick().await;
            revalidate_once(&*state).await;
        }
    });
}

/// Regenerate the published site once
///
/// Failures are logged and leave the current site in place. Returns whether
/// the build succeeded.
async fn revalidate_once<C: ContentSource>(state: &ServerState<C>) -> bool {
    tracing::info!("Revalidating site...");
    match state.generator.generate().await {
        Ok(stats) => {
            tracing::info!("Revalidated {} posts", stats.posts);
            // Posts may have been published since
            state.fallback.lock().await.missing.clear();
            true
        }
        Err(e) => {
            tracing::error!("Revalidation failed: {:#}", e);
            false
        }
    }
}

fn preview_context(headers: &HeaderMap) -> PreviewContext {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    PreviewContext::from_cookie_header(cookie)
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Render failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

async fn home_handler<C: ContentSource + 'static>(
    State(state): State<Arc<ServerState<C>>>,
    headers: HeaderMap,
) -> Response {
    let ctx = preview_context(&headers);

    if !ctx.preview {
        if let Ok(html) = tokio::fs::read_to_string(state.public_dir.join("index.html")).await {
            return Html(html).into_response();
        }
    }

    match state.generator.render_home(&ctx).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => server_error(e),
    }
}

async fn post_handler<C: ContentSource + 'static>(
    State(state): State<Arc<ServerState<C>>>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_safe_uid(&uid) {
        return not_found();
    }

    let ctx = preview_context(&headers);
    if ctx.preview {
        return match state.generator.render_post(&uid, &ctx).await {
            Ok(Some(html)) => Html(html).into_response(),
            Ok(None) => not_found(),
            Err(e) => server_error(e),
        };
    }

    let file = state.public_dir.join("post").join(&uid).join("index.html");
    if let Ok(html) = tokio::fs::read_to_string(&file).await {
        return Html(html).into_response();
    }

    if state.fallback.lock().await.is_missing(&uid, Instant::now()) {
        return not_found();
    }

    schedule_generation(state.clone(), uid).await;

    match state.generator.render_loading() {
        Ok(html) => Html(html).into_response(),
        Err(e) => server_error(e),
    }
}

/// Generate a post page in the background, once per uid at a time
async fn schedule_generation<C: ContentSource + 'static>(state: Arc<ServerState<C>>, uid: String) {
    if !state.fallback.lock().await.pending.insert(uid.clone()) {
        return;
    }

    tokio::spawn(async move {
        let result = state.generator.generate_post(&uid).await;

        let mut fallback = state.fallback.lock().await;
        fallback.pending.remove(&uid);
        match result {
            Ok(true) => tracing::info!("Generated post on demand: {}", uid),
            Ok(false) => {
                tracing::debug!("No post with uid {}", uid);
                fallback.mark_missing(uid, Instant::now());
            }
            Err(e) => tracing::error!("Failed to generate post {}: {:#}", uid, e),
        }
    });
}

async fn preview_handler<C: ContentSource + 'static>(
    State(state): State<Arc<ServerState<C>>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    };

    let ctx = PreviewContext::draft(&token);
    let mut location = "/".to_string();
    if let Some(id) = params.document_id.as_deref() {
        match state
            .generator
            .source()
            .get_by_id(id, &ctx.query_options())
            .await
        {
            Ok(Some(document)) => {
                if let Some(uid) = document.uid.as_deref() {
                    location = post_path(uid);
                }
            }
            Ok(None) => tracing::debug!("Preview document {} not found", id),
            Err(e) => tracing::warn!("Failed to resolve preview document {}: {}", id, e),
        }
    }

    let cookie = format!(
        "{}={}; Path=/; SameSite=Lax",
        PREVIEW_COOKIE,
        utf8_percent_encode(&token, NON_ALPHANUMERIC)
    );
    ([(header::SET_COOKIE, cookie)], Redirect::temporary(&location)).into_response()
}

async fn exit_preview_handler() -> Response {
    let cookie = format!("{}=; Path=/; Max-Age=0", PREVIEW_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::temporary("/")).into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
