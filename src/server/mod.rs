//! Development server
//!
//! Serves the generated public folder and the dynamic endpoints the pages
//! rely on: the "load more" listing API and the CMS preview session. While
//! a preview session is active, pages are rendered live from the preview
//! ref instead of being read from disk.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{self, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::cms::encode_value;
use crate::error::{Error, FetchError};
use crate::generator::Generator;
use crate::pagination::{PaginationController, PaginationState, Phase};
use crate::templates::PageView;
use crate::Blog;

/// Cookie holding the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Server state
struct ServerState {
    generator: Generator,
    public_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CursorParams {
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// A site path the server knows how to render
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Index,
    Post(String),
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let generator = Generator::new(blog, blog.fetcher()?)?;
    let app = router(generator, blog.public_dir.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes of the site, mounted under the configured root
fn router(generator: Generator, public_dir: PathBuf) -> Router {
    let root = generator.renderer().helpers().url_for("");
    let api = |path: &str| format!("{}api/{}", root, path);

    let state = Arc::new(ServerState {
        generator,
        public_dir,
    });

    Router::new()
        .route(&api("posts"), get(load_more_handler))
        .route(&api("preview"), get(preview_handler))
        .route(&api("exit-preview"), get(exit_preview_handler))
        .fallback(fallback_handler)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .with_state(state)
}

/// Next listing page as JSON
async fn load_more_handler(
    State(state): State<Arc<ServerState>>,
    extract::Query(params): extract::Query<CursorParams>,
) -> Response {
    let Some(cursor) = params.cursor.filter(|c| !c.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing cursor");
    };

    match load_page(&state.generator, cursor).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            tracing::warn!("Load more failed: {}", e);
            error_response(error_status(&e), &e.to_string())
        }
    }
}

async fn load_page(generator: &Generator, cursor: String) -> crate::Result<PageView> {
    let mut controller = PaginationController::resume(
        PaginationState {
            loaded_posts: Vec::new(),
            next_cursor: Some(cursor),
        },
        Phase::Extended,
    );
    controller.load_more(generator.fetcher().as_ref()).await?;

    let state = controller.into_state();
    Ok(generator.renderer().page_view(&crate::content::Page {
        results: state.loaded_posts,
        next_cursor: state.next_cursor,
    }))
}

/// Enter preview mode and land on the previewed document
async fn preview_handler(
    State(state): State<Arc<ServerState>>,
    extract::Query(params): extract::Query<PreviewParams>,
) -> Response {
    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing preview token");
    };
    let helpers = state.generator.renderer().helpers();

    let location = match params.document_id {
        Some(id) => match state
            .generator
            .fetcher()
            .get_by_id(&id, Some(token.clone()))
            .await
        {
            Ok(Some(doc)) => doc
                .uid
                .map(|uid| helpers.post_url(&uid))
                .unwrap_or_else(|| helpers.url_for("")),
            Ok(None) => helpers.url_for(""),
            Err(e) => {
                tracing::warn!("Preview of {} failed: {}", id, e);
                return error_response(StatusCode::BAD_GATEWAY, &e.to_string());
            }
        },
        None => helpers.url_for(""),
    };

    tracing::info!("Preview session started, redirecting to {}", location);
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE,
        encode_value(&token)
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to(&location)).into_response()
}

/// Leave preview mode
async fn exit_preview_handler(State(state): State<Arc<ServerState>>) -> Response {
    let cookie = format!("{}=; Path=/; Max-Age=0", PREVIEW_COOKIE);
    let home = state.generator.renderer().helpers().url_for("");
    ([(header::SET_COOKIE, cookie)], Redirect::to(&home)).into_response()
}

/// Live pages while previewing, static files otherwise
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    if let Some(reference) = preview_ref(request.headers()) {
        let root = state.generator.renderer().helpers().url_for("");
        if let Some(route) = route_for(&root, request.uri().path()) {
            return render_preview(&state.generator, route, reference).await;
        }
    }

    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

async fn render_preview(generator: &Generator, route: Route, reference: String) -> Response {
    let rendered = match &route {
        Route::Index => generator
            .render_index_page(Some(reference), true)
            .await
            .map(Some),
        Route::Post(uid) => generator.render_post_page(uid, Some(reference), true).await,
    };

    match rendered {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(e) => {
            tracing::warn!("Preview of {:?} failed: {}", route, e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

/// The preview ref carried by the request cookies, if any
fn preview_ref(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == PREVIEW_COOKIE)
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
        .filter(|value| !value.is_empty())
}

/// Which page a request path under `root` names
fn route_for(root: &str, path: &str) -> Option<Route> {
    let rest = path.strip_prefix(root).or_else(|| {
        // the root itself without its trailing slash
        (format!("{}/", path) == root).then_some("")
    })?;
    match rest {
        "" | "index.html" => Some(Route::Index),
        _ => {
            let uid = rest.strip_prefix("post/")?;
            let uid = uid
                .strip_suffix("/index.html")
                .or_else(|| uid.strip_suffix('/'))
                .unwrap_or(uid);
            if uid.is_empty() || uid.contains('/') {
                return None;
            }
            Some(Route::Post(
                percent_decode_str(uid).decode_utf8_lossy().into_owned(),
            ))
        }
    }
}

fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Fetch(FetchError::InvalidCursor(_)) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Fetch(_) | Error::MalformedDocument { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::{raw_post, MemoryFetcher};
    use crate::config::SiteConfig;
    use axum::http::HeaderValue;
    use tempfile::TempDir;

    fn state(fetcher: MemoryFetcher) -> (TempDir, Arc<ServerState>) {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        let generator = Generator::new(&blog, Arc::new(fetcher)).unwrap();
        let state = Arc::new(ServerState {
            generator,
            public_dir: blog.public_dir.clone(),
        });
        (dir, state)
    }

    fn documents() -> Vec<crate::cms::RawDocument> {
        vec![
            raw_post("first", "2021-03-01T10:00:00+0000", "First"),
            raw_post("second", "2021-03-02T10:00:00+0000", "Second"),
            raw_post("third", "2021-03-03T10:00:00+0000", "Third"),
        ]
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_route_for() {
        assert_eq!(route_for("/", "/"), Some(Route::Index));
        assert_eq!(route_for("/", "/index.html"), Some(Route::Index));
        assert_eq!(
            route_for("/", "/post/hooks/"),
            Some(Route::Post("hooks".to_string()))
        );
        assert_eq!(
            route_for("/", "/post/a%20b/index.html"),
            Some(Route::Post("a b".to_string()))
        );
        assert_eq!(route_for("/blog/", "/blog"), Some(Route::Index));
        assert_eq!(route_for("/blog/", "/other/"), None);
        assert_eq!(route_for("/", "/css/style.css"), None);
        assert_eq!(route_for("/", "/post/a/b/"), None);
    }

    #[test]
    fn test_preview_ref() {
        let mut headers = HeaderMap::new();
        assert_eq!(preview_ref(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; io.prismic.preview=https%3A%2F%2Frepo%2Fpreview"),
        );
        assert_eq!(preview_ref(&headers).as_deref(), Some("https://repo/preview"));

        headers.insert(header::COOKIE, HeaderValue::from_static("io.prismic.preview="));
        assert_eq!(preview_ref(&headers), None);
    }

    #[test]
    fn test_error_status() {
        let invalid = Error::Fetch(FetchError::InvalidCursor("x".to_string()));
        assert_eq!(error_status(&invalid), StatusCode::BAD_REQUEST);
        let down = Error::Fetch(FetchError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(error_status(&down), StatusCode::BAD_GATEWAY);
        assert_eq!(
            error_status(&Error::MalformedDocument { field: "uid" }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_load_more() {
        let (_dir, state) = state(MemoryFetcher::new(documents()));
        let params = CursorParams {
            cursor: Some("mem:1:2".to_string()),
        };
        let response = load_more_handler(State(state), extract::Query(params)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["results"][0]["id"], "second");
        assert_eq!(page["results"][0]["first_publication_date"], "02 mar 2021");
        assert_eq!(page["next_cursor"], "mem:1:3");
        assert_eq!(page["next_url"], "/api/posts?cursor=mem%3A1%3A3");
    }

    #[tokio::test]
    async fn test_load_more_failure() {
        let fetcher = MemoryFetcher::new(documents());
        fetcher.set_failing(true);
        let (_dir, state) = state(fetcher);

        let params = CursorParams {
            cursor: Some("mem:1:2".to_string()),
        };
        let response = load_more_handler(State(state.clone()), extract::Query(params)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_json(response).await["error"].is_string());

        let response =
            load_more_handler(State(state), extract::Query(CursorParams { cursor: None })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview_sets_cookie_and_redirects() {
        let (_dir, state) = state(MemoryFetcher::new(documents()));
        let params = PreviewParams {
            token: Some("https://repo/preview?x=1".to_string()),
            document_id: Some("ID-second".to_string()),
        };
        let response = preview_handler(State(state), extract::Query(params)).await;

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/post/second/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("io.prismic.preview=https%3A%2F%2Frepo%2Fpreview%3Fx%3D1;"));
    }

    #[tokio::test]
    async fn test_preview_renders_live() {
        let mut fetcher = MemoryFetcher::new(documents());
        let mut draft = raw_post("second", "2021-03-02T10:00:00+0000", "Second");
        draft.data["title"] = serde_json::json!("Second (draft)");
        fetcher.preview = Some(("preview-ref".to_string(), vec![draft]));
        let (_dir, state) = state(fetcher);

        let request = Request::builder()
            .uri("/post/second/")
            .header(header::COOKIE, "io.prismic.preview=preview-ref")
            .body(Body::empty())
            .unwrap();
        let response = fallback_handler(State(state.clone()), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Second (draft)"));
        assert!(html.contains("Sair do modo Preview"));

        let request = Request::builder()
            .uri("/post/missing/")
            .header(header::COOKIE, "io.prismic.preview=preview-ref")
            .body(Body::empty())
            .unwrap();
        let response = fallback_handler(State(state), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_exit_preview_clears_cookie() {
        let (_dir, state) = state(MemoryFetcher::new(documents()));
        let response = exit_preview_handler(State(state)).await;
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }
}
