//! Router assembly and request gating.

use crate::api;
use crate::assets;
use crate::error::{ErrorPage, ServerError};
use crate::logging::request_line;
use crate::pages::{self, HTML_CONTENT_TYPE};
use crate::state::SharedState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use greetmaster_page::{build_html, TemplateVars};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/get", get(api::get_greetings))
        .route("/stats", get(api::stats))
        .route("/random", get(api::random))
        .fallback(assets::static_file)
        .layer(middleware::from_fn_with_state(state.clone(), gate))
        .layer(middleware::from_fn_with_state(state.clone(), error_pages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log every request, refuse blocklisted clients and enforce the allowed host names.
async fn gate(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let config = &state.config;
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let blocked = config.is_blocked(&ip, user_agent);
    if !blocked || config.log_blocked_requests {
        info!("{}", request_line(&ip, user_agent, &request.uri().to_string(), blocked));
    }
    if blocked {
        return Err(ServerError::NotFound);
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(host_name)
        .unwrap_or_default();
    if !config.allows_host(&host) {
        return Err(ServerError::BadRequest);
    }

    Ok(next.run(request).await)
}

/// Replace the body of error responses with the rendered error template.
async fn error_pages(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };
    let vars = TemplateVars::new()
        .with("STATUSTEXT", page.status_text)
        .with("MESSAGE", page.message);
    let html = build_html(&state.templates.error, &vars);
    (response.status(), [(CONTENT_TYPE, HTML_CONTENT_TYPE)], html).into_response()
}

/// Lower-cased host name of a `Host` header value, without its port.
fn host_name(header: &str) -> String {
    let name = if header.starts_with('[') {
        match header.find(']') {
            Some(end) => &header[..=end],
            None => header,
        }
    } else {
        header.split(':').next().unwrap_or(header)
    };
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::index::{FileIndex, GreetingIndex};
    use crate::state::{AppState, Templates};
    use axum::body::{self, Body};
    use axum::http::{header::LOCATION, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn manifest_path(relative: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
    }

    fn test_config() -> Config {
        Config {
            greeting_index: manifest_path("testdata/greetings.json"),
            filesystem_index: manifest_path("testdata/files.json"),
            template_dir: manifest_path("templates"),
            data_dir: manifest_path("testdata/data"),
            static_dir: manifest_path("testdata/static"),
            log_file: String::new(),
            ..Config::default()
        }
    }

    fn test_router_with(config: Config) -> Router {
        let state = AppState {
            greetings: GreetingIndex::load(&config.greeting_index).unwrap(),
            files: FileIndex::load(&config.filesystem_index).unwrap(),
            templates: Templates::load(&config.template_dir).unwrap(),
            config,
        };
        build_router(Arc::new(state))
    }

    fn test_router() -> Router {
        test_router_with(test_config())
    }

    async fn send(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router
            .oneshot(
                Request::get(uri)
                    .header(HOST, "localhost:8991")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|h| h.to_str().unwrap().to_string());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, location, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get_json(uri: &str) -> Value {
        let (status, _, body) = send(test_router(), uri).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_str(&body).unwrap()
    }

    #[test]
    fn host_names() {
        assert_eq!(host_name("Example.com:8991"), "example.com");
        assert_eq!(host_name("localhost"), "localhost");
        assert_eq!(host_name("[::1]:8991"), "[::1]");
    }

    #[tokio::test]
    async fn home_page() {
        let (status, _, body) = send(test_router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Greetmaster</title>"));
        assert!(body.contains(r#"<script src="/main.js" defer></script>"#));
        assert!(body.contains("greetmaster-navigation"));
        assert!(!body.contains("noindex"));
    }

    #[tokio::test]
    async fn home_search_is_noindexed_and_escaped() {
        let (_, _, body) = send(test_router(), "/?search=%22cake%22").await;
        assert!(body.contains(r#"<meta name="robots" content="noindex">"#));
        assert!(body.contains(r#"value="&quot;cake&quot;""#));
    }

    #[tokio::test]
    async fn about_page() {
        let (status, _, body) = send(test_router(), "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>About Greetmaster</title>"));
        assert!(body.contains("greetmaster-about"));
    }

    #[tokio::test]
    async fn html_card_page() {
        let (status, _, body) = send(test_router(), "/?id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Happy Birthday - HTML E-Card at Greetmaster</title>"));
        assert!(body.contains(r#"class="greetmaster-html-container""#));
        assert!(body.contains("#greetmaster-html-container { background-color: #ffffcc; }"));
        assert!(body.contains(r#"src="/data/www.example.com/cards/0001/cake.gif""#));
        assert!(body.contains(r#"data-field="Name""#));
        assert!(!body.contains("noindex"));
    }

    #[tokio::test]
    async fn html_card_with_field_data() {
        // "Name=Sam"
        let (_, _, body) = send(test_router(), "/?id=1&data=TmFtZT1TYW0=").await;
        assert!(body.contains("Dear Sam,"));
        assert!(!body.contains("data-field"));
    }

    #[tokio::test]
    async fn embedded_card_skips_navigation_and_script() {
        let (status, _, body) = send(test_router(), "/?id=1&embed=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>E-Card at Greetmaster</title>"));
        assert!(!body.contains("greetmaster-navigation"));
        assert!(!body.contains("/main.js"));
    }

    #[tokio::test]
    async fn flash_card_page() {
        let (_, _, body) = send(test_router(), "/?id=2").await;
        assert!(body.contains(
            r#"<div id="greetmaster-flash-placeholder" data-src="/data/www.example.com/flash/2.swf" data-width="400" data-height="300" data-protected="false"></div>"#
        ));
    }

    #[tokio::test]
    async fn wallpaper_page_has_download_links() {
        let (_, _, body) = send(test_router(), "/?id=3").await;
        assert!(body.contains("Downloads:"));
        assert!(body.contains(r#"href="/data/www.example.com/wp/800x600.jpg" target="_blank">800x600</a>"#));
    }

    #[tokio::test]
    async fn invalid_card_is_bad_request() {
        for uri in ["/?id=99", "/?id=4"] {
            let (status, _, body) = send(test_router(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body.contains("<h1>400 Bad Request</h1>"));
            assert!(body.contains("The requested URL is invalid."));
        }
    }

    #[tokio::test]
    async fn get_by_id_with_fields() {
        let json = get_json("/get?id=1&field=titles&field=bogus&field=type").await;
        assert_eq!(
            json.to_string(),
            r#"{"1":{"titles":["Happy<br>Birthday"],"type":"htmlEcard"}}"#
        );
    }

    #[tokio::test]
    async fn get_unavailable_card_is_empty() {
        assert_eq!(get_json("/get?id=4").await.to_string(), "{}");
    }

    #[tokio::test]
    async fn get_page_of_cards() {
        let json = get_json("/get?count=2&offset=1&field=type").await;
        assert_eq!(
            json.to_string(),
            r#"{"2":{"type":"flashEcard"},"3":{"type":"wallpaperPreview"}}"#
        );
        assert_eq!(get_json("/get?field=type").await.to_string(), "{}");
        let filtered = get_json("/get?count=10&type=flashEcard&field=type").await;
        assert_eq!(filtered.to_string(), r#"{"2":{"type":"flashEcard"}}"#);
    }

    #[tokio::test]
    async fn stats_over_filtered_cards() {
        let json = get_json("/stats?category=Birthday").await;
        assert_eq!(
            json.to_string(),
            r#"{"total":2,"titles":{},"categories":{"Birthday":2,"Kids":1},"sources":{"Blue Mountain":2},"types":{"htmlEcard":1,"flashEcard":1}}"#
        );
    }

    #[tokio::test]
    async fn stats_shared_with_card() {
        let json = get_json("/stats?id=2").await;
        assert_eq!(json["total"], -1);
        assert_eq!(json["categories"].to_string(), r#"{"Birthday":2}"#);
        assert_eq!(json["sources"].to_string(), r#"{"Blue Mountain":2}"#);
        assert_eq!(json["types"].to_string(), r#"{"flashEcard":1}"#);
        assert_eq!(json["titles"].to_string(), r#"{"Balloons":1}"#);
    }

    #[tokio::test]
    async fn random_redirects_to_matching_card() {
        let (status, location, _) = send(test_router(), "/random?type=flashEcard").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(location.as_deref(), Some("/?id=2"));

        let (_, location, _) = send(test_router(), "/random?type=javaEcard").await;
        assert_eq!(location.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn static_and_archive_files() {
        let (status, _, body) = send(test_router(), "/main.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("greetmaster"));

        let response = test_router()
            .oneshot(
                Request::get("/data/www.example.com/cards/0001/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
    }

    #[tokio::test]
    async fn missing_files_are_not_found() {
        for uri in [
            "/nothing.gif",
            "/data/../greetings.json",
            "/data/www.example.com",
            "/data//etc/passwd",
            "/data/%2Fetc/passwd",
        ] {
            let (status, _, body) = send(test_router(), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert!(body.contains("The requested URL does not exist."));
        }
    }

    #[tokio::test]
    async fn blocked_user_agent_is_not_found() {
        let config = Config {
            blocked_uas: vec!["BadBot".to_string()],
            ..test_config()
        };
        let response = test_router_with(config)
            .oneshot(
                Request::get("/")
                    .header(USER_AGENT, "Mozilla/5.0 (BadBot)")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_host_is_bad_request() {
        let config = Config {
            access_hosts: vec!["greetmaster.example".to_string()],
            ..test_config()
        };
        let (status, _, _) = send(test_router_with(config.clone()), "/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let response = test_router_with(config)
            .oneshot(
                Request::get("/about")
                    .header(HOST, "Greetmaster.example:8991")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
