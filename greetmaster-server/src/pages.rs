//! HTML pages: home, about and individual cards.

use crate::error::{ServerError, ServerResult};
use crate::index::{select_media, type_name, Greeting};
use crate::params::QueryParams;
use crate::state::{AppState, SharedState};
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use greetmaster_page::{
    build_html, commented_html_body, decode_page, render_html_card, CardMedia, CardPage,
    FieldMode, TemplateVars,
};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

const SITE_NAME: &str = "Greetmaster";
const NOINDEX: &str = r#"<meta name="robots" content="noindex">"#;
const MAIN_JS: &str = r#"<script src="/main.js" defer></script>"#;
const SEARCH_MAX_CHARS: usize = 64;
/// Query parameter carrying encoded field values.
const FIELD_DATA_PARAM: &str = "data";

pub async fn home(
    State(state): State<SharedState>,
    uri: Uri,
    headers: HeaderMap,
) -> ServerResult<Response> {
    render_shell(&state, &uri, &headers, Section::Home).await
}

pub async fn about(
    State(state): State<SharedState>,
    uri: Uri,
    headers: HeaderMap,
) -> ServerResult<Response> {
    render_shell(&state, &uri, &headers, Section::About).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Home,
    About,
}

/// Card content for the shell: greeting markup plus the card's stylesheet.
struct CardContent {
    title: String,
    content: String,
    style: String,
}

async fn render_shell(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    section: Section,
) -> ServerResult<Response> {
    let params = QueryParams::from_uri(uri);
    let origin = origin(headers);
    let embed = params.get("embed") == Some("true");

    let mut title = SITE_NAME.to_string();
    let mut namespace = "home";
    let mut noindex = true;
    let mut main_js = Some(MAIN_JS);
    let mut style = String::new();
    let mut content = String::new();

    if section == Section::About {
        title = format!("About {}", SITE_NAME);
        namespace = "about";
        content = state.templates.about.clone();
    } else if let Some(id) = params.get("id") {
        let greeting = state.greetings.valid(id).ok_or(ServerError::BadRequest)?;
        let card = render_card(state, id, greeting, &params, embed).await?;
        title = card.title;
        content = card.content;
        style = card.style;
        namespace = "greeting";
        noindex = false;
        if embed {
            main_js = None;
        }
    }
    if params.is_empty() {
        noindex = false;
    }

    if !embed || namespace != "greeting" {
        let search = if namespace == "home" {
            let query: String = params
                .get("search")
                .unwrap_or("")
                .chars()
                .take(SEARCH_MAX_CHARS)
                .collect();
            html_escape::encode_quoted_attribute(&query).into_owned()
        } else {
            String::new()
        };
        let nav_vars = TemplateVars::new()
            .with("SEARCH", search)
            .with("CONTENT", content);
        content = build_html(&state.templates.main_navigation, &nav_vars);
    }

    let vars = TemplateVars::new()
        .with("OGTITLE", html_escape::encode_quoted_attribute(&title).into_owned())
        .with("TITLE", title)
        .with("OGIMAGE", format!("{}/logo.png", origin))
        .with("OGURL", format!("{}{}", origin, uri))
        .with("NOINDEX", noindex.then_some(NOINDEX))
        .with("NAMESPACE", namespace)
        .with("MAINJS", main_js)
        .with("STYLE", style)
        .with("CONTENT", content);
    Ok(html_response(build_html(&state.templates.main, &vars)))
}

async fn render_card(
    state: &AppState,
    id: &str,
    greeting: &Greeting,
    params: &QueryParams,
    embed: bool,
) -> ServerResult<CardContent> {
    let title = if embed {
        format!("E-Card at {}", SITE_NAME)
    } else {
        let kind = type_name(&greeting.kind).unwrap_or_default();
        let title = format!("{} at {}", kind, SITE_NAME);
        match greeting.display_title() {
            Some(card_title) => format!("{} - {}", card_title, title),
            None => title,
        }
    };

    let media = select_media(greeting, &state.files)?;
    let mut style = String::new();
    let body = match &media {
        CardMedia::Html { page_path } => {
            let text = read_page(state, page_path).await?;
            let card = render_html_card(&CardPage {
                text: &text,
                page_path,
                card_id: id,
                mode: FieldMode::from_param(params.get(FIELD_DATA_PARAM)),
            });
            style = card.style;
            commented_html_body(&card.body)
        }
        other => other.body().unwrap_or_default(),
    };

    let links = if embed {
        String::new()
    } else {
        download_links(greeting)
    };
    let vars = TemplateVars::new()
        .with("STYLE", media.container_class())
        .with("TYPE", greeting.kind.as_str())
        .with("BODY", body)
        .with("LINKS", links);
    let template = if embed {
        &state.templates.greeting_embed
    } else {
        &state.templates.greeting
    };

    Ok(CardContent {
        title,
        content: build_html(template, &vars),
        style,
    })
}

async fn read_page(state: &AppState, page_path: &str) -> ServerResult<String> {
    let bytes = tokio::fs::read(state.config.data_dir.join(page_path)).await?;
    let encoding = state
        .files
        .get(page_path)
        .and_then(|info| info.encoding.as_deref());
    Ok(decode_page(&bytes, encoding)?)
}

/// Footer download links for screensaver and wallpaper previews.
pub fn download_links(greeting: &Greeting) -> String {
    let find = |suffix: &str| {
        greeting
            .files
            .iter()
            .find(|f| f.ends_with(suffix))
            .map(String::as_str)
    };

    let links: Vec<String> = match greeting.kind.as_str() {
        "screensaverPreview" => [("Windows", find(".exe")), ("MacOS", find(".zip"))]
            .into_iter()
            .filter_map(|(label, path)| {
                path.map(|path| {
                    format!(
                        r#"<a class="greetmaster-greeting-footer-button" href="/data/{}">{}</a>"#,
                        path, label
                    )
                })
            })
            .collect(),
        "wallpaperPreview" => [
            ("640x480", find("640x480.jpg").or_else(|| find("640x480.gif"))),
            ("800x600", find("800x600.jpg").or_else(|| find("800x600.gif"))),
            ("1024x768", find("1024x768.jpg").or_else(|| find("1024x768.gif"))),
            ("1280x1024", find("1280x1024.jpg")),
        ]
        .into_iter()
        .filter_map(|(size, path)| {
            path.map(|path| {
                format!(
                    r#"<a class="greetmaster-greeting-footer-button" href="/data/{}" target="_blank">{}</a>"#,
                    path, size
                )
            })
        })
        .collect(),
        _ => Vec::new(),
    };

    if links.is_empty() {
        return String::new();
    }
    format!(
        "<div class=\"greetmaster-greeting-footer-section\">Downloads:</div>&nbsp;\n{}",
        links.join(",&nbsp;\n")
    )
}

fn origin(headers: &HeaderMap) -> String {
    match headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}", host),
        None => String::new(),
    }
}

pub fn html_response(html: String) -> Response {
    ([(CONTENT_TYPE, HTML_CONTENT_TYPE)], html).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn preview(kind: &str, files: &[&str]) -> Greeting {
        Greeting {
            kind: kind.to_string(),
            available: true,
            files: files.iter().map(|f| f.to_string()).collect(),
            ..Greeting::default()
        }
    }

    #[test]
    fn screensaver_links() {
        let greeting = preview("screensaverPreview", &["s/saver.zip", "s/saver.exe"]);
        assert_eq!(
            download_links(&greeting),
            concat!(
                "<div class=\"greetmaster-greeting-footer-section\">Downloads:</div>&nbsp;\n",
                "<a class=\"greetmaster-greeting-footer-button\" href=\"/data/s/saver.exe\">Windows</a>,&nbsp;\n",
                "<a class=\"greetmaster-greeting-footer-button\" href=\"/data/s/saver.zip\">MacOS</a>"
            )
        );
    }

    #[test]
    fn wallpaper_links_prefer_jpg() {
        let greeting = preview(
            "wallpaperPreview",
            &["w/800x600.gif", "w/800x600.jpg", "w/640x480.gif", "w/1280x1024.gif"],
        );
        let links = download_links(&greeting);
        assert!(links.contains(r#"href="/data/w/640x480.gif" target="_blank">640x480</a>"#));
        assert!(links.contains(r#"href="/data/w/800x600.jpg" target="_blank">800x600</a>"#));
        assert!(!links.contains("1024x768"));
        assert!(!links.contains("1280x1024"));
    }

    #[test]
    fn other_types_have_no_links() {
        let greeting = preview("htmlEcard", &["a/setup.exe"]);
        assert_eq!(download_links(&greeting), "");
        let empty = preview("screensaverPreview", &["a/readme.txt"]);
        assert_eq!(download_links(&empty), "");
    }
}
