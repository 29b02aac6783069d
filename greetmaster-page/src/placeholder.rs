//! Container classes and body markup for each kind of card media.

use crate::links::DATA_PREFIX;

pub const FLASH_PLACEHOLDER_ID: &str = "greetmaster-flash-placeholder";
pub const EMU_PLACEHOLDER_ID: &str = "greetmaster-emu-placeholder";
pub const UNSUPPORTED_MESSAGE: &str = "Unfortunately, this e-card is currently not supported.";

/// The single piece of media a card page displays.
#[derive(Debug, Clone, PartialEq)]
pub enum CardMedia {
    /// An archived HTML page, rendered through the rewriting pipeline.
    Html { page_path: String },
    Flash {
        src: String,
        width: f64,
        height: f64,
        protected: bool,
    },
    Image {
        src: String,
    },
    /// A Shockwave or executable preview, run by the client-side emulator.
    Emulated {
        src: String,
    },
    Unsupported,
}

impl CardMedia {
    /// Class of the element the card body is placed in.
    pub fn container_class(&self) -> &'static str {
        match self {
            CardMedia::Html { .. } => "greetmaster-html-container",
            CardMedia::Flash { .. } => "greetmaster-flash-container",
            CardMedia::Image { .. } => "greetmaster-image-container",
            CardMedia::Emulated { .. } => "greetmaster-emu-container",
            CardMedia::Unsupported => "greetmaster-unsupported-container",
        }
    }

    /// Placeholder markup for non-HTML media. `Html` bodies come from the pipeline and
    /// yield `None` here.
    pub fn body(&self) -> Option<String> {
        let body = match self {
            CardMedia::Html { .. } => return None,
            CardMedia::Flash {
                src,
                width,
                height,
                protected,
            } => format!(
                r#"<div id="{}" data-src="{}" data-width="{}" data-height="{}" data-protected="{}"></div>"#,
                FLASH_PLACEHOLDER_ID,
                data_url(src),
                width,
                height,
                protected
            ),
            CardMedia::Image { src } => format!(r#"<img src="{}">"#, data_url(src)),
            CardMedia::Emulated { src } => format!(
                r#"<div id="{}" data-src="{}"></div>"#,
                EMU_PLACEHOLDER_ID,
                data_url(src)
            ),
            CardMedia::Unsupported => UNSUPPORTED_MESSAGE.to_string(),
        };
        Some(body)
    }
}

fn data_url(src: &str) -> String {
    let escaped = html_escape::encode_double_quoted_attribute(src);
    format!("{}{}", DATA_PREFIX, escaped.trim_start_matches('/'))
}

/// Wrap a rendered HTML body in a comment so the client can inject it after hydration.
///
/// Comment delimiters inside the body are entity-escaped so they cannot close the wrapper.
pub fn commented_html_body(body: &str) -> String {
    format!(
        "<!--{}-->",
        body.replace("<!--", "&lt;!--").replace("-->", "--&gt;")
    )
}
