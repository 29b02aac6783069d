//! The card page rewriting pipeline.

use crate::body_style::extract_body_style;
use crate::embed::rewrite_embeds;
use crate::fields::{substitute_fields, FieldMode, GlyphContext};
use crate::links::redirect_links;

/// A decoded archived page ready to be rendered.
#[derive(Debug, Clone)]
pub struct CardPage<'a> {
    pub text: &'a str,
    /// Archive-relative path of the page, e.g. `www.example.com/cards/0001/index.html`.
    pub page_path: &'a str,
    pub card_id: &'a str,
    pub mode: FieldMode,
}

impl CardPage<'_> {
    /// Archive directory of the page, without a trailing slash.
    pub fn asset_dir(&self) -> &str {
        self.page_path
            .rsplit_once('/')
            .map_or("", |(dir, _)| dir)
    }
}

/// Rewritten body content and the `<style>` element derived from its body tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedCard {
    pub body: String,
    pub style: String,
}

/// Run every rewriting stage over an archived HTML card.
///
/// Links are relocated over the whole page first; the remaining stages only see the body.
pub fn render_html_card(page: &CardPage<'_>) -> RenderedCard {
    let relocated = redirect_links(page.text, page.page_path);
    let (body, style) = extract_body_style(&relocated);
    let body = rewrite_embeds(&body);
    let glyphs = GlyphContext {
        asset_dir: page.asset_dir(),
        card_id: page.card_id,
    };
    let body = substitute_fields(&body, &page.mode, glyphs);
    tracing::debug!(
        page_path = page.page_path,
        body_len = body.len(),
        has_style = !style.is_empty(),
        "rendered html card"
    );
    RenderedCard { body, style }
}
