//! # Greetmaster page rewriting
//!
//! Turns archived e-card pages into fragments that can be served inside the Greetmaster
//! page shell.
//!
//! ## Features
//! - Relocation of relative links into the archive's `/data/` tree
//! - Legacy `<body>` attributes converted to a scoped stylesheet
//! - Background MIDI tags folded into a single player placeholder
//! - Editable `[Field]` tokens for authoring and rendering personalized cards
//! - Indentation-aware `{NAME}` template substitution
//!
//! ## Example
//! ```ignore
//! use greetmaster_page::{render_html_card, CardPage, FieldMode};
//!
//! let page = CardPage {
//!     text: r#"<body bgcolor="ffffff"><img src="hello.gif"> Dear [Name]</body>"#,
//!     page_path: "www.example.com/cards/0001/index.html",
//!     card_id: "0001",
//!     mode: FieldMode::from_param(None),
//! };
//! let card = render_html_card(&page);
//! ```

pub mod attr;
pub mod body_style;
pub mod decode;
pub mod edit;
pub mod embed;
pub mod error;
pub mod fields;
pub mod links;
pub mod pipeline;
pub mod placeholder;
pub mod template;

pub use attr::{attributes, trim_value, Attribute};
pub use body_style::extract_body_style;
pub use decode::decode_page;
pub use edit::{apply_edits, Edit};
pub use embed::{find_embed, rewrite_embeds, EmbedInfo};
pub use error::{PageError, PageResult};
pub use fields::{substitute_fields, FieldMode, FieldValues, GlyphContext};
pub use links::redirect_links;
pub use pipeline::{render_html_card, CardPage, RenderedCard};
pub use placeholder::{commented_html_body, CardMedia};
pub use template::{build_html, TemplateValue, TemplateVars};
