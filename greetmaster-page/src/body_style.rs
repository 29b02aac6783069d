//! Translation of legacy `<body>` presentation attributes into a scoped stylesheet.

use crate::attr::attributes;
use regex::Regex;
use std::sync::OnceLock;

/// Element id the archived body content is injected into.
pub const HTML_CONTAINER_ID: &str = "greetmaster-html-container";

fn body_regex() -> &'static Regex {
    static BODY_REGEX: OnceLock<Regex> = OnceLock::new();
    BODY_REGEX.get_or_init(|| Regex::new(r"(?is)(<body.*?>)\s*(.*?)\s*</body>").unwrap())
}

/// Split a page into its body content and a `<style>` element built from the body tag.
///
/// Returns `(page, "")` unchanged when there is no `<body>…</body>` region. Otherwise
/// everything outside the body is discarded.
pub fn extract_body_style(page: &str) -> (String, String) {
    let Some(caps) = body_regex().captures(page) else {
        return (page.to_string(), String::new());
    };
    let rules = body_rules(&caps[1]);
    (caps[2].to_string(), style_element(&rules))
}

/// CSS rules equivalent to the presentation attributes of `body_tag`, in source order.
///
/// Container declarations come first as a single rule; link-state colors follow as
/// standalone rules.
pub fn body_rules(body_tag: &str) -> Vec<String> {
    let mut declarations: Vec<String> = Vec::new();
    let mut link_rules: Vec<String> = Vec::new();

    for attr in attributes(body_tag) {
        if attr.value.is_empty() {
            continue;
        }
        let value = attr.value;
        match attr.name.as_str() {
            "background" => declarations.push(format!("background-image: url({})", value)),
            "bgcolor" => declarations.push(format!("background-color: {}", hash_color(&value))),
            "text" => declarations.push(format!("color: {}", hash_color(&value))),
            "link" => link_rules.push(link_rule("link", &value)),
            "alink" => link_rules.push(link_rule("active", &value)),
            "vlink" => link_rules.push(link_rule("visited", &value)),
            "topmargin" => declarations.push(format!("margin-top: {}", pixels(&value))),
            "bottommargin" => declarations.push(format!("margin-bottom: {}", pixels(&value))),
            "leftmargin" => declarations.push(format!("margin-left: {}", pixels(&value))),
            "rightmargin" => declarations.push(format!("margin-right: {}", pixels(&value))),
            "style" => declarations.push(value.strip_suffix(';').unwrap_or(&value).to_string()),
            _ => {}
        }
    }

    let mut rules = Vec::with_capacity(link_rules.len() + 1);
    if !declarations.is_empty() {
        rules.push(format!(
            "#{} {{ {}; }}",
            HTML_CONTAINER_ID,
            declarations.join("; ")
        ));
    }
    rules.extend(link_rules);
    rules
}

/// `<style>` element holding `rules`, or an empty string when there are none.
pub fn style_element(rules: &[String]) -> String {
    if rules.is_empty() {
        return String::new();
    }
    let body: Vec<String> = rules.iter().map(|r| format!("\t{}", r)).collect();
    format!("<style>\n{}\n</style>", body.join("\n"))
}

fn link_rule(state: &str, value: &str) -> String {
    format!(
        "#{} a:{} {{ color: {}; }}",
        HTML_CONTAINER_ID,
        state,
        hash_color(value)
    )
}

// Legacy pages often omit the hash on hex colors. Named colors get one too (`#red`), which
// browsers ignore; archived pages rendered the same way.
fn hash_color(value: &str) -> String {
    if value.starts_with('#') {
        value.to_string()
    } else {
        format!("#{}", value)
    }
}

fn pixels(value: &str) -> String {
    if value.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{}px", value)
    } else {
        value.to_string()
    }
}
