use std::sync::OnceLock;

use regex::Regex;

use crate::codegen::escape_multiline;

static BREAK_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_CLOSE_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_OPEN_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static ENTITY_RE: OnceLock<Regex> = OnceLock::new();

/// Converts `contenteditable` markup back into the plain string stored on
/// the element. Line breaks and the start of each block become `\n`.
pub fn normalize_editable_markup(markup: &str) -> String {
    let breaks = BREAK_RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
    let closes = BLOCK_CLOSE_RE.get_or_init(|| Regex::new(r"(?i)</(div|p)>").unwrap());
    let opens = BLOCK_OPEN_RE.get_or_init(|| Regex::new(r"(?i)<(div|p)(\s[^>]*)?>").unwrap());
    let tags = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());

    let text = breaks.replace_all(markup, "\n");
    let text = closes.replace_all(&text, "");
    let text = opens.replace_all(&text, "\n");
    let text = text.replace("&nbsp;", " ").replace("&NBSP;", " ");
    let text = tags.replace_all(text.trim(), "");
    decode_entities(&text)
}

/// Markup shown inside the editable node for a stored string.
pub fn text_to_markup(text: &str) -> String {
    escape_multiline(text)
}

fn decode_entities(text: &str) -> String {
    let entities =
        ENTITY_RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());
    entities
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| name.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
