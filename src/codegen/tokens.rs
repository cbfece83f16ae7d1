use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::variables::interpolate;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\(\(([a-zA-Z_][a-zA-Z0-9_.]*)\)\)").unwrap())
}

/// Escapes text for use in markup and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escaped text with newlines shown as `<br>`.
pub fn escape_multiline(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Publish form: literal text is escaped, each token becomes `{{ $a->b }}`.
pub fn translate_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in token_re().captures_iter(text) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&escape_html(&text[last..whole.start()]));
        match interpolate(path.as_str()) {
            Ok(expr) => out.push_str(&expr),
            Err(_) => out.push_str(&escape_html(whole.as_str())),
        }
        last = whole.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// Replaces each token with `resolve(path)`, leaving unresolved tokens as written.
/// The result is not escaped.
pub fn resolve_tokens<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    token_re()
        .replace_all(text, |caps: &Captures| {
            caps.get(1)
                .and_then(|path| resolve(path.as_str()))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
