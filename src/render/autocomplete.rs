use std::sync::OnceLock;

use regex::Regex;

use crate::variables::{Variable, VariableCatalog};

static TRIGGER_RE: OnceLock<Regex> = OnceLock::new();

fn trigger_re() -> &'static Regex {
    TRIGGER_RE.get_or_init(|| Regex::new(r"\(\(([a-zA-Z0-9_.]*)$").unwrap())
}

/// Keys the suggestion list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocompleteKey {
    Down,
    Up,
    Accept,
    Dismiss,
}

impl AutocompleteKey {
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowDown" => Some(AutocompleteKey::Down),
            "ArrowUp" => Some(AutocompleteKey::Up),
            "Enter" | "Tab" => Some(AutocompleteKey::Accept),
            "Escape" => Some(AutocompleteKey::Dismiss),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub path: String,
    pub display_name: String,
    pub category_label: String,
}

impl From<&Variable> for Suggestion {
    fn from(variable: &Variable) -> Self {
        Self {
            path: variable.path.clone(),
            display_name: variable.display_name.clone(),
            category_label: variable.category_label.clone(),
        }
    }
}

/// Text after accepting a suggestion, with the caret placed after the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub caret: usize,
}

/// Open suggestion list for one editable node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutocompleteState {
    matches: Vec<Suggestion>,
    highlighted: usize,
}

/// Outcome of a key press while the list is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Highlight moved; the caller should swallow the key.
    Moved,
    Accepted(Suggestion),
    Closed,
    /// List is closed or the key is not handled.
    Ignored,
}

impl AutocompleteState {
    pub fn is_open(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn matches(&self) -> &[Suggestion] {
        &self.matches
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn close(&mut self) {
        self.matches.clear();
        self.highlighted = 0;
    }

    /// Re-evaluates the list after an input event. `caret` counts characters,
    /// with each line break counted once.
    pub fn update(&mut self, text: &str, caret: usize, catalog: &VariableCatalog, limit: usize) {
        self.highlighted = 0;
        self.matches = match trigger_query(text, caret) {
            Some(query) => catalog
                .suggest(query, limit)
                .into_iter()
                .map(Suggestion::from)
                .collect(),
            None => Vec::new(),
        };
    }

    pub fn handle_key(&mut self, key: AutocompleteKey) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            AutocompleteKey::Down => {
                self.highlighted = (self.highlighted + 1).min(self.matches.len() - 1);
                KeyOutcome::Moved
            }
            AutocompleteKey::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
                KeyOutcome::Moved
            }
            AutocompleteKey::Accept => match self.matches.get(self.highlighted).cloned() {
                Some(suggestion) => {
                    self.close();
                    KeyOutcome::Accepted(suggestion)
                }
                None => KeyOutcome::Ignored,
            },
            AutocompleteKey::Dismiss => {
                self.close();
                KeyOutcome::Closed
            }
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

/// Partial path typed after `((` right before the caret.
pub fn trigger_query(text: &str, caret: usize) -> Option<&str> {
    let before = &text[..byte_offset(text, caret)];
    trigger_re()
        .captures(before)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Replaces the `((partial` span before the caret with `((path))`.
pub fn accept(text: &str, caret: usize, path: &str) -> Option<Completion> {
    let split = byte_offset(text, caret);
    let (before, after) = text.split_at(split);
    let trigger = trigger_re().find(before)?;
    let token = format!("(({}))", path);
    let head = &before[..trigger.start()];
    Some(Completion {
        caret: head.chars().count() + token.chars().count(),
        text: format!("{}{}{}", head, token, after),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use pretty_assertions::assert_eq;

    fn small_catalog() -> VariableCatalog {
        let config = CatalogConfig::from_json(
            r#"{
                "variable_categories": {
                    "invoice": {"label": "Invoice", "variables": [
                        {"path": "invoice.invoice_no", "displayName": "Invoice Number"},
                        {"path": "invoice.total", "displayName": "Total", "type": "currency"}
                    ]},
                    "client": {"label": "Client", "variables": [
                        {"path": "client.name", "displayName": "Client Name"}
                    ]}
                }
            }"#,
        )
        .unwrap();
        VariableCatalog::from_config(&config)
    }

    #[test]
    fn test_trigger_opens_on_double_paren() {
        let catalog = small_catalog();
        let mut state = AutocompleteState::default();
        state.update("Hello ((inv", 11, &catalog, 10);
        let paths: Vec<&str> = state.matches().iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["invoice.invoice_no", "invoice.total"]);

        state.update("Hello (inv", 10, &catalog, 10);
        assert!(!state.is_open());
    }

    #[test]
    fn test_trigger_only_looks_before_caret() {
        assert_eq!(trigger_query("((cli rest", 5), Some("cli"));
        assert_eq!(trigger_query("((cli rest", 6), None);
        assert_eq!(trigger_query("é((a", 4), Some("a"));
    }

    #[test]
    fn test_keys_clamp_and_accept() {
        let catalog = small_catalog();
        let mut state = AutocompleteState::default();
        state.update("((", 2, &catalog, 10);
        assert_eq!(state.matches().len(), 3);
        assert_eq!(state.handle_key(AutocompleteKey::Up), KeyOutcome::Moved);
        assert_eq!(state.highlighted(), 0);
        for _ in 0..5 {
            state.handle_key(AutocompleteKey::Down);
        }
        assert_eq!(state.highlighted(), 2);
        match state.handle_key(AutocompleteKey::Accept) {
            KeyOutcome::Accepted(s) => assert_eq!(s.path, "client.name"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!state.is_open());
        assert_eq!(state.handle_key(AutocompleteKey::Down), KeyOutcome::Ignored);
    }

    #[test]
    fn test_accept_places_caret_after_token() {
        let done = accept("Dear ((cl and more", 9, "client.name").unwrap();
        assert_eq!(done.text, "Dear ((client.name)) and more");
        assert_eq!(done.caret, 20);
        assert_eq!(accept("no trigger", 4, "client.name"), None);
    }

    #[test]
    fn test_accept_counts_line_breaks_once() {
        let done = accept("a\n((us", 6, "user.name").unwrap();
        assert_eq!(done.text, "a\n((user.name))");
        assert_eq!(done.caret, 15);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(AutocompleteKey::from_key_name("Tab"), Some(AutocompleteKey::Accept));
        assert_eq!(AutocompleteKey::from_key_name("a"), None);
    }
}
