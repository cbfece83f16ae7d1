use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::config::ordered;
use crate::element::ElementType;
use crate::variables::stringify;

/// Ordered style map. Empty values mean "unset" and are skipped on output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key` when present and non-empty.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn value_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.value(key).unwrap_or(fallback)
    }

    /// Overwrites in place, or appends a new key at the end.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the map without the given keys.
    pub fn without(&self, keys: &[&str]) -> StyleMap {
        StyleMap(
            self.0
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .cloned()
                .collect(),
        )
    }

    /// Non-empty values for `keys`, in the order given.
    pub fn pick(&self, keys: &[&str]) -> StyleMap {
        StyleMap(
            keys.iter()
                .filter_map(|k| self.value(k).map(|v| (k.to_string(), v.to_string())))
                .collect(),
        )
    }

    /// `key: value` pairs joined with `; `, empty values dropped.
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StyleMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

impl Serialize for StyleMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered::serialize(&self.0, serializer)
    }
}

/// Accepts an object, or an empty list as written by PHP for an empty array.
impl<'de> Deserialize<'de> for StyleMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(StyleMap(
                map.into_iter()
                    .map(|(k, v)| (k, stringify(&v)))
                    .collect(),
            )),
            _ => Ok(StyleMap::new()),
        }
    }
}

fn base_styles() -> StyleMap {
    StyleMap::from_iter([
        ("margin", "0"),
        ("padding", "10px"),
        ("text-align", "left"),
        ("font-size", ""),
        ("color", "#000000"),
        ("background-color", ""),
        ("width", ""),
        ("height", ""),
        ("border-radius", "0"),
        ("font-weight", "normal"),
    ])
}

/// Fresh default style map for a newly created element.
pub fn defaults_for(kind: ElementType) -> StyleMap {
    let mut styles = base_styles();
    let overrides: &[(&str, &str)] = match kind {
        ElementType::Text => &[
            ("font-size", "14px"),
            ("padding", "10px"),
            ("margin", "0 0 10px 0"),
        ],
        ElementType::Heading => &[
            ("font-size", "24px"),
            ("font-weight", "bold"),
            ("padding", "10px"),
            ("margin", "0 0 15px 0"),
        ],
        ElementType::Image => &[
            ("width", "100%"),
            ("max-width", "100%"),
            ("height", "auto"),
            ("margin", "0 0 15px 0"),
            ("padding", "0"),
        ],
        ElementType::Button => &[
            ("background-color", "#3b82f6"),
            ("color", "#ffffff"),
            ("padding", "10px 20px"),
            ("border-radius", "4px"),
            ("font-size", "14px"),
            ("margin", "0 0 10px 0"),
            ("text-align", "center"),
            ("width", "150px"),
            ("height", "40px"),
        ],
        _ => &[],
    };
    for (key, value) in overrides {
        styles.set(*key, *value);
    }
    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_css_skips_empty_values() {
        let styles = StyleMap::from_iter([("margin", "0"), ("color", ""), ("padding", "4px")]);
        assert_eq!(styles.to_css(), "margin: 0; padding: 4px");
        assert_eq!(StyleMap::new().to_css(), "");
    }

    #[test]
    fn test_defaults_keep_base_order() {
        let text = defaults_for(ElementType::Text);
        assert_eq!(
            text.to_css(),
            "margin: 0 0 10px 0; padding: 10px; text-align: left; font-size: 14px; \
             color: #000000; border-radius: 0; font-weight: normal"
        );

        let image = defaults_for(ElementType::Image);
        let keys: Vec<&str> = image.iter().map(|(k, _)| k).collect();
        assert_eq!(keys.last(), Some(&"max-width"));
        assert_eq!(image.get("width"), Some("100%"));
    }

    #[test]
    fn test_defaults_are_independent_copies() {
        let mut first = defaults_for(ElementType::Button);
        first.set("width", "300px");
        let second = defaults_for(ElementType::Button);
        assert_eq!(second.get("width"), Some("150px"));
    }

    #[test]
    fn test_other_types_use_base_styles() {
        assert_eq!(defaults_for(ElementType::Loop), base_styles());
        assert_eq!(defaults_for(ElementType::InvoiceTotals).len(), 10);
    }

    #[test]
    fn test_set_keeps_position() {
        let mut styles = StyleMap::from_iter([("a", "1"), ("b", "2")]);
        styles.set("a", "3");
        styles.set("c", "4");
        assert_eq!(styles.to_css(), "a: 3; b: 2; c: 4");
        assert_eq!(styles.remove("b"), Some("2".to_string()));
        assert!(!styles.contains("b"));
    }

    #[test]
    fn test_pick_and_without() {
        let styles = StyleMap::from_iter([("color", "red"), ("width", ""), ("gap", "8px")]);
        assert_eq!(styles.pick(&["gap", "width", "color"]).to_css(), "gap: 8px; color: red");
        assert_eq!(styles.without(&["gap"]).to_css(), "color: red");
    }

    #[test]
    fn test_serde_preserves_order_and_tolerates_nulls() {
        let styles: StyleMap =
            serde_json::from_str(r#"{"z-index": 3, "color": null, "margin": "0"}"#).unwrap();
        assert_eq!(styles.get("z-index"), Some("3"));
        assert_eq!(styles.get("color"), Some(""));
        assert_eq!(
            serde_json::to_string(&styles).unwrap(),
            r#"{"z-index":"3","color":"","margin":"0"}"#
        );
        let empty: StyleMap = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }
}
