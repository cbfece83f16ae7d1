use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BuilderError, BuilderResult};
use crate::variables::VariableKind;

const EMBEDDED_CONFIG: &str = include_str!("../assets/page-builder.json");

/// One variable as declared in the configuration source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableConfig {
    pub path: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub example: String,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

/// The catalog shape consumed by the engine: categories in declaration order
/// plus the mock value tree used for preview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default, with = "ordered")]
    pub variable_categories: Vec<(String, CategoryConfig)>,
    #[serde(default)]
    pub mock_data: Value,
}

impl CatalogConfig {
    pub fn from_json(source: &str) -> BuilderResult<Self> {
        serde_json::from_str(source).map_err(|e| BuilderError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub upload_url: String,
    pub debounce_ms: u64,
    pub autocomplete_limit: usize,
    pub hint_limit: usize,
    /// Sent as `X-CSRF-TOKEN` with uploads when present.
    pub csrf_token: Option<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            upload_url: "/api/pages/upload-image".to_string(),
            debounce_ms: 500,
            autocomplete_limit: 10,
            hint_limit: 5,
            csrf_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(flatten)]
    catalog: CatalogConfig,
    #[serde(default)]
    editor: EditorOptions,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuilderConfig {
    pub catalog: CatalogConfig,
    pub editor: EditorOptions,
}

impl BuilderConfig {
    pub fn from_json(source: &str) -> BuilderResult<Self> {
        let raw: RawConfig =
            serde_json::from_str(source).map_err(|e| BuilderError::Config(e.to_string()))?;
        Ok(Self {
            catalog: raw.catalog,
            editor: raw.editor,
        })
    }

    /// Configuration bundled with the crate.
    pub fn embedded() -> BuilderResult<Self> {
        Self::from_json(EMBEDDED_CONFIG)
    }
}

/// (De)serializes a JSON object as an ordered list of entries.
pub(crate) mod ordered {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, V)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedded_config_parses() {
        let config = BuilderConfig::embedded().unwrap();
        let keys: Vec<&str> = config
            .catalog
            .variable_categories
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["invoice", "user", "client", "bankInfo"]);
        assert_eq!(config.editor, EditorOptions::default());
        assert_eq!(config.catalog.mock_data["invoice"]["total"], 1625.0);
    }

    #[test]
    fn test_category_order_follows_source() {
        let json = r#"{
            "variable_categories": {
                "zeta": { "label": "Z", "variables": [] },
                "alpha": { "variables": [] }
            }
        }"#;
        let config = CatalogConfig::from_json(json).unwrap();
        assert_eq!(config.variable_categories[0].0, "zeta");
        assert_eq!(config.variable_categories[1].0, "alpha");
        assert_eq!(config.variable_categories[1].1.label, None);
        assert_eq!(config.mock_data, Value::Null);
    }

    #[test]
    fn test_editor_section_is_optional() {
        let config = BuilderConfig::from_json(r#"{"editor": {"debounce_ms": 250}}"#).unwrap();
        assert_eq!(config.editor.debounce_ms, 250);
        assert_eq!(config.editor.upload_url, "/api/pages/upload-image");
        assert!(config.catalog.variable_categories.is_empty());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = BuilderConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, BuilderError::Config(_)));
    }
}
