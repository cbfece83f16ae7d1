use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CatalogConfig;
use crate::error::{BuilderError, BuilderResult};

/// Semantic type of a catalog variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Text,
    Date,
    Currency,
    Array,
}

/// A catalog entry tagged with its owning category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub path: String,
    pub display_name: String,
    pub example: String,
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub description: String,
    pub category: String,
    pub category_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub key: String,
    pub label: String,
}

/// Read-only registry of dot-path variables plus the mock value tree.
#[derive(Debug, Clone, Default)]
pub struct VariableCatalog {
    categories: Vec<Category>,
    variables: Vec<Variable>,
    mock_data: Value,
}

impl VariableCatalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        let mut categories = Vec::with_capacity(config.variable_categories.len());
        let mut variables = Vec::new();

        for (key, category) in &config.variable_categories {
            let label = category.label.clone().unwrap_or_else(|| key.clone());
            for var in &category.variables {
                variables.push(Variable {
                    path: var.path.clone(),
                    display_name: var.display_name.clone(),
                    example: var.example.clone(),
                    kind: var.kind,
                    description: var.description.clone(),
                    category: key.clone(),
                    category_label: label.clone(),
                });
            }
            categories.push(Category {
                key: key.clone(),
                label,
            });
        }

        Self {
            categories,
            variables,
            mock_data: config.mock_data.clone(),
        }
    }

    /// Every variable, category order first then declaration order.
    pub fn all_variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn by_path(&self, path: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.path == path)
    }

    pub fn array_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .filter(|v| v.kind == VariableKind::Array)
    }

    pub fn mock_data(&self) -> &Value {
        &self.mock_data
    }

    /// Walks the mock tree along a dot path.
    pub fn lookup_mock(&self, path: &str) -> Option<&Value> {
        walk(&self.mock_data, path)
    }

    /// Preview value for a catalog path, formatted by its declared type.
    ///
    /// `None` when the path is not in the catalog or has no mock value.
    pub fn resolve_preview(&self, path: &str) -> Option<String> {
        let variable = self.by_path(path)?;
        let value = self.lookup_mock(path)?;
        Some(format_value(value, variable.kind))
    }

    /// Variables whose path or display name contains `query`, ignoring case.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&Variable> {
        let needle = query.to_lowercase();
        self.variables
            .iter()
            .filter(|v| {
                v.path.to_lowercase().contains(&needle)
                    || v.display_name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }

    /// Short listing shown next to text inputs.
    pub fn hint(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .variables
            .iter()
            .take(limit)
            .map(|v| format!("(({})) - {}", v.path, v.display_name))
            .collect();
        if self.variables.len() > limit {
            lines.push(format!(
                "... and {} more variables",
                self.variables.len() - limit
            ));
        }
        lines
    }
}

/// Converts `a.b.c` into `$a->b->c`.
pub fn path_to_template_expr(path: &str) -> BuilderResult<String> {
    if path.is_empty() {
        return Err(BuilderError::EmptyVariablePath);
    }
    let mut segments = path.split('.');
    let mut expr = String::from("$");
    expr.push_str(segments.next().unwrap_or_default());
    for segment in segments {
        expr.push_str("->");
        expr.push_str(segment);
    }
    Ok(expr)
}

/// Converts `a.b` into `{{ $a->b }}`.
pub fn interpolate(path: &str) -> BuilderResult<String> {
    Ok(format!("{{{{ {} }}}}", path_to_template_expr(path)?))
}

pub(crate) fn walk<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |value, part| match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

pub fn format_value(value: &Value, kind: VariableKind) -> String {
    if kind == VariableKind::Currency {
        if let Some(amount) = as_number(value) {
            return format!("${:.2}", amount);
        }
    }
    stringify(value)
}

pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Plain text form of a JSON value.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
