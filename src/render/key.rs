use std::fmt;

/// Address of a rendered node: a top-level index, or a slot inside a layout column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructuralKey {
    TopLevel(usize),
    Nested {
        layout: usize,
        column: usize,
        element: usize,
    },
}

impl StructuralKey {
    pub fn nested(layout: usize, column: usize, element: usize) -> Self {
        StructuralKey::Nested {
            layout,
            column,
            element,
        }
    }

    /// Top-level index that owns this key.
    pub fn root(self) -> usize {
        match self {
            StructuralKey::TopLevel(index) => index,
            StructuralKey::Nested { layout, .. } => layout,
        }
    }

    /// Owning layout and column for nested keys.
    pub fn parent(self) -> Option<(usize, usize)> {
        match self {
            StructuralKey::TopLevel(_) => None,
            StructuralKey::Nested { layout, column, .. } => Some((layout, column)),
        }
    }

    /// Position among siblings.
    pub fn position(self) -> usize {
        match self {
            StructuralKey::TopLevel(index) => index,
            StructuralKey::Nested { element, .. } => element,
        }
    }

    pub fn is_nested(self) -> bool {
        matches!(self, StructuralKey::Nested { .. })
    }

    /// Whether both keys live in the same sibling list.
    pub fn is_sibling_of(self, other: StructuralKey) -> bool {
        self.parent() == other.parent()
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralKey::TopLevel(index) => write!(f, "{}", index),
            StructuralKey::Nested {
                layout,
                column,
                element,
            } => write!(f, "{}-{}-{}", layout, column, element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keys_order_by_position() {
        let mut keys = vec![
            StructuralKey::nested(1, 0, 2),
            StructuralKey::TopLevel(3),
            StructuralKey::nested(1, 0, 0),
            StructuralKey::TopLevel(0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                StructuralKey::TopLevel(0),
                StructuralKey::TopLevel(3),
                StructuralKey::nested(1, 0, 0),
                StructuralKey::nested(1, 0, 2),
            ]
        );
    }

    #[test]
    fn test_parent_and_siblings() {
        let key = StructuralKey::nested(2, 1, 4);
        assert_eq!(key.parent(), Some((2, 1)));
        assert_eq!(key.root(), 2);
        assert_eq!(key.position(), 4);
        assert!(key.is_sibling_of(StructuralKey::nested(2, 1, 0)));
        assert!(!key.is_sibling_of(StructuralKey::nested(2, 0, 4)));
        assert!(StructuralKey::TopLevel(0).is_sibling_of(StructuralKey::TopLevel(9)));
        assert_eq!(key.to_string(), "2-1-4");
    }
}
