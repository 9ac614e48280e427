//! Who a scanned stream belongs to.

use crate::patterns::catalog::CONTENTS;
use std::fmt;

/// The object a byte buffer was taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOwner {
    /// A node of the PDF object tree
    Node {
        /// Display label, e.g. `/Contents(12)`
        label: String,
        /// Semantic type tag, e.g. `/Contents` or `/XObject`
        node_type: String,
    },
    /// An embedded font program
    Font {
        /// Display label, e.g. the font's base name
        label: String,
    },
}

impl StreamOwner {
    /// Creates a tree node owner
    pub fn node(label: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::Node {
            label: label.into(),
            node_type: node_type.into(),
        }
    }

    /// Creates a font owner
    pub fn font(label: impl Into<String>) -> Self {
        Self::Font {
            label: label.into(),
        }
    }

    /// Display label
    pub fn label(&self) -> &str {
        match self {
            StreamOwner::Node { label, .. } | StreamOwner::Font { label } => label,
        }
    }

    /// Semantic type tag; fonts have none
    pub fn node_type(&self) -> Option<&str> {
        match self {
            StreamOwner::Node { node_type, .. } => Some(node_type),
            StreamOwner::Font { .. } => None,
        }
    }

    /// True for page content streams
    pub fn is_contents(&self) -> bool {
        self.node_type() == Some(CONTENTS)
    }
}

impl fmt::Display for StreamOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_accessors() {
        let node = StreamOwner::node("/Contents(7)", "/Contents");
        assert_eq!(node.label(), "/Contents(7)");
        assert!(node.is_contents());

        let font = StreamOwner::font("Helvetica");
        assert_eq!(font.node_type(), None);
        assert!(!font.is_contents());
        assert_eq!(font.to_string(), "Helvetica");
    }
}
