//! Vault item categories.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of vault entity a rule or item belongs to.
///
/// Every rule list and every item lookup is scoped to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    File,
    Folder,
    Tag,
    Property,
}

impl Category {
    /// All categories in stable declaration order.
    pub const ALL: [Category; 4] = [
        Category::File,
        Category::Folder,
        Category::Tag,
        Category::Property,
    ];

    /// Stable string id used by persistence and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
            Self::Tag => "tag",
            Self::Property => "property",
        }
    }

    /// Parses a persisted category id.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "file" => Some(Self::File),
            "folder" => Some(Self::Folder),
            "tag" => Some(Self::Tag),
            "property" => Some(Self::Property),
            _ => None,
        }
    }

    /// Contextual icon shown when neither the item nor a rule supplies one.
    pub fn default_icon(self) -> &'static str {
        match self {
            Self::File => "lucide-file",
            Self::Folder => "lucide-folder",
            Self::Tag => "lucide-tag",
            Self::Property => "lucide-text",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default icon for a property, keyed by its declared property type.
///
/// Unknown or missing types fall back to the category default.
pub fn property_type_icon(property_type: Option<&str>) -> &'static str {
    match property_type.map(str::trim) {
        Some("text") => "lucide-text",
        Some("multitext") => "lucide-list",
        Some("number") => "lucide-binary",
        Some("checkbox") => "lucide-check-square",
        Some("date") => "lucide-calendar",
        Some("datetime") => "lucide-clock",
        Some("tags") => "lucide-tags",
        Some("aliases") => "lucide-forward",
        _ => Category::Property.default_icon(),
    }
}

#[cfg(test)]
mod tests {
    use super::{property_type_icon, Category};

    #[test]
    fn parse_accepts_every_stable_id() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("bookmark"), None);
    }

    #[test]
    fn property_icon_falls_back_for_unknown_types() {
        assert_eq!(property_type_icon(Some("checkbox")), "lucide-check-square");
        assert_eq!(property_type_icon(Some("custom")), "lucide-text");
        assert_eq!(property_type_icon(None), "lucide-text");
    }
}
