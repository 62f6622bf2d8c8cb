//! Vault items as supplied by per-category managers.
//!
//! # Responsibility
//! - Carry the raw metadata the attribute resolver reads.
//! - Carry the item's own explicit icon/color, independently nullable.
//!
//! # Invariants
//! - `Item::category()` is derived from the `details` variant only.
//! - The engine never mutates items; managers own their lifetime.

use crate::attribute::normalize_tag;
use crate::model::category::Category;
use serde::{Deserialize, Serialize};

/// Identifier of an item within its category (file path, tag name, ...).
pub type ItemId = String;

/// File metadata read from the vault index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDetails {
    /// Vault-relative path including the file name.
    pub path: String,
    /// Tags declared by the file, with or without a leading `#`.
    pub tags: Vec<String>,
    /// Creation time in epoch milliseconds.
    pub created: Option<i64>,
    /// Last modification time in epoch milliseconds.
    pub modified: Option<i64>,
    pub size: Option<u64>,
    pub starred: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderDetails {
    /// Vault-relative path; root children have a single segment.
    pub path: String,
    pub starred: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagDetails {
    /// Number of files using the tag, when the tag index knows it.
    pub usage_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDetails {
    /// Declared widget type (`text`, `number`, `checkbox`, ...).
    pub property_type: Option<String>,
    pub usage_count: Option<u64>,
}

/// Category-specific payload of an item.
///
/// Classification happens once, when a manager builds the item; nothing
/// downstream inspects payload shape to guess what an item is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ItemDetails {
    File(FileDetails),
    Folder(FolderDetails),
    Tag(TagDetails),
    Property(PropertyDetails),
}

impl ItemDetails {
    pub fn category(&self) -> Category {
        match self {
            Self::File(_) => Category::File,
            Self::Folder(_) => Category::Folder,
            Self::Tag(_) => Category::Tag,
            Self::Property(_) => Category::Property,
        }
    }
}

/// One vault entity that can carry an icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Explicit per-item icon, overriding any rule.
    #[serde(default)]
    pub icon: Option<String>,
    /// Explicit per-item color, overriding any rule.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(flatten)]
    pub details: ItemDetails,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, details: ItemDetails) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
            color: None,
            details,
        }
    }

    /// Builds a file item keyed by its path; the name is the last segment.
    pub fn file(details: FileDetails) -> Self {
        let name = last_segment(&details.path).to_string();
        Self::new(details.path.clone(), name, ItemDetails::File(details))
    }

    /// Builds a folder item keyed by its path.
    pub fn folder(details: FolderDetails) -> Self {
        let name = last_segment(&details.path).to_string();
        Self::new(details.path.clone(), name, ItemDetails::Folder(details))
    }

    /// Builds a tag item; the id is the name normalized like tag values in
    /// file metadata, so tag rules and tag conditions agree on it.
    pub fn tag(name: &str, details: TagDetails) -> Self {
        let name = normalize_tag(name);
        Self::new(name.clone(), name, ItemDetails::Tag(details))
    }

    pub fn property(name: &str, details: PropertyDetails) -> Self {
        Self::new(name.trim(), name.trim(), ItemDetails::Property(details))
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// Whether the item carries its own icon or color.
    pub fn has_explicit_appearance(&self) -> bool {
        self.icon.is_some() || self.color.is_some()
    }
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
