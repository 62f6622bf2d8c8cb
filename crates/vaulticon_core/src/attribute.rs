//! Attribute resolution: item metadata to comparable attribute values.
//!
//! # Responsibility
//! - Turn one `Item` into an `AttributeSet` keyed by `AttributeSource`.
//! - Derive computed attributes (extension, parent, depth) once per item.
//!
//! # Invariants
//! - Resolution is pure and never fails.
//! - Sources that do not apply to the item's category, or whose data is
//!   unknown, resolve to `AttributeValue::Absent`.

use crate::model::category::Category;
use crate::model::condition::AttributeSource;
use crate::model::item::{Item, ItemDetails};
use std::collections::BTreeMap;

/// Typed attribute value ready for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    TextSet(Vec<String>),
    Number(f64),
    /// Epoch milliseconds.
    Date(i64),
    Boolean(bool),
    Absent,
}

static ABSENT: AttributeValue = AttributeValue::Absent;

/// Resolved attributes of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSet {
    category: Category,
    values: BTreeMap<AttributeSource, AttributeValue>,
}

impl AttributeSet {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            values: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Stores a value; inapplicable sources are silently dropped.
    pub fn insert(&mut self, source: AttributeSource, value: AttributeValue) {
        if source.applies_to(self.category) {
            self.values.insert(source, value);
        }
    }

    /// Returns the value for `source`, or `Absent` when unknown.
    pub fn get(&self, source: &AttributeSource) -> &AttributeValue {
        self.values.get(source).unwrap_or(&ABSENT)
    }
}

/// Contract for per-category managers producing attribute sets.
pub trait AttributeResolver {
    fn resolve(&self, item: &Item) -> AttributeSet;
}

/// Resolver for the built-in item variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAttributeResolver;

impl AttributeResolver for DefaultAttributeResolver {
    fn resolve(&self, item: &Item) -> AttributeSet {
        resolve_attributes(item)
    }
}

/// Resolves every applicable attribute of `item`.
pub fn resolve_attributes(item: &Item) -> AttributeSet {
    let mut set = AttributeSet::new(item.category());
    set.insert(AttributeSource::Name, AttributeValue::Text(item.name.clone()));

    match &item.details {
        ItemDetails::File(file) => {
            set.insert(AttributeSource::Path, AttributeValue::Text(file.path.clone()));
            set.insert(
                AttributeSource::Extension,
                text_or_absent(extension_of(&item.name).map(str::to_lowercase).as_deref()),
            );
            set.insert(AttributeSource::Parent, text_or_absent(parent_name(&file.path)));
            set.insert(
                AttributeSource::Tags,
                AttributeValue::TextSet(file.tags.iter().map(|tag| normalize_tag(tag)).collect()),
            );
            set.insert(AttributeSource::Created, date_or_absent(file.created));
            set.insert(AttributeSource::Modified, date_or_absent(file.modified));
            set.insert(AttributeSource::Size, count_or_absent(file.size));
            set.insert(AttributeSource::Starred, AttributeValue::Boolean(file.starred));
        }
        ItemDetails::Folder(folder) => {
            set.insert(AttributeSource::Path, AttributeValue::Text(folder.path.clone()));
            set.insert(AttributeSource::Parent, text_or_absent(parent_name(&folder.path)));
            set.insert(
                AttributeSource::Depth,
                AttributeValue::Number(segment_count(&folder.path, '/') as f64),
            );
            set.insert(AttributeSource::Starred, AttributeValue::Boolean(folder.starred));
        }
        ItemDetails::Tag(tag) => {
            let name = normalize_tag(&item.name);
            set.insert(
                AttributeSource::Depth,
                AttributeValue::Number(segment_count(&name, '/') as f64),
            );
            set.insert(AttributeSource::Name, AttributeValue::Text(name));
            set.insert(AttributeSource::UsageCount, count_or_absent(tag.usage_count));
        }
        ItemDetails::Property(property) => {
            set.insert(
                AttributeSource::PropertyType,
                text_or_absent(property.property_type.as_deref()),
            );
            set.insert(AttributeSource::UsageCount, count_or_absent(property.usage_count));
        }
    }

    set
}

/// Strips surrounding whitespace and one leading `#`.
pub fn normalize_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed).to_string()
}

fn extension_of(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

fn parent_name(path: &str) -> Option<&str> {
    let (parent, _) = path.trim_end_matches('/').rsplit_once('/')?;
    parent.rsplit('/').next().filter(|name| !name.is_empty())
}

fn segment_count(value: &str, separator: char) -> usize {
    value.split(separator).filter(|segment| !segment.is_empty()).count()
}

fn text_or_absent(value: Option<&str>) -> AttributeValue {
    match value {
        Some(text) => AttributeValue::Text(text.to_string()),
        None => AttributeValue::Absent,
    }
}

fn date_or_absent(value: Option<i64>) -> AttributeValue {
    value.map_or(AttributeValue::Absent, AttributeValue::Date)
}

fn count_or_absent(value: Option<u64>) -> AttributeValue {
    value.map_or(AttributeValue::Absent, |count| AttributeValue::Number(count as f64))
}

#[cfg(test)]
mod tests {
    use super::{resolve_attributes, AttributeValue};
    use crate::model::condition::AttributeSource;
    use crate::model::item::{FileDetails, FolderDetails, Item, PropertyDetails, TagDetails};

    #[test]
    fn file_attributes_are_derived_from_path_and_name() {
        let item = Item::file(FileDetails {
            path: "work/projects/Plan.MD".to_string(),
            tags: vec!["#project".to_string(), "urgent".to_string()],
            modified: Some(1_700_000_000_000),
            ..FileDetails::default()
        });
        let attrs = resolve_attributes(&item);

        assert_eq!(
            attrs.get(&AttributeSource::Name),
            &AttributeValue::Text("Plan.MD".to_string())
        );
        assert_eq!(
            attrs.get(&AttributeSource::Extension),
            &AttributeValue::Text("md".to_string())
        );
        assert_eq!(
            attrs.get(&AttributeSource::Parent),
            &AttributeValue::Text("projects".to_string())
        );
        assert_eq!(
            attrs.get(&AttributeSource::Tags),
            &AttributeValue::TextSet(vec!["project".to_string(), "urgent".to_string()])
        );
        assert_eq!(
            attrs.get(&AttributeSource::Modified),
            &AttributeValue::Date(1_700_000_000_000)
        );
        assert_eq!(attrs.get(&AttributeSource::Created), &AttributeValue::Absent);
        assert_eq!(
            attrs.get(&AttributeSource::Starred),
            &AttributeValue::Boolean(false)
        );
    }

    #[test]
    fn root_level_items_have_no_parent_and_dotfiles_no_extension() {
        let item = Item::file(FileDetails {
            path: ".obsidian".to_string(),
            ..FileDetails::default()
        });
        let attrs = resolve_attributes(&item);
        assert_eq!(attrs.get(&AttributeSource::Parent), &AttributeValue::Absent);
        assert_eq!(attrs.get(&AttributeSource::Extension), &AttributeValue::Absent);
    }

    #[test]
    fn inapplicable_sources_resolve_absent() {
        let folder = Item::folder(FolderDetails {
            path: "a/b/c".to_string(),
            starred: true,
        });
        let attrs = resolve_attributes(&folder);
        assert_eq!(attrs.get(&AttributeSource::Depth), &AttributeValue::Number(3.0));
        assert_eq!(attrs.get(&AttributeSource::Tags), &AttributeValue::Absent);
        assert_eq!(attrs.get(&AttributeSource::Extension), &AttributeValue::Absent);
        assert_eq!(
            attrs.get(&AttributeSource::Unknown("headings".to_string())),
            &AttributeValue::Absent
        );
    }

    #[test]
    fn tag_depth_counts_nested_segments() {
        let tag = Item::tag("#area/health/sleep", TagDetails { usage_count: Some(4) });
        let attrs = resolve_attributes(&tag);
        assert_eq!(attrs.get(&AttributeSource::Depth), &AttributeValue::Number(3.0));
        assert_eq!(
            attrs.get(&AttributeSource::Name),
            &AttributeValue::Text("area/health/sleep".to_string())
        );
        assert_eq!(
            attrs.get(&AttributeSource::UsageCount),
            &AttributeValue::Number(4.0)
        );
    }

    #[test]
    fn property_type_is_absent_when_undeclared() {
        let property = Item::property("status", PropertyDetails::default());
        let attrs = resolve_attributes(&property);
        assert_eq!(attrs.get(&AttributeSource::PropertyType), &AttributeValue::Absent);
    }
}
