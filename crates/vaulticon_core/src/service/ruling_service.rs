//! Ruling resolution: which rule, icon and color apply to an item.
//!
//! # Responsibility
//! - First-match-wins lookup of the effective rule for one item.
//! - Effective appearance under the item-override policy.
//! - Override/overrule explanation for multi-item selections.
//! - Rule checker previews across every item of a category.
//!
//! # Invariants
//! - Rule order is the only tie-break between matching rules.
//! - Each call resolves attributes fresh and scans one immutable snapshot.
//! - `check_ruling` reports the matching rule even when the item's own
//!   icon/color override it for rendering.

use crate::attribute::{AttributeResolver, AttributeSet, DefaultAttributeResolver};
use crate::engine::matcher::CompiledRule;
use crate::model::category::{property_type_icon, Category};
use crate::model::item::{Item, ItemDetails, ItemId};
use crate::model::rule::Rule;
use crate::store::rule_store::RuleStore;
use log::warn;
use std::collections::BTreeMap;

/// Collaborator supplying items of each category on demand.
pub trait ItemProvider {
    fn item(&self, category: Category, item_id: &str) -> Option<Item>;
    fn items(&self, category: Category) -> Vec<Item>;
}

/// Item provider backed by an in-memory index, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    items: BTreeMap<Category, Vec<Item>>,
}

impl ItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an item keyed by `(category, id)`.
    pub fn upsert(&mut self, item: Item) {
        let list = self.items.entry(item.category()).or_default();
        match list.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => list.push(item),
        }
    }

    pub fn remove(&mut self, category: Category, item_id: &str) -> bool {
        let Some(list) = self.items.get_mut(&category) else {
            return false;
        };
        let before = list.len();
        list.retain(|item| item.id != item_id);
        list.len() != before
    }
}

impl FromIterator<Item> for ItemIndex {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        let mut index = Self::new();
        for item in iter {
            index.upsert(item);
        }
        index
    }
}

impl ItemProvider for ItemIndex {
    fn item(&self, category: Category, item_id: &str) -> Option<Item> {
        self.items
            .get(&category)?
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
    }

    fn items(&self, category: Category) -> Vec<Item> {
        self.items.get(&category).cloned().unwrap_or_default()
    }
}

/// Where an effective icon/color came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceSource {
    /// The item's own explicit icon/color.
    Item,
    /// The first matching rule.
    Rule,
    /// Category default icon, no color.
    Default,
}

/// Effective rendering values for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub icon: String,
    pub color: Option<String>,
    pub source: AppearanceSource,
    /// The matching rule; shadowed when `source == Item`.
    pub rule: Option<Rule>,
}

impl Appearance {
    /// The rule the item's own values are overriding, if any.
    pub fn overridden_rule(&self) -> Option<&Rule> {
        match self.source {
            AppearanceSource::Item => self.rule.as_ref(),
            _ => None,
        }
    }
}

/// How a ruling applies to a selection of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulingKind {
    /// No selected item matches any rule.
    None,
    /// Every matched item has explicit values shadowing its rule.
    Override,
    /// At least one matched item takes its values from the rule.
    Overrule,
}

/// Ruling explanation for a multi-item picker selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRuling {
    pub kind: RulingKind,
    /// First rule, in selection order, among items of the reported kind.
    pub rule: Option<Rule>,
}

/// Ruling for one item of a batch lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRuling {
    pub item_id: ItemId,
    pub rule: Option<Rule>,
}

/// Items a candidate rule's conditions match, split by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulePreview {
    /// The rule would supply these items' icon/color.
    pub applied: Vec<ItemId>,
    /// An earlier enabled rule already wins for these items.
    pub shadowed: Vec<ItemId>,
    /// These items carry their own icon/color.
    pub overridden: Vec<ItemId>,
}

impl RulePreview {
    pub fn total(&self) -> usize {
        self.applied.len() + self.shadowed.len() + self.overridden.len()
    }
}

/// Public entry point for rule resolution.
pub struct RulingResolver<'a, P: ItemProvider + ?Sized, A = DefaultAttributeResolver> {
    rules: &'a RuleStore,
    items: &'a P,
    attributes: A,
}

impl<'a, P: ItemProvider + ?Sized> RulingResolver<'a, P> {
    pub fn new(rules: &'a RuleStore, items: &'a P) -> Self {
        Self {
            rules,
            items,
            attributes: DefaultAttributeResolver,
        }
    }
}

impl<'a, P: ItemProvider + ?Sized, A: AttributeResolver> RulingResolver<'a, P, A> {
    /// Swaps in a custom attribute resolver.
    pub fn with_resolver<B: AttributeResolver>(self, attributes: B) -> RulingResolver<'a, P, B> {
        RulingResolver {
            rules: self.rules,
            items: self.items,
            attributes,
        }
    }

    /// Returns the first enabled rule matching `(category, item_id)`.
    pub fn check_ruling(&self, category: Category, item_id: &str) -> Option<Rule> {
        let item = self.lookup(category, item_id)?;
        self.check_item(&item)
    }

    /// Same as `check_ruling` for an item the caller already holds.
    pub fn check_item(&self, item: &Item) -> Option<Rule> {
        let snapshot = self.rules.snapshot(item.category());
        first_match(&snapshot, &self.attributes.resolve(item)).cloned()
    }

    /// Rulings for every known item of `category`, in provider order.
    pub fn check_all(&self, category: Category) -> Vec<ItemRuling> {
        let snapshot = self.rules.snapshot(category);
        self.items
            .items(category)
            .into_iter()
            .map(|item| {
                let rule = first_match(&snapshot, &self.attributes.resolve(&item)).cloned();
                ItemRuling {
                    item_id: item.id,
                    rule,
                }
            })
            .collect()
    }

    /// Effective icon/color for `(category, item_id)`.
    pub fn appearance(&self, category: Category, item_id: &str) -> Option<Appearance> {
        let item = self.lookup(category, item_id)?;
        Some(self.appearance_of(&item))
    }

    /// Effective icon/color for an item the caller already holds.
    ///
    /// Explicit item values win whenever either icon or color is set; the
    /// matched rule is still reported so pickers can show it as overridden.
    pub fn appearance_of(&self, item: &Item) -> Appearance {
        let rule = self.check_item(item);
        let fallback_icon = default_icon(item);

        if item.has_explicit_appearance() {
            return Appearance {
                icon: item.icon.clone().unwrap_or_else(|| fallback_icon.to_string()),
                color: item.color.clone(),
                source: AppearanceSource::Item,
                rule,
            };
        }

        match rule {
            Some(rule) => Appearance {
                icon: rule.icon.clone().unwrap_or_else(|| fallback_icon.to_string()),
                color: rule.color.clone(),
                source: AppearanceSource::Rule,
                rule: Some(rule),
            },
            None => Appearance {
                icon: fallback_icon.to_string(),
                color: None,
                source: AppearanceSource::Default,
                rule: None,
            },
        }
    }

    /// Explains how rules apply across a picker selection.
    ///
    /// A selection mixing overridden and purely rule-driven items reports
    /// `Overrule`: one rule-driven item is enough.
    pub fn explain_selection(&self, category: Category, item_ids: &[&str]) -> SelectionRuling {
        let mut first_override: Option<Rule> = None;
        let mut first_overrule: Option<Rule> = None;

        for item_id in item_ids {
            let Some(item) = self.lookup(category, item_id) else {
                continue;
            };
            let Some(rule) = self.check_item(&item) else {
                continue;
            };
            let slot = if item.has_explicit_appearance() {
                &mut first_override
            } else {
                &mut first_overrule
            };
            if slot.is_none() {
                *slot = Some(rule);
            }
        }

        match (first_overrule, first_override) {
            (Some(rule), _) => SelectionRuling {
                kind: RulingKind::Overrule,
                rule: Some(rule),
            },
            (None, Some(rule)) => SelectionRuling {
                kind: RulingKind::Override,
                rule: Some(rule),
            },
            (None, None) => SelectionRuling {
                kind: RulingKind::None,
                rule: None,
            },
        }
    }

    /// Lists the items of the rule's category its conditions would match.
    ///
    /// The enabled flag is ignored so rules can be previewed while edited.
    /// Rules stored before the candidate (all of them, for a new rule)
    /// take precedence.
    pub fn preview_rule(&self, candidate: &Rule) -> RulePreview {
        let category = candidate.category;
        let snapshot = self.rules.snapshot(category);
        let cutoff = snapshot
            .iter()
            .position(|compiled| compiled.rule().id == candidate.id)
            .unwrap_or(snapshot.len());
        let earlier = &snapshot[..cutoff];
        let compiled = CompiledRule::compile(candidate.clone());

        let mut preview = RulePreview::default();
        for item in self.items.items(category) {
            let attributes = self.attributes.resolve(&item);
            if !compiled.matches_conditions(&attributes) {
                continue;
            }
            if first_match(earlier, &attributes).is_some() {
                preview.shadowed.push(item.id);
            } else if item.has_explicit_appearance() {
                preview.overridden.push(item.id);
            } else {
                preview.applied.push(item.id);
            }
        }
        preview
    }

    fn lookup(&self, category: Category, item_id: &str) -> Option<Item> {
        let item = self.items.item(category, item_id)?;
        if item.category() != category {
            warn!(
                "event=ruling_lookup module=service status=skip reason=category_mismatch requested={} actual={}",
                category,
                item.category()
            );
            return None;
        }
        Some(item)
    }
}

fn first_match<'r>(
    rules: &'r [CompiledRule],
    attributes: &AttributeSet,
) -> Option<&'r Rule> {
    rules
        .iter()
        .find(|compiled| compiled.matches(attributes))
        .map(CompiledRule::rule)
}

fn default_icon(item: &Item) -> &'static str {
    match &item.details {
        ItemDetails::Property(property) => property_type_icon(property.property_type.as_deref()),
        details => details.category().default_icon(),
    }
}
