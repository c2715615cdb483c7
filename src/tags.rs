//! Entity tags and the tag → cache entry registry.
//!
//! Queries declare the tags they *provide*; mutations declare the tags they
//! *invalidate*. A type tag (`Tag::of(TagType::Order)`) matches every entry
//! providing that type, with or without an id. An id tag
//! (`Tag::id(TagType::Order, 7)`) matches only entries providing that exact pair.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// The entity families the backend exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagType {
    User,
    Product,
    Category,
    Role,
    Cart,
    Order,
    Wishlist,
    ShippingAddress,
    ShippingCost,
    Payment,
    SupplierItem,
    Upload,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::User => "User",
            TagType::Product => "Product",
            TagType::Category => "Category",
            TagType::Role => "Role",
            TagType::Cart => "Cart",
            TagType::Order => "Order",
            TagType::Wishlist => "Wishlist",
            TagType::ShippingAddress => "ShippingAddress",
            TagType::ShippingCost => "ShippingCost",
            TagType::Payment => "Payment",
            TagType::SupplierItem => "SupplierItem",
            TagType::Upload => "Upload",
        }
    }
}

/// A cache tag: an entity type, optionally narrowed to one id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub kind: TagType,
    pub id: Option<String>,
}

impl Tag {
    /// A type-wide tag, e.g. `Cart`
    pub fn of(kind: TagType) -> Self {
        Self { kind, id: None }
    }

    /// A `{type, id}` tag, e.g. `{Order, 42}`
    pub fn id(kind: TagType, id: impl ToString) -> Self {
        Self {
            kind,
            id: Some(id.to_string()),
        }
    }

    /// Whether invalidating `self` affects an entry that provided `provided`
    pub fn matches(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match &self.id {
            None => true,
            Some(id) => provided.id.as_deref() == Some(id.as_str()),
        }
    }
}

impl From<TagType> for Tag {
    fn from(kind: TagType) -> Self {
        Tag::of(kind)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind.as_str(), id),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

/// Many-to-many association between provided tags and cache entry keys
#[derive(Debug, Default, Clone)]
pub struct TagRegistry {
    by_type: HashMap<TagType, HashMap<Tag, HashSet<String>>>,
    by_key: HashMap<String, Vec<Tag>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tags an entry provides, replacing whatever it provided before
    pub fn provide_tags(&mut self, key: &str, tags: &[Tag]) {
        self.remove_entry(key);
        if tags.is_empty() {
            return;
        }
        for tag in tags {
            self.by_type
                .entry(tag.kind)
                .or_default()
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        let mut unique = tags.to_vec();
        unique.sort();
        unique.dedup();
        self.by_key.insert(key.to_string(), unique);
    }

    /// Forget every association of an entry
    pub fn remove_entry(&mut self, key: &str) {
        let Some(tags) = self.by_key.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(by_tag) = self.by_type.get_mut(&tag.kind) {
                if let Some(keys) = by_tag.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        by_tag.remove(&tag);
                    }
                }
                if by_tag.is_empty() {
                    self.by_type.remove(&tag.kind);
                }
            }
        }
    }

    /// All entry keys affected by invalidating any of `tags`
    pub fn keys_for(&self, tags: &[Tag]) -> HashSet<String> {
        let mut keys = HashSet::new();
        for tag in tags {
            let Some(by_tag) = self.by_type.get(&tag.kind) else {
                continue;
            };
            for (provided, entry_keys) in by_tag {
                if tag.matches(provided) {
                    keys.extend(entry_keys.iter().cloned());
                }
            }
        }
        keys
    }

    /// The tags an entry currently provides
    pub fn tags_of(&self, key: &str) -> &[Tag] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.by_type.clear();
        self.by_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_matches_id_tags_of_same_type() {
        let mut registry = TagRegistry::new();
        registry.provide_tags("getOrders(null)", &[Tag::of(TagType::Order)]);
        registry.provide_tags("getOrderDetails(\"7\")", &[Tag::id(TagType::Order, 7)]);
        registry.provide_tags("getCart(null)", &[Tag::of(TagType::Cart)]);

        let keys = registry.keys_for(&[Tag::of(TagType::Order)]);
        assert_eq!(keys.len(), 2);
        assert!(!keys.contains("getCart(null)"));
    }

    #[test]
    fn id_tag_only_matches_that_id() {
        let mut registry = TagRegistry::new();
        registry.provide_tags("a", &[Tag::id(TagType::Order, 1)]);
        registry.provide_tags("b", &[Tag::id(TagType::Order, 2)]);
        registry.provide_tags("list", &[Tag::of(TagType::Order)]);

        let keys = registry.keys_for(&[Tag::id(TagType::Order, 2)]);
        assert_eq!(keys, HashSet::from(["b".to_string()]));
    }

    #[test]
    fn providing_again_replaces_previous_tags() {
        let mut registry = TagRegistry::new();
        registry.provide_tags("k", &[Tag::of(TagType::Product)]);
        registry.provide_tags("k", &[Tag::of(TagType::Category)]);

        assert!(registry.keys_for(&[Tag::of(TagType::Product)]).is_empty());
        assert_eq!(registry.tags_of("k"), &[Tag::of(TagType::Category)]);

        registry.remove_entry("k");
        assert!(registry.keys_for(&[Tag::of(TagType::Category)]).is_empty());
    }
}
