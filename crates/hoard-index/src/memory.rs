//! In-memory attribute store for testing and ephemeral use.
//!
//! [`InMemoryAttributeStore`] keeps every item in a `BTreeMap` behind a
//! `RwLock`. Conditional writes take the write lock for the whole
//! check-and-set, which gives the atomicity the trait requires.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::attributes::{Attributes, Item, Precondition, RangeQuery};
use crate::error::{IndexError, IndexResult};
use crate::traits::AttributeStore;

/// An in-memory implementation of [`AttributeStore`].
///
/// Data is lost when the store is dropped.
pub struct InMemoryAttributeStore {
    domain: String,
    created: AtomicBool,
    items: RwLock<BTreeMap<String, Attributes>>,
}

impl InMemoryAttributeStore {
    /// Create a store for the named domain. The domain starts out missing.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            created: AtomicBool::new(false),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of items in the domain.
    pub fn len(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the domain holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_domain(&self) -> IndexResult<()> {
        if self.created.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(IndexError::DomainMissing(self.domain.clone()))
        }
    }
}

#[async_trait]
impl AttributeStore for InMemoryAttributeStore {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn ensure_domain(&self) -> IndexResult<()> {
        self.created.store(true, Ordering::Release);
        Ok(())
    }

    async fn get(&self, item: &str) -> IndexResult<Option<Attributes>> {
        self.check_domain()?;
        let items = self.items.read().expect("lock poisoned");
        Ok(items.get(item).cloned())
    }

    async fn get_attr(&self, item: &str, attr: &str) -> IndexResult<Option<String>> {
        self.check_domain()?;
        let items = self.items.read().expect("lock poisoned");
        Ok(items.get(item).and_then(|attrs| attrs.get(attr)).cloned())
    }

    async fn put(
        &self,
        item: &str,
        attrs: Attributes,
        precondition: &Precondition,
    ) -> IndexResult<()> {
        self.check_domain()?;
        let mut items = self.items.write().expect("lock poisoned");
        precondition
            .check(items.get(item))
            .map_err(|reason| IndexError::ConditionFailed {
                item: item.to_string(),
                reason,
            })?;
        items.entry(item.to_string()).or_default().extend(attrs);
        Ok(())
    }

    async fn select(&self, query: &RangeQuery) -> IndexResult<Vec<Item>> {
        self.check_domain()?;
        let items = self.items.read().expect("lock poisoned");
        let mut hits: Vec<(&String, &String, &Attributes)> = items
            .iter()
            .filter_map(|(name, attrs)| {
                let value = attrs.get(&query.attr)?;
                query.contains(value).then_some((value, name, attrs))
            })
            .collect();
        hits.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        Ok(hits
            .into_iter()
            .take(query.limit)
            .map(|(_, name, attrs)| Item {
                name: name.clone(),
                attrs: attrs.clone(),
            })
            .collect())
    }

    async fn count(&self, attr: &str) -> IndexResult<u64> {
        self.check_domain()?;
        let items = self.items.read().expect("lock poisoned");
        Ok(items.values().filter(|a| a.contains_key(attr)).count() as u64)
    }
}

impl std::fmt::Debug for InMemoryAttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAttributeStore")
            .field("domain", &self.domain)
            .field("item_count", &self.len())
            .finish()
    }
}
