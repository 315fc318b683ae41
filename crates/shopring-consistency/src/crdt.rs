//! PN-counter and PN-counter map
//!
//! JSON layout of a list: `{"milk": {"P": {"alice": 3}, "N": {"bob": 1}}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shopring_common::ShopringError;

/// Counter supporting increments and decrements from many actors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounter {
    #[serde(rename = "P", default)]
    p: BTreeMap<String, u64>,
    #[serde(rename = "N", default)]
    n: BTreeMap<String, u64>,
}

impl PnCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, actor: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let entry = self.p.entry(actor.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn decrement(&mut self, actor: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let entry = self.n.entry(actor.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn value(&self) -> i64 {
        let positive: i128 = self.p.values().map(|v| i128::from(*v)).sum();
        let negative: i128 = self.n.values().map(|v| i128::from(*v)).sum();
        let value = positive - negative;
        value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Pointwise maximum over both grow-only maps
    pub fn merge(&self, other: &PnCounter) -> PnCounter {
        PnCounter {
            p: merge_max(&self.p, &other.p),
            n: merge_max(&self.n, &other.n),
        }
    }
}

fn merge_max(a: &BTreeMap<String, u64>, b: &BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    let mut merged = a.clone();
    for (actor, count) in b {
        merged
            .entry(actor.clone())
            .and_modify(|v| *v = (*v).max(*count))
            .or_insert(*count);
    }
    merged
}

/// Shopping list content: item name to quantity counter
///
/// Removed items stay in the map with a zero value so that a later merge
/// with an older replica cannot bring them back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PnCounterMap {
    state: BTreeMap<String, PnCounter>,
}

impl PnCounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty counter for `item` if it is not tracked yet
    pub fn insert(&mut self, item: &str) {
        self.state.entry(item.to_string()).or_default();
    }

    pub fn insert_with(&mut self, item: &str, actor: &str, amount: u64) {
        self.state
            .entry(item.to_string())
            .or_default()
            .increment(actor, amount);
    }

    pub fn increment(&mut self, item: &str, actor: &str, amount: u64) {
        self.insert_with(item, actor, amount);
    }

    pub fn decrement(&mut self, item: &str, actor: &str, amount: u64) {
        self.state
            .entry(item.to_string())
            .or_default()
            .decrement(actor, amount);
    }

    pub fn remove(&mut self, item: &str, actor: &str) {
        let counter = self.state.entry(item.to_string()).or_default();
        let value = counter.value();
        if value > 0 {
            counter.decrement(actor, value.unsigned_abs());
        }
    }

    /// Move the item's value to `quantity` with a single increment or decrement
    pub fn set(&mut self, item: &str, actor: &str, quantity: u64) {
        let counter = self.state.entry(item.to_string()).or_default();
        let target = i128::from(quantity);
        let current = i128::from(counter.value());
        let delta = target - current;
        if delta > 0 {
            counter.increment(actor, u64::try_from(delta).unwrap_or(u64::MAX));
        } else if delta < 0 {
            counter.decrement(actor, u64::try_from(-delta).unwrap_or(u64::MAX));
        }
    }

    pub fn value(&self, item: &str) -> i64 {
        self.state.get(item).map(PnCounter::value).unwrap_or(0)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.state.contains_key(item)
    }

    /// Items with a positive quantity, ordered by name
    pub fn items(&self) -> Vec<(String, i64)> {
        self.state
            .iter()
            .map(|(name, counter)| (name, counter.value()))
            .filter(|(_, value)| *value > 0)
            .map(|(name, value)| (name.clone(), value))
            .collect()
    }

    pub fn is_visible(&self, item: &str) -> bool {
        self.value(item) > 0
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn merge(&self, other: &PnCounterMap) -> PnCounterMap {
        let mut state = self.state.clone();
        for (item, counter) in &other.state {
            state
                .entry(item.clone())
                .and_modify(|c| *c = c.merge(counter))
                .or_insert_with(|| counter.clone());
        }
        PnCounterMap { state }
    }

    pub fn to_json(&self) -> Result<String, ShopringError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ShopringError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse both sides and return the merged JSON
    pub fn merge_json(local: &str, remote: &str) -> Result<String, ShopringError> {
        let local = Self::from_json(local)?;
        let remote = Self::from_json(remote)?;
        local.merge(&remote).to_json()
    }
}
