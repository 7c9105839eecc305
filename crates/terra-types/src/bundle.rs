//! Resource bundles: a sparse quantity per [`Resource`].
//!
//! Bundles are used for holdings, costs, yields, and trade terms. Zero
//! quantities are never stored by the mutating helpers, so two bundles
//! built through the API compare equal exactly when they hold the same
//! amounts. Subtraction clamps at zero; addition saturates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Resource;

/// A quantity of each resource. Missing entries mean zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceBundle(BTreeMap<Resource, u32>);

impl ResourceBundle {
    /// Create an empty bundle.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style helper: return the bundle with `resource` set to `amount`.
    #[must_use]
    pub fn with(mut self, resource: Resource, amount: u32) -> Self {
        self.set(resource, amount);
        self
    }

    /// Quantity held of `resource`.
    pub fn get(&self, resource: Resource) -> u32 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    /// Overwrite the quantity of `resource`. Setting zero removes the entry.
    pub fn set(&mut self, resource: Resource, amount: u32) {
        if amount == 0 {
            self.0.remove(&resource);
        } else {
            self.0.insert(resource, amount);
        }
    }

    /// Add `amount` of `resource`, saturating at `u32::MAX`.
    pub fn add(&mut self, resource: Resource, amount: u32) {
        let next = self.get(resource).saturating_add(amount);
        self.set(resource, next);
    }

    /// Remove up to `amount` of `resource`, clamping at zero.
    ///
    /// Returns the quantity actually removed.
    pub fn take(&mut self, resource: Resource, amount: u32) -> u32 {
        let held = self.get(resource);
        let removed = held.min(amount);
        self.set(resource, held.saturating_sub(removed));
        removed
    }

    /// Add every quantity of `other` to this bundle.
    pub fn add_bundle(&mut self, other: &Self) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Subtract every quantity of `other`, clamping each resource at zero.
    pub fn saturating_sub_bundle(&mut self, other: &Self) {
        for (resource, amount) in other.iter() {
            self.take(resource, amount);
        }
    }

    /// Whether this bundle holds at least every quantity in `cost`.
    pub fn covers(&self, cost: &Self) -> bool {
        self.shortfall(cost).is_none()
    }

    /// The first resource (in declaration order) this bundle cannot cover,
    /// as `(resource, needed, available)`.
    pub fn shortfall(&self, cost: &Self) -> Option<(Resource, u32, u32)> {
        cost.iter().find_map(|(resource, needed)| {
            let available = self.get(resource);
            (available < needed).then_some((resource, needed, available))
        })
    }

    /// Per-resource minimum of this bundle and `ceiling`.
    #[must_use]
    pub fn clamped_to(&self, ceiling: &Self) -> Self {
        self.iter()
            .map(|(resource, amount)| (resource, amount.min(ceiling.get(resource))))
            .collect()
    }

    /// Sum of all quantities.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&v| u64::from(v)).sum()
    }

    /// Whether every quantity is zero.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&v| v == 0)
    }

    /// Iterate non-zero `(resource, amount)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        self.0
            .iter()
            .filter(|&(_, &amount)| amount > 0)
            .map(|(&resource, &amount)| (resource, amount))
    }

    /// The resource held in the largest quantity, ties broken by
    /// declaration order. `None` for an empty bundle.
    pub fn largest(&self) -> Option<(Resource, u32)> {
        self.iter()
            .fold(None, |best: Option<(Resource, u32)>, (resource, amount)| {
                match best {
                    Some((_, top)) if top >= amount => best,
                    _ => Some((resource, amount)),
                }
            })
    }
}

impl FromIterator<(Resource, u32)> for ResourceBundle {
    fn from_iter<I: IntoIterator<Item = (Resource, u32)>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for (resource, amount) in iter {
            bundle.add(resource, amount);
        }
        bundle
    }
}

impl<const N: usize> From<[(Resource, u32); N]> for ResourceBundle {
    fn from(pairs: [(Resource, u32); N]) -> Self {
        pairs.into_iter().collect()
    }
}
