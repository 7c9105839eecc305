//! Negotiation parameters.
//!
//! Deserialized from the `negotiation` section of `terra-config.yaml`.
//! Relationship deltas and tolerances are whole percentages so that the
//! Decimal relationship scores stay exact.

use std::collections::BTreeMap;
use std::ops::Neg;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use terra_types::{Resource, TradeTerms};

/// Valuation, acceptance, and sizing knobs for trade negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Resource a counterpart must hold to be worth proposing to.
    #[serde(default = "default_currency")]
    pub trade_currency: Resource,
    /// Minimum units of the currency a counterpart must hold.
    #[serde(default = "default_min_unit")]
    pub min_trade_unit: u32,
    /// Relationship gain on an accepted trade, in hundredths.
    #[serde(default = "default_accept_delta")]
    pub accept_delta_pct: u32,
    /// Relationship loss on a rejected trade, in hundredths.
    #[serde(default = "default_reject_delta")]
    pub reject_delta_pct: u32,
    /// How far an economist lets the request exceed the offer, in percent.
    #[serde(default = "default_loss_tolerance")]
    pub loss_tolerance_pct: u32,
    /// Worth of one unit of each resource. Unlisted resources are worth 1.0.
    #[serde(default = "default_resource_values")]
    pub resource_values: BTreeMap<Resource, f64>,
    /// Flat worth of one region.
    #[serde(default = "default_region_value")]
    pub region_value: f64,
    /// Expansionists multiply region worth by this factor.
    #[serde(default = "default_region_factor")]
    pub expansionist_region_factor: f64,
    /// Builders weigh wood and stone they give up by this factor.
    #[serde(default = "default_builder_premium")]
    pub builder_cost_premium: f64,
    /// Diplomat acceptance probability before adjustments.
    #[serde(default = "default_diplomat_base")]
    pub diplomat_base: f64,
    /// Added to the diplomat probability per unit of net value.
    #[serde(default = "default_diplomat_value_bonus")]
    pub diplomat_value_bonus: f64,
    /// Added to the diplomat probability per unit of relationship.
    #[serde(default = "default_diplomat_relationship_bonus")]
    pub diplomat_relationship_bonus: f64,
    /// Upper bound on the diplomat probability.
    #[serde(default = "default_diplomat_cap")]
    pub diplomat_cap: f64,
    /// Holding assumed to satisfy a counterpart when estimating its surplus.
    #[serde(default = "default_neutral_target")]
    pub neutral_target: u32,
    /// Share of its holding an expansionist offers for a region, in percent.
    #[serde(default = "default_region_offer_pct")]
    pub region_offer_pct: u32,
}

const fn default_currency() -> Resource {
    Resource::Gold
}

const fn default_min_unit() -> u32 {
    1
}

const fn default_accept_delta() -> u32 {
    10
}

const fn default_reject_delta() -> u32 {
    5
}

const fn default_loss_tolerance() -> u32 {
    10
}

fn default_resource_values() -> BTreeMap<Resource, f64> {
    BTreeMap::from([
        (Resource::Wood, 1.0),
        (Resource::Stone, 1.5),
        (Resource::Gold, 3.0),
        (Resource::Water, 1.0),
    ])
}

const fn default_region_value() -> f64 {
    5.0
}

const fn default_region_factor() -> f64 {
    4.0
}

const fn default_builder_premium() -> f64 {
    1.5
}

const fn default_diplomat_base() -> f64 {
    0.4
}

const fn default_diplomat_value_bonus() -> f64 {
    0.05
}

const fn default_diplomat_relationship_bonus() -> f64 {
    0.3
}

const fn default_diplomat_cap() -> f64 {
    0.9
}

const fn default_neutral_target() -> u32 {
    4
}

const fn default_region_offer_pct() -> u32 {
    30
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            trade_currency: default_currency(),
            min_trade_unit: default_min_unit(),
            accept_delta_pct: default_accept_delta(),
            reject_delta_pct: default_reject_delta(),
            loss_tolerance_pct: default_loss_tolerance(),
            resource_values: default_resource_values(),
            region_value: default_region_value(),
            expansionist_region_factor: default_region_factor(),
            builder_cost_premium: default_builder_premium(),
            diplomat_base: default_diplomat_base(),
            diplomat_value_bonus: default_diplomat_value_bonus(),
            diplomat_relationship_bonus: default_diplomat_relationship_bonus(),
            diplomat_cap: default_diplomat_cap(),
            neutral_target: default_neutral_target(),
            region_offer_pct: default_region_offer_pct(),
        }
    }
}

impl NegotiationConfig {
    /// Worth of one unit of `resource`.
    pub fn unit_value(&self, resource: Resource) -> f64 {
        self.resource_values.get(&resource).copied().unwrap_or(1.0)
    }

    /// Worth of `terms`, with each region valued at `region_value`.
    pub fn terms_value(&self, terms: &TradeTerms, region_value: f64) -> f64 {
        let resources: f64 = terms
            .resources
            .iter()
            .map(|(resource, amount)| f64::from(amount) * self.unit_value(resource))
            .sum();
        let regions = u32::try_from(terms.regions.len()).map_or(f64::from(u32::MAX), f64::from);
        regions.mul_add(region_value, resources)
    }

    /// Relationship change for an accepted trade.
    pub fn accept_delta(&self) -> Decimal {
        Decimal::new(i64::from(self.accept_delta_pct), 2)
    }

    /// Relationship change for a rejected trade (negative).
    pub fn reject_delta(&self) -> Decimal {
        Decimal::new(i64::from(self.reject_delta_pct), 2).neg()
    }

    /// The economist loss tolerance as a fraction.
    pub fn loss_tolerance(&self) -> f64 {
        f64::from(self.loss_tolerance_pct) / 100.0
    }
}
