//! Archetype personality profiles.
//!
//! A profile is a static table per [`Archetype`]: action multipliers,
//! resource targets, preferred biomes, and trade sizing. Lookups are
//! pure and cannot fail. Kinds a profile leaves out weigh 1.0.
//!
//! [`KindWeights`] folds a profile together with the difficulty tier
//! (and optionally a strategic bias) into the effective weight applied
//! to each opportunity kind.

use std::collections::BTreeSet;

use serde::Serialize;
use terra_types::{Archetype, Biome, OpportunityKind, Resource, ResourceBundle};

use crate::difficulty::DifficultyTier;

/// Static decision profile of one archetype.
#[derive(Debug)]
pub struct PersonalityProfile {
    /// Per-kind multipliers. Missing kinds weigh 1.0.
    pub multipliers: &'static [(OpportunityKind, f64)],
    /// Holdings the archetype aims for.
    pub targets: [(Resource, u32); 4],
    /// Biomes the archetype likes to claim.
    pub preferred_biomes: &'static [Biome],
    /// Share of its own holding offered in a trade, in percent.
    pub offer_pct: u32,
    /// Share of the counterpart's holding requested, in percent.
    pub request_pct: u32,
}

const EXPANSIONIST: PersonalityProfile = PersonalityProfile {
    multipliers: &[
        (OpportunityKind::Claim, 1.5),
        (OpportunityKind::Explore, 1.2),
        (OpportunityKind::Collect, 0.9),
        (OpportunityKind::Build, 0.8),
        (OpportunityKind::Dispute, 1.3),
    ],
    targets: [
        (Resource::Wood, 6),
        (Resource::Stone, 4),
        (Resource::Gold, 3),
        (Resource::Water, 6),
    ],
    preferred_biomes: &[Biome::Plains, Biome::Forest],
    offer_pct: 15,
    request_pct: 15,
};

const BUILDER: PersonalityProfile = PersonalityProfile {
    multipliers: &[
        (OpportunityKind::Claim, 0.8),
        (OpportunityKind::Collect, 1.2),
        (OpportunityKind::Build, 1.6),
        (OpportunityKind::Dispute, 0.7),
    ],
    targets: [
        (Resource::Wood, 8),
        (Resource::Stone, 8),
        (Resource::Gold, 2),
        (Resource::Water, 4),
    ],
    preferred_biomes: &[Biome::Mountain, Biome::Forest],
    offer_pct: 15,
    request_pct: 15,
};

const ECONOMIST: PersonalityProfile = PersonalityProfile {
    multipliers: &[
        (OpportunityKind::Claim, 0.9),
        (OpportunityKind::Collect, 1.5),
        (OpportunityKind::Build, 1.1),
        (OpportunityKind::Dispute, 0.8),
    ],
    targets: [
        (Resource::Wood, 5),
        (Resource::Stone, 5),
        (Resource::Gold, 6),
        (Resource::Water, 5),
    ],
    preferred_biomes: &[Biome::Lake, Biome::Mountain],
    offer_pct: 10,
    request_pct: 12,
};

const DIPLOMAT: PersonalityProfile = PersonalityProfile {
    multipliers: &[
        (OpportunityKind::Explore, 1.1),
        (OpportunityKind::Collect, 1.1),
        (OpportunityKind::Dispute, 0.5),
    ],
    targets: [
        (Resource::Wood, 5),
        (Resource::Stone, 5),
        (Resource::Gold, 4),
        (Resource::Water, 5),
    ],
    preferred_biomes: &[Biome::Plains, Biome::Lake],
    offer_pct: 20,
    request_pct: 10,
};

/// The static profile of `archetype`.
pub const fn profile(archetype: Archetype) -> &'static PersonalityProfile {
    match archetype {
        Archetype::Expansionist => &EXPANSIONIST,
        Archetype::Builder => &BUILDER,
        Archetype::Economist => &ECONOMIST,
        Archetype::Diplomat => &DIPLOMAT,
    }
}

/// Multiplier the archetype applies to `kind` (1.0 when unspecified).
pub fn multiplier(archetype: Archetype, kind: OpportunityKind) -> f64 {
    profile(archetype)
        .multipliers
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or(1.0, |&(_, m)| m)
}

/// Holdings the archetype aims for.
pub fn resource_targets(archetype: Archetype) -> ResourceBundle {
    ResourceBundle::from(profile(archetype).targets)
}

/// Biomes the archetype prefers to claim.
pub fn preferred_biomes(archetype: Archetype) -> BTreeSet<Biome> {
    profile(archetype).preferred_biomes.iter().copied().collect()
}

/// Per-kind effective weights for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KindWeights {
    /// Weight of claim candidates.
    pub claim: f64,
    /// Weight of explore candidates.
    pub explore: f64,
    /// Weight of collect candidates.
    pub collect: f64,
    /// Weight of build candidates.
    pub build: f64,
    /// Weight of dispute candidates.
    pub dispute: f64,
}

impl Default for KindWeights {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl KindWeights {
    /// Every kind weighs 1.0.
    pub const NEUTRAL: Self = Self {
        claim: 1.0,
        explore: 1.0,
        collect: 1.0,
        build: 1.0,
        dispute: 1.0,
    };

    /// Effective weights for `archetype` under `tier`.
    ///
    /// Each multiplier is pulled toward 1.0 (or pushed away from it) by
    /// the tier's personality bias. Disputes are further scaled by the
    /// tier's aggression.
    pub fn for_agent(archetype: Archetype, tier: &DifficultyTier) -> Self {
        let bias = tier.personality_weight_bias;
        let eff = |kind| (multiplier(archetype, kind) - 1.0).mul_add(bias, 1.0);
        Self {
            claim: eff(OpportunityKind::Claim),
            explore: eff(OpportunityKind::Explore),
            collect: eff(OpportunityKind::Collect),
            build: eff(OpportunityKind::Build),
            dispute: eff(OpportunityKind::Dispute) * tier.aggression_level,
        }
    }

    /// Weight of `kind`.
    pub const fn get(&self, kind: OpportunityKind) -> f64 {
        match kind {
            OpportunityKind::Claim => self.claim,
            OpportunityKind::Explore => self.explore,
            OpportunityKind::Collect => self.collect,
            OpportunityKind::Build => self.build,
            OpportunityKind::Dispute => self.dispute,
        }
    }

    /// Component-wise product with a strategic bias.
    #[must_use]
    pub fn scaled_by(&self, bias: &Self) -> Self {
        Self {
            claim: self.claim * bias.claim,
            explore: self.explore * bias.explore,
            collect: self.collect * bias.collect,
            build: self.build * bias.build,
            dispute: self.dispute * bias.dispute,
        }
    }
}
