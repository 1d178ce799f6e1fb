//! Prerequisite resolution within a skill group.
//!
//! A skill's direct prerequisite is the sibling one step below it on the
//! upgrade path:
//! 1. If any sibling has a lower rarity, only siblings on the nearest lower
//!    rarity tier are eligible.
//! 2. Otherwise, siblings on the same tier with a lower group rate are.
//! 3. Among the eligible siblings the highest group rate wins; equal rates
//!    fall back to the smallest id.

use std::cmp::Reverse;
use std::collections::HashMap;

use super::catalog::{Skill, SkillCatalog, SkillId};

/// Source of prerequisite edges.
pub trait ResolvePrerequisite {
    /// Id of the direct prerequisite of `skill`, or `None` for a root.
    fn prerequisite_of(&self, skill: &Skill, catalog: &SkillCatalog) -> Option<SkillId>;
}

/// Resolves edges on demand from group, rarity and group rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupRateResolver;

impl ResolvePrerequisite for GroupRateResolver {
    fn prerequisite_of(&self, skill: &Skill, catalog: &SkillCatalog) -> Option<SkillId> {
        let siblings = catalog.related_skills(skill);

        let lower_tier = siblings
            .iter()
            .map(|s| s.rarity_value)
            .filter(|&rarity| rarity < skill.rarity_value)
            .max();

        let eligible = siblings.into_iter().filter(|s| match lower_tier {
            Some(tier) => s.rarity_value == tier,
            None => s.rarity_value == skill.rarity_value && s.group_rate < skill.group_rate,
        });

        eligible
            .max_by_key(|s| (s.group_rate, Reverse(s.id)))
            .map(|s| s.id)
    }
}

/// Prerequisite edges cached in a side table keyed by skill id.
///
/// Tables can also be assembled from external edge lists, so nothing
/// guarantees they are acyclic; the chain walk checks for cycles.
#[derive(Debug, Clone, Default)]
pub struct PrerequisiteTable {
    edges: HashMap<SkillId, SkillId>,
}

impl PrerequisiteTable {
    /// Resolve every skill in the catalog once.
    pub fn from_catalog<R: ResolvePrerequisite>(catalog: &SkillCatalog, resolver: &R) -> Self {
        let edges = catalog
            .iter()
            .filter_map(|skill| {
                resolver
                    .prerequisite_of(skill, catalog)
                    .map(|prereq| (skill.id, prereq))
            })
            .collect();
        Self { edges }
    }

    /// Build from explicit `(skill, prerequisite)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (SkillId, SkillId)>,
    {
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    /// Set or replace the prerequisite of `skill_id`.
    pub fn insert(&mut self, skill_id: SkillId, prerequisite: SkillId) {
        self.edges.insert(skill_id, prerequisite);
    }

    pub fn get(&self, skill_id: SkillId) -> Option<SkillId> {
        self.edges.get(&skill_id).copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl ResolvePrerequisite for PrerequisiteTable {
    fn prerequisite_of(&self, skill: &Skill, _catalog: &SkillCatalog) -> Option<SkillId> {
        self.get(skill.id)
    }
}

/// Direct prerequisite of `skill` under the group-rate rules.
pub fn resolve_prerequisite<'a>(skill: &Skill, catalog: &'a SkillCatalog) -> Option<&'a Skill> {
    GroupRateResolver
        .prerequisite_of(skill, catalog)
        .and_then(|id| catalog.get(id))
}
