//! Cumulative point cost of a skill and all of its prerequisites.

use serde::Serialize;
use std::collections::HashSet;

use super::catalog::{Skill, SkillCatalog, SkillId};
use super::discount::{DiscountTable, LevelMap, UpgradeLevel};
use super::error::SkillError;
use super::resolver::{GroupRateResolver, ResolvePrerequisite};

/// Cost of one skill in a chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStep {
    pub skill_id: SkillId,
    pub name: String,
    pub level: UpgradeLevel,
    pub original_cost: u32,
    pub discount: f64,
    pub actual_cost: u32,
}

/// Total cost of a chain, with its steps ordered root first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainCost {
    pub skill_id: SkillId,
    pub total_cost: u32,
    pub steps: Vec<ChainStep>,
}

/// Walks prerequisite chains and prices them under a level map.
///
/// Holds no state between calls: every call re-walks the chain, so a changed
/// level map is always reflected.
pub struct ChainCalculator<'a, R = GroupRateResolver> {
    catalog: &'a SkillCatalog,
    resolver: R,
    discounts: DiscountTable,
}

impl<'a> ChainCalculator<'a, GroupRateResolver> {
    /// Calculator using group-rate resolution and the standard discounts.
    pub fn new(catalog: &'a SkillCatalog) -> Self {
        Self {
            catalog,
            resolver: GroupRateResolver,
            discounts: DiscountTable::default(),
        }
    }
}

impl<'a, R: ResolvePrerequisite> ChainCalculator<'a, R> {
    /// Swap the edge source, e.g. for a precomputed `PrerequisiteTable`.
    pub fn with_resolver<S: ResolvePrerequisite>(self, resolver: S) -> ChainCalculator<'a, S> {
        ChainCalculator {
            catalog: self.catalog,
            resolver,
            discounts: self.discounts,
        }
    }

    pub fn with_discounts(mut self, discounts: DiscountTable) -> Self {
        self.discounts = discounts;
        self
    }

    pub fn catalog(&self) -> &'a SkillCatalog {
        self.catalog
    }

    /// Skills from the root of the chain down to `skill`, inclusive.
    pub fn chain<'s>(&'s self, skill: &'s Skill) -> Result<Vec<&'s Skill>, SkillError> {
        let mut visited = HashSet::from([skill.id]);
        let mut chain = vec![skill];
        let mut current = skill;

        while let Some(prereq_id) = self.resolver.prerequisite_of(current, self.catalog) {
            if !visited.insert(prereq_id) {
                return Err(SkillError::CyclicPrerequisite { skill_id: prereq_id });
            }
            let prereq = self.catalog.require(prereq_id)?;
            chain.push(prereq);
            current = prereq;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Price the full chain ending at `skill`.
    pub fn chain_cost(&self, skill: &Skill, levels: &LevelMap) -> Result<ChainCost, SkillError> {
        let chain = self.chain(skill)?;

        let mut steps = Vec::with_capacity(chain.len());
        let mut total_cost: u32 = 0;

        for link in chain {
            let original_cost = link
                .need_skill_point
                .ok_or(SkillError::IncompleteCostData { skill_id: link.id })?;
            let level = levels.level_of(link.id);
            let actual_cost = self.discounts.apply(link.id, original_cost, level)?;

            total_cost = total_cost
                .checked_add(actual_cost)
                .ok_or(SkillError::CostOverflow { skill_id: skill.id })?;
            steps.push(ChainStep {
                skill_id: link.id,
                name: link.name.clone(),
                level,
                original_cost,
                // In range: apply() succeeded for this level
                discount: self.discounts.discount(level).unwrap_or_default(),
                actual_cost,
            });
        }

        Ok(ChainCost {
            skill_id: skill.id,
            total_cost,
            steps,
        })
    }
}

/// Chain cost of `skill` with group-rate resolution and standard discounts.
pub fn compute_chain_cost(
    skill: &Skill,
    catalog: &SkillCatalog,
    levels: &LevelMap,
) -> Result<ChainCost, SkillError> {
    ChainCalculator::new(catalog).chain_cost(skill, levels)
}
