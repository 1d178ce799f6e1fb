//! Efficiency: effect delivered per skill point spent on the whole chain.
//!
//! `efficiency = effect_value * 100 / chain_cost`

use serde::Serialize;

use super::catalog::{Skill, SkillCatalog, SkillId};
use super::chain::{ChainCalculator, ChainCost};
use super::discount::LevelMap;
use super::error::SkillError;
use super::resolver::{GroupRateResolver, ResolvePrerequisite};

/// Efficiency of one skill with the chain cost it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillEfficiency {
    pub skill_id: SkillId,
    pub name: String,
    pub effect_value: f64,
    pub efficiency: f64,
    pub chain: ChainCost,
}

/// A skill that could not be ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankFailure {
    pub skill_id: SkillId,
    pub reason: String,
    #[serde(skip)]
    pub error: SkillError,
}

/// Ranked skills, best first, plus those that failed to evaluate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ranking {
    pub ranked: Vec<SkillEfficiency>,
    pub failures: Vec<RankFailure>,
}

/// Scores skills against their chain cost.
pub struct EfficiencyEvaluator<'a, R = GroupRateResolver> {
    calculator: ChainCalculator<'a, R>,
}

impl<'a, R: ResolvePrerequisite> EfficiencyEvaluator<'a, R> {
    pub fn new(calculator: ChainCalculator<'a, R>) -> Self {
        Self { calculator }
    }

    /// Score a single skill.
    pub fn evaluate(&self, skill: &Skill, levels: &LevelMap) -> Result<SkillEfficiency, SkillError> {
        let effect_value = skill
            .effect_value
            .ok_or(SkillError::MissingEffectValue { skill_id: skill.id })?;

        let chain = self.calculator.chain_cost(skill, levels)?;
        if chain.total_cost == 0 {
            return Err(SkillError::DivideByZero { skill_id: skill.id });
        }

        Ok(SkillEfficiency {
            skill_id: skill.id,
            name: skill.name.clone(),
            effect_value,
            efficiency: effect_value * 100.0 / f64::from(chain.total_cost),
            chain,
        })
    }

    /// Score every skill in the catalog.
    ///
    /// Ordered by efficiency descending, ties by ascending id. A failing
    /// skill is recorded in `failures` and does not affect the others.
    pub fn rank(&self, levels: &LevelMap) -> Ranking {
        let mut ranking = Ranking::default();

        for skill in self.calculator.catalog().iter() {
            match self.evaluate(skill, levels) {
                Ok(scored) => ranking.ranked.push(scored),
                Err(error) => ranking.failures.push(RankFailure {
                    skill_id: skill.id,
                    reason: error.to_string(),
                    error,
                }),
            }
        }

        ranking.ranked.sort_by(|a, b| {
            b.efficiency
                .total_cmp(&a.efficiency)
                .then_with(|| a.skill_id.cmp(&b.skill_id))
        });

        ranking
    }
}

/// Efficiency of `skill` with group-rate resolution and standard discounts.
pub fn efficiency(skill: &Skill, catalog: &SkillCatalog, levels: &LevelMap) -> Result<f64, SkillError> {
    EfficiencyEvaluator::new(ChainCalculator::new(catalog))
        .evaluate(skill, levels)
        .map(|scored| scored.efficiency)
}

/// Rank the whole catalog with group-rate resolution and standard discounts.
pub fn rank_by_efficiency(catalog: &SkillCatalog, levels: &LevelMap) -> Ranking {
    EfficiencyEvaluator::new(ChainCalculator::new(catalog)).rank(levels)
}
