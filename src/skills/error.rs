//! Error kinds for the prerequisite-chain calculator.

use super::catalog::SkillId;

/// Errors returned by the resolver, chain calculator and evaluator.
///
/// Every variant that concerns a specific skill names it, so the caller can
/// report which catalog entry needs fixing.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SkillError {
    /// Walking the prerequisite chain revisited a skill already on the path.
    #[error("cyclic prerequisite chain at skill {skill_id}")]
    CyclicPrerequisite { skill_id: SkillId },

    /// A skill in the chain has no known base cost.
    #[error("skill {skill_id} has no need_skill_point; chain cost is undefined")]
    IncompleteCostData { skill_id: SkillId },

    /// The summed chain cost does not fit in a `u32`.
    #[error("chain cost of skill {skill_id} overflows")]
    CostOverflow { skill_id: SkillId },

    /// The chain cost is zero, so efficiency cannot be computed.
    #[error("chain cost of skill {skill_id} is zero")]
    DivideByZero { skill_id: SkillId },

    /// An upgrade level is outside the discount table.
    #[error("level {level} of skill {skill_id} is out of range (max {max})")]
    LevelOutOfRange {
        skill_id: SkillId,
        level: u8,
        max: u8,
    },

    /// A prerequisite edge or lookup refers to an id missing from the catalog.
    #[error("skill {0} is not in the catalog")]
    UnknownSkill(SkillId),

    /// The same id appeared twice while building a catalog.
    #[error("skill {0} appears more than once in the catalog")]
    DuplicateSkill(SkillId),

    /// The skill has no effect magnitude to evaluate.
    #[error("skill {skill_id} has no effect value")]
    MissingEffectValue { skill_id: SkillId },

    /// The discount table violates its invariants.
    #[error("invalid discount table: {0}")]
    InvalidDiscountTable(String),
}
