//! Skill catalog and the prerequisite-chain cost/efficiency calculator.
//!
//! Pure computation over in-memory data: Catalog -> Resolver -> Calculator ->
//! Evaluator. Nothing here performs I/O or logs; errors go back to the caller.

pub mod catalog;
pub mod chain;
pub mod discount;
pub mod efficiency;
pub mod error;
pub mod resolver;

pub use catalog::{Skill, SkillCatalog, SkillId};
pub use chain::{compute_chain_cost, ChainCalculator, ChainCost, ChainStep};
pub use discount::{DiscountTable, LevelMap, UpgradeLevel, STANDARD_DISCOUNTS};
pub use efficiency::{
    efficiency, rank_by_efficiency, EfficiencyEvaluator, RankFailure, Ranking, SkillEfficiency,
};
pub use error::SkillError;
pub use resolver::{resolve_prerequisite, GroupRateResolver, PrerequisiteTable, ResolvePrerequisite};
