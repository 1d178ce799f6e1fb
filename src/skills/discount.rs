//! Upgrade levels and the discount table they index.
//!
//! Discounts are held as integer basis points so that discounted costs round
//! half-up exactly, without floating point drift (90 pt at 35% off is 58.5,
//! which must become 59).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::catalog::SkillId;
use super::error::SkillError;

/// Per-skill upgrade level (0 = no discount).
pub type UpgradeLevel = u8;

const BASIS: u64 = 10_000;

/// Standard discount fractions by level.
pub const STANDARD_DISCOUNTS: [f64; 6] = [0.0, 0.10, 0.20, 0.30, 0.35, 0.40];

/// Validated discount lookup indexed by upgrade level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DiscountTable {
    basis_points: Vec<u32>,
}

impl DiscountTable {
    /// Build a table from discount fractions.
    ///
    /// The first entry must be 0, entries must lie in `[0, 1]` in whole
    /// basis points (0.01%) and never decrease, and there can be at most
    /// 256 levels.
    pub fn new(fractions: &[f64]) -> Result<Self, SkillError> {
        if fractions.is_empty() {
            return Err(SkillError::InvalidDiscountTable("table is empty".into()));
        }
        if fractions.len() > usize::from(UpgradeLevel::MAX) + 1 {
            return Err(SkillError::InvalidDiscountTable(format!(
                "{} levels exceeds the maximum of 256",
                fractions.len()
            )));
        }

        let mut basis_points = Vec::with_capacity(fractions.len());
        for (level, &fraction) in fractions.iter().enumerate() {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(SkillError::InvalidDiscountTable(format!(
                    "discount {} at level {} is outside [0, 1]",
                    fraction, level
                )));
            }
            let scaled = fraction * BASIS as f64;
            let bp = scaled.round();
            if (scaled - bp).abs() > 1e-6 {
                return Err(SkillError::InvalidDiscountTable(format!(
                    "discount {} at level {} is finer than 0.01%",
                    fraction, level
                )));
            }
            let bp = bp as u32;
            if let Some(&prev) = basis_points.last() {
                if bp < prev {
                    return Err(SkillError::InvalidDiscountTable(format!(
                        "discount decreases at level {}",
                        level
                    )));
                }
            }
            basis_points.push(bp);
        }

        if basis_points[0] != 0 {
            return Err(SkillError::InvalidDiscountTable(
                "level 0 must have no discount".into(),
            ));
        }

        Ok(Self { basis_points })
    }

    /// Highest valid level.
    pub fn max_level(&self) -> UpgradeLevel {
        // Length is bounded to 1..=256 by construction
        (self.basis_points.len() - 1) as UpgradeLevel
    }

    /// Discount fraction for a level, if the level is in range.
    pub fn discount(&self, level: UpgradeLevel) -> Option<f64> {
        self.basis_points
            .get(usize::from(level))
            .map(|&bp| f64::from(bp) / BASIS as f64)
    }

    /// Discounted cost of `skill_id` at `level`, rounded half-up.
    pub fn apply(
        &self,
        skill_id: SkillId,
        base_cost: u32,
        level: UpgradeLevel,
    ) -> Result<u32, SkillError> {
        let bp = self
            .basis_points
            .get(usize::from(level))
            .copied()
            .ok_or(SkillError::LevelOutOfRange {
                skill_id,
                level,
                max: self.max_level(),
            })?;

        let scaled = u64::from(base_cost) * (BASIS - u64::from(bp));
        // Result never exceeds base_cost, so it fits in u32
        Ok(((scaled + BASIS / 2) / BASIS) as u32)
    }
}

impl Default for DiscountTable {
    fn default() -> Self {
        Self {
            basis_points: vec![0, 1_000, 2_000, 3_000, 3_500, 4_000],
        }
    }
}

impl TryFrom<Vec<f64>> for DiscountTable {
    type Error = SkillError;

    fn try_from(fractions: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(&fractions)
    }
}

impl From<DiscountTable> for Vec<f64> {
    fn from(table: DiscountTable) -> Self {
        table
            .basis_points
            .iter()
            .map(|&bp| f64::from(bp) / BASIS as f64)
            .collect()
    }
}

/// Caller-supplied upgrade levels; absent skills are level 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelMap(HashMap<SkillId, UpgradeLevel>);

impl LevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, skill_id: SkillId, level: UpgradeLevel) {
        self.0.insert(skill_id, level);
    }

    /// Builder-style `set`.
    pub fn with(mut self, skill_id: SkillId, level: UpgradeLevel) -> Self {
        self.set(skill_id, level);
        self
    }

    pub fn level_of(&self, skill_id: SkillId) -> UpgradeLevel {
        self.0.get(&skill_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SkillId, UpgradeLevel)> for LevelMap {
    fn from_iter<T: IntoIterator<Item = (SkillId, UpgradeLevel)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_standard() {
        let table = DiscountTable::new(&STANDARD_DISCOUNTS).unwrap();
        assert_eq!(table, DiscountTable::default());
        assert_eq!(table.max_level(), 5);
        assert_eq!(table.discount(3), Some(0.30));
        assert_eq!(table.discount(6), None);
    }

    #[test]
    fn test_apply_rounds_half_up() {
        let table = DiscountTable::default();
        let id = SkillId(1);

        assert_eq!(table.apply(id, 90, 0).unwrap(), 90);
        // 90 * 0.7 = 63
        assert_eq!(table.apply(id, 90, 3).unwrap(), 63);
        // 110 * 0.8 = 88
        assert_eq!(table.apply(id, 110, 2).unwrap(), 88);
        // 90 * 0.65 = 58.5 -> 59
        assert_eq!(table.apply(id, 90, 4).unwrap(), 59);
        // 5 * 0.9 = 4.5 -> 5
        assert_eq!(table.apply(id, 5, 1).unwrap(), 5);
    }

    #[test]
    fn test_apply_level_out_of_range() {
        let table = DiscountTable::default();
        let err = table.apply(SkillId(7), 100, 6).unwrap_err();
        assert_eq!(
            err,
            SkillError::LevelOutOfRange {
                skill_id: SkillId(7),
                level: 6,
                max: 5
            }
        );
    }

    #[test]
    fn test_invalid_tables_rejected() {
        assert!(DiscountTable::new(&[]).is_err());
        assert!(DiscountTable::new(&[0.1, 0.2]).is_err());
        assert!(DiscountTable::new(&[0.0, 0.3, 0.2]).is_err());
        assert!(DiscountTable::new(&[0.0, 1.5]).is_err());
        assert!(DiscountTable::new(&[0.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_sub_basis_point_discount_rejected() {
        let err = DiscountTable::new(&[0.0, 0.00005]).unwrap_err();
        assert!(matches!(err, SkillError::InvalidDiscountTable(_)));

        // Whole basis points, including ones that are inexact in binary
        let table = DiscountTable::new(&[0.0, 0.0001, 0.35]).unwrap();
        assert_eq!(table.apply(SkillId(1), 10_000, 1).unwrap(), 9_999);
        assert_eq!(table.apply(SkillId(1), 90, 2).unwrap(), 59);
    }

    #[test]
    fn test_table_serde_as_fractions() {
        let table: DiscountTable = serde_json::from_str("[0, 0.25, 0.5]").unwrap();
        assert_eq!(table.max_level(), 2);
        assert_eq!(serde_json::to_string(&table).unwrap(), "[0.0,0.25,0.5]");

        let bad: Result<DiscountTable, _> = serde_json::from_str("[0.5]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_level_map_defaults_to_zero() {
        let levels: LevelMap = serde_json::from_str(r#"{"200022": 3}"#).unwrap();
        assert_eq!(levels.level_of(SkillId(200022)), 3);
        assert_eq!(levels.level_of(SkillId(200021)), 0);
    }
}
