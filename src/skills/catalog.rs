//! Skill catalog: immutable, id-indexed skill records.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::error::SkillError;

/// Stable numeric skill identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub u32);

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SkillId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A single catalog entry.
///
/// Core fields drive prerequisite resolution and cost; the descriptive
/// fields are carried through from the scraped payload for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    /// Ordinal rank of the rarity tier (lower = more common)
    pub rarity_value: u32,
    /// Rarity label as scraped ("normal", "gold", "unique", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    pub group_id: u32,
    /// Evolution order within the group
    pub group_rate: u32,
    /// Base point cost before discounts
    #[serde(default)]
    pub need_skill_point: Option<u32>,
    /// Effect magnitude used for efficiency
    #[serde(default)]
    pub effect_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
    /// Effect text as shown on the skill card
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub effect: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effect_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Id-indexed set of skills with a group index for sibling lookups.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: BTreeMap<SkillId, Skill>,
    groups: HashMap<u32, Vec<SkillId>>,
}

impl SkillCatalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn from_skills<I>(skills: I) -> Result<Self, SkillError>
    where
        I: IntoIterator<Item = Skill>,
    {
        let mut catalog = Self::default();
        for skill in skills {
            if catalog.skills.contains_key(&skill.id) {
                return Err(SkillError::DuplicateSkill(skill.id));
            }
            catalog.groups.entry(skill.group_id).or_default().push(skill.id);
            catalog.skills.insert(skill.id, skill);
        }
        Ok(catalog)
    }

    /// Load a catalog from a JSON array of skills.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let skills: Vec<Skill> = serde_json::from_str(json)?;
        Ok(Self::from_skills(skills)?)
    }

    pub fn get(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    /// Look up a skill, failing with `UnknownSkill` when absent.
    pub fn require(&self, id: SkillId) -> Result<&Skill, SkillError> {
        self.get(id).ok_or(SkillError::UnknownSkill(id))
    }

    /// Skills in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Number of distinct groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Other skills sharing the group of `skill`.
    pub fn related_skills<'a>(&'a self, skill: &Skill) -> Vec<&'a Skill> {
        self.groups
            .get(&skill.group_id)
            .into_iter()
            .flatten()
            .filter(|&&id| id != skill.id)
            .filter_map(|id| self.skills.get(id))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn skill(id: u32, name: &str, rarity: u32, group: u32, rate: u32, cost: u32) -> Skill {
        Skill {
            id: SkillId(id),
            name: name.to_string(),
            rarity_value: rarity,
            group_id: group,
            group_rate: rate,
            need_skill_point: Some(cost),
            ..Default::default()
        }
    }

    /// 左回り chain: ○ (normal) -> ◎ (normal) -> の鬼 (gold)
    pub fn left_turn_catalog() -> SkillCatalog {
        let mut circle = skill(200022, "左回り○", 1, 20002, 1, 90);
        circle.effect_value = Some(0.25);
        let mut double = skill(200021, "左回り◎", 1, 20002, 2, 110);
        double.effect_value = Some(0.37);
        let mut demon = skill(200024, "左回りの鬼", 2, 20002, 3, 130);
        demon.effect_value = Some(0.72);

        SkillCatalog::from_skills([circle, double, demon]).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_related_skills_excludes_self() {
        let catalog = left_turn_catalog();
        let demon = catalog.get(SkillId(200024)).unwrap();

        let mut related: Vec<_> = catalog.related_skills(demon).iter().map(|s| s.id).collect();
        related.sort();

        assert_eq!(related, vec![SkillId(200021), SkillId(200022)]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = SkillCatalog::from_skills([
            skill(1, "a", 1, 1, 1, 10),
            skill(1, "b", 1, 1, 2, 10),
        ]);
        assert_eq!(result.unwrap_err(), SkillError::DuplicateSkill(SkillId(1)));
    }

    #[test]
    fn test_from_json_camel_case() {
        let json = r#"[
            {"id": 200022, "name": "左回り○", "rarityValue": 1, "groupId": 20002,
             "groupRate": 1, "needSkillPoint": 90, "effectValue": 0.25},
            {"id": 200024, "name": "左回りの鬼", "rarityValue": 2, "groupId": 20002,
             "groupRate": 3, "needSkillPoint": null}
        ]"#;

        let catalog = SkillCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.group_count(), 1);
        assert_eq!(catalog.get(SkillId(200022)).unwrap().need_skill_point, Some(90));
        assert_eq!(catalog.get(SkillId(200024)).unwrap().need_skill_point, None);
        assert_eq!(catalog.get(SkillId(200024)).unwrap().effect_value, None);
    }

    #[test]
    fn test_require_unknown() {
        let catalog = left_turn_catalog();
        assert_eq!(
            catalog.require(SkillId(1)).unwrap_err(),
            SkillError::UnknownSkill(SkillId(1))
        );
    }
}
