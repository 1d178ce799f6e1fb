//! Skill data embedded in page scripts (`__NEXT_DATA__` and other JSON
//! script tags), plus folding rendered card fields into it.

use anyhow::Result;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

use super::course_page::{split_effects, SkillCard};
use crate::skills::{Skill, SkillId};

/// Skill object as it appears in the script payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadSkill {
    id: u32,
    name: String,
    #[serde(default)]
    rarity: Option<Value>,
    #[serde(default)]
    rarity_value: Option<u32>,
    group_id: u32,
    #[serde(default)]
    group_rate: Option<u32>,
    #[serde(default)]
    grade_value: Option<i64>,
    #[serde(default)]
    icon_id: Option<u32>,
    #[serde(default)]
    need_skill_point: Option<u32>,
    #[serde(default, alias = "descriptions")]
    description: Option<String>,
    #[serde(default)]
    memo: Option<String>,
}

/// Rank of a rarity label; unknown labels have none.
pub fn rarity_rank(label: &str) -> Option<u32> {
    match label.trim().to_ascii_lowercase().as_str() {
        "normal" | "white" => Some(1),
        "gold" | "rare" => Some(2),
        "unique" => Some(3),
        "evolution" | "evolved" => Some(4),
        _ => None,
    }
}

impl PayloadSkill {
    /// `None` when rarity or group rate is unknown: either one would make
    /// prerequisite resolution guess.
    fn into_skill(self) -> Option<Skill> {
        let group_rate = self.group_rate?;
        let label = match &self.rarity {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        let rarity_value = self
            .rarity_value
            .or_else(|| match &self.rarity {
                Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
                _ => None,
            })
            .or_else(|| label.as_deref().and_then(rarity_rank))?;

        Some(Skill {
            id: SkillId(self.id),
            name: self.name,
            rarity_value,
            rarity: label,
            group_id: self.group_id,
            group_rate,
            need_skill_point: self.need_skill_point,
            grade_value: self.grade_value,
            icon_id: self.icon_id,
            description: self.description.unwrap_or_default(),
            memo: self.memo.unwrap_or_default(),
            ..Default::default()
        })
    }
}

/// Parser for skill data embedded in script tags
pub struct SkillPayloadParser;

impl SkillPayloadParser {
    /// Extract skills from every JSON script on the page, first occurrence
    /// of an id wins.
    pub fn parse(html: &str) -> Result<Vec<Skill>> {
        let document = Html::parse_document(html);
        let mut skills = Vec::new();
        let mut seen = HashSet::new();

        for selector in [r#"script#__NEXT_DATA__"#, r#"script[type="application/json"]"#] {
            let Ok(selector) = Selector::parse(selector) else {
                continue;
            };
            for script in document.select(&selector) {
                let text = script.text().collect::<String>();
                let Ok(value) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                for skill in Self::from_value(&value) {
                    if seen.insert(skill.id) {
                        skills.push(skill);
                    }
                }
            }
        }

        Ok(skills)
    }

    /// Collect skill-shaped objects anywhere in a JSON tree
    pub fn from_value(value: &Value) -> Vec<Skill> {
        let mut skills = Vec::new();
        let mut stack = vec![value];

        while let Some(node) = stack.pop() {
            match node {
                Value::Object(map) => {
                    if is_skill_shaped(map) {
                        match serde_json::from_value::<PayloadSkill>(node.clone())
                            .ok()
                            .and_then(PayloadSkill::into_skill)
                        {
                            Some(skill) => {
                                skills.push(skill);
                                continue;
                            }
                            None => warn!(
                                "Skipping skill {} without a usable rarity or groupRate",
                                map.get("id").unwrap_or(&serde_json::Value::Null)
                            ),
                        }
                    }
                    stack.extend(map.values().rev());
                }
                Value::Array(items) => stack.extend(items.iter().rev()),
                _ => {}
            }
        }

        skills
    }
}

fn is_skill_shaped(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("id")
        && map.contains_key("name")
        && map.contains_key("groupId")
        && (map.contains_key("rarityValue") || map.contains_key("rarity"))
}

/// Outcome of folding cards into payload skills
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub merged: usize,
    /// Cards that matched no skill, or only an ambiguous name
    pub unmatched: Vec<String>,
}

/// Fold rendered card fields into payload skills.
///
/// Cards carrying a skill id match by id. Cards without one match by name,
/// but only when exactly one skill has that name.
pub fn merge_cards(skills: &mut [Skill], cards: &[SkillCard]) -> MergeReport {
    let by_id: HashMap<SkillId, usize> = skills.iter().enumerate().map(|(i, s)| (s.id, i)).collect();

    let mut by_name: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, skill) in skills.iter().enumerate() {
        by_name.entry(skill.name.as_str()).or_default().push(i);
    }
    let unique_names: HashMap<String, usize> = by_name
        .into_iter()
        .filter(|(_, idx)| idx.len() == 1)
        .map(|(name, idx)| (name.to_string(), idx[0]))
        .collect();

    let mut report = MergeReport::default();
    for card in cards {
        let target = match card.skill_id {
            Some(id) => by_id.get(&id).copied(),
            None => unique_names.get(&card.name).copied(),
        };

        match target {
            Some(i) => {
                apply_card(&mut skills[i], card);
                report.merged += 1;
            }
            None => report.unmatched.push(card.name.clone()),
        }
    }
    report
}

fn apply_card(skill: &mut Skill, card: &SkillCard) {
    if !card.effect.is_empty() {
        skill.effect = card.effect.clone();
        skill.effect_list = split_effects(&card.effect);
    }
    if skill.effect_value.is_none() {
        skill.effect_value = card.effect_value();
    }
    if skill.description.is_empty() {
        skill.description = card.description.clone();
    }
    if card.icon.is_some() {
        skill.icon = card.icon.clone();
    }
}
