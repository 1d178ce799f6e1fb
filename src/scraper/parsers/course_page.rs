//! Course effect page parser: headline and skill cards.

use anyhow::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::skills::SkillId;

const HEADLINE_SELECTOR: &str = r#"[class*="headlineDefault_component_headlineDefault__body"]"#;
const TABLE_SELECTOR: &str = r#"[class*="courseSkillEffectTable_component_courseSkillEffectTable"]"#;
const CARD_SELECTOR: &str = r#"[class*="skillCard"]"#;
const CARD_CLASS: &str = "skillCard";

/// Headline used when the page has none
pub const MISSING_HEADLINE: &str = "未找到標題";

static SKILL_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/skills/(\d+)").expect("valid skill href regex"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid number regex"));

/// Image found on a skill card
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CardImage {
    pub src: String,
    pub alt: String,
}

/// One skill card as rendered in the effect table
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SkillCard {
    /// Id from `data-skill-id` or a `/skills/<id>` link, when the card has one
    pub skill_id: Option<SkillId>,
    pub name: String,
    pub effect: String,
    pub effect_list: Vec<String>,
    pub description: String,
    pub icon: Option<String>,
    pub images: Vec<CardImage>,
    /// Hint spinner state
    pub value: String,
    pub min_value: String,
    pub max_value: String,
    pub data_attributes: BTreeMap<String, String>,
    pub row_index: usize,
}

impl SkillCard {
    /// First number in the effect text (e.g. "0.72" from "0.72バ").
    pub fn effect_value(&self) -> Option<f64> {
        NUMBER_RE
            .captures(&self.effect)
            .and_then(|caps| caps[1].parse().ok())
    }
}

/// Parsed course effect page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoursePage {
    pub headline: String,
    pub skill_cards: Vec<SkillCard>,
}

/// Parser for course effect pages
pub struct CoursePageParser;

impl CoursePageParser {
    /// Parse headline and skill cards from HTML
    pub fn parse(html: &str) -> Result<CoursePage> {
        let document = Html::parse_document(html);

        let headline = Self::parse_headline(&document);
        let skill_cards = Self::parse_cards(&document);

        Ok(CoursePage {
            headline: if headline.is_empty() {
                MISSING_HEADLINE.to_string()
            } else {
                headline
            },
            skill_cards,
        })
    }

    fn parse_headline(document: &Html) -> String {
        let Ok(selector) = Selector::parse(HEADLINE_SELECTOR) else {
            return String::new();
        };
        document
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn parse_cards(document: &Html) -> Vec<SkillCard> {
        let (Ok(table_sel), Ok(card_sel)) =
            (Selector::parse(TABLE_SELECTOR), Selector::parse(CARD_SELECTOR))
        else {
            return Vec::new();
        };

        let mut cards = Vec::new();
        for table in document.select(&table_sel) {
            // Nested matches (skillCard__name etc.) belong to their outer card
            for element in table.select(&card_sel).filter(|el| !has_card_ancestor(el, &table)) {
                let card = Self::parse_card(element);
                if !card.name.is_empty() || !card.effect.is_empty() || !card.description.is_empty() {
                    cards.push(card);
                }
            }
        }
        cards
    }

    fn parse_card(card: ElementRef) -> SkillCard {
        let name = first_text(card, r#"[class*="skillCard__name"], [class*="name"]"#);
        let effect = first_text(card, r#"[class*="skillCard__effect"], [class*="effect"]"#);
        let description = first_text(card, r#"[class*="description"], [class*="desc"]"#);

        let effect_list = split_effects(&effect);

        let images: Vec<CardImage> = select_all(card, "img")
            .filter_map(|img| {
                img.value().attr("src").map(|src| CardImage {
                    src: src.to_string(),
                    alt: img.value().attr("alt").unwrap_or_default().to_string(),
                })
            })
            .collect();
        let icon = images.first().map(|img| img.src.clone());

        let (value, min_value, max_value) =
            match select_all(card, r#"[class*="hintSpinner"] input, [class*="spinner"] input"#).next() {
                Some(input) => (
                    attr(input, "value"),
                    attr(input, "min"),
                    attr(input, "max"),
                ),
                None => Default::default(),
            };

        let data_attributes: BTreeMap<String, String> = card
            .value()
            .attrs()
            .filter(|(key, _)| key.starts_with("data-"))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let row_index = card
            .prev_siblings()
            .filter(|node| node.value().is_element())
            .count();

        SkillCard {
            skill_id: Self::card_skill_id(card, &data_attributes),
            name,
            effect,
            effect_list,
            description,
            icon,
            images,
            value,
            min_value,
            max_value,
            data_attributes,
            row_index,
        }
    }

    fn card_skill_id(card: ElementRef, data: &BTreeMap<String, String>) -> Option<SkillId> {
        if let Some(id) = data.get("data-skill-id").and_then(|v| v.trim().parse().ok()) {
            return Some(SkillId(id));
        }

        select_all(card, "a[href]")
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| SKILL_HREF_RE.captures(href))
            .and_then(|caps| caps[1].parse().ok())
            .map(SkillId)
    }
}

/// Split effect text on 、 and , into trimmed, non-empty items
pub fn split_effects(effect: &str) -> Vec<String> {
    effect
        .split(['、', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_card_ancestor(element: &ElementRef, table: &ElementRef) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != table.id())
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().attr("class").is_some_and(|c| c.contains(CARD_CLASS)))
}

fn select_all<'a>(root: ElementRef<'a>, css: &str) -> impl Iterator<Item = ElementRef<'a>> {
    let selector = Selector::parse(css).ok();
    selector
        .map(|sel| root.select(&sel).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
}

fn first_text(root: ElementRef, css: &str) -> String {
    select_all(root, css)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn attr(element: ElementRef, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().to_string()
}
