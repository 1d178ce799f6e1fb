//! Web scraper for course skill effect pages.
//!
//! Fetches or renders a page, extracts skill cards and the embedded skill
//! payload, and merges them into catalog-ready skills.

pub mod browser;
pub mod cache;
pub mod fetch;
pub mod parsers;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use url::Url;

pub use browser::Browser;
pub use cache::SnapshotStore;

use crate::config::ScraperConfig;
use crate::retry::{retry, RetryPolicy};
use crate::skills::Skill;
use parsers::{merge_cards, CoursePageParser, HeadlineInfo, SkillCard, SkillPayloadParser};

/// Base URL of the companion site (ウマ娘.攻略.tools)
pub const BASE_URL: &str = "https://xn--gck1f423k.xn--1bvt37a.tools";

/// Build a course effect URL
pub fn course_effects_url(course_id: &str, effect_type: &str) -> String {
    format!("{}/race/courses/{}/effects/{}", BASE_URL, course_id, effect_type)
}

/// Course and effect identifiers taken from a page URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParams {
    pub course_id: Option<String>,
    pub effect_type: Option<String>,
}

impl UrlParams {
    /// Parse `/race/courses/<course>/effects/<effect>` style URLs
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|part| !part.is_empty()).collect())
            .unwrap_or_default();

        let after = |marker: &str| {
            segments
                .iter()
                .position(|part| *part == marker)
                .and_then(|i| segments.get(i + 1))
                .map(|part| part.to_string())
        };

        Ok(Self {
            course_id: after("courses"),
            effect_type: after("effects"),
        })
    }

    /// Snapshot key for this page
    fn snapshot_key(&self) -> String {
        format!(
            "{}-{}",
            self.course_id.as_deref().unwrap_or("unknown"),
            self.effect_type.as_deref().unwrap_or("unknown")
        )
    }
}

/// Where the skill list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Embedded script payload merged with HTML cards
    Script,
    /// HTML cards only
    Html,
}

/// Everything extracted from one course effect page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub url_params: UrlParams,
    pub headline: String,
    pub headline_info: HeadlineInfo,
    pub data_source: DataSource,
    pub skill_list: Vec<Skill>,
    pub skill_cards: Vec<SkillCard>,
    /// Card names that could not be matched to a payload skill
    pub unmatched_cards: Vec<String>,
    pub total_groups: usize,
}

/// Parse a page already in hand
pub fn parse_course_page(url: &str, html: &str) -> Result<ScrapeResult> {
    let url_params = UrlParams::parse(url)?;
    let page = CoursePageParser::parse(html)?;
    let mut skills = SkillPayloadParser::parse(html)?;

    let (data_source, unmatched_cards) = if skills.is_empty() {
        (DataSource::Html, Vec::new())
    } else {
        let report = merge_cards(&mut skills, &page.skill_cards);
        (DataSource::Script, report.unmatched)
    };

    let total_groups = skills.iter().map(|s| s.group_id).collect::<HashSet<_>>().len();

    Ok(ScrapeResult {
        url: url.to_string(),
        url_params,
        headline_info: HeadlineInfo::parse(&page.headline),
        headline: page.headline,
        data_source,
        skill_list: skills,
        skill_cards: page.skill_cards,
        unmatched_cards,
        total_groups,
    })
}

/// Scrapes course pages with snapshot reuse
pub struct CourseScraper {
    config: ScraperConfig,
    snapshots: SnapshotStore,
}

impl CourseScraper {
    pub fn new(config: ScraperConfig) -> Self {
        let snapshots = SnapshotStore::new(
            config.snapshot_dir.clone(),
            Duration::hours(config.snapshot_ttl_hours),
        );
        Self { config, snapshots }
    }

    /// Scrape `url`, rendering in Chrome when `render` is set
    pub async fn scrape(&self, url: &str, render: bool) -> Result<ScrapeResult> {
        let key = UrlParams::parse(url)?.snapshot_key();
        if let Some(cached) = self.snapshots.get::<ScrapeResult>(&key) {
            if cached.url == url {
                info!("Using snapshot for {}", url);
                return Ok(cached);
            }
        }

        let html = if render {
            self.render(url).await?
        } else {
            let client = fetch::client(&self.config)?;
            fetch::fetch_html(&client, url).await?
        };

        let result = parse_course_page(url, &html)?;
        info!(
            "Scraped {}: {} skills, {} cards, {} groups ({:?})",
            url,
            result.skill_list.len(),
            result.skill_cards.len(),
            result.total_groups,
            result.data_source
        );
        if !result.unmatched_cards.is_empty() {
            warn!("{} cards not matched to a skill", result.unmatched_cards.len());
        }

        if let Err(e) = self.snapshots.put(&key, &result) {
            warn!("Failed to save snapshot: {:#}", e);
        }

        Ok(result)
    }

    async fn render(&self, url: &str) -> Result<String> {
        let browser = Browser::launch(&self.config).await?;
        let html = retry(&RetryPolicy::render(), "render", || browser.render(url)).await;
        browser.close().await?;
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_params() {
        let params = UrlParams::parse(
            "https://xn--gck1f423k.xn--1bvt37a.tools/race/courses/10301/effects/betweener",
        )
        .unwrap();
        assert_eq!(params.course_id.as_deref(), Some("10301"));
        assert_eq!(params.effect_type.as_deref(), Some("betweener"));
    }

    #[test]
    fn test_url_params_missing_segments() {
        let params = UrlParams::parse("https://example.com/race/courses/").unwrap();
        assert_eq!(params.course_id, None);
        assert_eq!(params.effect_type, None);
    }

    #[test]
    fn test_url_params_invalid() {
        assert!(UrlParams::parse("not a url").is_err());
    }

    #[test]
    fn test_course_effects_url_round_trips() {
        let url = course_effects_url("10708", "leader");
        let params = UrlParams::parse(&url).unwrap();
        assert_eq!(params.course_id.as_deref(), Some("10708"));
        assert_eq!(params.effect_type.as_deref(), Some("leader"));
    }

    const PAGE: &str = r#"<html><head>
<script id="__NEXT_DATA__" type="application/json">
{"skills": [
  {"id": 200022, "name": "左回り○", "rarity": "normal", "groupId": 20002, "groupRate": 1, "needSkillPoint": 90},
  {"id": 200024, "name": "左回りの鬼", "rarity": "gold", "groupId": 20002, "groupRate": 3, "needSkillPoint": 130},
  {"id": 100011, "name": "弧線のプロフェッサー", "rarity": "gold", "groupId": 10001, "groupRate": 2}
]}
</script></head><body>
<div class="headlineDefault_component_headlineDefault__body">東京 芝1600m</div>
<div class="courseSkillEffectTable_component_courseSkillEffectTable">
  <div class="skillCard"><span class="skillCard__name">左回り○</span><span class="skillCard__effect">0.25バ</span></div>
  <div class="skillCard" data-skill-id="200024"><span class="skillCard__name">左回りの鬼</span><span class="skillCard__effect">0.72バ</span></div>
</div></body></html>"#;

    #[test]
    fn test_parse_course_page_merges_payload() {
        let url = course_effects_url("10301", "betweener");
        let result = parse_course_page(&url, PAGE).unwrap();

        assert_eq!(result.data_source, DataSource::Script);
        assert_eq!(result.headline_info.distance, Some(1600));
        assert_eq!(result.skill_list.len(), 3);
        assert_eq!(result.total_groups, 2);
        assert!(result.unmatched_cards.is_empty());

        let demon = result.skill_list.iter().find(|s| s.id.0 == 200024).unwrap();
        assert_eq!(demon.effect_value, Some(0.72));
    }

    #[test]
    fn test_parse_course_page_html_only() {
        let html = r#"<div class="courseSkillEffectTable_component_courseSkillEffectTable">
            <div class="skillCard"><span class="skillCard__name">x</span></div></div>"#;
        let result = parse_course_page("https://example.com/race/courses/1/effects/a", html).unwrap();

        assert_eq!(result.data_source, DataSource::Html);
        assert!(result.skill_list.is_empty());
        assert_eq!(result.skill_cards.len(), 1);
    }
}
