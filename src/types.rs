//! Request and response types for the skill API.

use serde::{Deserialize, Serialize};

use crate::scraper::{DataSource, UrlParams};
use crate::scraper::parsers::{HeadlineInfo, SkillCard};
use crate::skills::{LevelMap, Skill, SkillEfficiency, RankFailure, SkillId};

/// Scrape request
#[derive(Debug, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Render in headless Chrome; defaults to the configured mode
    #[serde(default)]
    pub render: Option<bool>,
}

/// Parsed page content
#[derive(Debug, Serialize)]
pub struct ParsedPage {
    pub headline: String,
    pub headline_info: HeadlineInfo,
    pub data_source: DataSource,
    pub skill_list: Vec<Skill>,
    pub skill_cards: Vec<SkillCard>,
    pub unmatched_cards: Vec<String>,
    pub total_groups: usize,
}

/// Scrape response
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub success: bool,
    pub url_params: UrlParams,
    pub parsed: ParsedPage,
}

/// Chain cost request
#[derive(Debug, Deserialize)]
pub struct ChainCostRequest {
    pub skill_id: SkillId,
    #[serde(default)]
    pub levels: LevelMap,
}

/// Ranking request
#[derive(Debug, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub levels: LevelMap,
    /// Maximum number of ranked skills returned
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Ranking response
#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub total: usize,
    pub ranked: Vec<SkillEfficiency>,
    pub failures: Vec<RankFailure>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_size: usize,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
