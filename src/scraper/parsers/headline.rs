//! Course headline parser ("東京 芝1600m 逃げ" style headlines).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DISTANCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(芝|ダート|ダ)?\s*(\d{3,4})\s*m").expect("valid distance regex"));

const RUNNING_STYLES: [&str; 5] = ["逃げ", "先行", "差し", "追い込み", "追込"];

/// Structured view of a course headline
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HeadlineInfo {
    pub raw: String,
    pub course_name: Option<String>,
    /// Distance in meters
    pub distance: Option<u32>,
    /// "turf" or "dirt"
    pub surface: Option<String>,
    pub running_style: Option<String>,
    pub additional_info: Option<String>,
}

impl HeadlineInfo {
    /// Parse a headline; unknown parts end up in `additional_info`
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut info = HeadlineInfo {
            raw: raw.to_string(),
            ..Default::default()
        };
        let mut rest = raw.to_string();

        if let Some(caps) = DISTANCE_RE.captures(raw) {
            info.distance = caps[2].parse().ok();
            info.surface = caps.get(1).map(|m| surface_of(m.as_str()).to_string());
            rest = rest.replacen(&caps[0], " ", 1);
        }

        if info.surface.is_none() {
            if rest.contains("ダート") {
                info.surface = Some("dirt".to_string());
                rest = rest.replacen("ダート", " ", 1);
            } else if rest.contains('芝') {
                info.surface = Some("turf".to_string());
                rest = rest.replacen('芝', " ", 1);
            }
        }

        if let Some(style) = RUNNING_STYLES.iter().find(|s| rest.contains(**s)) {
            info.running_style = Some(style.to_string());
            rest = rest.replacen(*style, " ", 1);
        }

        let mut tokens = rest.split_whitespace();
        info.course_name = tokens.next().map(str::to_string);
        let additional: Vec<&str> = tokens.collect();
        if !additional.is_empty() {
            info.additional_info = Some(additional.join(" "));
        }

        info
    }
}

fn surface_of(marker: &str) -> &'static str {
    if marker == "芝" {
        "turf"
    } else {
        "dirt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_headline() {
        let info = HeadlineInfo::parse("東京 芝1600m 逃げ");
        assert_eq!(info.course_name.as_deref(), Some("東京"));
        assert_eq!(info.distance, Some(1600));
        assert_eq!(info.surface.as_deref(), Some("turf"));
        assert_eq!(info.running_style.as_deref(), Some("逃げ"));
        assert_eq!(info.additional_info, None);
    }

    #[test]
    fn test_parse_dirt_with_extra() {
        let info = HeadlineInfo::parse("中山 ダート1800m 右 差し 内回り");
        assert_eq!(info.course_name.as_deref(), Some("中山"));
        assert_eq!(info.distance, Some(1800));
        assert_eq!(info.surface.as_deref(), Some("dirt"));
        assert_eq!(info.running_style.as_deref(), Some("差し"));
        assert_eq!(info.additional_info.as_deref(), Some("右 内回り"));
    }

    #[test]
    fn test_parse_unstructured() {
        let info = HeadlineInfo::parse("未找到標題");
        assert_eq!(info.raw, "未找到標題");
        assert_eq!(info.distance, None);
        assert_eq!(info.course_name.as_deref(), Some("未找到標題"));
    }
}
