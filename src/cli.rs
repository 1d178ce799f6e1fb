//! CLI commands for uma-skill.
//!
//! Supports API server mode, one-off scraping, and chain cost / efficiency
//! reports over a saved catalog.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::scraper::CourseScraper;
use crate::skills::{
    ChainCalculator, ChainCost, EfficiencyEvaluator, LevelMap, Ranking, Skill, SkillCatalog, SkillId,
};

#[derive(Parser)]
#[command(name = "uma-skill")]
#[command(version, about = "Skill scraper and prerequisite-chain efficiency calculator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Catalog JSON to load at startup
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Scrape a course effect page
    Scrape {
        /// Course effect page URL
        url: String,

        /// Render with headless Chrome
        #[arg(long)]
        render: bool,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the prerequisite chain cost of one skill
    Chain {
        /// Catalog JSON file (skill array or scrape output)
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,

        /// Target skill id
        skill_id: u32,

        /// Level JSON file: {"<skill id>": level}
        #[arg(short, long)]
        levels: Option<PathBuf>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Rank every skill in a catalog by efficiency
    Rank {
        /// Catalog JSON file (skill array or scrape output)
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,

        /// Level JSON file: {"<skill id>": level}
        #[arg(short, long)]
        levels: Option<PathBuf>,

        /// Number of skills to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

/// Accepted catalog file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    /// Bare array of skills
    Skills(Vec<Skill>),
    /// Output of `scrape -o`
    Scrape { skill_list: Vec<Skill> },
}

/// Load a catalog file: a skill array or a saved scrape result.
pub fn load_catalog(path: &Path) -> anyhow::Result<SkillCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let file: CatalogFile = serde_json::from_str(&json)
        .with_context(|| format!("Invalid catalog {}", path.display()))?;

    let skills = match file {
        CatalogFile::Skills(skills) => skills,
        CatalogFile::Scrape { skill_list } => skill_list,
    };
    SkillCatalog::from_skills(skills).with_context(|| format!("Invalid catalog {}", path.display()))
}

/// Load a level file, or an empty map.
pub fn load_levels(path: Option<&Path>) -> anyhow::Result<LevelMap> {
    let Some(path) = path else {
        return Ok(LevelMap::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read levels {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid levels {}", path.display()))
}

/// Scrape a page and print or save the result.
pub async fn run_scrape(url: String, render: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let render = render || config.scraper.render;
    let scraper = CourseScraper::new(config.scraper);

    eprintln!("Scraping: {}", url);
    let result = scraper.scrape(&url, render).await?;
    eprintln!(
        "Found {} skills in {} groups ({} cards)",
        result.skill_list.len(),
        result.total_groups,
        result.skill_cards.len()
    );

    let json = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!("Saved to: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Print the chain cost of one skill.
pub fn run_chain(
    catalog_path: PathBuf,
    skill_id: u32,
    levels_path: Option<PathBuf>,
    format: String,
) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let catalog = load_catalog(&catalog_path)?;
    let levels = load_levels(levels_path.as_deref())?;

    let skill = catalog.require(SkillId(skill_id))?;
    let cost = ChainCalculator::new(&catalog)
        .with_discounts(config.discount)
        .chain_cost(skill, &levels)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&cost)?),
        "table" => print_chain(&cost),
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_chain(&cost);
        }
    }

    Ok(())
}

/// Print the efficiency ranking of a catalog.
pub fn run_rank(
    catalog_path: PathBuf,
    levels_path: Option<PathBuf>,
    limit: usize,
    format: String,
) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let catalog = load_catalog(&catalog_path)?;
    let levels = load_levels(levels_path.as_deref())?;
    eprintln!("Loaded {} skills", catalog.len());

    let calculator = ChainCalculator::new(&catalog).with_discounts(config.discount);
    let mut ranking = EfficiencyEvaluator::new(calculator).rank(&levels);
    ranking.ranked.truncate(limit);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&ranking)?),
        "table" => print_ranking(&ranking),
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_ranking(&ranking);
        }
    }

    Ok(())
}

/// Print chain steps root first.
fn print_chain(cost: &ChainCost) {
    println!("=== Chain for {} ===", cost.skill_id);
    for step in &cost.steps {
        println!(
            "  {} Lv{}: {} Pt x (1-{:.0}%) = {} Pt",
            step.name,
            step.level,
            step.original_cost,
            step.discount * 100.0,
            step.actual_cost
        );
    }
    println!();
    println!("Total: {} Pt", cost.total_cost);
}

/// Print ranked skills and failures.
fn print_ranking(ranking: &Ranking) {
    println!("=== Efficiency [バ/Pt] ===");
    for (i, r) in ranking.ranked.iter().enumerate() {
        println!(
            "  {:3}. {:<20} {:>7.4}  ({:.2} x 100 / {} Pt, {} steps)",
            i + 1,
            r.name,
            r.efficiency,
            r.effect_value,
            r.chain.total_cost,
            r.chain.steps.len()
        );
    }

    if !ranking.failures.is_empty() {
        println!();
        println!("=== Not ranked ===");
        for f in &ranking.failures {
            println!("  {}: {}", f.skill_id, f.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::{course_effects_url, parse_course_page};
    use std::io::Write;

    #[test]
    fn test_load_levels_missing_path() {
        assert!(load_levels(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_catalog_and_levels() {
        let dir = tempfile::tempdir().unwrap();

        let catalog_path = dir.path().join("catalog.json");
        let mut file = std::fs::File::create(&catalog_path).unwrap();
        write!(
            file,
            r#"[{{"id": 1, "name": "a", "rarityValue": 1, "groupId": 1, "groupRate": 1, "needSkillPoint": 100}}]"#
        )
        .unwrap();

        let levels_path = dir.path().join("levels.json");
        std::fs::write(&levels_path, r#"{"1": 2}"#).unwrap();

        let catalog = load_catalog(&catalog_path).unwrap();
        let levels = load_levels(Some(&levels_path)).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(levels.level_of(SkillId(1)), 2);
    }

    #[test]
    fn test_load_catalog_from_scrape_output() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">
{"skills": [
  {"id": 200022, "name": "左回り○", "rarity": "normal", "groupId": 20002, "groupRate": 1, "needSkillPoint": 90},
  {"id": 200021, "name": "左回り◎", "rarity": "normal", "groupId": 20002, "groupRate": 2, "needSkillPoint": 110},
  {"id": 200024, "name": "左回りの鬼", "rarity": "gold", "groupId": 20002, "groupRate": 3, "needSkillPoint": 130}
]}
</script>"#;
        let scraped = parse_course_page(&course_effects_url("10301", "betweener"), html).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrape.json");
        std::fs::write(&path, serde_json::to_string_pretty(&scraped).unwrap()).unwrap();

        let catalog = load_catalog(&path).unwrap();
        let demon = catalog.require(SkillId(200024)).unwrap();
        let cost = ChainCalculator::new(&catalog)
            .chain_cost(demon, &LevelMap::new())
            .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(cost.total_cost, 330);
    }

    #[test]
    fn test_load_catalog_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name": "a", "rarityValue": 1, "groupId": 1, "groupRate": 1},
                {"id": 1, "name": "b", "rarityValue": 1, "groupId": 1, "groupRate": 2}]"#,
        )
        .unwrap();

        assert!(load_catalog(&path).is_err());
    }

    #[test]
    fn test_load_catalog_reports_path() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }

    #[test]
    fn test_cli_parses_rank() {
        let cli = Cli::try_parse_from(["uma-skill", "rank", "skills.json", "-n", "5", "-f", "json"]).unwrap();
        match cli.command {
            Commands::Rank { limit, format, .. } => {
                assert_eq!(limit, 5);
                assert_eq!(format, "json");
            }
            _ => panic!("expected rank"),
        }
    }
}
