//! uma-skill
//!
//! Scrapes course skill effect pages and computes prerequisite chain costs
//! and efficiency rankings over the resulting skill catalog.

pub mod cli;
pub mod config;
pub mod retry;
pub mod routes;
pub mod scraper;
pub mod skills;
pub mod types;
