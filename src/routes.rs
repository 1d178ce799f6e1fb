//! API route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::scraper::CourseScraper;
use crate::skills::{
    resolve_prerequisite, ChainCalculator, ChainCost, EfficiencyEvaluator, Skill, SkillCatalog,
    SkillError, SkillId,
};
use crate::types::{
    ChainCostRequest, ErrorResponse, FetchRequest, FetchResponse, HealthResponse, ParsedPage,
    RankRequest, RankResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub scraper: CourseScraper,
    /// Replaced wholesale by each successful scrape
    pub catalog: RwLock<SkillCatalog>,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: SkillCatalog) -> Self {
        Self {
            scraper: CourseScraper::new(config.scraper.clone()),
            config,
            catalog: RwLock::new(catalog),
        }
    }

    /// Swap in a scraped skill list as the catalog.
    ///
    /// An empty list leaves the current catalog in place; returns whether
    /// the catalog was replaced.
    pub async fn replace_catalog(&self, skills: Vec<Skill>) -> Result<bool, SkillError> {
        if skills.is_empty() {
            tracing::warn!(
                "Scrape returned no skills; keeping the current catalog ({} skills)",
                self.catalog.read().await.len()
            );
            return Ok(false);
        }

        let catalog = SkillCatalog::from_skills(skills)?;
        tracing::info!("Catalog replaced: {} skills", catalog.len());
        *self.catalog.write().await = catalog;
        Ok(true)
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }
}

impl From<SkillError> for ApiError {
    fn from(err: SkillError) -> Self {
        let status = match err {
            SkillError::UnknownSkill(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fetch", post(fetch))
        .route("/api/skills/:id/prerequisite", get(prerequisite))
        .route("/api/chain-cost", post(chain_cost))
        .route("/api/rank", post(rank))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size: state.catalog.read().await.len(),
    })
}

/// Scrape a course page and load its skills as the catalog.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResponse>, ApiError> {
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("url is required"))?;
    let render = req.render.unwrap_or(state.config.scraper.render);

    let result = state.scraper.scrape(&url, render).await.map_err(|e| {
        tracing::error!("Scrape failed for {}: {:#}", url, e);
        ApiError::bad_gateway(format!("Scrape failed: {:#}", e))
    })?;

    state.replace_catalog(result.skill_list.clone()).await?;

    Ok(Json(FetchResponse {
        success: true,
        url_params: result.url_params,
        parsed: ParsedPage {
            headline: result.headline,
            headline_info: result.headline_info,
            data_source: result.data_source,
            skill_list: result.skill_list,
            skill_cards: result.skill_cards,
            unmatched_cards: result.unmatched_cards,
            total_groups: result.total_groups,
        },
    }))
}

/// Direct prerequisite of a skill, or `null` for a root.
pub async fn prerequisite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Option<Skill>>, ApiError> {
    let catalog = state.catalog.read().await;
    let skill = catalog.require(SkillId(id))?;
    Ok(Json(resolve_prerequisite(skill, &catalog).cloned()))
}

/// Chain cost under the supplied levels.
pub async fn chain_cost(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChainCostRequest>,
) -> Result<Json<ChainCost>, ApiError> {
    let catalog = state.catalog.read().await;
    let skill = catalog.require(req.skill_id)?;
    let cost = ChainCalculator::new(&catalog)
        .with_discounts(state.config.discount.clone())
        .chain_cost(skill, &req.levels)?;
    Ok(Json(cost))
}

/// Efficiency ranking of the whole catalog.
pub async fn rank(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RankRequest>,
) -> Json<RankResponse> {
    let catalog = state.catalog.read().await;
    let calculator = ChainCalculator::new(&catalog).with_discounts(state.config.discount.clone());
    let mut ranking = EfficiencyEvaluator::new(calculator).rank(&req.levels);

    let total = ranking.ranked.len();
    if let Some(limit) = req.limit {
        ranking.ranked.truncate(limit);
    }

    Json(RankResponse {
        total,
        ranked: ranking.ranked,
        failures: ranking.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::skills::catalog::fixtures::left_turn_catalog;

    fn app() -> Router {
        router(Arc::new(AppState::new(AppConfig::default(), left_turn_catalog())))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["catalog_size"], 3);
    }

    #[tokio::test]
    async fn test_chain_cost_with_levels() {
        let (status, body) = call(
            app(),
            "POST",
            "/api/chain-cost",
            Some(json!({"skill_id": 200024, "levels": {"200022": 3, "200021": 2}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cost"], 281);
        assert_eq!(body["steps"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_chain_cost_unknown_skill() {
        let (status, body) =
            call(app(), "POST", "/api/chain-cost", Some(json!({"skill_id": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("not in the catalog"));
    }

    #[tokio::test]
    async fn test_chain_cost_level_out_of_range() {
        let (status, _) = call(
            app(),
            "POST",
            "/api/chain-cost",
            Some(json!({"skill_id": 200024, "levels": {"200024": 8}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_prerequisite() {
        let (status, body) = call(app(), "GET", "/api/skills/200024/prerequisite", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 200021);

        let (status, body) = call(app(), "GET", "/api/skills/200022/prerequisite", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_rank_limit() {
        let (status, body) = call(app(), "POST", "/api/rank", Some(json!({"limit": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["ranked"].as_array().unwrap().len(), 1);
        assert_eq!(body["ranked"][0]["skill_id"], 200022);
    }

    #[tokio::test]
    async fn test_empty_scrape_keeps_catalog() {
        let state = AppState::new(AppConfig::default(), left_turn_catalog());

        assert!(!state.replace_catalog(Vec::new()).await.unwrap());
        assert_eq!(state.catalog.read().await.len(), 3);

        let replacement = vec![crate::skills::catalog::fixtures::skill(1, "a", 1, 1, 1, 100)];
        assert!(state.replace_catalog(replacement).await.unwrap());
        assert_eq!(state.catalog.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_requires_url() {
        let (status, _) = call(app(), "POST", "/api/fetch", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
