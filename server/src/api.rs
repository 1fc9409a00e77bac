use axum::{
    extract::{Json, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use railsearch_core::render::HtmlBuffer;
use railsearch_core::types::{BoostSet, CatalogEntry, SuggestionItem};

use crate::types::*;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": message })))
}

// ---------------------------------------------------------------------------
// Catalog source endpoint
// ---------------------------------------------------------------------------

/// `GET /api/contents`: the raw records document.
pub async fn api_contents(State(ctx): State<AppContext>) -> Response {
    match &ctx.cache.contents_json {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body.clone()).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "This server does not own a records file")
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CatalogResponse {
    pub entries: Vec<CatalogEntry>,
    #[serde(rename = "totalRecords")]
    pub total_records: usize,
}

/// `GET /api/catalog`: the deduplicated catalog in source order.
pub async fn api_catalog(State(ctx): State<AppContext>) -> Json<CatalogResponse> {
    let catalog = ctx.loader.ensure_loaded().await;
    Json(CatalogResponse {
        entries: catalog.entries().to_vec(),
        total_records: catalog.record_count(),
    })
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
    /// Comma-separated labels to boost
    pub boost: Option<String>,
    /// `json` (default) or `html`
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct SuggestResult {
    #[serde(flatten)]
    pub item: SuggestionItem,
    pub count: usize,
    pub score: u32,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub items: Vec<SuggestResult>,
    #[serde(rename = "totalEntries")]
    pub total_entries: usize,
    #[serde(rename = "queryTime")]
    pub query_time: f64,
}

/// `GET /api/suggest`: ranked suggestions for `q`.
pub async fn api_suggest(
    State(ctx): State<AppContext>,
    Query(q): Query<SuggestQuery>,
) -> Result<Response, ApiError> {
    let format = q.format.as_deref().unwrap_or("json");
    if format != "json" && format != "html" {
        return Err(api_error(StatusCode::BAD_REQUEST, "format must be 'json' or 'html'"));
    }

    let catalog = ctx.loader.ensure_loaded().await;
    let limit = q.limit.unwrap_or(ctx.config.limit).min(MAX_SUGGEST_LIMIT);
    let boost = q.boost.as_deref().map(BoostSet::from_csv).unwrap_or_default();

    if format == "html" {
        let items = ctx.builder.build(&catalog, &q.q, &boost, limit);
        let mut rail = HtmlBuffer::new("contentSuggestRail");
        ctx.renderers.render(&mut rail, &items);
        return Ok(
            ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], rail.into_markup())
                .into_response(),
        );
    }

    let start = Instant::now();
    let ranked = ctx.builder.rank(&catalog, &q.q, &boost, limit);
    let items = ranked
        .into_iter()
        .map(|c| {
            let (count, score) = (c.entry.count, c.score);
            let item = ctx.builder.build_item(c);
            SuggestResult { item, count, score }
        })
        .collect();

    Ok(Json(SuggestResponse {
        items,
        total_entries: catalog.len(),
        query_time: start.elapsed().as_secs_f64() * 1000.0,
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(rename = "catalogLoaded")]
    pub catalog_loaded: bool,
    pub entries: usize,
    #[serde(rename = "uptimeSecs")]
    pub uptime_secs: u64,
}

/// `GET /health`: liveness plus catalog status; never triggers a load.
pub async fn api_health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        catalog_loaded: ctx.loader.is_loaded(),
        entries: ctx.loader.snapshot().len(),
        uptime_secs: ctx.start_time.elapsed().as_secs(),
    })
}
