//! Contract tests for the HTTP API handlers.

mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use railsearch_core::catalog::CatalogSource;
use railsearch_core::error::{CatalogError, Result as CatalogResult};
use railsearch_core::render::{RenderHook, RenderTarget};
use railsearch_core::types::{ContentRecord, SuggestionItem};
use railsearch_server::api::*;
use serde_json::Value;

use helpers::*;

fn query(q: &str) -> SuggestQuery {
    SuggestQuery { q: q.to_string(), limit: None, boost: None, format: None }
}

fn titles(json: &Value) -> Vec<String> {
    json["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|i| i["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

struct DownSource;

#[async_trait]
impl CatalogSource for DownSource {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch_records(&self) -> CatalogResult<Vec<ContentRecord>> {
        Err(CatalogError::Status(500))
    }
}

// ---------------------------------------------------------------------------
// /api/contents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn contents_serves_raw_document() {
    let ctx = context_from_fixture("places.json");
    let json = body_json(api_contents(State(ctx)).await).await;
    let records = json.as_array().expect("array");
    assert_eq!(records.len(), 11);
    assert_eq!(records[0]["name"], "Namsan Tower");
}

#[tokio::test]
async fn contents_is_404_without_records_file() {
    let ctx = context_from_source(Arc::new(DownSource));
    let resp = api_contents(State(ctx)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// /api/catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn catalog_is_trimmed_deduplicated_and_counted() {
    let ctx = context_from_fixture("places.json");
    let json = body_json(api_catalog(State(ctx)).await.into_response()).await;
    let pairs: Vec<(String, u64)> = json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["label"].as_str().unwrap().to_string(), e["count"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![("Drama".to_string(), 5), ("Music".to_string(), 2), ("K-drama".to_string(), 2)]
    );
    assert_eq!(json["totalRecords"], 9);
}

// ---------------------------------------------------------------------------
// /api/suggest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn suggest_ranks_prefix_then_contains() {
    let ctx = context_from_fixture("places.json");
    let mut q = query("dra");
    q.limit = Some(2);
    let json = body_json(api_suggest(State(ctx), Query(q)).await.expect("ok")).await;
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Drama");
    assert_eq!(items[0]["score"], 80);
    assert_eq!(items[0]["count"], 5);
    assert_eq!(items[0]["subtitle"], "5 places");
    assert_eq!(items[1]["title"], "K-drama");
    assert_eq!(items[1]["score"], 60);
    assert_eq!(json["totalEntries"], 3);
}

#[tokio::test]
async fn suggest_empty_query_lists_trending() {
    let ctx = context_from_fixture("places.json");
    let json = body_json(api_suggest(State(ctx), Query(query(""))).await.unwrap()).await;
    assert_eq!(titles(&json), vec!["Drama", "Music", "K-drama"]);
}

#[tokio::test]
async fn suggest_boost_param_includes_boosted_label() {
    let ctx = context_from_fixture("places.json");
    let mut q = query("dra");
    q.boost = Some("Music".into());
    let json = body_json(api_suggest(State(ctx), Query(q)).await.unwrap()).await;
    assert_eq!(titles(&json), vec!["Drama", "K-drama", "Music"]);
}

#[tokio::test]
async fn suggest_limit_is_capped() {
    let ctx = context_from_fixture("places.json");
    let mut q = query("a");
    q.limit = Some(10_000);
    let json = body_json(api_suggest(State(ctx), Query(q)).await.unwrap()).await;
    assert!(json["items"].as_array().unwrap().len() <= 3);
}

#[tokio::test]
async fn suggest_html_uses_fallback_until_hook_registered() {
    let ctx = context_from_fixture("places.json");
    let mut q = query("music");
    q.limit = Some(1);
    q.format = Some("html".into());
    let html = body_text(api_suggest(State(ctx.clone()), Query(q)).await.unwrap()).await;
    assert!(html.contains("<div class=\"search-item-title\">Music</div>"), "{html}");
    assert!(html.contains("<div class=\"search-item-subtitle\">2 places</div>"), "{html}");

    ctx.registry.register(
        "card_factory",
        RenderHook::function(|t: &mut dyn RenderTarget, items: &[SuggestionItem]| {
            t.set_markup(format!("<cards n=\"{}\"/>", items.len()));
        }),
    );
    let mut q = query("music");
    q.limit = Some(1);
    q.format = Some("html".into());
    let html = body_text(api_suggest(State(ctx), Query(q)).await.unwrap()).await;
    assert_eq!(html, "<cards n=\"1\"/>");
}

#[tokio::test]
async fn suggest_rejects_unknown_format() {
    let ctx = context_from_fixture("places.json");
    let mut q = query("dra");
    q.format = Some("xml".into());
    let err = api_suggest(State(ctx), Query(q)).await.err().expect("should be rejected");
    assert_eq!(err.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggest_degrades_to_empty_on_load_failure() {
    let ctx = context_from_source(Arc::new(DownSource));
    let json = body_json(api_suggest(State(ctx), Query(query("dra"))).await.unwrap()).await;
    assert!(titles(&json).is_empty());
    assert_eq!(json["totalEntries"], 0);
}

// ---------------------------------------------------------------------------
// /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_catalog_state_without_loading() {
    let ctx = context_from_fixture("places.json");
    let json = body_json(api_health(State(ctx.clone())).await.into_response()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["catalogLoaded"], false);
    assert_eq!(ctx.loader.fetch_count(), 0);

    ctx.loader.ensure_loaded().await;
    let json = body_json(api_health(State(ctx)).await.into_response()).await;
    assert_eq!(json["catalogLoaded"], true);
    assert_eq!(json["entries"], 3);
}

// ---------------------------------------------------------------------------
// Records file
// ---------------------------------------------------------------------------

#[test]
fn open_records_file_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(railsearch_server::open_records_file(&missing).is_err());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"contents\": \"Drama\"}").unwrap();
    let err = railsearch_server::open_records_file(&broken).err().expect("not an array");
    assert!(err.contains("Invalid records file"), "{err}");

    let ok = dir.path().join("ok.json");
    std::fs::write(&ok, "[{\"contents\": \"Drama\"}]").unwrap();
    let (body, source) = railsearch_server::open_records_file(&ok).unwrap();
    assert!(body.contains("Drama"));
    assert!(source.name().starts_with("file:"));
}
