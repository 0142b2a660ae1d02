// src/pipeline/run.rs

//! End-to-end run: roster → aggregate → merge → sort + cap → persist.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, Friend, Roster};
use crate::pipeline::aggregate::{Aggregation, Aggregator};
use crate::pipeline::cache::FeedCache;
use crate::pipeline::capper::sort_and_cap;
use crate::pipeline::merge::PeerMerger;
use crate::storage::{DocumentStore, save_json};
use crate::utils::http::{AcceptKind, HttpFetch};

/// Load the friend roster from an `http(s)` URL or a local file.
///
/// This is the only failure that aborts a run.
pub async fn load_roster(http: &dyn HttpFetch, location: &str) -> Result<Vec<Friend>> {
    let text = if location.starts_with("http://") || location.starts_with("https://") {
        let page = http
            .get(location, AcceptKind::Json)
            .await
            .map_err(|e| AppError::roster(location, e))?;
        if !page.is_ok() {
            return Err(AppError::roster(
                location,
                format!("HTTP status {}", page.status),
            ));
        }
        page.body
    } else {
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| AppError::roster(location, e))?
    };

    let friends = Roster::parse(location, &text)?;
    log::info!("Loaded {} friend(s) from {}", friends.len(), location);
    Ok(friends)
}

/// Run a full aggregation and write the corpus, error list and cache.
pub async fn run_pipeline(
    config: &Config,
    http: &dyn HttpFetch,
    store: &dyn DocumentStore,
) -> Result<Aggregation> {
    let start_time = Utc::now();

    let friends = load_roster(http, &config.sources.roster).await?;
    let manual = config.sources.manual_entries();

    let cache = match config.output.cache_key() {
        Some(key) => FeedCache::load(store, key).await,
        None => FeedCache::new(),
    };

    let mut result = Aggregator::new(http, &config.crawler, &manual)
        .run(&friends, cache)
        .await;

    if config.merge.enabled {
        let merger = PeerMerger::new(http);
        if let Some(url) = &config.merge.data_url {
            merger.merge_data(&mut result.corpus, url).await;
        }
        if let Some(url) = &config.merge.errors_url {
            let errors = std::mem::take(&mut result.errors);
            result.errors = merger
                .merge_errors(errors, url, config.merge.error_policy)
                .await;
        }
    }

    sort_and_cap(&mut result.corpus, config.output.max_articles);

    save_json(store, &config.output.corpus_file, &result.corpus).await?;
    save_json(store, &config.output.errors_file, &result.errors).await?;
    if let Some(key) = config.output.cache_key() {
        result.cache.save(store, key).await?;
    }

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Run finished in {}s: {} article(s) published, {} error(s), {} cache change(s)",
        elapsed.num_seconds(),
        result.corpus.statistics.article_num,
        result.errors.len(),
        result.applied.len()
    );

    Ok(result)
}
