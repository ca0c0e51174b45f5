//! Remote listing through the Artifactory Query Language search API.
//!
//! `POST {url}/api/search/aql` is paged with `.offset(n).limit(m)`. A page
//! whose reported `range.total` is below the page size is the last one.
//! Pages are requested one second apart and any failure aborts the fetch.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use ureq::Agent;

pub const PAGE_DELAY: Duration = Duration::from_secs(1);

const INCLUDED_FIELDS: [&str; 8] = [
    "repo", "path", "name", "type", "size", "created", "modified", "updated",
];

#[derive(Debug, Deserialize)]
pub struct AqlPage {
    #[serde(default)]
    pub results: Vec<Value>,
    pub range: Option<AqlRange>,
}

#[derive(Debug, Deserialize)]
pub struct AqlRange {
    #[serde(default)]
    pub start_pos: u64,
    #[serde(default)]
    pub end_pos: u64,
    #[serde(default)]
    pub total: u64,
    pub limit: Option<u64>,
}

/// AQL query for one page of files in `repo`, ordered so offsets are stable.
pub fn build_query(repo: &str, offset: usize, limit: usize) -> String {
    let include = INCLUDED_FIELDS
        .iter()
        .map(|f| format!("\"{}\"", f))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"items.find({{"repo":{},"type":"file"}}).include({}).sort({{"$asc":["path","name"]}}).offset({}).limit({})"#,
        Value::from(repo),
        include,
        offset,
        limit
    )
}

/// Offset of the page after this one, or `None` when this page was the last.
pub fn next_offset(offset: usize, page_size: usize, page: &AqlPage) -> Option<usize> {
    let returned = page.results.len();
    if returned == 0 {
        return None;
    }
    let reported = page
        .range
        .as_ref()
        .map(|r| r.total as usize)
        .unwrap_or(returned);
    if reported < page_size {
        None
    } else {
        Some(offset + page_size)
    }
}

pub struct AqlClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
    page_size: usize,
    page_delay: Duration,
}

impl AqlClient {
    pub fn new(base_url: &str, token: Option<String>, page_size: usize, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            page_size: page_size.max(1),
            page_delay: PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn search_url(&self) -> String {
        format!("{}/api/search/aql", self.base_url)
    }

    pub fn search(&self, query: &str) -> Result<AqlPage> {
        let url = self.search_url();
        let mut request = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let mut response = request
            .send(query)
            .with_context(|| format!("AQL request to {} failed", url))?;
        response
            .body_mut()
            .read_json::<AqlPage>()
            .context("Failed to decode AQL response")
    }

    pub fn fetch_repo(&self, repo: &str, progress: &ProgressBar) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .search(&build_query(repo, offset, self.page_size))
                .with_context(|| format!("Fetching '{}' stopped at offset {}", repo, offset))?;
            let next = next_offset(offset, self.page_size, &page);
            debug!(
                "AQL page for {} at offset {}: {} results",
                repo,
                offset,
                page.results.len()
            );

            items.extend(page.results);
            progress.set_message(format!("{}: {} files", repo, items.len()));

            match next {
                Some(n) => {
                    offset = n;
                    thread::sleep(self.page_delay);
                }
                None => break,
            }
        }

        info!("Fetched {} files from {}", items.len(), repo);
        Ok(items)
    }

    pub fn fetch_all(&self, repos: &[String]) -> Result<Vec<Value>> {
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            progress.set_style(style);
        }
        progress.enable_steady_tick(Duration::from_millis(120));

        let mut all = Vec::new();
        for repo in repos {
            match self.fetch_repo(repo, &progress) {
                Ok(items) => all.extend(items),
                Err(e) => {
                    progress.finish_and_clear();
                    return Err(e);
                }
            }
        }
        progress.finish_and_clear();
        Ok(all)
    }
}
