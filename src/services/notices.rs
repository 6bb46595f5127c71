// src/services/notices.rs

//! Notice source service.
//!
//! Fetches the listing page and extracts candidate notices using configured
//! CSS selectors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Candidate, SourceConfig};
use crate::utils::http::create_async_client;
use crate::utils::resolve_url;

/// Anything that can produce the current list of published notices.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Fetch the listing as it is right now.
    async fn fetch(&self) -> Result<Vec<Candidate>>;
}

/// Compiled extraction rules.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    item: Selector,
    title: Selector,
    link: Selector,
}

impl ListingSelectors {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&config.item_selector)?,
            title: parse_selector(&config.title_selector)?,
            link: parse_selector(&config.link_selector)?,
        })
    }
}

/// Scrapes notices from a single HTML page.
pub struct HtmlNoticeSource {
    url: Url,
    selectors: ListingSelectors,
    client: Client,
}

impl HtmlNoticeSource {
    /// Create a source with the given configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let url = Url::parse(&config.url)?;
        let selectors = ListingSelectors::from_config(config)?;
        let client = create_async_client(config)?;

        Ok(Self {
            url,
            selectors,
            client,
        })
    }

    async fn fetch_html(&self) -> Result<String> {
        let response = self.client.get(self.url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::source_unavailable(format!(
                "{} returned {}",
                self.url, status
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl NoticeSource for HtmlNoticeSource {
    async fn fetch(&self) -> Result<Vec<Candidate>> {
        let html = self.fetch_html().await.map_err(|e| match e {
            AppError::SourceUnavailable(_) => e,
            other => AppError::source_unavailable(other),
        })?;

        let candidates = parse_listing(&html, &self.url, &self.selectors, Utc::now());
        log::debug!("Fetched {} notices from {}", candidates.len(), self.url);
        Ok(candidates)
    }
}

/// Extract candidates from a listing page.
///
/// Items without a title or a link are skipped. Every candidate is stamped
/// with the same `observed_at`.
pub fn parse_listing(
    html: &str,
    base_url: &Url,
    selectors: &ListingSelectors,
    observed_at: DateTime<Utc>,
) -> Vec<Candidate> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.item)
        .filter_map(|item| parse_item(&item, base_url, selectors, observed_at))
        .collect()
}

fn parse_item(
    item: &ElementRef,
    base_url: &Url,
    selectors: &ListingSelectors,
    observed_at: DateTime<Utc>,
) -> Option<Candidate> {
    let title = item
        .select(&selectors.title)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| element_text(item));
    if title.is_empty() {
        return None;
    }

    let href = item
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))?;

    Some(Candidate::new(title, resolve_url(base_url, href), observed_at))
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s)
        .map_err(|e| AppError::source_unavailable(format!("invalid selector '{s}': {e:?}")))
}
