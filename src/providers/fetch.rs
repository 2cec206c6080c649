use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::models::WebContent;

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("coldopen/", env!("CARGO_PKG_VERSION"));

/// Cap on extracted page text, to bound downstream prompt size.
const MAX_TEXT_CHARS: usize = 8_000;

/// A page as returned by the fetch collaborator.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub title: String,
    pub text: String,
}

impl FetchedPage {
    /// Attach the source URL, producing the context-level record.
    pub fn into_web_content(self, url: &str) -> WebContent {
        WebContent {
            url: url.to_string(),
            title: self.title,
            text: self.text,
        }
    }
}

/// HTML content collaborator consumed by the retrieval stage.
///
/// Fails on unreachable URLs or pages with no extractable content; the
/// retrieval stage's retry/fallback machinery absorbs those failures.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Fetches pages over HTTP and extracts readable text with CSS selectors.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            anyhow::bail!("fetch of {} returned status {}", url, response.status());
        }

        let html = response
            .text()
            .await
            .with_context(|| format!("failed to read body of {url}"))?;

        let page = extract_page(&html);
        if page.text.is_empty() {
            anyhow::bail!("no extractable text content at {url}");
        }
        Ok(page)
    }
}

/// Pull the title and readable body text out of an HTML document.
///
/// Prefers `<main>`/`<article>` content areas over the full `<body>`, strips
/// markup, collapses whitespace, and truncates to `MAX_TEXT_CHARS`.
fn extract_page(html: &str) -> FetchedPage {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("static selector");
    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut text = String::new();
    for sel_str in ["main", "article", r#"[role="main"]"#, "body"] {
        let sel = Selector::parse(sel_str).expect("static selector");
        if let Some(el) = doc.select(&sel).next() {
            text = collapse_whitespace(el.text());
            if !text.is_empty() {
                break;
            }
        }
    }

    if text.chars().count() > MAX_TEXT_CHARS {
        text = text.chars().take(MAX_TEXT_CHARS).collect();
    }

    FetchedPage { title, text }
}

fn collapse_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    let joined: String = fragments.collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
