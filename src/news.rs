//! Naver news search used as generation context.
//!
//! A single query against the news search API supplies the handful of
//! `{title, description}` records the article generation is grounded on.
//! The records are only context: a failed or empty search degrades to an
//! empty context string and the run continues.

use std::error::Error;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::models::NewsItem;
use crate::utils::strip_tags;

const SEARCH_ENDPOINT: &str = "https://openapi.naver.com/v1/search/news.json";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    title: String,
    description: String,
}

/// Fetch the most relevant news items for `query`.
#[instrument(level = "info", skip_all, fields(%query))]
pub async fn search_news(
    http: &reqwest::Client,
    config: &Config,
    query: &str,
) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let url = format!(
        "{SEARCH_ENDPOINT}?query={}&display=5&sort=sim",
        urlencoding::encode(query)
    );

    let response = http
        .get(&url)
        .header("X-Naver-Client-Id", &config.naver_client_id)
        .header("X-Naver-Client-Secret", &config.naver_client_secret)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!(%status, "News search returned an error status");
        return Err(format!("news search returned {status}").into());
    }

    let parsed: SearchResponse = response.json().await?;
    let items: Vec<NewsItem> = parsed
        .items
        .into_iter()
        .map(|item| {
            let cleaned = NewsItem {
                title: strip_tags(&item.title),
                description: strip_tags(&item.description),
            };
            debug!(title = %cleaned.title, "Fetched news item");
            cleaned
        })
        .collect();

    info!(count = items.len(), "Indexed news items");
    Ok(items)
}

/// Format news items into the context block fed to the model.
pub fn news_context(items: &[NewsItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!("제목: {}\n내용: {}\n\n", item.title, item.description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_context_format() {
        let items = vec![
            NewsItem {
                title: "국민연금 개혁안 발표".to_string(),
                description: "보험료율 인상 일정이 공개됐다.".to_string(),
            },
            NewsItem {
                title: "수급 연령 논의".to_string(),
                description: "개시 연령 상향이 검토된다.".to_string(),
            },
        ];
        let context = news_context(&items);
        assert!(context.starts_with("제목: 국민연금 개혁안 발표\n내용: 보험료율 인상 일정이 공개됐다.\n\n"));
        assert!(context.contains("제목: 수급 연령 논의\n"));
    }

    #[test]
    fn test_news_context_empty() {
        assert_eq!(news_context(&[]), "");
    }

    #[test]
    fn test_search_response_tolerates_missing_items() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());
    }
}
