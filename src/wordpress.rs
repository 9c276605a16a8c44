//! WordPress REST API client.
//!
//! Three interactions with the publishing target:
//! - tag get-or-create, matching the model's tag names case-insensitively
//! - listing recent posts as internal link candidates
//! - creating the final post
//!
//! All requests authenticate with an application password over Basic auth.
//! Per-tag failures are logged and skipped so a single bad tag never sinks
//! a publishing run.

use std::error::Error;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;

/// The post payload sent to `POST /wp-json/wp/v2/posts`.
#[derive(Debug, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: String,
    pub tags: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Rendered {
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct PostRecord {
    title: Rendered,
    link: String,
}

/// A recent post on the target blog, offered as an internal link candidate.
#[derive(Debug, Clone)]
pub struct RecentPost {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    link: String,
}

/// Basic-auth client for the WordPress REST API.
#[derive(Debug, Clone)]
pub struct WordPress {
    http: reqwest::Client,
    base_url: String,
    auth: String,
}

impl WordPress {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        let credentials = format!("{}:{}", config.wp_username, config.wp_app_password);
        Self {
            http,
            base_url: config.wp_url.trim_end_matches('/').to_string(),
            auth: format!("Basic {}", BASE64.encode(credentials)),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.base_url)
    }

    /// Resolve tag names to tag IDs, creating missing tags.
    ///
    /// Names are deduplicated case-insensitively first. A name whose lookup
    /// and creation both fail is skipped with a warning.
    #[instrument(level = "info", skip_all, fields(count = names.len()))]
    pub async fn get_or_create_tags(&self, names: &[String]) -> Vec<u64> {
        let unique: Vec<&String> = names.iter().unique_by(|n| n.to_lowercase()).collect();

        let ids: Vec<u64> = stream::iter(unique)
            .then(|name| async move {
                match self.get_or_create_tag(name).await {
                    Ok(id) => {
                        debug!(%name, id, "Resolved tag");
                        Some(id)
                    }
                    Err(e) => {
                        warn!(%name, error = %e, "Tag lookup/creation failed; skipping");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await;

        info!(resolved = ids.len(), requested = names.len(), "Resolved tags");
        ids
    }

    async fn get_or_create_tag(&self, name: &str) -> Result<u64, Box<dyn Error>> {
        let search_url = format!("{}?search={}", self.endpoint("tags"), urlencoding::encode(name));
        let existing: Vec<TagRecord> = self
            .http
            .get(&search_url)
            .header("Authorization", &self.auth)
            .send()
            .await?
            .json()
            .await?;

        if let Some(tag) = existing.iter().find(|t| t.name.to_lowercase() == name.to_lowercase()) {
            return Ok(tag.id);
        }

        let response = self
            .http
            .post(self.endpoint("tags"))
            .header("Authorization", &self.auth)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            return Err(format!("tag creation returned {status}").into());
        }
        let created: TagRecord = response.json().await?;
        Ok(created.id)
    }

    /// Fetch the blog's most recent posts as internal link candidates.
    #[instrument(level = "info", skip(self))]
    pub async fn recent_posts(&self, limit: usize) -> Result<Vec<RecentPost>, Box<dyn Error>> {
        let url = format!(
            "{}?per_page={limit}&_fields=title,link",
            self.endpoint("posts")
        );
        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("recent posts listing returned {status}").into());
        }

        let records: Vec<PostRecord> = response.json().await?;
        let posts: Vec<RecentPost> = records
            .into_iter()
            .map(|r| RecentPost {
                title: crate::utils::strip_tags(&r.title.rendered),
                link: r.link,
            })
            .collect();

        info!(count = posts.len(), "Fetched recent posts");
        Ok(posts)
    }

    /// Create the post and return its public link.
    #[instrument(level = "info", skip_all, fields(title = %post.title, status = %post.status))]
    pub async fn create_post(&self, post: &NewPost) -> Result<String, Box<dyn Error>> {
        let response = self
            .http
            .post(self.endpoint("posts"))
            .header("Authorization", &self.auth)
            .json(post)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "post creation returned {status}: {}",
                crate::utils::truncate_for_log(&body, 300)
            )
            .into());
        }

        let created: CreatedPost = response.json().await?;
        info!(link = %created.link, "Post created");
        Ok(created.link)
    }
}
