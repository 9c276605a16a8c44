//! # Gutenpress
//!
//! An automated publishing pipeline that grounds a generative model in
//! recent news, asks it for a Gutenberg block article, sanitizes the
//! result, and publishes it to a WordPress blog.
//!
//! ## Features
//!
//! - Fetches recent news for a configurable query as generation context
//! - Generates a `{title, content, excerpt, tags}` article through a
//!   Gemini-compatible JSON-schema API
//! - Sanitizes the generated markup: block and sentence dedup, link token
//!   resolution, and defensive URL repair
//! - Resolves tags against the WordPress REST API and publishes the post
//!
//! ## Usage
//!
//! ```sh
//! gutenpress --query "국민연금 개혁" --link-store ./links.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Context**: Fetch news items for the query
//! 2. **Topic**: Ask the model to pick today's topic from the context
//! 3. **Generation**: Ask for the full article, with link tokens on offer
//! 4. **Sanitization**: Pure string passes over the generated document
//! 5. **Publishing**: Tag resolution and post creation

use std::error::Error;
use std::path::Path;

use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod models;
mod news;
mod sanitize;
mod utils;
mod wordpress;

use api::ask_with_backoff;
use cli::Cli;
use config::load_config;
use models::{GeneratedPost, load_link_store};
use sanitize::{LinkMapping, LinkOrigin, sanitize_document, strip_markdown_noise};
use utils::{looks_truncated, truncate_for_log};
use wordpress::{NewPost, WordPress};

/// Bodies shorter than this abort the run before publishing.
const MIN_BODY_CHARS: usize = 200;

const FALLBACK_TOPIC: &str = "국민연금 최신 제도 변화 분석";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("gutenpress starting up");

    // Parse CLI and configuration
    let args = Cli::parse();
    debug!(?args.query, ?args.link_store, args.dry_run, "Parsed CLI arguments");

    let config = load_config(args.config.as_deref().map(Path::new))?;
    if config.gemini_api_key.is_empty() {
        error!("GEMINI_API_KEY is not set; cannot generate");
        return Err("missing generation API key".into());
    }

    let http = reqwest::Client::new();
    let wp = WordPress::new(http.clone(), &config);
    let month = Local::now().format("%Y년 %-m월").to_string();

    // ---- Fetch news context ----
    let news_items = match news::search_news(&http, &config, &args.query).await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "News search failed; continuing without context");
            Vec::new()
        }
    };
    let news_context = news::news_context(&news_items);
    info!(count = news_items.len(), "News context assembled");

    // ---- Pick a topic ----
    let topic_prompt = format!(
        "다음은 현재 실시간 뉴스 내용이야:\n{news_context}\n위 뉴스들을 참고해서 {month} 현재 \
         가장 중요한 국민연금 관련 주제를 하나 선정해 제목 형태로 답해줘. 제목 처음에 연도를 넣지 마."
    );
    let topic = match ask_with_backoff(&http, &config, &topic_prompt, None).await {
        Ok(response) => match serde_json::from_str::<GeneratedPost>(&response) {
            Ok(parsed) => parsed.title,
            Err(e) => {
                warn!(error = %e, "Topic response did not parse; using fallback topic");
                FALLBACK_TOPIC.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "Topic selection failed; using fallback topic");
            FALLBACK_TOPIC.to_string()
        }
    };
    info!(%topic, "Topic selected");

    // ---- Build the link mapping ----
    let mut candidates: Vec<(String, String, LinkOrigin)> = Vec::new();

    if args.recent_posts > 0 {
        match wp.recent_posts(args.recent_posts).await {
            Ok(posts) => {
                for post in posts {
                    candidates.push((post.title, post.link, LinkOrigin::Internal));
                }
            }
            Err(e) => warn!(error = %e, "Recent posts unavailable; skipping internal links"),
        }
    }
    if let Some(store_path) = &args.link_store {
        match load_link_store(Path::new(store_path)).await {
            Ok(links) => {
                for link in links {
                    candidates.push((link.title, link.url, LinkOrigin::External));
                }
            }
            Err(e) => warn!(path = %store_path, error = %e, "Link store unavailable; skipping"),
        }
    }

    let mut mapping = LinkMapping::new();
    for (title, url, origin) in candidates.into_iter().unique_by(|(_, url, _)| url.clone()) {
        let entry = mapping.insert(&title, &url, origin);
        debug!(title = %entry.title, origin = ?entry.origin, "Link candidate registered");
    }
    info!(links = mapping.len(), "Link mapping built");

    // ---- Generate the article ----
    let link_guidance = if mapping.is_empty() {
        String::new()
    } else {
        let mut table = String::from(
            "\n[링크 규칙]\n아래 주제를 본문에서 언급할 때는 반드시 해당 토큰을 그대로 \
             href 값으로 사용해 <a href=\"토큰\">앵커 텍스트</a> 형태로 링크하세요. \
             토큰을 수정하거나 완성된 URL로 바꾸지 마세요.\n",
        );
        for entry in mapping.entries() {
            table.push_str(&format!("- {} → {}\n", entry.title, entry.token));
        }
        table
    };

    let system_instruction = format!(
        "당신은 대한민국 최고의 금융 전문가입니다. 현재 시점은 {month}입니다. \
         아래 제공되는 최신 뉴스 데이터와 당신의 지식을 결합하여 독자들에게 가장 정확하고 \
         유익한 글을 작성하세요.\n\n[참조 뉴스 데이터]\n{news_context}\n[엄격 규칙]\n\
         1. 인사말 및 자기소개 절대 금지.\n\
         2. 구텐베르크 블록 마커(<!-- wp:paragraph --> 등)만 사용하여 본문을 구조화하세요.\n\
         3. 한 단락은 3문장 이내로 짧게 구성하세요.\n\
         4. 마크다운 기호를 사용하지 마세요. 강조는 <strong> 태그를 쓰세요.\n\
         5. 같은 문장이나 단락을 반복하지 마세요.\n\
         6. 요약글은 150자 내외로 작성하세요.\n\
         7. 3,000자 이상의 풍부한 내용을 작성하세요.\n{link_guidance}"
    );

    let article_prompt = format!("주제: {topic}. 실시간 정보를 포함하여 깊이 있는 블로그 글을 작성해줘.");
    let response = ask_with_backoff(&http, &config, &article_prompt, Some(&system_instruction)).await?;

    let mut parsed = serde_json::from_str::<GeneratedPost>(&response);

    // If the parse failed due to EOF (truncation), re-ask ONCE
    if let Err(ref e) = parsed {
        if looks_truncated(e) {
            warn!(error = %e, "EOF while parsing; re-asking once");
            match ask_with_backoff(&http, &config, &article_prompt, Some(&system_instruction)).await {
                Ok(r2) => {
                    parsed = serde_json::from_str::<GeneratedPost>(&r2);
                }
                Err(e2) => {
                    warn!(error = %e2, "Re-ask failed");
                }
            }
        }
    }

    let post = match parsed {
        Ok(post) => post,
        Err(e) => {
            error!(
                error = %e,
                response_preview = %truncate_for_log(&response, 300),
                "Model returned non-conforming JSON; aborting"
            );
            return Err(e.into());
        }
    };

    let Some(body) = post.body() else {
        error!("Generated post has no content; aborting");
        return Err("generated post has no content".into());
    };
    if body.chars().count() < MIN_BODY_CHARS {
        error!(chars = body.chars().count(), "Generated body too short; aborting");
        return Err("generated body too short".into());
    }

    // ---- Sanitize ----
    let title = strip_markdown_noise(&post.title);
    let excerpt = strip_markdown_noise(&post.excerpt);
    let content = sanitize_document(&body, &mapping);

    for entry in mapping.entries() {
        if content.contains(&entry.token) {
            warn!(token = %entry.token, "Residual link token survived sanitization");
        }
    }
    info!(
        title = %title,
        body_chars = content.chars().count(),
        "Article sanitized"
    );

    // ---- Tags and publishing ----
    let tag_ids = wp.get_or_create_tags(&post.tag_names()).await;

    let payload = NewPost {
        title,
        content,
        excerpt,
        status: args.status.clone(),
        tags: tag_ids,
    };

    if args.dry_run {
        info!("Dry run; printing payload instead of publishing");
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let link = wp.create_post(&payload).await?;
        info!(%link, "Published");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
