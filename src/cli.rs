//! Command-line interface definitions for gutenpress.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials come from the config file or environment (see
//! [`crate::config`]); the flags here select what a single run does.

use clap::Parser;

/// Command-line arguments for a single publishing run.
///
/// # Examples
///
/// ```sh
/// # Generate and publish with credentials from the environment
/// gutenpress
///
/// # Rehearse without publishing
/// gutenpress --dry-run
///
/// # Use a curated link store and a different news query
/// gutenpress --query "기초연금" --link-store ./links.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// News search query used to ground generation
    #[arg(short, long, default_value = "국민연금 개혁")]
    pub query: String,

    /// Path to a JSON file of curated links to offer the model
    #[arg(long, env = "LINK_STORE")]
    pub link_store: Option<String>,

    /// How many of the blog's recent posts to offer as internal links
    #[arg(long, default_value_t = 5)]
    pub recent_posts: usize,

    /// WordPress post status for the created post
    #[arg(long, default_value = "publish")]
    pub status: String,

    /// Generate and sanitize, but print instead of publishing
    #[arg(long)]
    pub dry_run: bool,
}
