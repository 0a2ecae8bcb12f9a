use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use blog_shared::PostId;

const DEFAULT_SERVER_URL: &str = "https://localhost:7270/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub post_id: Option<PostId>,
    pub auth_token: Option<String>,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_file = match var("BLOG_LOG_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_log_file()?,
        };

        Ok(Self {
            server_url: var("BLOG_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            post_id: var("BLOG_POST_ID").map(PostId::new),
            auth_token: var("BLOG_AUTH_TOKEN"),
            log_file,
        })
    }
}

fn default_log_file() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("Could not find a data directory for the log file")?;

    Ok(data_dir.join("blog-tui").join("blog-tui.log"))
}
