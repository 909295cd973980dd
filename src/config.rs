use std::env;
use std::time::Duration;

use crate::top::DEFAULT_TOP_PLAYLIST_IDS;

const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_api_base: String,
    pub spotify_token_url: String,
    pub upstream_timeout: Duration,
    pub recommender_url: Option<String>,
    pub max_recommender_calls: usize,
    pub top_playlist_ids: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8081);

        let spotify_client_id = env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_ID is required"))?;

        let spotify_client_secret = env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_SECRET is required"))?;

        let spotify_api_base =
            env::var("SPOTIFY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let spotify_token_url =
            env::var("SPOTIFY_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.into());

        let upstream_timeout = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        let recommender_url = env::var("RECOMMENDER_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());

        let max_recommender_calls = match env::var("MAX_RECOMMENDER_CALLS") {
            Ok(raw) => parse_call_budget(&raw)?,
            Err(_) => 2,
        };

        let top_playlist_ids = env::var("TOP_PLAYLIST_IDS")
            .ok()
            .map(|raw| split_ids(&raw))
            .filter(|ids| !ids.is_empty())
            .unwrap_or_else(|| DEFAULT_TOP_PLAYLIST_IDS.iter().map(|s| s.to_string()).collect());

        Ok(Self {
            port,
            spotify_client_id,
            spotify_client_secret,
            spotify_api_base,
            spotify_token_url,
            upstream_timeout,
            recommender_url,
            max_recommender_calls,
            top_playlist_ids,
        })
    }
}

fn parse_call_budget(raw: &str) -> anyhow::Result<usize> {
    let n: usize = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("MAX_RECOMMENDER_CALLS must be an integer, got {raw:?}"))?;
    if n == 0 || n > crate::recommender::MAX_CALLS {
        anyhow::bail!(
            "MAX_RECOMMENDER_CALLS must be in 1..={}, got {n}",
            crate::recommender::MAX_CALLS
        );
    }
    Ok(n)
}

/// Splits a comma separated id list, dropping blanks.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
