mod aggregate;
mod cache;
mod config;
mod error;
#[cfg(test)]
mod fake;
mod handlers;
mod recommender;
mod search;
mod segment;
mod spotify;
mod top;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::PlaylistCache;
use crate::config::Config;
use crate::handlers::{router, AppState};
use crate::recommender::{HttpRecommender, NullRecommender, Recommender};
use crate::spotify::SpotifyClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let spotify = SpotifyClient::new(&config)?;

    let recommender: Arc<dyn Recommender> = match &config.recommender_url {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(config.upstream_timeout)
                .build()?;
            Arc::new(HttpRecommender::new(client, url.clone()))
        }
        None => {
            tracing::warn!("RECOMMENDER_URL not set, recommendations will be empty");
            Arc::new(NullRecommender)
        }
    };

    let state = AppState {
        api: Arc::new(spotify),
        recommender,
        cache: Arc::new(PlaylistCache::new()),
        max_recommender_calls: config.max_recommender_calls,
        top_playlist_ids: Arc::new(config.top_playlist_ids.clone()),
    };

    let app = router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
