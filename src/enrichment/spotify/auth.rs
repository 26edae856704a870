//! Spotify connection state as seen by the enrichment engine.
//!
//! The OAuth flow lives elsewhere; we only need to know whether the user is
//! connected and get a bearer token when they are.

use async_trait::async_trait;

#[async_trait]
pub trait SpotifyAuth: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Current bearer token, `None` when disconnected or expired.
    async fn access_token(&self) -> Option<String>;
}

/// Auth backed by a fixed token from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticSpotifyAuth {
    token: Option<String>,
}

impl StaticSpotifyAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn disconnected() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl SpotifyAuth for StaticSpotifyAuth {
    fn is_connected(&self) -> bool {
        self.token.is_some()
    }

    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
