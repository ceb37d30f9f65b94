//! HTTP game repository
//!
//! Talks to the game API with blocking `ureq` requests. The player fetches
//! once at startup, before the first frame, so blocking is acceptable here.

use super::record::GameRecord;
use super::{GameRepository, RepoError};
use crate::game::Game;
use std::io::Read;

/// Largest image the player will download
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpGameRepository {
    api_base: String,
}

impl HttpGameRepository {
    /// `api_base` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn game_url(&self, id: &str) -> String {
        format!("{}/games/{}", self.api_base, id)
    }

    /// Absolute image URLs pass through; relative ones hang off the API host
    pub fn image_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            let host = self.api_base.trim_end_matches("/api");
            format!("{}/{}", host, url.trim_start_matches('/'))
        }
    }

    fn get_request(&self, url: &str) -> Result<ureq::Response, RepoError> {
        ureq::get(url).call().map_err(Self::convert_error)
    }

    fn convert_error(e: ureq::Error) -> RepoError {
        match e {
            ureq::Error::Status(401, _) | ureq::Error::Status(403, _) => {
                RepoError::PermissionDenied("game is not public".into())
            }
            ureq::Error::Status(404, _) => RepoError::NotFound("game not found".into()),
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                RepoError::Network(format!("HTTP {}: {}", code, body))
            }
            other => RepoError::Network(other.to_string()),
        }
    }
}

impl GameRepository for HttpGameRepository {
    fn fetch_game_by_id(&self, id: &str) -> Result<Game, RepoError> {
        let url = self.game_url(id);
        tracing::info!(%url, "fetching game");
        let record: GameRecord = self
            .get_request(&url)?
            .into_json()
            .map_err(|e| RepoError::Parse(e.to_string()))?;
        Ok(Game::from(record))
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RepoError> {
        let url = self.image_url(url);
        tracing::debug!(%url, "fetching image");
        let response = self.get_request(&url)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_IMAGE_BYTES)
            .read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let repo = HttpGameRepository::new("http://localhost:5000/api/");
        assert_eq!(repo.api_base(), "http://localhost:5000/api");
        assert_eq!(repo.game_url("abc"), "http://localhost:5000/api/games/abc");
        assert_eq!(repo.image_url("https://cdn/x.png"), "https://cdn/x.png");
        assert_eq!(repo.image_url("/uploads/map.png"), "http://localhost:5000/uploads/map.png");
    }
}
