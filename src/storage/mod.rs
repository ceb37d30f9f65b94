//! Game Storage
//!
//! Read-only access to game snapshots and their map images:
//! - `LocalGameRepository`: a directory of `<id>.json` / `<id>.ron` files
//! - `HttpGameRepository`: the game API (`GET {api}/games/{id}`), native only
//!
//! A game is fetched once when a session starts; the session never goes back
//! to storage afterwards.

pub mod local;
pub mod record;

#[cfg(not(target_arch = "wasm32"))]
pub mod http;

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpGameRepository;
pub use local::LocalGameRepository;
pub use record::{GameRecord, GpsRecord, MapPosKind, MapPosRecord, MapRecord, StepRecord};

use crate::game::Game;
use crate::map::Size;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed game record: {0}")]
    Parse(String),
    #[error("unreadable map image: {0}")]
    Image(String),
}

impl From<std::io::Error> for RepoError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => RepoError::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => RepoError::PermissionDenied(e.to_string()),
            _ => RepoError::Io(e.to_string()),
        }
    }
}

/// Source of game snapshots
pub trait GameRepository {
    fn fetch_game_by_id(&self, id: &str) -> Result<Game, RepoError>;

    /// Raw bytes of an image referenced by a game (map, hints)
    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RepoError>;

    /// Fetch the map image of a game and fill in its natural size when the
    /// record did not carry one. Returns the image bytes.
    fn fetch_map_image(&self, game: &mut Game) -> Result<Option<Vec<u8>>, RepoError> {
        let Some(map) = game.map.as_mut() else {
            return Ok(None);
        };
        let bytes = self.fetch_image(&map.image_url)?;
        if map.natural_size.is_none() {
            let size = probe_image_size(&bytes)?;
            tracing::debug!(w = size.w, h = size.h, "probed map size");
            map.natural_size = Some(size);
        }
        Ok(Some(bytes))
    }
}

/// Natural pixel size of an encoded image
pub fn probe_image_size(bytes: &[u8]) -> Result<Size, RepoError> {
    use image::GenericImageView;

    let img = image::load_from_memory(bytes).map_err(|e| RepoError::Image(e.to_string()))?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(RepoError::Image("image has no pixels".into()));
    }
    Ok(Size::new(w as f64, h as f64))
}

#[cfg(test)]
pub(crate) mod test_support {
    /// A small PNG for map tests
    pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([40, 120, 60, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }
}
