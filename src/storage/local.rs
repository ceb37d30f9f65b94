//! Local filesystem game repository
//!
//! Games live as `<id>.json` (the API's shape) or `<id>.ron` under a base
//! directory. Image URLs are read as paths relative to that directory unless
//! they are absolute.

use super::record::GameRecord;
use super::{GameRepository, RepoError};
use crate::game::Game;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalGameRepository {
    base_dir: PathBuf,
}

impl Default for LocalGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalGameRepository {
    /// Rooted at the current directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    /// Ids of every game file in the directory, sorted
    pub fn list(&self) -> Result<Vec<String>, RepoError> {
        let mut ids: Vec<String> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("json") | Some("ron")))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Parse a game file directly, by extension
    pub fn load_file(path: &Path) -> Result<Game, RepoError> {
        let text = std::fs::read_to_string(path)?;
        let record: GameRecord = match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => ron::from_str(&text).map_err(|e| RepoError::Parse(e.to_string()))?,
            _ => serde_json::from_str(&text).map_err(|e| RepoError::Parse(e.to_string()))?,
        };
        let mut game = Game::from(record);
        if game.id.is_none() {
            game.id = path.file_stem().and_then(|s| s.to_str()).map(str::to_string);
        }
        Ok(game)
    }
}

impl GameRepository for LocalGameRepository {
    fn fetch_game_by_id(&self, id: &str) -> Result<Game, RepoError> {
        for ext in ["json", "ron"] {
            let path = self.base_dir.join(format!("{}.{}", id, ext));
            if path.is_file() {
                tracing::info!(path = %path.display(), "loading game");
                return Self::load_file(&path);
            }
        }
        Err(RepoError::NotFound(format!("game {}", id)))
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RepoError> {
        Ok(std::fs::read(self.resolve(url))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Size;
    use crate::storage::test_support::png_bytes;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, LocalGameRepository) {
        let dir = TempDir::new().unwrap();
        let repo = LocalGameRepository::with_base_dir(dir.path());
        (dir, repo)
    }

    #[test]
    fn test_fetch_json() {
        let (dir, repo) = setup_test_dir();
        std::fs::write(
            dir.path().join("hunt.json"),
            r#"{"title": "Hunt", "steps": [{"qrCode": "A"}, {"qrCode": "B"}]}"#,
        )
        .unwrap();

        let game = repo.fetch_game_by_id("hunt").unwrap();
        assert_eq!(game.title, "Hunt");
        assert_eq!(game.mission_count(), 2);
        // File stem stands in for a missing _id
        assert_eq!(game.id.as_deref(), Some("hunt"));
    }

    #[test]
    fn test_fetch_ron() {
        let (dir, repo) = setup_test_dir();
        std::fs::write(dir.path().join("park.ron"), r#"(title: "Park", steps: [(qrCode: "GATE")])"#).unwrap();
        let game = repo.fetch_game_by_id("park").unwrap();
        assert_eq!(game.missions[0].qr_code, "GATE");
    }

    #[test]
    fn test_not_found() {
        let (_dir, repo) = setup_test_dir();
        assert!(matches!(repo.fetch_game_by_id("missing"), Err(RepoError::NotFound(_))));
    }

    #[test]
    fn test_malformed() {
        let (dir, repo) = setup_test_dir();
        std::fs::write(dir.path().join("bad.json"), "{ nope").unwrap();
        assert!(matches!(repo.fetch_game_by_id("bad"), Err(RepoError::Parse(_))));
    }

    #[test]
    fn test_list() {
        let (dir, repo) = setup_test_dir();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.ron"), "()").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        assert_eq!(repo.list().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_map_size_probed() {
        let (dir, repo) = setup_test_dir();
        std::fs::write(dir.path().join("map.png"), png_bytes(20, 10)).unwrap();
        std::fs::write(
            dir.path().join("g.json"),
            r#"{"map": {"imageUrl": "map.png", "width": 0, "height": 0}}"#,
        )
        .unwrap();

        let mut game = repo.fetch_game_by_id("g").unwrap();
        assert_eq!(game.map.as_ref().unwrap().natural_size, None);
        let bytes = repo.fetch_map_image(&mut game).unwrap();
        assert!(bytes.is_some());
        assert_eq!(game.map.unwrap().natural_size, Some(Size::new(20.0, 10.0)));
    }

    #[test]
    fn test_no_map() {
        let (dir, repo) = setup_test_dir();
        std::fs::write(dir.path().join("g.json"), "{}").unwrap();
        let mut game = repo.fetch_game_by_id("g").unwrap();
        assert_eq!(repo.fetch_map_image(&mut game).unwrap(), None);
    }
}
