//! QUESTMAP player
//!
//! Desktop front-end for playing a scavenger-hunt game: the map with its
//! mission pins, the toolbar, mission cards and notifications. Camera-based
//! collaborators are stood in for: QR payloads are typed, the AR viewer has
//! a "Target found" button, and positions come from a replayed track (or
//! arrow-key nudges).

mod app;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use macroquad::prelude::*;
use questmap::game::{Game, GameSession};
use questmap::geo::TrackReplaySource;
use questmap::map::{Rect, ViewportController};
use questmap::storage::{GameRepository, HttpGameRepository, LocalGameRepository, RepoError};
use questmap::{PlayerConfig, VERSION};
use tracing_subscriber::EnvFilter;

use app::PlayerApp;

#[derive(Parser, Debug)]
#[command(name = "questmap", version, about = "Play a scavenger-hunt game")]
struct Cli {
    /// Game file (.json / .ron), or a game id with --remote
    game: String,

    /// Fetch the game from the API instead of a local file
    #[arg(long)]
    remote: bool,

    /// Override the API base URL
    #[arg(long)]
    api: Option<String>,

    /// Position track (RON) to replay as the device location
    #[arg(long)]
    track: Option<PathBuf>,

    /// Enable test tools (reset locks, unlock all)
    #[arg(long)]
    test: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("QUESTMAP v{}", VERSION),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("questmap=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> PlayerConfig {
    let path = cli.config.clone().unwrap_or_else(PlayerConfig::default_path);
    let mut config = match PlayerConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            PlayerConfig::default()
        }
    };
    if let Some(api) = &cli.api {
        config.api_base = api.clone();
    }
    if cli.test {
        config.test_mode = true;
    }
    config
}

/// Fetch the game and its map image bytes
fn load_game(cli: &Cli, config: &PlayerConfig) -> Result<(Game, Option<Vec<u8>>), RepoError> {
    let (mut game, repo): (Game, Box<dyn GameRepository>) = if cli.remote {
        let repo = HttpGameRepository::new(config.api_base.clone());
        (repo.fetch_game_by_id(&cli.game)?, Box::new(repo))
    } else {
        let path = PathBuf::from(&cli.game);
        let base = path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let game = LocalGameRepository::load_file(&path)?;
        (game, Box::new(LocalGameRepository::with_base_dir(base)))
    };

    let map_bytes = match repo.fetch_map_image(&mut game) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "map image unavailable");
            None
        }
    };
    Ok((game, map_bytes))
}

fn map_texture(bytes: &[u8]) -> Option<Texture2D> {
    match image::load_from_memory(bytes) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            let (Ok(w), Ok(h)) = (u16::try_from(w), u16::try_from(h)) else {
                tracing::warn!(w, h, "map image too large for a texture");
                return None;
            };
            let texture = Texture2D::from_rgba8(w, h, rgba.as_raw());
            texture.set_filter(FilterMode::Linear);
            Some(texture)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode map image");
            None
        }
    }
}

fn load_track(cli: &Cli) -> TrackReplaySource {
    match &cli.track {
        Some(path) => match TrackReplaySource::load(path) {
            Ok(track) => {
                tracing::info!(path = %path.display(), points = track.remaining(), "replaying position track");
                track
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not load track");
                TrackReplaySource::new(Vec::new())
            }
        },
        None => TrackReplaySource::new(Vec::new()),
    }
}

/// Keep a window up with the load error until it is closed
async fn error_screen(message: String) {
    loop {
        clear_background(ui::BG_COLOR);
        ui::draw_wrapped(
            &message,
            Rect::new(24.0, 24.0, screen_width() as f64 - 48.0, screen_height() as f64 - 48.0),
            ui::FONT_SIZE_HEADER,
            ui::TEXT_COLOR,
        );
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        next_frame().await;
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli);
    tracing::info!(version = VERSION, api = %config.api_base, "=== QUESTMAP ===");

    let (game, map_bytes) = match load_game(&cli, &config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, game = %cli.game, "could not load game");
            error_screen(format!("Could not load game \"{}\": {}", cli.game, e)).await;
            return;
        }
    };

    let texture = map_bytes.as_deref().and_then(map_texture);
    let session = GameSession::new(game, config.session_options());
    let bounds = Rect::screen(screen_width() as f64, screen_height() as f64);
    let viewport = ViewportController::with_limits(bounds, config.zoom, config.pinch_threshold);

    let mut app = PlayerApp::new(session, viewport, load_track(&cli), texture);

    loop {
        app.frame(get_frame_time());
        next_frame().await;
    }
}
