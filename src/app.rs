//! Player application state
//!
//! Glue between macroquad input/drawing and the game session: routes
//! pointer events to the viewport, collaborator stand-ins (typed QR payloads,
//! the AR button, the replayed position track) to the session, and session
//! notifications to the modal queue.

use std::collections::VecDeque;

use macroquad::prelude::*;
use questmap::game::{Card, GameSession, Notification, ScanTarget};
use questmap::geo::TrackReplaySource;
use questmap::map::{GesturePhase, PointerEvent, Rect, Size, ViewportController};

use crate::ui::{
    draw_ar_viewer, draw_card, draw_map, draw_notification, draw_pins, draw_scanner, ArAction, CardAction,
    MouseState, ScannerAction, TextField, Toolbar, UiContext, ACCENT_COLOR, TEXT_COLOR, WARNING_COLOR,
};

const TOOLBAR_H: f64 = 44.0;

/// Mouse travel below which a press-release counts as a tap
const TAP_SLOP: f64 = 6.0;

/// Wheel zoom step
const WHEEL_ZOOM: f64 = 1.1;

/// Arrow-key nudge of the simulated position, about 10m of latitude
const NUDGE_DEG: f64 = 0.00009;

#[derive(Debug, Clone, Copy)]
struct MouseDrag {
    start: (f64, f64),
    last: (f64, f64),
    moved: bool,
}

pub struct PlayerApp {
    session: GameSession,
    viewport: ViewportController,
    source: TrackReplaySource,
    map_texture: Option<Texture2D>,
    notes: VecDeque<Notification>,
    /// Shared by the answer box and the scanner; only one is ever open
    field: TextField,
    ui: UiContext,
    drag: Option<MouseDrag>,
    sim_pos: Option<(f64, f64)>,
}

impl PlayerApp {
    pub fn new(
        session: GameSession,
        mut viewport: ViewportController,
        source: TrackReplaySource,
        map_texture: Option<Texture2D>,
    ) -> Self {
        let natural = session.game().map.as_ref().and_then(|m| m.natural_size);
        let image = natural
            .or_else(|| map_texture.as_ref().map(|t| Size::new(t.width() as f64, t.height() as f64)))
            .unwrap_or_default();
        viewport.load_image(image);

        // Start the simulated walker ~200m south of the first geofence
        let sim_pos = session
            .game()
            .gps_missions()
            .find_map(|m| m.geofence())
            .map(|f| (f.lat - 0.0018, f.lon));

        Self {
            session,
            viewport,
            source,
            map_texture,
            notes: VecDeque::new(),
            field: TextField::new(),
            ui: UiContext::new(),
            drag: None,
            sim_pos,
        }
    }

    fn overlay_open(&self) -> bool {
        !self.notes.is_empty()
            || self.session.scanner().is_some()
            || self.session.ar_viewer().is_some()
            || self.session.card().is_some()
    }

    /// One frame: feed collaborators, handle input, draw
    pub fn frame(&mut self, dt: f32) {
        self.source.advance((dt * 1000.0) as u64);
        self.session.pump_positions(&mut self.source);

        let screen = Rect::screen(screen_width() as f64, screen_height() as f64);
        let map_rect = screen.remaining_after_top(TOOLBAR_H);
        self.viewport.resize(map_rect);

        self.ui.begin_frame(MouseState::sample());
        let overlay = self.overlay_open();

        clear_background(crate::ui::BG_COLOR);
        draw_map(self.map_texture.as_ref(), &self.viewport);
        let pins = self.session.pin_views(&self.viewport);
        draw_pins(&pins, &self.viewport);

        self.draw_toolbar(screen.slice_top(TOOLBAR_H), overlay);

        // Releases must land even under a modal or the pointer table goes stale
        self.handle_touches(overlay);
        if !overlay {
            self.handle_mouse(map_rect);
            self.handle_keys();
        } else {
            self.drag = None;
        }

        self.notes.extend(self.session.drain_notifications());
        self.draw_overlay(screen);
    }

    // ========================================================================
    // Map input
    // ========================================================================

    fn handle_touches(&mut self, blocked: bool) {
        for touch in touches() {
            let (x, y) = (touch.position.x as f64, touch.position.y as f64);
            let event = match touch.phase {
                TouchPhase::Started => PointerEvent::Down,
                TouchPhase::Moved | TouchPhase::Stationary => PointerEvent::Move,
                TouchPhase::Ended => PointerEvent::Up,
                TouchPhase::Cancelled => PointerEvent::Cancel,
            };
            self.viewport.handle_pointer(touch.id, event, x, y, blocked);
        }
    }

    fn handle_mouse(&mut self, map_rect: Rect) {
        let mouse = self.ui.mouse;

        if mouse.scroll != 0.0 && map_rect.contains(mouse.x, mouse.y) {
            let factor = if mouse.scroll > 0.0 { WHEEL_ZOOM } else { 1.0 / WHEEL_ZOOM };
            self.viewport.zoom_by(factor, mouse.x, mouse.y);
        }

        // Pinching owns the pointers; single-pointer drag pans
        let pinching = self.viewport.gesture_phase() == GesturePhase::Pinching;

        if mouse.left_pressed && !self.ui.click_consumed && map_rect.contains(mouse.x, mouse.y) {
            self.drag = Some(MouseDrag {
                start: (mouse.x, mouse.y),
                last: (mouse.x, mouse.y),
                moved: false,
            });
        }

        if let Some(mut drag) = self.drag {
            if mouse.left_down && !pinching {
                let (dx, dy) = (mouse.x - drag.last.0, mouse.y - drag.last.1);
                if (mouse.x - drag.start.0).hypot(mouse.y - drag.start.1) > TAP_SLOP {
                    drag.moved = true;
                }
                if drag.moved {
                    self.viewport.pan_by(-dx, -dy);
                }
                drag.last = (mouse.x, mouse.y);
                self.drag = Some(drag);
            }
            if mouse.left_released || !mouse.left_down {
                if !drag.moved && !pinching {
                    self.session.tap_map(&self.viewport, drag.start.0, drag.start.1);
                }
                self.drag = None;
            }
        }
    }

    fn handle_keys(&mut self) {
        let Some((lat, lon)) = self.sim_pos else {
            return;
        };
        let (dlat, dlon) = if is_key_pressed(KeyCode::Up) {
            (NUDGE_DEG, 0.0)
        } else if is_key_pressed(KeyCode::Down) {
            (-NUDGE_DEG, 0.0)
        } else if is_key_pressed(KeyCode::Right) {
            (0.0, NUDGE_DEG)
        } else if is_key_pressed(KeyCode::Left) {
            (0.0, -NUDGE_DEG)
        } else {
            return;
        };
        let next = (lat + dlat, lon + dlon);
        self.sim_pos = Some(next);
        self.source.push_fix(next.0, next.1);
        tracing::debug!(lat = next.0, lon = next.1, "simulated position");
    }

    // ========================================================================
    // Chrome
    // ========================================================================

    fn draw_toolbar(&mut self, rect: Rect, overlay: bool) {
        let mut bar = Toolbar::new(rect);
        let title = self.session.game().title.clone();
        bar.label(&title, TEXT_COLOR);

        // Modals own the input while open
        if overlay {
            self.ui.click_consumed = true;
        }

        if bar.button(&mut self.ui, "QR", false) {
            self.field.clear();
            self.session.open_scanner(ScanTarget::Global);
        }

        let watching = self.session.is_watching();
        if self.session.game().has_gps_missions()
            && bar.button(&mut self.ui, if watching { "GPS on" } else { "GPS off" }, watching)
        {
            // Failures also arrive as notifications
            if let Err(err) = self.session.toggle_watch(&mut self.source) {
                tracing::debug!(error = %err, "watch toggle failed");
            }
        }

        if !self.session.game().intro.trim().is_empty() && bar.button(&mut self.ui, "Intro", false) {
            self.session.open_card(Card::Intro);
        }

        if self.session.options().test_mode {
            bar.label("TEST MODE", WARNING_COLOR);
            if bar.button(&mut self.ui, "Reset locks", false) {
                if let Err(err) = self.session.reset_locks() {
                    tracing::debug!(error = %err, "reset locks refused");
                }
            }
            if bar.button(&mut self.ui, "Unlock all", false) {
                if let Err(err) = self.session.unlock_all() {
                    tracing::debug!(error = %err, "unlock all refused");
                }
            }
        }

        let unlocked = self.session.unlocks().unlocked_count();
        let total = self.session.game().mission_count();
        bar.label(&format!("{}/{}", unlocked, total), ACCENT_COLOR);
        bar.label(&format!("x{:.2}", self.viewport.zoom()), TEXT_COLOR);

        if overlay {
            self.ui.click_consumed = false;
        }
        self.ui.block_pointer(&rect);
    }

    // ========================================================================
    // Overlays (one at a time: notification, scanner, AR, card)
    // ========================================================================

    fn draw_overlay(&mut self, screen: Rect) {
        if let Some(note) = self.notes.front() {
            if draw_notification(&mut self.ui, screen, note) {
                let action = note.on_confirm;
                self.notes.pop_front();
                self.session.confirm(action);
            }
            return;
        }

        if let Some(target) = self.session.scanner() {
            match draw_scanner(&mut self.ui, screen, target, &mut self.field) {
                ScannerAction::None => {}
                ScannerAction::Close => self.session.close_scanner(),
                ScannerAction::Detected(payload) => {
                    if let Err(e) = self.session.on_qr_detected(target, &payload) {
                        tracing::warn!(error = %e, "qr check failed");
                    }
                }
            }
            return;
        }

        if let Some(request) = self.session.ar_viewer().cloned() {
            match draw_ar_viewer(&mut self.ui, screen, &request) {
                ArAction::None => {}
                ArAction::Close => self.session.close_ar(),
                ArAction::TargetFound => {
                    if let Err(e) = self.session.on_ar_target_found(request.mission) {
                        tracing::warn!(error = %e, "ar unlock failed");
                    }
                }
            }
            return;
        }

        if let Some(card) = self.session.card() {
            let action = draw_card(&mut self.ui, screen, &self.session, card, &mut self.field);
            self.apply_card_action(action);
        }
    }

    fn apply_card_action(&mut self, action: CardAction) {
        let result = match action {
            CardAction::None => Ok(()),
            CardAction::Close => {
                self.field.clear();
                self.session.close_card();
                Ok(())
            }
            CardAction::ScanQr(i) => {
                self.field.clear();
                self.session.open_scanner(ScanTarget::Mission(i));
                Ok(())
            }
            CardAction::OpenAr(i) => self.session.open_ar(i).map(|_| ()),
            CardAction::DetectLocation(i) => self.session.detect_location(i, &mut self.source).map(|_| ()),
            CardAction::SubmitAnswer(i, answer) => self.session.submit_answer(i, &answer).map(|_| ()),
            CardAction::Skip(i) => self.session.skip_mission(i).map(|_| ()),
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "card action failed");
        }
    }
}
