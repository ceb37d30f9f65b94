//! Modal overlays: notifications, mission cards, the scanner and AR panels
//!
//! Each overlay draws itself centered over a dimmed backdrop, swallows all
//! pointer input for the frame, and reports what the player chose.

use macroquad::prelude::*;
use questmap::game::{ArRequest, Card, GameSession, Notification, ScanTarget, TriggerMethod};
use questmap::map::Rect;

use super::text_input::{draw_text_field, FieldEvent, TextField};
use super::theme::*;
use super::widgets::{draw_rounded_rect, draw_wrapped, text_button};
use super::UiContext;

const BUTTON_H: f64 = 36.0;

/// Dimmed backdrop plus a centered panel; returns the panel's content rect
fn begin_modal(ctx: &mut UiContext, screen: Rect, w: f64, h: f64) -> Rect {
    ctx.modal_open = true;
    draw_rectangle(0.0, 0.0, screen.w as f32, screen.h as f32, SCRIM_COLOR);

    let panel = screen.centered(w.min(screen.w - 24.0), h.min(screen.h - 24.0));
    draw_rounded_rect(panel.x as f32, panel.y as f32, panel.w as f32, panel.h as f32, 8.0, MODAL_BG);
    draw_rectangle_lines(panel.x as f32, panel.y as f32, panel.w as f32, panel.h as f32, 1.0, MODAL_BORDER);
    panel.pad(16.0)
}

/// Swallow whatever input the modal's widgets did not take
fn end_modal(ctx: &mut UiContext, screen: Rect) {
    ctx.block_pointer(&screen);
}

fn draw_title(text: &str, rect: Rect) {
    draw_text(text, rect.x as f32, (rect.y + FONT_SIZE_HEADER as f64) as f32, FONT_SIZE_HEADER, WHITE);
}

// =============================================================================
// Notification
// =============================================================================

/// Returns true when the confirm button is pressed
pub fn draw_notification(ctx: &mut UiContext, screen: Rect, note: &Notification) -> bool {
    let body = begin_modal(ctx, screen, 420.0, 220.0);
    draw_title(&note.title, body);
    draw_wrapped(
        &note.message,
        Rect::new(body.x, body.y + 36.0, body.w, body.h - 36.0 - BUTTON_H),
        FONT_SIZE_CONTENT,
        TEXT_COLOR,
    );

    let button = Rect::new(body.right() - 120.0, body.bottom() - BUTTON_H, 120.0, BUTTON_H);
    let confirmed = text_button(ctx, button, &note.confirm_label, true) || is_key_pressed(KeyCode::Enter);
    end_modal(ctx, screen);
    confirmed
}

// =============================================================================
// Mission card
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    None,
    Close,
    ScanQr(usize),
    OpenAr(usize),
    DetectLocation(usize),
    SubmitAnswer(usize, String),
    Skip(usize),
}

pub fn draw_card(ctx: &mut UiContext, screen: Rect, session: &GameSession, card: Card, field: &mut TextField) -> CardAction {
    let body = begin_modal(ctx, screen, 560.0, 460.0);
    let mut action = CardAction::None;
    let content = Rect::new(body.x, body.y + 40.0, body.w, body.h - 40.0 - BUTTON_H - 12.0);
    let buttons_y = body.bottom() - BUTTON_H;

    match card {
        Card::Intro => {
            let game = session.game();
            draw_title(&game.title, body);
            draw_wrapped(&game.intro, content, FONT_SIZE_CONTENT, TEXT_COLOR);
        }
        Card::Mission(index) => {
            if let Some(mission) = session.game().mission(index) {
                let unlocked = session.unlocks().is_unlocked(index);
                draw_title(&mission.display_title(), body);

                let mut x = body.x;
                let mut button = |ctx: &mut UiContext, label: &str| {
                    let w = measure_text(label, None, FONT_SIZE_CONTENT as u16, 1.0).width as f64 + 24.0;
                    let r = Rect::new(x, buttons_y, w, BUTTON_H);
                    x += w + 8.0;
                    text_button(ctx, r, label, false)
                };

                if !unlocked {
                    let mut text = format!("Locked ({})", mission.trigger_method.label());
                    if !mission.hint.text.trim().is_empty() {
                        text.push_str("\n\nHint: ");
                        text.push_str(&mission.hint.text);
                    }
                    draw_wrapped(&text, content, FONT_SIZE_CONTENT, TEXT_DIM);

                    match mission.trigger_method {
                        TriggerMethod::Qr => {
                            if button(ctx, "Scan QR") {
                                action = CardAction::ScanQr(index);
                            }
                        }
                        TriggerMethod::Gps => {
                            if button(ctx, "Detect my location") {
                                action = CardAction::DetectLocation(index);
                            }
                        }
                        TriggerMethod::Ar => {
                            if button(ctx, "Start AR") {
                                action = CardAction::OpenAr(index);
                            }
                        }
                    }
                    if session.options().role == questmap::game::PlayerRole::Mod && button(ctx, "Skip (Mod)") {
                        action = CardAction::Skip(index);
                    }
                } else if !mission.mission_type.is_answerable() {
                    draw_wrapped(&mission.content.message, content, FONT_SIZE_CONTENT, TEXT_COLOR);
                } else {
                    let used = draw_wrapped(&mission.content.question, content, FONT_SIZE_CONTENT, TEXT_COLOR);
                    let progress = session.progress(index);
                    let solved = progress.map(|p| p.is_solved()).unwrap_or(false);
                    let field_rect = Rect::new(content.x, content.y + used + 12.0, content.w, 36.0);

                    if solved {
                        let answer = progress.map(|p| p.submitted_answer.as_str()).unwrap_or("");
                        draw_text(
                            &format!("Solved: {}", answer),
                            field_rect.x as f32,
                            (field_rect.y + 24.0) as f32,
                            FONT_SIZE_CONTENT,
                            PIN_UNLOCKED,
                        );
                    } else {
                        let event = draw_text_field(field_rect, field, "Your answer", FONT_SIZE_CONTENT);
                        if (button(ctx, "Submit") || event == FieldEvent::Submitted) && !field.text.trim().is_empty() {
                            action = CardAction::SubmitAnswer(index, field.take());
                        }
                    }
                    if let Some(message) = progress.and_then(|p| p.result_message.as_deref()) {
                        draw_text(
                            message,
                            field_rect.x as f32,
                            (field_rect.bottom() + 24.0) as f32,
                            FONT_SIZE_SMALL,
                            TEXT_DIM,
                        );
                    }
                }
            }
        }
    }

    let close = Rect::new(body.right() - 100.0, buttons_y, 100.0, BUTTON_H);
    if text_button(ctx, close, "Close", false) || is_key_pressed(KeyCode::Escape) {
        action = CardAction::Close;
    }
    end_modal(ctx, screen);
    action
}

// =============================================================================
// QR scanner
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ScannerAction {
    None,
    Close,
    /// A payload was "decoded" (typed or pasted on desktop)
    Detected(String),
}

pub fn draw_scanner(ctx: &mut UiContext, screen: Rect, target: ScanTarget, field: &mut TextField) -> ScannerAction {
    let body = begin_modal(ctx, screen, 480.0, 220.0);
    let title = match target {
        ScanTarget::Global => "Scan any QR".to_string(),
        ScanTarget::Mission(i) => format!("Scan QR for mission {}", i + 1),
    };
    draw_title(&title, body);

    let mut action = ScannerAction::None;
    let field_rect = Rect::new(body.x, body.y + 56.0, body.w, 36.0);
    let event = draw_text_field(field_rect, field, "QR payload", FONT_SIZE_CONTENT);

    let buttons_y = body.bottom() - BUTTON_H;
    let scan = Rect::new(body.x, buttons_y, 100.0, BUTTON_H);
    if (text_button(ctx, scan, "Scan", true) || event == FieldEvent::Submitted) && !field.text.is_empty() {
        action = ScannerAction::Detected(field.take());
    }
    let close = Rect::new(body.right() - 100.0, buttons_y, 100.0, BUTTON_H);
    if text_button(ctx, close, "Close", false) || is_key_pressed(KeyCode::Escape) {
        action = ScannerAction::Close;
    }
    end_modal(ctx, screen);
    action
}

// =============================================================================
// AR viewer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArAction {
    None,
    Close,
    TargetFound,
}

/// Desktop stand-in for the camera view: shows what would be tracked
pub fn draw_ar_viewer(ctx: &mut UiContext, screen: Rect, request: &ArRequest) -> ArAction {
    let body = begin_modal(ctx, screen, 520.0, 240.0);
    draw_title(&format!("AR target {}", request.target_index), body);
    draw_wrapped(
        &request.mind_file_url,
        Rect::new(body.x, body.y + 40.0, body.w, 80.0),
        FONT_SIZE_SMALL,
        TEXT_DIM,
    );

    let mut action = ArAction::None;
    let buttons_y = body.bottom() - BUTTON_H;
    if text_button(ctx, Rect::new(body.x, buttons_y, 160.0, BUTTON_H), "Target found", true) {
        action = ArAction::TargetFound;
    }
    if text_button(ctx, Rect::new(body.right() - 100.0, buttons_y, 100.0, BUTTON_H), "Close", false)
        || is_key_pressed(KeyCode::Escape)
    {
        action = ArAction::Close;
    }
    end_modal(ctx, screen);
    action
}
