//! Input handling: maps key/mouse events to gallery operations.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::config::Action;
use crate::core::gallery::GalleryControls;
use crate::ui::gallery_widget::{screen_for, CELL_PX_W};

use super::state::AppState;

/// Wheel delta, in virtual pixels, for one terminal scroll notch.
pub const WHEEL_STEP: f64 = 100.0;

/// Bend change per key press.
pub const BEND_STEP: f64 = 0.5;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    // Ctrl+c always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    // Digits jump straight to an item.
    if let KeyCode::Char(c @ '1'..='9') = key.code {
        if key.modifiers.is_empty() {
            let index = (c as u8 - b'1') as usize;
            jump_to(state, index);
            return;
        }
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;

    let gallery = &mut state.gallery;
    match action {
        Action::Quit => state.should_quit = true,
        Action::Next => gallery.next(),
        Action::Prev => gallery.prev(),
        Action::First => jump_to(state, 0),
        Action::Last => {
            let last = state.gallery.len().saturating_sub(1);
            jump_to(state, last);
        }
        Action::BendUp => {
            let bend = gallery.config().bend + BEND_STEP;
            gallery.set_bend(bend);
        }
        Action::BendDown => {
            let bend = gallery.config().bend - BEND_STEP;
            gallery.set_bend(bend);
        }
    }
}

fn jump_to(state: &mut AppState, index: usize) {
    match state.gallery.go_to(index) {
        Ok(()) => state.status_message = None,
        Err(e) => state.status_message = Some(e.to_string()),
    }
}

/// Process a mouse event.  Terminal cells are converted to virtual pixels
/// so drag distances match the pointer sensitivities.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    let area = state.gallery_area;
    let x = pixel_x(area, mouse.column);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if point_in_rect(area, mouse.column, mouse.row) {
                state.gallery.pointer_down(x);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => state.gallery.pointer_move(x),
        MouseEventKind::Up(MouseButton::Left) => {
            if state.gallery.is_dragging() {
                state.gallery.pointer_up();
            }
        }
        MouseEventKind::ScrollDown | MouseEventKind::ScrollRight => {
            state.gallery.wheel(WHEEL_STEP)
        }
        MouseEventKind::ScrollUp | MouseEventKind::ScrollLeft => {
            state.gallery.wheel(-WHEEL_STEP)
        }
        _ => {}
    }
}

/// Terminal resized: the gallery area changed.
pub fn handle_resize(state: &mut AppState, gallery_area: Rect) {
    if gallery_area == state.gallery_area {
        return;
    }
    state.gallery_area = gallery_area;
    state.gallery.resize(screen_for(gallery_area));
    state.thumbs.clear();
}

fn pixel_x(area: Rect, column: u16) -> f64 {
    column.saturating_sub(area.x) as f64 * CELL_PX_W + CELL_PX_W / 2.0
}

fn point_in_rect(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}
