use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::App;
use crate::view::Mode;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // ── Schedule picker intercepts all keys while open ────────────────
    if app.picker.is_some() {
        handle_picker_key(app, code, modifiers);
        return;
    }

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        (KeyCode::Tab, _) | (KeyCode::BackTab, _) | (KeyCode::Char('m'), _) => {
            app.toggle_mode();
            return;
        }
        _ => {}
    }

    match code {
        KeyCode::Char('/') | KeyCode::Char('s') => app.open_picker(),
        KeyCode::Char('r') if !app.syncing => app.start_sync(true),
        // Day selector only exists in simplified mode.
        _ if app.selection.mode == Mode::Simplified => handle_day_key(app, code),
        _ => {}
    }
}

fn handle_day_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Right | KeyCode::Char('l') => app.next_day(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_day(),
        KeyCode::Home | KeyCode::Char('g') => app.select_day(0),
        KeyCode::End | KeyCode::Char('G') => app.select_day(usize::MAX),
        KeyCode::Char('t') => app.reset_day_to_today(),
        KeyCode::Char(c @ '1'..='7') => app.select_day(c as usize - '1' as usize),
        _ => {}
    }
}

fn handle_picker_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Esc, _) => app.close_picker(),
        (KeyCode::Enter, _) => app.picker_confirm(),
        (KeyCode::Down, _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
            if let Some(picker) = app.picker.as_mut() {
                picker.list_state.select_next();
            }
        }
        (KeyCode::Up, _) | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
            if let Some(picker) = app.picker.as_mut() {
                picker.list_state.select_prev();
            }
        }
        (KeyCode::Backspace, _) => app.picker_pop(),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => app.picker_push(c),
        _ => {}
    }
}
