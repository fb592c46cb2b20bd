//! Keyboard input handling for the TUI.
//!
//! Overlays take keys first. Screens with a text cursor (forms, the note
//! editor, chat) receive printable characters, so the single-letter shortcuts
//! only apply on the other screens.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use neurotype_core::routes::Route;

use crate::app::{App, AppState, Form, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle delete confirmation
    if matches!(app.state, AppState::ConfirmingDelete) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.delete_note(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.current_route() {
        Route::Login => handle_login_input(app, key),
        Route::Register => handle_register_input(app, key),
        Route::Profile => handle_profile_input(app, key),
        Route::NoteDetail(_) if app.editor.editing => handle_editor_input(app, key),
        Route::Chat => handle_chat_input(app, key),
        _ => handle_normal_input(app, key),
    }
}

/// Keys shared by the screens without a text cursor
fn handle_normal_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Esc => {
            if !app.go_back() && app.current_route() == Route::Landing {
                app.state = AppState::ConfirmingQuit;
            }
            return Ok(false);
        }
        _ => {}
    }

    match app.current_route() {
        Route::Landing => match key.code {
            KeyCode::Enter | KeyCode::Char('l') => app.navigate(Route::Login),
            KeyCode::Char('r') => app.navigate(Route::Register),
            _ => {}
        },
        Route::Dashboard => handle_dashboard_input(app, key),
        Route::Notes => handle_notes_input(app, key),
        Route::NoteDetail(_) => match key.code {
            KeyCode::Char('e') | KeyCode::Enter => {
                if !app.editor.loading {
                    app.editor.editing = true;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => app.request_delete_note(),
            KeyCode::Up | KeyCode::Char('k') => app.editor.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => app.editor.scroll_down(1),
            KeyCode::PageUp => app.editor.scroll_up(PAGE_SCROLL_SIZE),
            KeyCode::PageDown => app.editor.scroll_down(PAGE_SCROLL_SIZE),
            KeyCode::Home => app.editor.scroll = 0,
            _ => {}
        },
        Route::Calendar => match key.code {
            KeyCode::Left | KeyCode::Char('h') => app.change_month(false),
            KeyCode::Right | KeyCode::Char('l') => app.change_month(true),
            KeyCode::Char('t') => app.current_month(),
            _ => {}
        },
        Route::Recommendations => {
            if key.code == KeyCode::Char('u') {
                app.refresh();
            }
        }
        Route::Export => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('e')) {
                app.run_export();
            }
        }
        Route::SelectPlan => match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
                app.plan = app.plan.toggle();
            }
            KeyCode::Enter => app.submit_plan(),
            _ => {}
        },
        // Handled by their own input functions
        Route::Login | Route::Register | Route::Profile | Route::Chat => {}
    }
    Ok(false)
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    let chat_enabled = app.dashboard.as_ref().is_some_and(|d| d.chat_enabled());
    match key.code {
        KeyCode::Char('n') => app.navigate(Route::Notes),
        KeyCode::Char('c') => app.navigate(Route::Calendar),
        KeyCode::Char('r') => app.navigate(Route::Recommendations),
        KeyCode::Char('x') => app.navigate(Route::Export),
        KeyCode::Char('t') if chat_enabled => app.navigate(Route::Chat),
        KeyCode::Char('p') => app.navigate(Route::Profile),
        KeyCode::Char('s') => app.navigate(Route::SelectPlan),
        KeyCode::Char('u') => app.refresh(),
        KeyCode::Char('l') => app.logout(),
        _ => {}
    }
}

fn handle_notes_input(app: &mut App, key: KeyEvent) {
    let len = app.notes.len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.notes_selection = app.notes_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.notes_selection + 1 < len {
                app.notes_selection += 1;
            }
        }
        KeyCode::PageUp => {
            app.notes_selection = app.notes_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            app.notes_selection = (app.notes_selection + PAGE_SCROLL_SIZE).min(len.saturating_sub(1));
        }
        KeyCode::Home => app.notes_selection = 0,
        KeyCode::End => app.notes_selection = len.saturating_sub(1),
        KeyCode::Enter => app.open_selected_note(),
        KeyCode::Char('n') => app.new_note(),
        KeyCode::Char('u') => app.refresh(),
        _ => {}
    }
}

/// Go back, or to `fallback` when there is no history
fn back_or(app: &mut App, fallback: Route) {
    if !app.go_back() {
        app.navigate(fallback);
    }
}

/// Keys common to every form. Returns true when the form should be submitted.
fn handle_form_keys(form: &mut Form, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Enter => {
            if form.on_button() || form.focus + 1 == form.fields.len() {
                return true;
            }
            form.focus_next();
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.push_char(c),
        _ => {}
    }
    false
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        back_or(app, Route::Landing);
        return Ok(false);
    }
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.navigate(Route::Register);
        return Ok(false);
    }
    if handle_form_keys(&mut app.login, key) {
        app.submit_login();
    }
    Ok(false)
}

fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        back_or(app, Route::Landing);
        return Ok(false);
    }
    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.navigate(Route::Login);
        return Ok(false);
    }
    if handle_form_keys(&mut app.register, key) {
        app.submit_register();
    }
    Ok(false)
}

fn handle_profile_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        back_or(app, Route::Dashboard);
        return Ok(false);
    }
    if handle_form_keys(&mut app.profile, key) {
        app.submit_profile();
    }
    Ok(false)
}

fn handle_editor_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('s') if ctrl => app.save_note(),
        KeyCode::Esc => {
            if app.editor.target.is_some_and(|t| t.is_new()) {
                back_or(app, Route::Notes);
            } else {
                // Drop unsaved changes
                app.editor.editing = false;
                if let Some(ref note) = app.editor.note {
                    app.editor.text = note.text.clone();
                }
            }
        }
        KeyCode::Enter => app.editor.text.push('\n'),
        KeyCode::Backspace => {
            app.editor.text.pop();
        }
        KeyCode::Tab => app.editor.text.push_str("    "),
        KeyCode::Char(c) if !ctrl => app.editor.text.push(c),
        _ => {}
    }
    Ok(false)
}

fn handle_chat_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => back_or(app, Route::Dashboard),
        KeyCode::Enter => app.send_chat(),
        KeyCode::PageUp => app.chat.scroll_older(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.chat.scroll_newer(PAGE_SCROLL_SIZE),
        KeyCode::Backspace => {
            app.chat.input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.push_chat_char(c),
        _ => {}
    }
    Ok(false)
}
