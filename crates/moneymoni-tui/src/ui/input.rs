//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use moneymoni_core::router::Route;

use crate::app::{can_add_pin_char, App, AppState, Focus, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) || app.route() == Route::Login {
        return handle_login_input(app, key).await;
    }

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
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_delete().await;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_delete();
            }
            _ => {}
        }
        return Ok(false);
    }

    if matches!(app.state, AppState::EditingForm) {
        return handle_form_input(app, key).await;
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        return handle_search_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('u') => {
            app.status_message = None;
            app.refresh_current();
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout().await;
            return Ok(false);
        }
        KeyCode::Esc => {
            if app.focus == Focus::Detail {
                app.focus = Focus::List;
            } else {
                app.dismiss_status();
            }
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.navigate(Route::PAGES[index]);
            return Ok(false);
        }
        KeyCode::Left => {
            app.navigate(app.route().prev());
            return Ok(false);
        }
        KeyCode::Right => {
            app.navigate(app.route().next());
            return Ok(false);
        }
        KeyCode::Tab => {
            if app.route() == Route::Transactions {
                app.toggle_focus();
            }
            return Ok(false);
        }
        _ => {}
    }

    // List navigation shared by every page with a list
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        _ => match app.route() {
            Route::Transactions => handle_transactions_input(app, key),
            Route::Categories | Route::Accounts => handle_reference_input(app, key),
            Route::Budgets => handle_budgets_input(app, key).await,
            Route::Dashboard | Route::Login => {}
        },
    }

    Ok(false)
}

fn handle_transactions_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.open_new_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('f') => app.open_filter_form(),
        KeyCode::Char('x') => app.clear_filters(),
        KeyCode::Char('<') | KeyCode::Char(',') => app.prev_page(),
        KeyCode::Char('>') | KeyCode::Char('.') => app.next_page(),
        KeyCode::Enter => app.toggle_focus(),
        _ => {}
    }
}

/// Categories and accounts share the same key set.
fn handle_reference_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.open_new_form(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit_form(),
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
}

async fn handle_budgets_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.open_new_form(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit_form(),
        KeyCode::Char('s') => app.save_budgets().await,
        KeyCode::Char('x') => app.discard_budget_edits(),
        KeyCode::Char('<') | KeyCode::Char(',') => app.shift_budget_month(-1),
        KeyCode::Char('>') | KeyCode::Char('.') => app.shift_budget_month(1),
        _ => {}
    }
}

async fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        app.cancel_form();
        return Ok(false);
    }
    if key.code == KeyCode::Enter {
        app.submit_form().await;
        return Ok(false);
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return Ok(false);
    };
    let on_choice = form.focused().is_some_and(|f| f.is_choice());

    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Right if on_choice => form.cycle_choice(true),
        KeyCode::Left if on_choice => form.cycle_choice(false),
        KeyCode::Char(' ') if on_choice => form.cycle_choice(true),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.apply_search(),
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            if crate::form::can_add_field_char(app.search_input.chars().count(), c) {
                app.search_input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if app.busy {
        return Ok(false);
    }
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Enter => {
            // On failure login_error is set and the form stays up
            let _ = app.attempt_login().await;
        }
        KeyCode::Backspace => {
            app.login_pin.pop();
        }
        KeyCode::Char(c) => {
            if can_add_pin_char(app.login_pin.len(), c) {
                app.login_pin.push(c);
                app.login_error = None;
            }
        }
        _ => {}
    }
    Ok(false)
}
