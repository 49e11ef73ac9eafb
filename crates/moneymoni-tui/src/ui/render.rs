use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use moneymoni_core::router::{GuardDecision, Route};

use crate::app::{App, AppState};
use crate::form::Form;

use super::styles;
use super::tabs::{self, accounts, budgets, categories, dashboard, transactions};

const LOGO: [&str; 3] = [
    "   ╔╦╗╔═╗╔╗╔╔═╗╦ ╦╔╦╗╔═╗╔╗╔╦",
    "   ║║║║ ║║║║║╣ ╚╦╝║║║║ ║║║║║",
    "   ╩ ╩╚═╝╝╚╝╚═╝ ╩ ╩ ╩╚═╝╝╚╝╩",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Page tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    if app.route() == Route::Login || matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if let Some(ref form) = app.form {
        render_form_overlay(frame, form);
    }

    if matches!(app.state, AppState::ConfirmingDelete) {
        render_delete_overlay(frame, app);
    }

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  MoneyMoni";
    let session_hint = match app.session.current_session() {
        Some(session) => format!(
            "{} · checked {} · expires in {}m  [L]ogout  [?] Help",
            session.user_type,
            app.session.session_age().unwrap_or_default(),
            session.minutes_until_expiry()
        ),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + session_hint.chars().count() + 2),
        )),
        Span::styled(session_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.route();
    let mut spans = vec![Span::raw(" ")];
    for (i, route) in Route::PAGES.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, route.title());
        if *route == current {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.guard_decision() {
        GuardDecision::Render(Route::Dashboard) => dashboard::render(frame, app, area),
        GuardDecision::Render(Route::Transactions) => transactions::render(frame, app, area),
        GuardDecision::Render(Route::Categories) => categories::render(frame, app, area),
        GuardDecision::Render(Route::Accounts) => accounts::render(frame, app, area),
        GuardDecision::Render(Route::Budgets) => budgets::render(frame, app, area),
        GuardDecision::Loading => {
            tabs::render_placeholder(frame, area, "MoneyMoni", "Checking your session...")
        }
        // Login is drawn as an overlay; redirects resolve on the next tick
        GuardDecision::Render(Route::Login) | GuardDecision::Redirect(_) => {}
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[u]pdate | [q]uit";

    let (left_text, left_style) = if let Some(ref msg) = app.status_message {
        (format!(" {} ", msg), styles::highlight_style())
    } else if app.busy || app.is_loading(app.route()) {
        (" Loading... ".to_string(), styles::muted_style())
    } else {
        (format!(" {} ", app.last_updated_display()), styles::muted_style())
    };

    let right_text = format!(" {} ", shortcuts);
    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 34, frame.area());
    frame.render_widget(Clear, area);

    let mut help_text = logo_lines();
    help_text.push(Line::from(Span::styled(
        format!("              version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-5", "Switch pages"),
        help_line("←/→", "Previous/next page"),
        help_line("↑/↓ j/k", "Navigate list"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line("Enter", "Edit / show detail"),
        help_line("Esc", "Close dialog or message"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("n", "New transaction / category / account / limit"),
        help_line("e", "Edit selected"),
        help_line("d", "Delete selected"),
        help_line("u", "Update data from the server"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Transactions", styles::highlight_style())),
        help_line("Enter", "Show list / detail"),
        help_line("/", "Search memo"),
        help_line("f / x", "Filter / clear filters"),
        help_line("< / >", "Previous/next page of results"),
        Line::from(""),
        Line::from(Span::styled(" Budgets", styles::highlight_style())),
        help_line("< / >", "Previous/next month"),
        help_line("s / x", "Save / discard changes"),
        Line::from(""),
        Line::from(vec![
            Span::styled("        Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    let masked = "*".repeat(app.login_pin.len());
    lines.push(Line::from(vec![
        Span::raw("         "),
        Span::styled("PIN: [", styles::muted_style()),
        Span::styled(format!("{:<12}▌", masked), styles::selected_style()),
        Span::styled("]", styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    let hint = if app.busy {
        "           Signing in..."
    } else {
        "       [Enter] log in   [Esc] quit"
    };
    lines.push(Line::from(Span::styled(hint, styles::muted_style())));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Log in ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, form: &Form) {
    let extra = if form.error.is_some() { 2 } else { 0 };
    let height = form.fields.len() as u16 + 6 + extra;
    let area = centered_rect_fixed(56, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let value_style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let value = if field.is_choice() {
            format!("◀ {} ▶", field.display())
        } else if focused {
            format!("{}▌", field.display())
        } else {
            field.display().to_string()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<10}", field.label), styles::muted_style()),
            Span::styled(value, value_style),
        ]));
    }

    lines.push(Line::from(""));
    let hint = if form.submitting {
        "  Saving..."
    } else {
        "  [Tab] next  [Space] change  [Enter] save  [Esc] cancel"
    };
    lines.push(Line::from(Span::styled(hint, styles::muted_style())));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(format!(" {} ", form.kind.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(56, 7, frame.area());
    frame.render_widget(Clear, area);

    let target = app
        .pending_delete
        .as_ref()
        .map(|t| t.description())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete {}?", target),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
