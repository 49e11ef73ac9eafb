use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use moneymoni_core::router::Route;

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::render_placeholder;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let accounts = app.accounts();
    if accounts.is_empty() {
        let message = if app.is_loading(Route::Accounts) {
            "Loading accounts..."
        } else {
            "No accounts yet. Press [n] to add one."
        };
        render_placeholder(frame, area, "Accounts", message);
        return;
    }

    let items: Vec<ListItem> = accounts
        .iter()
        .enumerate()
        .map(|(i, account)| {
            let mut spans = vec![
                Span::raw(format!(" {:<30}", account.name)),
                Span::styled(format!("{:<8}", account.kind.label()), styles::muted_style()),
            ];
            if !account.is_active {
                spans.push(Span::styled(" (inactive)", styles::muted_style()));
            }

            let style = if i == app.account_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let block = Block::default()
        .title(format!(
            " Accounts ({}) - [n]ew [e]dit [d]elete ",
            accounts.len()
        ))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.account_selection));

    frame.render_stateful_widget(list, area, &mut state);
}
