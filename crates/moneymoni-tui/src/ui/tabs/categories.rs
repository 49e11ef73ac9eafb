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
    let categories = app.categories();
    if categories.is_empty() {
        let message = if app.is_loading(Route::Categories) {
            "Loading categories..."
        } else {
            "No categories yet. Press [n] to add one."
        };
        render_placeholder(frame, area, "Categories", message);
        return;
    }

    let items: Vec<ListItem> = categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let mut spans = vec![Span::raw(format!(" {:<30}", category.name))];
            if let Some(parent) = category
                .parent_id
                .and_then(|id| categories.iter().find(|c| c.id == id))
            {
                spans.push(Span::styled(format!("in {}", parent.name), styles::muted_style()));
            }
            if !category.is_active {
                spans.push(Span::styled(" (inactive)", styles::muted_style()));
            }

            let style = if i == app.category_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let block = Block::default()
        .title(format!(
            " Categories ({}) - [n]ew [e]dit [d]elete ",
            categories.len()
        ))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.category_selection));

    frame.render_stateful_widget(list, area, &mut state);
}
