use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use moneymoni_core::router::Route;
use moneymoni_core::utils::{format_currency, parse_month_key};

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::{progress_bar, render_placeholder};

const BAR_WIDTH: usize = 16;

/// Render the Budgets page - one row per category limit for the month
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let month = parse_month_key(&app.budget_month)
        .map(|d| d.format("%Y/%m").to_string())
        .unwrap_or_else(|| app.budget_month.clone());
    let rows_data = app.budget_rows();

    if rows_data.is_empty() {
        let message = if app.is_loading(Route::Budgets) {
            "Loading budgets..."
        } else {
            "No budgets for this month. Press [n] to set a limit, [</>] to change month."
        };
        render_placeholder(frame, area, &format!("Budgets {}", month), message);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Category"),
        Cell::from(format!("{:>12}", "Limit")),
        Cell::from(format!("{:>12}", "Spent")),
        Cell::from(format!("{:>12}", "Remaining")),
        Cell::from("Progress"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(i, budget)| {
            let style = if i == app.budget_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let remaining = budget.remaining();
            let remaining_style = if remaining < 0.0 {
                styles::error_style()
            } else {
                styles::list_item_style()
            };
            let pct = budget.percentage();
            let staged = app
                .budget_edits
                .iter()
                .any(|e| e.category_id == budget.category_id);
            let name = if staged {
                format!("{} *", budget.category_display())
            } else {
                budget.category_display()
            };

            Row::new(vec![
                Cell::from(name),
                Cell::from(format!("{:>12}", format_currency(budget.amount_limit))),
                Cell::from(format!("{:>12}", format_currency(budget.amount_spent))),
                Cell::from(Span::styled(
                    format!("{:>12}", format_currency(remaining)),
                    remaining_style,
                )),
                Cell::from(Span::styled(
                    format!("{} {:>3.0}%", progress_bar(pct, BAR_WIDTH), pct),
                    styles::budget_style(budget.level()),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(BAR_WIDTH as u16 + 5),
    ];

    let unsaved = if app.has_unsaved_budgets() {
        " - unsaved, [s]ave [x] discard"
    } else {
        ""
    };
    let title = format!(" Budgets {} [</>]{} ", month, unsaved);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.budget_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
