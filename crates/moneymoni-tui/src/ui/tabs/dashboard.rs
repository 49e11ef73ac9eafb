use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use moneymoni_core::router::Route;
use moneymoni_core::utils::{format_currency, format_date, parse_month_key, truncate_string};

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::{progress_bar, render_placeholder};

const BAR_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(data) = app.dashboard() else {
        let message = if app.is_loading(Route::Dashboard) {
            "Loading this month's summary..."
        } else {
            "No data yet. Press [u] to update."
        };
        render_placeholder(frame, area, "Dashboard", message);
        return;
    };

    // Summary on top, recent transactions | budgets below
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(area);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let month = parse_month_key(&data.month)
        .map(|d| d.format("%Y/%m").to_string())
        .unwrap_or_else(|| data.month.clone());
    let stats = &data.stats;
    let balance = stats.balance();
    let balance_style = if balance < 0.0 {
        styles::error_style()
    } else {
        styles::success_style()
    };

    let summary = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Income:        ", styles::muted_style()),
            Span::styled(format_currency(stats.income), styles::success_style()),
        ]),
        Line::from(vec![
            Span::styled("  Expenses:      ", styles::muted_style()),
            Span::styled(format_currency(stats.expense), styles::error_style()),
        ]),
        Line::from(vec![
            Span::styled("  Balance:       ", styles::muted_style()),
            Span::styled(format_currency(balance), balance_style),
        ]),
        Line::from(vec![
            Span::styled("  Transactions:  ", styles::muted_style()),
            Span::raw(stats.transaction_count.to_string()),
        ]),
    ];
    let block = Block::default()
        .title(format!(" {} ", month))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(summary).block(block), chunks[0]);

    render_recent(frame, app, bottom[0]);
    render_budget_progress(frame, app, bottom[1]);
}

fn render_recent(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    if let Some(data) = app.dashboard() {
        if data.stats.recent.is_empty() {
            lines.push(Line::from(Span::styled(
                " No transactions this month",
                styles::muted_style(),
            )));
        }
        let memo_width = (area.width as usize).saturating_sub(30).max(8);
        for t in &data.stats.recent {
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<10} ", format_date(t.date)), styles::muted_style()),
                Span::raw(format!(
                    "{:<width$} ",
                    truncate_string(t.memo_display(), memo_width),
                    width = memo_width
                )),
                Span::styled(
                    format!("{:>12}", t.signed_amount_display()),
                    styles::amount_style(t.kind),
                ),
            ]));
        }
    }

    let block = Block::default()
        .title(" Recent ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_budget_progress(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    if let Some(data) = app.dashboard() {
        if data.budgets.is_empty() {
            lines.push(Line::from(Span::styled(
                " No budgets set for this month",
                styles::muted_style(),
            )));
            lines.push(Line::from(Span::styled(
                " Add limits on the Budgets page [5]",
                styles::muted_style(),
            )));
        }
        for budget in &data.budgets {
            let pct = budget.percentage();
            lines.push(Line::from(vec![
                Span::raw(format!(" {:<14} ", truncate_string(&budget.category_display(), 14))),
                Span::styled(progress_bar(pct, BAR_WIDTH), styles::budget_style(budget.level())),
                Span::styled(format!(" {:>3.0}%", pct), styles::muted_style()),
            ]));
            lines.push(Line::from(Span::styled(
                format!(
                    "   {} / {}",
                    format_currency(budget.amount_spent),
                    format_currency(budget.amount_limit)
                ),
                styles::muted_style(),
            )));
        }
    }

    let block = Block::default()
        .title(" Budgets ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
