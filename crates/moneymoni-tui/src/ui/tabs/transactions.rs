use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use moneymoni_core::models::{Transaction, TransactionQuery};
use moneymoni_core::router::Route;
use moneymoni_core::utils::{format_currency, format_date, format_number};

use crate::app::{App, AppState, Focus};
use crate::ui::styles;

/// Render the Transactions page - filter bar, table, and detail panel
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);

    render_filter_bar(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    render_table(frame, app, body[0]);
    render_detail(frame, app, body[1]);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.state == AppState::Searching {
        Line::from(vec![
            Span::styled(" Search: ", styles::search_style()),
            Span::raw(app.search_input.clone()),
            Span::styled("▌", styles::search_style()),
            Span::styled("  [Enter] apply  [Esc] cancel", styles::muted_style()),
        ])
    } else if app.tx_query.has_filters() {
        Line::from(vec![
            Span::styled(" Filters: ", styles::highlight_style()),
            Span::raw(filter_summary(app, &app.tx_query)),
            Span::styled("  [x] clear", styles::muted_style()),
        ])
    } else {
        Line::from(Span::styled(
            " [/] search  [f] filter  [n] new  [e] edit  [d] delete  [</>] page",
            styles::muted_style(),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// One-line description of the active filters.
fn filter_summary(app: &App, query: &TransactionQuery) -> String {
    let mut parts = vec![];
    match (query.from_date, query.to_date) {
        (Some(from), Some(to)) => parts.push(format!("{} - {}", format_date(from), format_date(to))),
        (Some(from), None) => parts.push(format!("from {}", format_date(from))),
        (None, Some(to)) => parts.push(format!("until {}", format_date(to))),
        (None, None) => {}
    }
    if let Some(id) = query.category_id {
        let name = app
            .categories()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{}", id));
        parts.push(format!("category {}", name));
    }
    if let Some(id) = query.account_id {
        let name = app
            .accounts()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| format!("#{}", id));
        parts.push(format!("account {}", name));
    }
    if let Some(ref q) = query.q {
        parts.push(format!("\"{}\"", q));
    }
    parts.join(", ")
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let transactions = app.transactions();

    let header = Row::new(vec![
        Cell::from("Date"),
        Cell::from("Memo"),
        Cell::from("Category"),
        Cell::from("Account"),
        Cell::from(format!("{:>12}", "Amount")),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = transactions
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == app.tx_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(format_date(t.date)),
                Cell::from(t.memo_display().to_string()),
                Cell::from(t.category_name().unwrap_or("-").to_string()),
                Cell::from(t.account_name().to_string()),
                Cell::from(Span::styled(
                    format!("{:>12}", t.signed_amount_display()),
                    styles::amount_style(t.kind),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(12),
    ];

    let title = match app.transaction_page() {
        Some(page) => format!(
            " Transactions ({}) - page {}/{} ",
            page.total,
            page.page,
            page.pages.max(1)
        ),
        None if app.is_loading(Route::Transactions) => " Transactions - loading... ".to_string(),
        None => " Transactions ".to_string(),
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !transactions.is_empty() {
        state.select(Some(app.tx_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let content = match app.selected_transaction() {
        Some(t) => detail_lines(t),
        None => vec![Line::from(Span::styled(
            if app.is_loading(Route::Transactions) {
                "Loading..."
            } else {
                "No transactions"
            },
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Detail ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn detail_lines(t: &Transaction) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(t.memo_display().to_string(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Date:       ", styles::muted_style()),
            Span::raw(format_date(t.date)),
        ]),
        Line::from(vec![
            Span::styled("Type:       ", styles::muted_style()),
            Span::raw(t.kind.label()),
        ]),
        Line::from(vec![
            Span::styled("Amount:     ", styles::muted_style()),
            Span::styled(t.signed_amount_display(), styles::amount_style(t.kind)),
        ]),
        Line::from(vec![
            Span::styled("Account:    ", styles::muted_style()),
            Span::raw(t.account_name().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Category:   ", styles::muted_style()),
            Span::raw(t.category_name().unwrap_or("-").to_string()),
        ]),
    ];

    if let Some(ref payer) = t.payer_user {
        lines.push(Line::from(vec![
            Span::styled("Paid by:    ", styles::muted_style()),
            Span::raw(payer.name.clone()),
        ]));
    }
    if let Some(ratio) = t.split_ratio_payer {
        lines.push(Line::from(vec![
            Span::styled("Split:      ", styles::muted_style()),
            Span::raw(format!("{}%", format_number(ratio * 100.0))),
        ]));
    }
    if t.has_receipt {
        lines.push(Line::from(Span::styled("Receipt attached", styles::success_style())));
    }

    if !t.items.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Items", styles::highlight_style())));
        for item in &t.items {
            let qty = item
                .quantity
                .map(|q| format!(" x{}", format_number(q)))
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::raw(format!("  {}{}  ", item.name, qty)),
                Span::styled(format_currency(item.amount), styles::muted_style()),
            ]));
        }
    }

    lines
}
