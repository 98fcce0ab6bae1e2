//! Dashboard page: node info, funds, fee rates, and recent activity.

use crate::amounts::format_sats;
use crate::dashboard::{ActivityEntry, ActivityKind, DashboardSummary};
use crate::ui::theme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

fn kv(label: &str, value: Span<'static>) -> Line<'static> {
    kv_spans(label, vec![value])
}

fn kv_spans(label: &str, value: Vec<Span<'static>>) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{label:>25}: "),
        Style::default().fg(theme::LABEL),
    )];
    spans.extend(value);
    Line::from(spans)
}

fn plain(value: impl Into<String>) -> Span<'static> {
    Span::styled(value.into(), Style::default().fg(theme::TEXT))
}

fn amount(value: i64) -> Span<'static> {
    Span::styled(format_sats(value), Style::default().fg(theme::VALUE))
}

/// Render the dashboard into `area`.
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    summary: &DashboardSummary,
    activity: &[ActivityEntry],
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(2, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(columns[0]);

    draw_node_info(frame, left[0], summary);
    draw_funds(frame, left[1], summary);
    draw_fees(frame, left[2], summary);
    draw_activity(frame, columns[1], activity);
}

fn draw_node_info(frame: &mut Frame, area: Rect, summary: &DashboardSummary) {
    let mut lines = vec![
        kv("Node alias", plain(summary.alias.clone())),
        kv("Node pubkey", plain(summary.node_id.clone())),
        kv("Network", plain(summary.network.clone())),
        kv("Blockheight", plain(summary.blockheight.to_string())),
    ];
    for bound in &summary.bound_to {
        lines.push(kv("Bound to", plain(bound.clone())));
    }
    for announce in &summary.announced {
        lines.push(kv("Announce", plain(announce.clone())));
    }
    lines.push(kv("Peers", plain(summary.num_peers.to_string())));
    lines.push(kv(
        "Active channels",
        plain(summary.active_channels.to_string()),
    ));
    lines.push(kv(
        "Offline channels",
        plain(summary.offline_channels.to_string()),
    ));
    lines.push(kv(
        "Pending channels",
        plain(summary.pending_channels.to_string()),
    ));
    lines.push(kv(
        "Large channels",
        if summary.large_channels {
            plain("Supported")
        } else {
            Span::styled("Not supported", Style::default().fg(theme::WARN))
        },
    ));
    lines.push(kv(
        "Minimum capacity",
        plain(format_sats(summary.min_capacity_sat as i64)),
    ));
    lines.push(kv("Fees collected (sats)", amount(summary.fees_collected_sat)));
    lines.push(kv("Fees spent on-chain", amount(summary.fees_spent_sat)));
    let pl_color = if summary.profit_loss_sat > 0 {
        theme::OK
    } else {
        theme::WARN
    };
    lines.push(kv(
        "Profit/Loss",
        Span::styled(
            format_sats(summary.profit_loss_sat),
            Style::default().fg(pl_color),
        ),
    ));

    let block = Block::default()
        .title(" Node Info ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_funds(frame: &mut Frame, area: Rect, summary: &DashboardSummary) {
    let lines = vec![
        kv_spans(
            "On-chain capacity",
            vec![
                amount(summary.onchain_sat as i64),
                plain(" in "),
                Span::styled(
                    summary.utxo_count.to_string(),
                    Style::default().fg(theme::VALUE),
                ),
                plain(" UTXOs"),
            ],
        ),
        kv_spans(
            "Outbound LN capacity",
            vec![
                amount(summary.outbound_sat as i64),
                plain(" in "),
                Span::styled(
                    summary.active_channels.to_string(),
                    Style::default().fg(theme::VALUE),
                ),
                plain(" channels"),
            ],
        ),
        kv(
            "Total node worth",
            amount((summary.onchain_sat + summary.outbound_sat) as i64),
        ),
        kv("Inbound LN capacity", amount(summary.inbound_sat as i64)),
        kv(
            "Smallest channel",
            amount(summary.smallest_channel_sat as i64),
        ),
        kv("Biggest channel", amount(summary.biggest_channel_sat as i64)),
    ];

    let block = Block::default()
        .title(" Available funds ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_fees(frame: &mut Frame, area: Rect, summary: &DashboardSummary) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let offchain = vec![
        kv(
            "Default base fee",
            plain(format_sats(summary.default_base_fee_msat as i64)),
        ),
        kv(
            "Default fee rate",
            plain(format_sats(summary.default_fee_ppm as i64)),
        ),
    ];
    let block = Block::default()
        .title(" Default channel fees ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER));
    frame.render_widget(Paragraph::new(offchain).block(block), halves[0]);

    let rates = &summary.feerates_per_vb;
    let vb = |v: u64| plain(format!("{} sat/vB", format_sats(v as i64)));
    let onchain = vec![
        kv("Opening", vb(rates.opening)),
        kv("Mutual close", vb(rates.mutual_close)),
        kv("Unilateral close", vb(rates.unilateral_close)),
        kv("Delayed to us", vb(rates.delayed_to_us)),
        kv("HTLC resolution", vb(rates.htlc_resolution)),
        kv("Penalty", vb(rates.penalty)),
        kv("Min acceptable", vb(rates.min_acceptable)),
        kv("Max acceptable", vb(rates.max_acceptable)),
    ];
    let block = Block::default()
        .title(" On-chain fee rates ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER));
    frame.render_widget(Paragraph::new(onchain).block(block), halves[1]);
}

fn operation_cell(entry: &ActivityEntry) -> Cell<'static> {
    match entry.kind {
        ActivityKind::Rebalance => {
            Cell::from("rebalance").style(Style::default().fg(theme::OPENER_LOCAL))
        }
        ActivityKind::Sent => Cell::from(format!("sent to {}", entry.counterparty))
            .style(Style::default().fg(theme::OPENER_REMOTE)),
        ActivityKind::PendingSend => Cell::from(format!("pending to {}", entry.counterparty))
            .style(Style::default().fg(theme::MUTED)),
        ActivityKind::Received => Cell::from("received").style(Style::default().fg(theme::OK)),
    }
}

fn draw_activity(frame: &mut Frame, area: Rect, activity: &[ActivityEntry]) {
    let header = Row::new(vec!["date", "operation", "amount", "fees (sats)", "description"])
        .style(Style::default().fg(theme::TEXT).bold());

    let mut total_fees = 0i64;
    let mut rows: Vec<Row> = Vec::with_capacity(activity.len() + 1);
    for entry in activity {
        total_fees += entry.fees_sat;
        let amount_color = if entry.kind == ActivityKind::Received {
            theme::OK
        } else {
            theme::WARN
        };
        let fees = if entry.fees_sat == 0 {
            String::new()
        } else {
            format_sats(entry.fees_sat)
        };
        rows.push(Row::new(vec![
            Cell::from(entry.date.format("%Y-%m-%d %H:%M").to_string())
                .style(Style::default().fg(theme::MUTED)),
            operation_cell(entry),
            Cell::from(format_sats(entry.amount_sat)).style(Style::default().fg(amount_color)),
            Cell::from(fees).style(Style::default().fg(theme::WARN)),
            Cell::from(entry.description.clone()),
        ]));
    }
    rows.push(
        Row::new(vec![
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(format_sats(total_fees)).style(Style::default().fg(theme::WARN)),
            Cell::from(""),
        ])
        .top_margin(1),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(24),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Recent LN activity ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER)),
    );
    frame.render_widget(table, area);
}
