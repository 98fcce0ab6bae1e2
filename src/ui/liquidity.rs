//! Liquidity-ads page: nodes selling inbound capacity, plus the local
//! dual-funding status.

use crate::amounts::{format_sats, msat_to_sat};
use crate::directory::Node;
use crate::ui::theme;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

/// Render the liquidity-ads page.
pub fn draw(frame: &mut Frame, area: Rect, ads: &[Node], dual_funding: bool, config_path: &str) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let mut lines = vec![Line::from(vec![
        Span::styled("Dual-funding enabled: ", Style::default().fg(theme::LABEL)),
        if dual_funding {
            Span::styled("Yes", Style::default().fg(theme::OK))
        } else {
            Span::styled("No", Style::default().fg(theme::WARN))
        },
    ])];
    if !dual_funding {
        lines.push(Line::default());
        lines.push(Line::from("To lease liquidity, add"));
        lines.push(Line::from(Span::styled(
            "experimental-dual-fund",
            Style::default().fg(theme::VALUE),
        )));
        lines.push(Line::from(format!("to {config_path}")));
        lines.push(Line::from("and restart lightningd."));
    }
    let block = Block::default()
        .title(" Dual Funding ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER));
    frame.render_widget(Paragraph::new(lines).block(block), columns[0]);

    let header = Row::new(vec![
        "alias",
        "lease fee base (sats)",
        "lease fee basis",
        "funding weight",
        "max base",
        "max proportional",
        "lease id",
    ])
    .style(Style::default().fg(theme::TEXT).bold());

    let rows: Vec<Row> = ads
        .iter()
        .filter_map(|node| {
            let ad = node.liquidity_ad.as_ref()?;
            Some(Row::new(vec![
                Cell::from(node.display_name().to_string())
                    .style(Style::default().fg(theme::OPENER_LOCAL)),
                Cell::from(format_sats(msat_to_sat(ad.lease_fee_base_msat) as i64)),
                Cell::from(format_sats(ad.lease_fee_basis as i64)),
                Cell::from(format_sats(ad.funding_weight as i64)),
                Cell::from(format_sats(msat_to_sat(ad.channel_fee_max_base_msat) as i64)),
                Cell::from(format_sats(ad.channel_fee_max_proportional_thousandths as i64)),
                Cell::from(ad.compact_lease.clone()).style(Style::default().fg(theme::MUTED)),
            ]))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(21),
            Constraint::Length(15),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Liquidity Ads ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER)),
    );
    frame.render_widget(table, columns[1]);
}
