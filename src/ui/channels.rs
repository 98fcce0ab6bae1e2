//! Channels page: the sortable channel table and its modal forms
//! (sort selector, fee editor, open-channel form).

use crate::amounts::{days_since, format_sats};
use crate::channels::{Channel, SortPolicy};
use crate::directory::Node;
use crate::ui::theme;
use crate::ui::widgets::{centered_rect, choice_line, input_line, TextField};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::Frame;

/// What a form did with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    /// Key consumed, nothing else to do.
    Consumed,
    /// The operator submitted the form.
    Submit,
    /// The operator dismissed the form.
    Cancel,
}

fn balance_bar(channel: &Channel) -> Line<'static> {
    let spendable = channel
        .capacity_sat
        .saturating_sub(channel.commit_fee_sat)
        .max(1);
    let send = (10 * channel.local_balance_sat / spendable).min(10) as usize;
    let recv = 10 - send;
    Line::from(vec![
        Span::styled(".".repeat(recv), Style::default().fg(theme::WARN)),
        Span::styled("|", Style::default().fg(theme::TEXT)),
        Span::styled(".".repeat(send), Style::default().fg(theme::OK)),
    ])
}

fn status_cell(channel: &Channel) -> Cell<'static> {
    use crate::rpc::ChannelState::*;
    let (text, color) = match channel.state {
        Normal if channel.peer_connected => ("online", theme::OK),
        Normal => ("offline", theme::MUTED),
        Openingd | AwaitingLockin => ("opening", theme::ACCENT),
        AwaitingUnilateral => ("awaiting unilateral", theme::ACCENT),
        ShuttingDown | ClosingSigexchange | ClosingComplete => ("closing", theme::MUTED),
        FundingSpendSeen | Onchain => ("onchain", theme::MUTED),
        Closed => ("closed", theme::MUTED),
        Unknown => ("unknown", theme::MUTED),
    };
    Cell::from(text).style(Style::default().fg(color))
}

fn alias_cell(channel: &Channel) -> Cell<'static> {
    use crate::rpc::Opener;
    let color = match (channel.opener, channel.peer_connected) {
        (Opener::Local, true) => theme::OPENER_LOCAL,
        (Opener::Remote, true) => theme::OPENER_REMOTE,
        (Opener::Local, false) => theme::OPENER_LOCAL_OFFLINE,
        (Opener::Remote, false) => theme::OPENER_REMOTE_OFFLINE,
        _ => theme::TEXT,
    };
    Cell::from(channel.remote_alias.clone()).style(Style::default().fg(color))
}

fn last_forward_cell(channel: &Channel) -> Cell<'static> {
    let days = days_since(channel.last_forward);
    if days > 0.0 {
        let color = if days > 60.0 { theme::WARN } else { theme::TEXT };
        Cell::from(format!("{days:.1}")).style(Style::default().fg(color))
    } else {
        Cell::from("never").style(Style::default().fg(theme::MUTED))
    }
}

/// Render the channel table with its totals row.
pub fn draw_table(frame: &mut Frame, area: Rect, channels: &[Channel], selected: usize) {
    let header = Row::new(vec![
        Cell::from("inbound"),
        Cell::from("balance"),
        Cell::from("outbound"),
        Cell::from("base (msat)"),
        Cell::from("rate (ppm)"),
        Cell::from("r.base"),
        Cell::from("r.rate"),
        Cell::from("last fwd (d)"),
        Cell::from("fees earned"),
        Cell::from("r.fees (est)"),
        Cell::from("status"),
        Cell::from("age (blocks)"),
        Cell::from("alias"),
    ])
    .style(Style::default().fg(theme::TEXT).bold());

    let mut total_inbound = 0i64;
    let mut total_outbound = 0i64;
    let mut total_local_fees = 0i64;
    let mut total_remote_fees = 0i64;

    let mut rows: Vec<Row> = Vec::with_capacity(channels.len() + 1);
    for channel in channels {
        total_inbound += channel.remote_balance_sat as i64;
        total_outbound += channel.local_balance_sat as i64;
        total_local_fees += channel.local_fees_sat as i64;
        total_remote_fees += channel.remote_fees_sat as i64;

        rows.push(Row::new(vec![
            Cell::from(format_sats(channel.remote_balance_sat as i64))
                .style(Style::default().fg(theme::WARN)),
            Cell::from(balance_bar(channel)),
            Cell::from(format_sats(channel.local_balance_sat as i64))
                .style(Style::default().fg(theme::OK)),
            Cell::from(format_sats(channel.local_fee.base_msat as i64))
                .style(Style::default().fg(theme::LOCAL_FEE)),
            Cell::from(format_sats(channel.local_fee.rate_ppm as i64))
                .style(Style::default().fg(theme::LOCAL_FEE)),
            Cell::from(format_sats(channel.remote_fee.base_msat as i64))
                .style(Style::default().fg(theme::REMOTE_FEE)),
            Cell::from(format_sats(channel.remote_fee.rate_ppm as i64))
                .style(Style::default().fg(theme::REMOTE_FEE)),
            last_forward_cell(channel),
            Cell::from(format_sats(channel.local_fees_sat as i64))
                .style(Style::default().fg(theme::LOCAL_FEE)),
            Cell::from(format_sats(channel.remote_fees_sat as i64))
                .style(Style::default().fg(theme::REMOTE_FEE)),
            status_cell(channel),
            Cell::from(channel.age_blocks.to_string()),
            alias_cell(channel),
        ]));
    }

    rows.push(
        Row::new(vec![
            Cell::from(format_sats(total_inbound)).style(Style::default().fg(theme::WARN)),
            Cell::from(""),
            Cell::from(format_sats(total_outbound)).style(Style::default().fg(theme::OK)),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(format_sats(total_local_fees)).style(Style::default().fg(theme::LOCAL_FEE)),
            Cell::from(format_sats(total_remote_fees))
                .style(Style::default().fg(theme::REMOTE_FEE)),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
        ])
        .top_margin(1),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().reversed())
    .block(
        Block::default()
            .title(" Channels ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER)),
    );

    let mut state = TableState::default();
    if !channels.is_empty() {
        state.select(Some(selected.min(channels.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// Render the sort-policy selector.
pub fn draw_sort_modal(frame: &mut Frame, area: Rect, selected: usize, current: SortPolicy) {
    let rect = centered_rect(40, SortPolicy::ALL.len() as u16 + 3, area);
    frame.render_widget(Clear, rect);

    let mut lines = Vec::with_capacity(SortPolicy::ALL.len() + 1);
    for (idx, policy) in SortPolicy::ALL.iter().enumerate() {
        let marker = if *policy == current { "*" } else { " " };
        let style = if idx == selected {
            Style::default().fg(theme::ACCENT).reversed()
        } else {
            Style::default().fg(theme::TEXT)
        };
        lines.push(Line::from(Span::styled(
            format!(" {marker} {}", policy.label()),
            style,
        )));
    }
    lines.push(Line::from(Span::styled(
        " j/k move · Enter select · Esc close",
        Style::default().fg(theme::MUTED),
    )));

    let block = Block::default()
        .title(" Sort channels by ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER));
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// Modal form for `setchannelfee`.
#[derive(Debug, Clone)]
pub struct FeesForm {
    /// Channel the form was opened on.
    pub short_channel_id: String,
    /// Alias shown in the title.
    pub remote_alias: String,
    /// Base fee input, millisatoshi.
    pub base: TextField,
    /// Proportional fee input, ppm.
    pub rate: TextField,
    /// Apply to every channel instead of just this one.
    pub all_channels: bool,
    focus: usize,
}

impl FeesForm {
    /// Prefill from the channel's current local schedule.
    pub fn new(channel: &Channel) -> Self {
        Self {
            short_channel_id: channel.short_channel_id.clone(),
            remote_alias: channel.remote_alias.clone(),
            base: TextField::numeric().with_value(channel.local_fee.base_msat.to_string()),
            rate: TextField::numeric().with_value(channel.local_fee.rate_ppm.to_string()),
            all_channels: false,
            focus: 0,
        }
    }

    /// The `setchannelfee` target: this channel or `"all"`.
    pub fn target(&self) -> &str {
        if self.all_channels {
            "all"
        } else {
            &self.short_channel_id
        }
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: &KeyEvent) -> FormEvent {
        match key.code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => FormEvent::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % 3;
                FormEvent::Consumed
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + 2) % 3;
                FormEvent::Consumed
            }
            KeyCode::Char(' ') if self.focus == 2 => {
                self.all_channels = !self.all_channels;
                FormEvent::Consumed
            }
            _ => {
                match self.focus {
                    0 => {
                        self.base.handle_key(key);
                    }
                    1 => {
                        self.rate.handle_key(key);
                    }
                    _ => {}
                }
                FormEvent::Consumed
            }
        }
    }

    /// Render the form.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let rect = centered_rect(44, 8, area);
        frame.render_widget(Clear, rect);

        let lines = vec![
            input_line("Base fee (msat)", self.base.value(), self.focus == 0),
            input_line("Fee rate (ppm)", self.rate.value(), self.focus == 1),
            choice_line(
                "Apply to all channels",
                if self.all_channels { "yes" } else { "no" },
                self.focus == 2,
            ),
            Line::default(),
            Line::from(Span::styled(
                " Enter apply · Space toggle · Esc cancel",
                Style::default().fg(theme::MUTED),
            )),
        ];

        let block = Block::default()
            .title(format!(" Set fees: {} ", self.remote_alias))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER));
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

/// Feerate tiers offered by the open-channel form.
pub const FEERATE_TIERS: [&str; 3] = ["slow", "normal", "urgent"];

/// Modal form for `fundchannel`.
#[derive(Debug, Clone, Default)]
pub struct OpenForm {
    /// Alias/id search input.
    pub query: TextField,
    /// Directory matches for the current query.
    pub suggestions: Vec<Node>,
    /// Highlighted suggestion.
    pub suggestion_idx: usize,
    /// The picked peer, once chosen.
    pub chosen: Option<Node>,
    /// Channel size input, satoshi.
    pub amount: TextField,
    /// Index into [`FEERATE_TIERS`].
    pub feerate_idx: usize,
    /// Announce the channel to the network.
    pub announce: bool,
    /// Confirmed, unreserved on-chain funds available, satoshi.
    pub available_sat: u64,
    focus: usize,
}

impl OpenForm {
    /// Fresh form; `available_sat` is shown as a hint.
    pub fn new(available_sat: u64) -> Self {
        Self {
            announce: true,
            feerate_idx: 1,
            available_sat,
            ..Default::default()
        }
    }

    /// The selected feerate tier.
    pub fn feerate(&self) -> &'static str {
        FEERATE_TIERS[self.feerate_idx % FEERATE_TIERS.len()]
    }

    /// Apply one key press. `Submit` is only produced once a peer is
    /// chosen and a size is entered.
    pub fn handle_key(&mut self, key: &KeyEvent) -> FormEvent {
        match key.code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => {
                if self.focus == 0 {
                    if let Some(node) = self.suggestions.get(self.suggestion_idx) {
                        self.query.set_value(node.display_name());
                        self.chosen = Some(node.clone());
                        self.focus = 1;
                    }
                    FormEvent::Consumed
                } else if self.chosen.is_some() && self.amount.parse_u64().is_some() {
                    FormEvent::Submit
                } else {
                    FormEvent::Consumed
                }
            }
            KeyCode::Tab => {
                self.focus = (self.focus + 1) % 4;
                FormEvent::Consumed
            }
            KeyCode::BackTab => {
                self.focus = (self.focus + 3) % 4;
                FormEvent::Consumed
            }
            KeyCode::Down if self.focus == 0 => {
                if !self.suggestions.is_empty() {
                    self.suggestion_idx = (self.suggestion_idx + 1) % self.suggestions.len();
                }
                FormEvent::Consumed
            }
            KeyCode::Up if self.focus == 0 => {
                if !self.suggestions.is_empty() {
                    self.suggestion_idx =
                        (self.suggestion_idx + self.suggestions.len() - 1) % self.suggestions.len();
                }
                FormEvent::Consumed
            }
            KeyCode::Left | KeyCode::Right if self.focus == 2 => {
                let step = if key.code == KeyCode::Right { 1 } else { 2 };
                self.feerate_idx = (self.feerate_idx + step) % FEERATE_TIERS.len();
                FormEvent::Consumed
            }
            KeyCode::Char(' ') if self.focus == 3 => {
                self.announce = !self.announce;
                FormEvent::Consumed
            }
            _ => {
                match self.focus {
                    0 => {
                        if self.query.handle_key(key) {
                            // Typing invalidates the previous pick.
                            self.chosen = None;
                            self.suggestion_idx = 0;
                        }
                    }
                    1 => {
                        self.amount.handle_key(key);
                    }
                    _ => {}
                }
                FormEvent::Consumed
            }
        }
    }

    /// Render the form.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let rect = centered_rect(76, 14, area);
        frame.render_widget(Clear, rect);

        let mut lines = vec![input_line(
            "Node alias (id)",
            self.query.value(),
            self.focus == 0,
        )];
        if self.focus == 0 && self.chosen.is_none() {
            for (idx, node) in self.suggestions.iter().take(4).enumerate() {
                let style = if idx == self.suggestion_idx {
                    Style::default().fg(theme::ACCENT).reversed()
                } else {
                    Style::default().fg(theme::MUTED)
                };
                let id_tail: String = node.id.chars().take(16).collect();
                lines.push(Line::from(Span::styled(
                    format!("{:>24}{} ({}…)", "", node.display_name(), id_tail),
                    style,
                )));
            }
        }
        lines.push(Line::default());
        lines.push(input_line(
            "Available funds (sats)",
            &format_sats(self.available_sat as i64),
            false,
        ));
        lines.push(input_line(
            "Channel size (sats)",
            self.amount.value(),
            self.focus == 1,
        ));
        lines.push(choice_line("Feerate", self.feerate(), self.focus == 2));
        lines.push(choice_line(
            "Announce",
            if self.announce { "yes" } else { "no" },
            self.focus == 3,
        ));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            " Tab fields · Enter pick/open · Esc cancel",
            Style::default().fg(theme::MUTED),
        )));

        let block = Block::default()
            .title(" Open new channel ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER));
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_fees_form_targets_all_when_toggled() {
        let channel = Channel {
            short_channel_id: "800000x1x0".to_string(),
            ..Default::default()
        };
        let mut form = FeesForm::new(&channel);
        assert_eq!(form.target(), "800000x1x0");

        form.handle_key(&press(KeyCode::Tab));
        form.handle_key(&press(KeyCode::Tab));
        form.handle_key(&press(KeyCode::Char(' ')));
        assert_eq!(form.target(), "all");
        assert_eq!(form.handle_key(&press(KeyCode::Enter)), FormEvent::Submit);
    }

    #[test]
    fn test_open_form_requires_choice_and_amount() {
        let mut form = OpenForm::new(50_000);
        // Nothing chosen: Enter does not submit.
        form.focus = 1;
        assert_eq!(form.handle_key(&press(KeyCode::Enter)), FormEvent::Consumed);

        form.focus = 0;
        form.suggestions = vec![Node {
            id: "02aa".to_string(),
            alias: "carol".to_string(),
            ..Default::default()
        }];
        assert_eq!(form.handle_key(&press(KeyCode::Enter)), FormEvent::Consumed);
        assert!(form.chosen.is_some());

        form.handle_key(&press(KeyCode::Char('9')));
        assert_eq!(form.handle_key(&press(KeyCode::Enter)), FormEvent::Submit);
        assert_eq!(form.feerate(), "normal");
    }
}
