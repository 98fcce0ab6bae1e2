//! Receive page: invoice/offer/address creation with a QR rendering.

use crate::ui::channels::FormEvent;
use crate::ui::theme;
use crate::ui::widgets::{choice_line, input_line, TextField};
use crossterm::event::{KeyCode, KeyEvent};
use qrcode::render::unicode;
use qrcode::{EcLevel, QrCode};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Payment request kinds the form can produce.
pub const RECEIVE_KINDS: [&str; 3] = ["bolt11", "bolt12", "onchain"];

const DEFAULT_EXPIRY_DAYS: &str = "7";

/// Render a payment request as a half-block unicode QR code.
pub fn render_qr(content: &str) -> Option<String> {
    let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::L).ok()?;
    Some(
        code.render::<unicode::Dense1x2>()
            .quiet_zone(false)
            .build(),
    )
}

/// The receive form plus the state of the request it produced.
#[derive(Debug, Clone)]
pub struct ReceiveForm {
    /// Index into [`RECEIVE_KINDS`].
    pub kind_idx: usize,
    /// Amount input, satoshi.
    pub amount: TextField,
    /// Invoice description input.
    pub memo: TextField,
    /// Expiry input, days.
    pub expiry_days: TextField,
    /// Rendered QR of the last created request.
    pub qr: Option<String>,
    /// The encoded invoice/offer/address behind the QR.
    pub encoded: String,
    /// Payment hash the page is waiting on, for bolt11 requests.
    pub watching_hash: Option<String>,
    /// Set when the watched invoice settles.
    pub paid: bool,
    focus: usize,
}

impl Default for ReceiveForm {
    fn default() -> Self {
        Self {
            kind_idx: 0,
            amount: TextField::numeric(),
            memo: TextField::text(),
            expiry_days: TextField::numeric().with_value(DEFAULT_EXPIRY_DAYS),
            qr: None,
            encoded: String::new(),
            watching_hash: None,
            paid: false,
            focus: 0,
        }
    }
}

impl ReceiveForm {
    /// The selected request kind.
    pub fn kind(&self) -> &'static str {
        RECEIVE_KINDS[self.kind_idx % RECEIVE_KINDS.len()]
    }

    /// Reset the inputs after a watched invoice settles.
    pub fn reset_inputs(&mut self) {
        self.amount = TextField::numeric();
        self.memo = TextField::text();
        self.expiry_days = TextField::numeric().with_value(DEFAULT_EXPIRY_DAYS);
        self.watching_hash = None;
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: &KeyEvent) -> FormEvent {
        match key.code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => FormEvent::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % 4;
                FormEvent::Consumed
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + 3) % 4;
                FormEvent::Consumed
            }
            KeyCode::Left | KeyCode::Right if self.focus == 0 => {
                let step = if key.code == KeyCode::Right { 1 } else { 2 };
                self.kind_idx = (self.kind_idx + step) % RECEIVE_KINDS.len();
                FormEvent::Consumed
            }
            _ => {
                match self.focus {
                    1 => {
                        self.amount.handle_key(key);
                    }
                    2 => {
                        self.memo.handle_key(key);
                    }
                    3 => {
                        self.expiry_days.handle_key(key);
                    }
                    _ => {}
                }
                FormEvent::Consumed
            }
        }
    }

    /// Render the form and the QR pane.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let mut lines = vec![
            choice_line("Type", self.kind(), self.focus == 0),
            input_line("Satoshi", self.amount.value(), self.focus == 1),
            input_line("Memo", self.memo.value(), self.focus == 2),
            input_line("Expires in (days)", self.expiry_days.value(), self.focus == 3),
            Line::default(),
            Line::from(Span::styled(
                " Enter create · Tab fields · Esc back",
                Style::default().fg(theme::MUTED),
            )),
        ];
        if self.paid {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                " Invoice PAID",
                Style::default().fg(theme::OK).bold(),
            )));
        }
        let form_block = Block::default()
            .title(" Receive funds ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER));
        frame.render_widget(Paragraph::new(lines).block(form_block), halves[0]);

        let qr_block = Block::default()
            .title(" QR Code ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));
        let mut qr_lines: Vec<Line> = Vec::new();
        if let Some(qr) = &self.qr {
            for row in qr.lines() {
                qr_lines.push(Line::from(row.to_string()));
            }
            qr_lines.push(Line::default());
            qr_lines.push(Line::from(Span::styled(
                self.encoded.clone(),
                Style::default().fg(theme::MUTED),
            )));
        }
        frame.render_widget(
            Paragraph::new(qr_lines)
                .block(qr_block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: false }),
            halves[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_qr_produces_blocks() {
        let qr = render_qr("lnbc1pvjluezpp5qqqsyq").unwrap();
        assert!(!qr.is_empty());
        // Half-block rendering uses the block-element range.
        assert!(qr.chars().any(|c| c == '█' || c == '▀' || c == '▄'));
    }

    #[test]
    fn test_kind_cycles() {
        let mut form = ReceiveForm::default();
        assert_eq!(form.kind(), "bolt11");
        form.kind_idx = 2;
        assert_eq!(form.kind(), "onchain");
        form.kind_idx = 3;
        assert_eq!(form.kind(), "bolt11");
    }
}
