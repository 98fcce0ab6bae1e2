//! Pay page: paste a payment request, decode it, review before paying.

use crate::amounts::{format_sats, msat_to_sat};
use crate::rpc::DecodedPay;
use crate::ui::channels::FormEvent;
use crate::ui::theme;
use crate::ui::widgets::{input_line, TextField};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// The pay form and the last decoded preview.
#[derive(Debug, Clone, Default)]
pub struct PayForm {
    /// Payment request input.
    pub invoice: TextField,
    /// Decoded preview of the entered request.
    pub decoded: Option<DecodedPay>,
}

impl PayForm {
    /// Apply one key press. `Submit` asks the app to decode the entry.
    pub fn handle_key(&mut self, key: &KeyEvent) -> FormEvent {
        match key.code {
            KeyCode::Esc => FormEvent::Cancel,
            KeyCode::Enter => FormEvent::Submit,
            _ => {
                if self.invoice.handle_key(key) {
                    // The preview no longer matches the entry.
                    self.decoded = None;
                }
                FormEvent::Consumed
            }
        }
    }

    /// Render the form and preview.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            input_line("Payment request", self.invoice.value(), true),
            Line::default(),
        ];
        if let Some(decoded) = &self.decoded {
            lines.push(Line::from(Span::styled(
                format!("{:>22}: {}", "Description", decoded.description),
                Style::default().fg(theme::TEXT),
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "{:>22}: {} sats",
                    "Amount",
                    format_sats(msat_to_sat(decoded.msatoshi) as i64)
                ),
                Style::default().fg(theme::VALUE),
            )));
            lines.push(Line::from(Span::styled(
                format!("{:>22}: {}", "Payee", decoded.payee),
                Style::default().fg(theme::MUTED),
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            " Enter decode · Esc back",
            Style::default().fg(theme::MUTED),
        )));

        let block = Block::default()
            .title(" Pay an invoice ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}
