//! Terminal UI shell.
//!
//! A thin layer over the aggregation engines: every page renders plain
//! data the engines produced, and every mutating form funnels into one
//! RPC call. Navigation, key bindings, and styling live here and only
//! here.

use crate::amounts::format_sats;
use crate::channels::{Channel, SortPolicy};
use crate::dashboard::{ActivityEntry, DashboardSummary};
use crate::directory::Node;
use crate::notifications::PaidInvoice;
use crate::Cockpit;
use anyhow::Result;
use chrono::Utc;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

mod channels;
mod dash;
mod liquidity;
mod log;
mod pay;
mod receive;
pub mod theme;
mod widgets;

pub use log::LogBuffer;

use channels::{FeesForm, FormEvent, OpenForm};
use pay::PayForm;
use receive::ReceiveForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Dashboard,
    Channels,
    Receive,
    Pay,
    Liquidity,
}

enum Modal {
    Help,
    Sort { selected: usize },
    Fees(FeesForm),
    Open(OpenForm),
}

const HELP_LINES: [&str; 10] = [
    "i     - Node overview               ",
    "p     - Pay an invoice              ",
    "r     - Receive funds               ",
    "c     - Channel table               ",
    "l     - Liquidity ads               ",
    "j/k   - Scroll down/up              ",
    "o/f/s - Open / fees / sort (channels)",
    "Enter - Details / submit            ",
    "ESC   - Back                        ",
    "q     - Quit                        ",
];

/// Run the UI until the operator quits.
///
/// Owns the terminal for the duration: raw mode plus the alternate
/// screen, restored on the way out even when the loop errors.
pub async fn run(
    cockpit: Arc<Cockpit>,
    log: LogBuffer,
    paid_rx: broadcast::Receiver<PaidInvoice>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cockpit, log, paid_rx);
    app.refresh_dashboard().await;
    let result = app.event_loop(&mut terminal).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    result
}

struct App {
    cockpit: Arc<Cockpit>,
    log: LogBuffer,
    paid_rx: broadcast::Receiver<PaidInvoice>,
    page: Page,
    modal: Option<Modal>,
    should_quit: bool,

    summary: DashboardSummary,
    activity: Vec<ActivityEntry>,
    channels: Vec<Channel>,
    channel_selected: usize,
    liquidity_ads: Vec<Node>,

    receive: ReceiveForm,
    pay: PayForm,
}

impl App {
    fn new(cockpit: Arc<Cockpit>, log: LogBuffer, paid_rx: broadcast::Receiver<PaidInvoice>) -> Self {
        Self {
            cockpit,
            log,
            paid_rx,
            page: Page::Dashboard,
            modal: None,
            should_quit: false,
            summary: DashboardSummary::default(),
            activity: Vec::new(),
            channels: Vec::new(),
            channel_selected: 0,
            liquidity_ads: Vec::new(),
            receive: ReceiveForm::default(),
            pay: PayForm::default(),
        }
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let tick = Duration::from_millis(self.cockpit.config.ui.tick_ms);
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.drain_paid_invoices();
            if crossterm::event::poll(tick)? {
                match crossterm::event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key).await;
                    }
                    Event::Paste(text) if self.page == Page::Pay && self.modal.is_none() => {
                        let mut value = self.pay.invoice.value().to_string();
                        value.push_str(text.trim());
                        self.pay.invoice.set_value(value);
                        self.pay.decoded = None;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn drain_paid_invoices(&mut self) {
        while let Ok(paid) = self.paid_rx.try_recv() {
            info!(
                "Invoice {} paid ({} msat)",
                paid.label, paid.amount_msat
            );
            if self.receive.watching_hash.as_deref() == Some(paid.payment_hash.as_str()) {
                self.receive.paid = true;
                self.receive.reset_inputs();
            }
        }
    }

    async fn refresh_dashboard(&mut self) {
        self.summary = self.cockpit.dashboard.summary().await;
        self.activity = self
            .cockpit
            .dashboard
            .recent_activity(&self.summary.node_id)
            .await;
    }

    async fn refresh_channels(&mut self) {
        self.channels = self.cockpit.channels.list_channels().await;
        if self.channel_selected >= self.channels.len() {
            self.channel_selected = 0;
        }
    }

    async fn refresh_liquidity(&mut self) {
        self.liquidity_ads = self.cockpit.directory.list_willing_to_fund().await;
    }

    async fn switch_page(&mut self, page: Page) {
        match page {
            Page::Dashboard => self.refresh_dashboard().await,
            Page::Channels => self.refresh_channels().await,
            Page::Liquidity => self.refresh_liquidity().await,
            Page::Receive | Page::Pay => {}
        }
        self.page = page;
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        // Raw mode swallows SIGINT; honor ctrl-c everywhere.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.modal.is_some() {
            self.handle_modal_key(key).await;
            return;
        }

        // Receive and Pay own the keyboard for text entry.
        match self.page {
            Page::Receive => return self.handle_receive_key(key).await,
            Page::Pay => return self.handle_pay_key(key).await,
            _ => {}
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('i') => self.switch_page(Page::Dashboard).await,
            KeyCode::Char('c') => self.switch_page(Page::Channels).await,
            KeyCode::Char('r') => self.switch_page(Page::Receive).await,
            KeyCode::Char('p') => self.switch_page(Page::Pay).await,
            KeyCode::Char('l') => self.switch_page(Page::Liquidity).await,
            KeyCode::Char('h') => self.modal = Some(Modal::Help),
            KeyCode::Esc => self.page = Page::Dashboard,
            _ => {
                if self.page == Page::Channels {
                    self.handle_channels_key(key).await;
                }
            }
        }
    }

    async fn handle_channels_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.channel_selected + 1 < self.channels.len() {
                    self.channel_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.channel_selected = self.channel_selected.saturating_sub(1);
            }
            KeyCode::Char('g') => self.channel_selected = 0,
            KeyCode::Char('G') => {
                self.channel_selected = self.channels.len().saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(channel) = self.channels.get(self.channel_selected) {
                    info!(
                        "Selected channel {}: commit fee {} sats, remote base fee {}, block {}",
                        channel.short_channel_id,
                        channel.commit_fee_sat,
                        channel.remote_fee.base_msat,
                        channel.block
                    );
                }
            }
            KeyCode::Char('s') => {
                let selected = SortPolicy::ALL
                    .iter()
                    .position(|p| *p == self.cockpit.channels.sort_policy())
                    .unwrap_or(0);
                self.modal = Some(Modal::Sort { selected });
            }
            KeyCode::Char('f') => {
                if let Some(channel) = self.channels.get(self.channel_selected) {
                    self.modal = Some(Modal::Fees(FeesForm::new(channel)));
                }
            }
            KeyCode::Char('o') => {
                let available = self.available_onchain_sat().await;
                self.modal = Some(Modal::Open(OpenForm::new(available)));
            }
            _ => {}
        }
    }

    /// Confirmed, unreserved on-chain funds, for the open-channel hint.
    async fn available_onchain_sat(&self) -> u64 {
        match self.cockpit.client.list_funds(false).await {
            Ok(funds) => funds
                .outputs
                .iter()
                .filter(|output| output.status == "confirmed" && !output.reserved)
                .map(|output| output.value)
                .sum(),
            Err(e) => {
                warn!("listfunds failed: {}", e);
                0
            }
        }
    }

    async fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(mut modal) = self.modal.take() else {
            return;
        };
        let mut keep = true;

        match &mut modal {
            Modal::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char('h') | KeyCode::Char('q')
                ) {
                    keep = false;
                }
            }
            Modal::Sort { selected } => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    *selected = (*selected + 1) % SortPolicy::ALL.len();
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    *selected = (*selected + SortPolicy::ALL.len() - 1) % SortPolicy::ALL.len();
                }
                KeyCode::Enter => {
                    keep = false;
                    let policy = SortPolicy::ALL[*selected];
                    if policy != self.cockpit.channels.sort_policy() {
                        info!("Sorting channels by: {}", policy.label());
                        self.cockpit.channels.set_sort_policy(policy);
                        // Policy changes re-fetch; the table never
                        // re-sorts a stale snapshot.
                        self.refresh_channels().await;
                    }
                }
                KeyCode::Esc => keep = false,
                _ => {}
            },
            Modal::Fees(form) => match form.handle_key(&key) {
                FormEvent::Cancel => keep = false,
                FormEvent::Submit => {
                    if let (Some(base), Some(rate)) =
                        (form.base.parse_u64(), form.rate.parse_u64())
                    {
                        keep = false;
                        let target = form.target().to_string();
                        self.apply_channel_fees(&target, base, rate).await;
                    } else {
                        warn!("Incorrect base fee or fee rate");
                    }
                }
                FormEvent::Consumed => {}
            },
            Modal::Open(form) => match form.handle_key(&key) {
                FormEvent::Cancel => keep = false,
                FormEvent::Submit => {
                    match (form.chosen.clone(), form.amount.parse_u64()) {
                        (Some(node), Some(amount)) => {
                            keep = false;
                            let feerate = form.feerate();
                            let announce = form.announce;
                            self.open_channel(&node, amount, feerate, announce).await;
                        }
                        _ => warn!("Incorrect channel size"),
                    }
                }
                FormEvent::Consumed => {
                    // Typing refines the peer suggestions.
                    if form.chosen.is_none() && form.query.value().len() >= 2 {
                        let query = form.query.value().to_string();
                        form.suggestions = self.cockpit.directory.search(&query).await;
                        form.suggestion_idx = form
                            .suggestion_idx
                            .min(form.suggestions.len().saturating_sub(1));
                    }
                }
            },
        }

        if keep {
            self.modal = Some(modal);
        }
    }

    async fn apply_channel_fees(&mut self, target: &str, base: u64, rate: u64) {
        match self.cockpit.client.set_channel_fee(target, base, rate).await {
            Ok(result) => {
                for updated in &result.channels {
                    let node = self.cockpit.directory.resolve(&updated.peer_id).await;
                    info!(
                        "Channel with {}: base fee {}, fee rate {}",
                        node.display_name(),
                        result.base,
                        result.ppm
                    );
                }
                self.refresh_channels().await;
            }
            Err(e) => warn!("Error when setting fees: {}", e),
        }
    }

    async fn open_channel(&mut self, node: &Node, amount_sat: u64, feerate: &str, announce: bool) {
        match self
            .cockpit
            .client
            .fund_channel(&node.id, amount_sat, feerate, announce)
            .await
        {
            Ok(result) => {
                info!(
                    "Channel open initiated with {}: txid {}",
                    node.display_name(),
                    result.txid
                );
                self.refresh_channels().await;
            }
            Err(e) => warn!("Error opening channel: {}", e),
        }
    }

    async fn handle_receive_key(&mut self, key: KeyEvent) {
        match self.receive.handle_key(&key) {
            FormEvent::Cancel => self.page = Page::Dashboard,
            FormEvent::Submit => self.create_receive_request().await,
            FormEvent::Consumed => {}
        }
    }

    async fn create_receive_request(&mut self) {
        self.receive.paid = false;
        match self.receive.kind() {
            "onchain" => match self.cockpit.client.new_addr().await {
                Ok(addr) => {
                    info!("New deposit address: {}", addr.bech32);
                    self.receive.encoded = addr.bech32.clone();
                    self.receive.qr = receive::render_qr(&addr.bech32);
                    self.receive.watching_hash = None;
                }
                Err(e) => warn!("newaddr failed: {}", e),
            },
            "bolt11" => {
                let Some(amount_sat) = self.receive.amount.parse_u64() else {
                    warn!("Incorrect satoshi amount");
                    return;
                };
                let Some(expiry_days) = self.receive.expiry_days.parse_u64().filter(|d| *d > 0)
                else {
                    warn!("Incorrect expiry");
                    return;
                };
                let label = format!("cockpit_{}", Utc::now().timestamp());
                match self
                    .cockpit
                    .client
                    .invoice(
                        amount_sat * 1_000,
                        &label,
                        self.receive.memo.value(),
                        expiry_days,
                    )
                    .await
                {
                    Ok(invoice) => {
                        info!("bolt11: {}", invoice.bolt11);
                        self.receive.encoded = invoice.bolt11.clone();
                        self.receive.qr = receive::render_qr(&invoice.bolt11);
                        self.receive.watching_hash = Some(invoice.payment_hash);
                    }
                    Err(e) => warn!("invoice failed: {}", e),
                }
            }
            _ => {
                let amount_sat = self.receive.amount.parse_u64().unwrap_or(0);
                match self
                    .cockpit
                    .client
                    .offer(amount_sat, self.receive.memo.value())
                    .await
                {
                    Ok(offer) => {
                        info!("Offer {}: {}", offer.offer_id, offer.bolt12);
                        self.receive.encoded = offer.bolt12.clone();
                        self.receive.qr = receive::render_qr(&offer.bolt12);
                        self.receive.watching_hash = None;
                    }
                    Err(e) => warn!("offer failed: {}", e),
                }
            }
        }
    }

    async fn handle_pay_key(&mut self, key: KeyEvent) {
        match self.pay.handle_key(&key) {
            FormEvent::Cancel => self.page = Page::Dashboard,
            FormEvent::Submit => {
                let bolt11 = self.pay.invoice.value().trim().to_string();
                if bolt11.is_empty() {
                    return;
                }
                match self.cockpit.client.decode_pay(&bolt11).await {
                    Ok(decoded) => {
                        info!(
                            "Decoded invoice: {} sats to {}",
                            format_sats(crate::amounts::msat_to_sat(decoded.msatoshi) as i64),
                            decoded.payee
                        );
                        self.pay.decoded = Some(decoded);
                    }
                    Err(e) => warn!("Invalid payment request: {}", e),
                }
            }
            FormEvent::Consumed => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(7),
            ])
            .split(frame.area());

        self.draw_top_bar(frame, outer[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(outer[1]);
        self.draw_menu(frame, middle[0]);

        match self.page {
            Page::Dashboard => dash::draw(frame, middle[1], &self.summary, &self.activity),
            Page::Channels => {
                channels::draw_table(frame, middle[1], &self.channels, self.channel_selected)
            }
            Page::Receive => self.receive.draw(frame, middle[1]),
            Page::Pay => self.pay.draw(frame, middle[1]),
            Page::Liquidity => liquidity::draw(
                frame,
                middle[1],
                &self.liquidity_ads,
                self.summary.dual_funding,
                &self.summary.config_path,
            ),
        }

        self.draw_status_bar(frame, outer[2]);
        self.draw_log(frame, outer[3]);

        match &self.modal {
            Some(Modal::Help) => self.draw_help(frame, middle[1]),
            Some(Modal::Sort { selected }) => channels::draw_sort_modal(
                frame,
                middle[1],
                *selected,
                self.cockpit.channels.sort_policy(),
            ),
            Some(Modal::Fees(form)) => form.draw(frame, middle[1]),
            Some(Modal::Open(form)) => form.draw(frame, middle[1]),
            None => {}
        }
    }

    fn draw_top_bar(&self, frame: &mut Frame, area: Rect) {
        let bar = Paragraph::new(" cln-cockpit - press h for help")
            .style(Style::default().fg(ratatui::style::Color::Black).bg(theme::ACCENT));
        frame.render_widget(bar, area);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let entries = [
            (Page::Dashboard, "Node info", 'i'),
            (Page::Pay, "Pay", 'p'),
            (Page::Receive, "Receive", 'r'),
            (Page::Channels, "Channels", 'c'),
            (Page::Liquidity, "Liquidity ads", 'l'),
        ];
        let items: Vec<ListItem> = entries
            .iter()
            .map(|(page, label, hotkey)| {
                let style = if *page == self.page {
                    Style::default().fg(theme::ACCENT).reversed()
                } else {
                    Style::default().fg(theme::TEXT)
                };
                ListItem::new(Line::from(Span::styled(
                    format!(" ({hotkey}) {label}"),
                    style,
                )))
            })
            .collect();
        let menu = List::new(items).block(
            Block::default()
                .title(" Menu ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT)),
        );
        frame.render_widget(menu, area);
    }

    fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
        let bar = Paragraph::new("  [j/k] Down/Up    [Enter] Details    [ESC] Back    [q] Quit")
            .style(Style::default().fg(theme::TEXT).bg(ratatui::style::Color::Black));
        frame.render_widget(bar, area);
    }

    fn draw_log(&self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .log
            .tail(height)
            .into_iter()
            .map(Line::from)
            .collect();
        let pane = Paragraph::new(lines).block(
            Block::default()
                .title(" Activity ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT)),
        );
        frame.render_widget(pane, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let rect = widgets::centered_rect(44, HELP_LINES.len() as u16 + 2, area);
        frame.render_widget(Clear, rect);
        let lines: Vec<Line> = HELP_LINES
            .iter()
            .map(|line| Line::from(format!(" {line}")))
            .collect();
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}
