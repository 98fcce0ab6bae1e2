//! Color palette for the terminal UI.

use ratatui::style::Color;

/// Accent color for the top bar, borders, and focus marks.
pub const ACCENT: Color = Color::Rgb(255, 165, 0);
/// Default text.
pub const TEXT: Color = Color::White;
/// Labels in key/value columns.
pub const LABEL: Color = Color::Rgb(0, 191, 255);
/// Pane borders.
pub const BORDER: Color = Color::Rgb(255, 165, 0);
/// Positive values and success messages.
pub const OK: Color = Color::Green;
/// Negative values and warnings.
pub const WARN: Color = Color::Red;
/// Highlighted amounts.
pub const VALUE: Color = Color::Yellow;
/// Secondary text.
pub const MUTED: Color = Color::DarkGray;
/// Channels we opened.
pub const OPENER_LOCAL: Color = Color::Rgb(173, 255, 47);
/// Channels the peer opened.
pub const OPENER_REMOTE: Color = Color::Rgb(148, 0, 211);
/// Locally opened channel with the peer offline.
pub const OPENER_LOCAL_OFFLINE: Color = Color::Rgb(157, 178, 124);
/// Remotely opened channel with the peer offline.
pub const OPENER_REMOTE_OFFLINE: Color = Color::Rgb(113, 87, 124);
/// Our fee columns.
pub const LOCAL_FEE: Color = Color::Rgb(0, 191, 255);
/// The peer's fee columns.
pub const REMOTE_FEE: Color = Color::Rgb(255, 255, 224);
