//! Visual styling utilities for the CLI.
//!
//! Colors follow the dashboard palette carried by [`RiskLevel::color`], so a
//! CRITICAL line in the terminal matches the red card on screen.

use owo_colors::OwoColorize;
use rockwatch_types::{ConnectionState, RiskLevel};

// ============================================================================
// Risk Level Colors
// ============================================================================

/// Parse a `#rrggbb` color into its components.
pub fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Format a risk level label in its dashboard color, padded to `width`.
pub fn format_level(level: RiskLevel, width: usize, no_color: bool) -> String {
    let label = format!("{:<width$}", level);
    if no_color {
        return label;
    }
    match hex_rgb(level.color()) {
        Some((r, g, b)) => format!("{}", label.truecolor(r, g, b).bold()),
        None => label,
    }
}

/// Format a risk level badge, e.g. `[HIGH]`.
pub fn format_level_badge(level: RiskLevel, no_color: bool) -> String {
    format!("[{}]", format_level(level, 0, no_color))
}

/// Render a score as a ten-cell bar.
pub fn format_score_bar(score: u8, no_color: bool) -> String {
    let filled = usize::from(score.min(10));
    let (on, off) = if no_color { ("#", ".") } else { ("█", "░") };
    let bar = format!("{}{}", on.repeat(filled), off.repeat(10 - filled));
    if no_color {
        return bar;
    }
    match hex_rgb(RiskLevel::from_score(score).color()) {
        Some((r, g, b)) => format!("{}", bar.truecolor(r, g, b)),
        None => bar,
    }
}

/// Format the connection state.
pub fn format_connection(state: ConnectionState, no_color: bool) -> String {
    let label = state.to_string();
    if no_color {
        return label;
    }
    match state {
        ConnectionState::Connected => format!("{}", label.green()),
        ConnectionState::Connecting => format!("{}", label.yellow()),
        ConnectionState::Disconnected => format!("{}", label.dimmed()),
        ConnectionState::Error => format!("{}", label.red().bold()),
    }
}

// ============================================================================
// Trend Indicators
// ============================================================================

/// Get trend indicator comparing the current and previous risk score.
pub fn trend_indicator(current: u8, previous: Option<u8>, no_color: bool) -> &'static str {
    match previous {
        None => " ",
        Some(previous) if current == previous => "-",
        Some(previous) if current > previous => {
            if no_color {
                "^"
            } else {
                "↑"
            }
        }
        Some(_) => {
            if no_color {
                "v"
            } else {
                "↓"
            }
        }
    }
}

// ============================================================================
// Messages and Headers
// ============================================================================

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format a warning message.
pub fn format_warning(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[!!] {}", message)
    } else {
        format!("{} {}", "[!!]".yellow(), message)
    }
}

/// Format a title header.
pub fn format_title(title: &str, no_color: bool) -> String {
    let rule = "━".repeat(title.chars().count());
    if no_color {
        format!("{}\n{}", title, rule)
    } else {
        format!("{}\n{}", title.bold(), rule.dimmed())
    }
}

/// Dim secondary text.
pub fn dimmed(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.dimmed())
    }
}
