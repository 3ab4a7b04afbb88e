//! Palette and semantic styling for the dashboard.

use ratatui::style::{Color, Modifier, Style};

use forgewatch_core::{HealthStatus, Severity};

// ── Palette ───────────────────────────────────────────────────────────

pub const STEEL_BLUE: Color = Color::Rgb(97, 175, 239); // #61afef
pub const AMBER: Color = Color::Rgb(229, 192, 123); // #e5c07b
pub const ORANGE: Color = Color::Rgb(255, 158, 100); // #ff9e64
pub const HEALTHY_GREEN: Color = Color::Rgb(152, 195, 121); // #98c379
pub const ALERT_RED: Color = Color::Rgb(224, 108, 117); // #e06c75
pub const CRITICAL_MAGENTA: Color = Color::Rgb(198, 120, 221); // #c678dd

pub const TEXT: Color = Color::Rgb(200, 204, 212); // #c8ccd4
pub const MUTED: Color = Color::Rgb(92, 99, 112); // #5c6370
pub const BG_HIGHLIGHT: Color = Color::Rgb(44, 49, 58); // #2c313a
pub const BG_DARK: Color = Color::Rgb(30, 33, 39); // #1e2127

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(STEEL_BLUE).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(STEEL_BLUE)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(STEEL_BLUE)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(TEXT)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(AMBER)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(TEXT)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(STEEL_BLUE).add_modifier(Modifier::BOLD)
}

pub fn error() -> Style {
    Style::default().fg(ALERT_RED)
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Low => HEALTHY_GREEN,
        Severity::Medium => AMBER,
        Severity::High => ORANGE,
        Severity::Critical => CRITICAL_MAGENTA,
        Severity::Unknown => MUTED,
    }
}

pub fn severity(severity: Severity) -> Style {
    Style::default().fg(severity_color(severity))
}

pub fn health(status: HealthStatus) -> Style {
    match status {
        HealthStatus::Healthy => Style::default().fg(HEALTHY_GREEN),
        HealthStatus::Failure => Style::default().fg(ALERT_RED).add_modifier(Modifier::BOLD),
        HealthStatus::Unknown => Style::default().fg(MUTED),
    }
}
