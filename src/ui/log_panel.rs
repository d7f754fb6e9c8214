use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::log::{LogEntry, LogLevel};
use crate::ui::theme::Theme;

fn level_style(level: LogLevel) -> (Style, Style) {
    match level {
        LogLevel::Info => (Theme::footer(), Style::default().fg(Color::White)),
        LogLevel::Warn => (
            Style::default().fg(Color::Yellow),
            Style::default().fg(Color::Yellow),
        ),
        LogLevel::Error => (Theme::error(), Theme::error()),
    }
}

pub fn render_log_panel(f: &mut Frame, entries: &[LogEntry], scroll: usize, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = if entries.is_empty() {
        vec![Line::from(Span::styled(" No log entries yet", Theme::muted()))]
    } else {
        entries
            .iter()
            .map(|entry| {
                let (tag, msg) = level_style(entry.level);
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", entry.timestamp.format("%H:%M:%S")),
                        Theme::footer(),
                    ),
                    Span::styled(format!("[{:<5}] ", entry.level.label()), tag),
                    Span::styled(entry.message.as_str(), msg),
                ])
            })
            .collect()
    };

    // A scroll past the end pins the view to the newest entries.
    let max_scroll = lines.len().saturating_sub(inner_height);
    let offset = scroll.min(max_scroll);

    let footer = format!(
        " L/Esc:back  j/k:scroll  g/G:top/bottom  c:clear  {} | {} entries ",
        crate::log::LOG_PATH,
        entries.len()
    );

    let block = Block::default()
        .title(" Log ")
        .title_bottom(Line::from(footer).centered())
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((offset.min(u16::MAX as usize) as u16, 0));

    f.render_widget(paragraph, area);
}
