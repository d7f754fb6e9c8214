use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::widgets::{Block, Borders, Cell, Clear, Row, Table};
use ratatui::Frame;

use crate::ui::theme::Theme;

struct Section {
    title: &'static str,
    keys: &'static [(&'static str, &'static str)],
}

const SECTIONS: &[Section] = &[
    Section {
        title: "Dashboard",
        keys: &[
            ("r", "Refresh now"),
            ("e / E", "Next / prev environment"),
            ("c", "Reconnect (login form)"),
            ("x", "Disconnect"),
            ("Tab", "Switch agents / queues"),
            ("j k / arrows", "Scroll"),
            ("g / G", "Top / bottom"),
            ("L", "Log panel"),
            ("?", "This help"),
            ("q / Ctrl+c", "Quit"),
        ],
    },
    Section {
        title: "Login form",
        keys: &[
            ("Tab / Up / Down", "Move between fields"),
            ("Left / Right", "Cycle environment"),
            ("Enter", "Connect"),
            ("Esc", "Back to dashboard, or quit"),
        ],
    },
];

pub fn render_help(f: &mut Frame, area: Rect) {
    let mut rows = Vec::new();
    for (i, section) in SECTIONS.iter().enumerate() {
        if i > 0 {
            rows.push(Row::new(vec![Cell::from("")]));
        }
        rows.push(Row::new(vec![
            Cell::from(format!("-- {} --", section.title)).style(Theme::footer())
        ]));
        rows.extend(section.keys.iter().map(|(key, desc)| {
            Row::new(vec![
                Cell::from(*key).style(Theme::help_key()),
                Cell::from(*desc).style(Theme::help_desc()),
            ])
        }));
    }

    let height = rows.len() as u16 + 2;
    let popup = centered_rect(50, height, area);
    f.render_widget(Clear, popup);

    let table = Table::new(rows, [Constraint::Length(18), Constraint::Min(20)])
        .column_spacing(1)
        .block(
            Block::default()
                .title(format!(" ccdash {} keys ", env!("CARGO_PKG_VERSION")))
                .borders(Borders::ALL)
                .border_style(Theme::title()),
        );
    f.render_widget(table, popup);
}

/// A `width` x `height` rect in the middle of `area`, clipped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}
