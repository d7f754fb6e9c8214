use ratatui::style::{Color, Modifier, Style};

use crate::present::StatusColor;
use crate::refresh::ConnectionState;

pub struct Theme;

impl Theme {
    pub fn header() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn footer() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn label() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn value() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn border() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn input_focused() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn help_key() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn help_desc() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn muted() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn status(color: StatusColor) -> Style {
        let (r, g, b) = color.rgb();
        Style::default().fg(Color::Rgb(r, g, b))
    }

    /// Filled badge for a queue's waiting count.
    pub fn badge(color: StatusColor) -> Style {
        let (r, g, b) = color.rgb();
        Style::default()
            .bg(Color::Rgb(r, g, b))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    pub fn connection(state: ConnectionState) -> Style {
        match state {
            ConnectionState::Connected => Self::status(StatusColor::Green),
            ConnectionState::Connecting => Self::status(StatusColor::Orange),
            ConnectionState::Disconnected => Self::status(StatusColor::Red),
        }
    }
}
