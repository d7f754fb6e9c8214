use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{LoginField, LoginForm};
use crate::ui::help::centered_rect;
use crate::ui::theme::Theme;

const FORM_WIDTH: u16 = 64;
const FORM_HEIGHT: u16 = 15;

pub fn render_login(f: &mut Frame, form: &LoginForm, connecting: bool, area: Rect) {
    let popup = centered_rect(FORM_WIDTH, FORM_HEIGHT, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Genesys Cloud Login ")
        .borders(Borders::ALL)
        .border_style(Theme::title());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Min(2),
        Constraint::Length(1),
    ])
    .split(inner);

    let masked = "\u{2022}".repeat(form.client_secret.chars().count());
    let environment = format!(
        "< {} ({}) >",
        form.environment.as_str(),
        form.environment.label()
    );

    render_field(f, "Client ID", &form.client_id, form.focus == LoginField::ClientId, rows[1]);
    render_field(
        f,
        "Client Secret",
        &masked,
        form.focus == LoginField::ClientSecret,
        rows[2],
    );
    render_field(
        f,
        "Environment",
        &environment,
        form.focus == LoginField::Environment,
        rows[3],
    );

    let button = if connecting {
        Span::styled("  [ Connecting... ]", Theme::muted())
    } else {
        Span::styled("  [ Connect ]", Theme::help_key())
    };
    f.render_widget(Paragraph::new(Line::from(button)), rows[4]);

    if let Some(ref err) = form.error {
        let error = Paragraph::new(Line::from(Span::styled(format!("  {}", err), Theme::error())))
            .wrap(Wrap { trim: false });
        f.render_widget(error, rows[5]);
    }

    let hints = Line::from(Span::styled(
        "  Tab:next field  Left/Right:environment  Enter:connect  Esc:quit",
        Theme::footer(),
    ));
    f.render_widget(Paragraph::new(hints), rows[6]);
}

fn render_field(f: &mut Frame, label: &str, value: &str, focused: bool, area: Rect) {
    let (marker, style) = if focused {
        ("> ", Theme::input_focused())
    } else {
        ("  ", Theme::value())
    };
    let cursor = if focused { "_" } else { "" };
    let line = Line::from(vec![
        Span::styled(marker, Theme::input_focused()),
        Span::styled(format!("{:<15}", label), Theme::label()),
        Span::styled(format!("{}{}", value, cursor), style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesys::Environment;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(form: &LoginForm, connecting: bool) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| render_login(f, form, connecting, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    fn form() -> LoginForm {
        LoginForm {
            client_id: "my-client".into(),
            client_secret: "hunter2".into(),
            environment: Environment::parse("mypurecloud.ie").unwrap(),
            focus: LoginField::ClientSecret,
            error: Some("Authentication failed (HTTP 401): nope".into()),
        }
    }

    #[test]
    fn test_secret_is_masked_and_error_shown() {
        let screen = draw(&form(), false);
        assert!(screen.contains("my-client"));
        assert!(!screen.contains("hunter2"));
        assert!(screen.contains("mypurecloud.ie"));
        assert!(screen.contains("HTTP 401"));
        assert!(screen.contains("[ Connect ]"));
    }

    #[test]
    fn test_connect_control_while_connecting() {
        let screen = draw(&form(), true);
        assert!(screen.contains("Connecting..."));
    }
}
