use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::app::{App, Panel, Region, RegionContent};
use crate::present::{AgentView, QueueView};
use crate::ui::theme::Theme;

pub fn render_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .split(area);

    render_header(f, app, chunks[0]);

    let panels = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_agents(f, app, panels[0]);
    render_queues(f, app, panels[1]);

    render_footer(f, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let state = app.connection_state();
    let environment = app.environment();
    let updated = app
        .last_update()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let header = Line::from(vec![
        Span::styled(" Contact Center Dashboard", Theme::title()),
        Span::raw("  "),
        Span::styled(format!("\u{25cf} {}", state.label()), Theme::connection(state)),
        Span::raw("  "),
        Span::styled("Env: ", Theme::label()),
        Span::styled(
            format!("{} ({})", environment.as_str(), environment.label()),
            Theme::value(),
        ),
        Span::raw("  "),
        Span::styled("Last update: ", Theme::label()),
        Span::styled(updated, Theme::value()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Theme::border());
    f.render_widget(Paragraph::new(header).block(block), area);
}

fn panel_block<T>(title: &str, region: &Region<T>, focused: bool) -> Block<'static> {
    let mut title = format!(" {} ", title);
    if region.loading {
        title.push_str("(loading) ");
    }
    if let Some(at) = region.updated_at {
        title.push_str(&format!("@ {} ", at.format("%H:%M:%S")));
    }
    let border = if focused {
        Theme::border_focused()
    } else {
        Theme::border()
    };
    Block::default()
        .title(Span::styled(title, Theme::title()))
        .borders(Borders::ALL)
        .border_style(border)
}

/// Waiting, empty and failed regions render as one line of text.
fn render_message(f: &mut Frame, block: Block, text: &str, style: Style, area: Rect) {
    let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", text), style)))
        .block(block)
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_agents(f: &mut Frame, app: &App, area: Rect) {
    let region = app.agents();
    let block = panel_block("Agents", region, app.focus() == Panel::Agents);

    let rows = match &region.content {
        RegionContent::Waiting => {
            return render_message(f, block, "Loading agents...", Theme::muted(), area);
        }
        RegionContent::Failed(msg) => return render_message(f, block, msg, Theme::error(), area),
        RegionContent::Ready(AgentView::Empty) => {
            return render_message(f, block, "No agents currently online", Theme::muted(), area);
        }
        RegionContent::Ready(view) => view.rows(),
    };

    let header = Row::new(
        ["", "Name", "Status"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header())),
    );
    let body: Vec<Row> = rows
        .iter()
        .map(|row| {
            let style = Theme::status(row.color);
            Row::new(vec![
                Cell::from(row.icon.glyph().to_string()).style(style),
                Cell::from(row.name.clone()),
                Cell::from(row.label.clone()).style(style),
            ])
        })
        .collect();

    let table = Table::new(
        body,
        [
            Constraint::Length(2),
            Constraint::Min(16),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .column_spacing(1)
    .block(block)
    .row_highlight_style(Theme::border_focused());

    let mut state = TableState::default();
    if app.focus() == Panel::Agents {
        state.select(Some(app.scroll(Panel::Agents)));
    } else {
        *state.offset_mut() = app.scroll(Panel::Agents);
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn render_queues(f: &mut Frame, app: &App, area: Rect) {
    let region = app.queues();
    let block = panel_block("Queues", region, app.focus() == Panel::Queues);

    let rows = match &region.content {
        RegionContent::Waiting => {
            return render_message(f, block, "Loading queues...", Theme::muted(), area);
        }
        RegionContent::Failed(msg) => return render_message(f, block, msg, Theme::error(), area),
        RegionContent::Ready(QueueView::Empty) => {
            return render_message(f, block, "No queue data available", Theme::muted(), area);
        }
        RegionContent::Ready(view) => view.rows(),
    };

    let header = Row::new(
        ["Queue", "Waiting", "Active"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header())),
    );
    let body: Vec<Row> = rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.name.clone()),
                Cell::from(format!(" {:>3} ", row.waiting))
                    .style(Theme::badge(row.severity.color())),
                Cell::from(row.active.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        body,
        [
            Constraint::Min(16),
            Constraint::Length(7),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .column_spacing(1)
    .block(block)
    .row_highlight_style(Theme::border_focused());

    let mut state = TableState::default();
    if app.focus() == Panel::Queues {
        state.select(Some(app.scroll(Panel::Queues)));
    } else {
        *state.offset_mut() = app.scroll(Panel::Queues);
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let version = env!("CARGO_PKG_VERSION");
    let keys = "  r:refresh  e/E:environment  c:reconnect  x:disconnect  Tab:panel  L:log  ?:help  q:quit";

    let footer = Line::from(vec![
        Span::styled(format!(" ccdash {}", version), Theme::label()),
        Span::styled(keys, Theme::footer()),
    ]);
    f.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_fresh_dashboard_shows_placeholders() {
        let app = App::new(&DashConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|f| render_dashboard(f, &app, f.area()))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Disconnected"));
        assert!(text.contains("mypurecloud.com"));
        assert!(text.contains("Loading agents..."));
        assert!(text.contains("Loading queues..."));
    }

    #[test]
    fn test_connected_dashboard_lists_rows_in_order() {
        use crate::genesys::Routing;
        use crate::test_support::{MockUpstream, Reply};
        use std::time::{Duration, Instant};

        let mock = MockUpstream::start(|req| {
            if req.url.ends_with("/oauth/token") {
                Reply::json(200, r#"{"access_token":"tok"}"#)
            } else if req.url.contains("/api/v2/users") {
                Reply::json(
                    200,
                    r#"{"entities":[
                        {"name":"Bob","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}},
                        {"name":"Amy","presence":{"presenceDefinition":{"systemPresence":"AVAILABLE"}}}
                    ]}"#,
                )
            } else {
                Reply::json(200, r#"{"results":[]}"#)
            }
        });

        let mut config = DashConfig::default();
        config.client_id = Some("id".into());
        config.client_secret = Some("secret".into());
        config.routing = Routing::LocalProxy {
            base: mock.base_url(),
        };
        let mut app = App::new(&config);
        app.submit_login();

        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline
            && !(matches!(app.agents().content, RegionContent::Ready(_))
                && matches!(app.queues().content, RegionContent::Ready(_)))
        {
            app.drain_session_events();
            std::thread::sleep(Duration::from_millis(20));
        }

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal
            .draw(|f| render_dashboard(f, &app, f.area()))
            .unwrap();
        let text = screen_text(&terminal);

        let amy = text.find("Amy").expect("Amy on screen");
        let bob = text.find("Bob").expect("Bob on screen");
        assert!(amy < bob);
        assert!(text.contains("Connected"));
        assert!(text.contains("No queue data available"));
    }
}
