mod app;
mod config;
mod genesys;
mod input;
mod log;
mod present;
mod proxy;
mod refresh;
mod ui;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use app::{App, ViewMode};
use clap::{Args, Parser, Subcommand};
use config::{parse_routing, DashConfig, ProxyConfig};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use genesys::{DashError, KNOWN_ENVIRONMENTS};
use input::{handle_event, Action};
use present::{AgentView, QueueView};
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use refresh::{Session, SessionEvent};
use std::io::{stdout, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "ccdash", version)]
#[command(about = "Genesys Cloud agent presence and queue dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    genesys: GenesysArgs,
}

#[derive(Args)]
struct GenesysArgs {
    /// Region suffix, e.g. mypurecloud.ie
    #[arg(long, global = true)]
    environment: Option<String>,
    #[arg(long, global = true)]
    client_id: Option<String>,
    #[arg(long, global = true)]
    client_secret: Option<String>,
    /// direct | proxy | relay
    #[arg(long, global = true)]
    routing: Option<String>,
    #[arg(long, global = true)]
    proxy_url: Option<String>,
    #[arg(long, global = true)]
    relay_url: Option<String>,
    /// Seconds between refresh cycles
    #[arg(long, global = true)]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Dash,
    /// Run one fetch cycle and print both views
    Once,
    /// Local CORS proxy for the Genesys Cloud API and login hosts
    Proxy {
        #[arg(long)]
        listen: Option<String>,
        #[arg(long)]
        region: Option<String>,
        /// Directory served for non-proxied paths
        #[arg(long)]
        root: Option<PathBuf>,
        /// Open the dashboard page in the browser
        #[arg(long)]
        open: bool,
    },
    /// List known region suffixes
    Environments,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = DashConfig::load();
    apply_cli(&mut config, &cli.genesys);

    match cli.command.unwrap_or(Command::Dash) {
        Command::Dash => run_dashboard(&config).map(|()| ExitCode::SUCCESS),
        Command::Once => run_once(&config),
        Command::Proxy {
            listen,
            region,
            root,
            open,
        } => {
            let mut proxy = config.proxy.clone();
            if let Some(listen) = listen {
                proxy.listen = listen;
            }
            if let Some(region) = region {
                proxy.region = region;
            }
            if let Some(root) = root {
                proxy.static_root = root;
            }
            run_proxy(&proxy, open).map(|()| ExitCode::SUCCESS)
        }
        Command::Environments => {
            for (suffix, label) in KNOWN_ENVIRONMENTS {
                println!("{:<24} {}", suffix, label);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_cli(config: &mut DashConfig, args: &GenesysArgs) {
    if let Some(ref env) = args.environment {
        config.environment = env.clone();
    }
    if let Some(ref id) = args.client_id {
        config.client_id = Some(id.clone());
    }
    if let Some(ref secret) = args.client_secret {
        config.client_secret = Some(secret.clone());
    }
    if let Some(interval) = args.interval {
        config.poll_interval = interval.max(1);
    }

    let kind = args.routing.as_deref().or(if args.relay_url.is_some() {
        Some("relay")
    } else if args.proxy_url.is_some() {
        Some("proxy")
    } else {
        None
    });
    if kind.is_some() {
        config.routing = parse_routing(kind, args.proxy_url.clone(), args.relay_url.clone());
    }
}

fn run_dashboard(config: &DashConfig) -> Result<()> {
    if !stdout().is_terminal() {
        eprintln!("Error: ccdash requires an interactive terminal (TTY). Try 'ccdash once'.");
        std::process::exit(1);
    }

    let mut app = App::new(config);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut needs_draw = true;

    loop {
        if app.drain_session_events() {
            needs_draw = true;
        }

        if app.view_mode() == ViewMode::Log && log::take_dirty() {
            needs_draw = true;
        }

        if needs_draw {
            terminal.draw(|f| {
                let area = f.area();
                match app.view_mode() {
                    ViewMode::Login => {
                        ui::render_login(f, app.form(), app.is_connecting(), area);
                    }
                    ViewMode::Dashboard => ui::render_dashboard(f, app, area),
                    ViewMode::Help => {
                        if app.base_view() == ViewMode::Dashboard {
                            ui::render_dashboard(f, app, area);
                        }
                        ui::render_help(f, area);
                    }
                    ViewMode::Log => {
                        let entries = log::entries();
                        ui::render_log_panel(f, &entries, app.log_scroll(), area);
                    }
                }
            })?;
            needs_draw = false;
        }

        if event::poll(Duration::from_millis(50))? {
            loop {
                let ev = event::read()?;
                if let event::Event::Resize(_, _) = ev {
                    needs_draw = true;
                }

                let action = handle_event(&ev, app.view_mode());
                if action != Action::None {
                    process_action(app, action);
                    needs_draw = true;
                }

                if app.should_quit() || !event::poll(Duration::from_millis(0))? {
                    break;
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn process_action(app: &mut App, action: Action) {
    match action {
        Action::Quit => app.quit(),
        Action::MoveUp => app.move_up(),
        Action::MoveDown => app.move_down(),
        Action::MoveToTop => app.move_to_top(),
        Action::MoveToBottom => app.move_to_bottom(),
        Action::Back => {
            if app.view_mode() == ViewMode::Login {
                if !app.cancel_login() {
                    app.quit();
                }
            } else {
                app.back();
            }
        }
        Action::ShowHelp => app.toggle_help(),
        Action::ToggleLog => app.toggle_log(),
        Action::ClearLog => log::clear(),
        Action::FieldInput(c) => app.form_mut().push(c),
        Action::FieldBackspace => app.form_mut().pop(),
        Action::NextField => {
            let form = app.form_mut();
            form.focus = form.focus.next();
        }
        Action::PrevField => {
            let form = app.form_mut();
            form.focus = form.focus.prev();
        }
        Action::LoginEnvironment(forward) => app.login_cycle_environment(forward),
        Action::Connect => app.submit_login(),
        Action::Refresh => app.refresh_now(),
        Action::CycleEnvironment(forward) => app.cycle_environment(forward),
        Action::Reconnect => app.reconnect(),
        Action::Disconnect => app.disconnect(),
        Action::SwitchPanel => app.toggle_focus(),
        Action::None => {}
    }
}

/// Headless single cycle. Exit status reflects authentication only;
/// region failures are printed inline.
fn run_once(config: &DashConfig) -> Result<ExitCode> {
    log::set_echo(true);

    let environment = match config.environment() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let mut session = Session::new(environment.clone(), config.session_settings());
    if let Err(e) = session.connect(config.credentials()) {
        eprintln!("Error: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    let budget = config
        .session_settings()
        .request_timeout
        .map(|t| t * 3)
        .unwrap_or(Duration::from_secs(120));
    let deadline = Instant::now() + budget;

    let mut agents: Option<Result<AgentView, DashError>> = None;
    let mut queues: Option<Result<QueueView, DashError>> = None;
    while agents.is_none() || queues.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match session.wait_event(remaining) {
            Some(SessionEvent::ConnectFailed(e)) => {
                eprintln!("Error: {}", e);
                return Ok(ExitCode::FAILURE);
            }
            Some(SessionEvent::Agents(result)) => agents = Some(result),
            Some(SessionEvent::Queues(result)) => queues = Some(result),
            Some(SessionEvent::Connected | SessionEvent::Loading(_)) => {}
            None => {
                eprintln!("Error: timed out waiting for {}", environment);
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    session.disconnect();

    println!("Environment: {} ({})", environment, environment.label());
    println!();
    match agents {
        Some(Ok(view)) => {
            println!(
                "Agents ({} online, {} available)",
                view.rows().len(),
                view.available_count()
            );
            print!("{}", view);
        }
        Some(Err(e)) => println!("Agents\n  Error loading agents: {}", e),
        None => {}
    }
    println!();
    match queues {
        Some(Ok(view)) => {
            println!("Queues ({} waiting)", view.total_waiting());
            print!("{}", view);
        }
        Some(Err(e)) => println!("Queues\n  Error loading queues: {}", e),
        None => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn run_proxy(proxy: &ProxyConfig, open_browser: bool) -> Result<()> {
    log::set_echo(true);

    let server = proxy::ProxyServer::from_config(proxy)?;
    let addr = server.local_addr();
    let base = if addr.ip().is_unspecified() || addr.ip().is_loopback() {
        format!("http://localhost:{}", addr.port())
    } else {
        format!("http://{}", addr)
    };
    let page = format!("{}/index.html", base);

    println!("CORS proxy server running at {}", base);
    println!("Open {} to use the application", page);

    if open_browser {
        if let Err(e) = open::that(&page) {
            crate::tlog!(warn, "could not open browser: {}", e);
        }
    }

    let stop = AtomicBool::new(false);
    server.run(&stop)
}
