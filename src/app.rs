use crate::tlog;

use chrono::{DateTime, Local};

use crate::config::DashConfig;
use crate::genesys::{Credentials, Environment};
use crate::present::{AgentView, QueueView};
use crate::refresh::{ConnectionState, DataKind, Session, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Login,
    Dashboard,
    Help,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    ClientId,
    ClientSecret,
    Environment,
}

impl LoginField {
    pub fn next(self) -> Self {
        match self {
            Self::ClientId => Self::ClientSecret,
            Self::ClientSecret => Self::Environment,
            Self::Environment => Self::ClientId,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::ClientId => Self::Environment,
            Self::ClientSecret => Self::ClientId,
            Self::Environment => Self::ClientSecret,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub client_id: String,
    pub client_secret: String,
    pub environment: Environment,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn push(&mut self, c: char) {
        match self.focus {
            LoginField::ClientId => self.client_id.push(c),
            LoginField::ClientSecret => self.client_secret.push(c),
            LoginField::Environment => {}
        }
    }

    pub fn pop(&mut self) {
        match self.focus {
            LoginField::ClientId => {
                self.client_id.pop();
            }
            LoginField::ClientSecret => {
                self.client_secret.pop();
            }
            LoginField::Environment => {}
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.client_id.clone(), self.client_secret.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionContent<T> {
    /// Nothing fetched yet for this session.
    Waiting,
    Ready(T),
    Failed(String),
}

/// One independently updated half of the dashboard.
#[derive(Debug, Clone)]
pub struct Region<T> {
    pub loading: bool,
    pub content: RegionContent<T>,
    pub updated_at: Option<DateTime<Local>>,
}

impl<T> Default for Region<T> {
    fn default() -> Self {
        Self {
            loading: false,
            content: RegionContent::Waiting,
            updated_at: None,
        }
    }
}

impl<T> Region<T> {
    fn apply(&mut self, kind: DataKind, result: Result<T, crate::genesys::DashError>) {
        self.loading = false;
        self.content = match result {
            Ok(view) => {
                self.updated_at = Some(Local::now());
                RegionContent::Ready(view)
            }
            Err(e) => RegionContent::Failed(format!("Error loading {}: {}", kind.label(), e)),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Agents,
    Queues,
}

pub struct App {
    session: Session,
    view_mode: ViewMode,
    /// Where Help and Log return to.
    base_view: ViewMode,
    form: LoginForm,
    agents: Region<AgentView>,
    queues: Region<QueueView>,
    focus: Panel,
    agents_scroll: usize,
    queues_scroll: usize,
    log_scroll: usize,
    last_update: Option<DateTime<Local>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &DashConfig) -> Self {
        let environment = config.environment().unwrap_or_else(|e| {
            tlog!(warn, "invalid environment {:?}: {}", config.environment, e);
            Environment::default()
        });

        let form = LoginForm {
            client_id: config.client_id.clone().unwrap_or_default(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            environment: environment.clone(),
            focus: LoginField::ClientId,
            error: None,
        };

        Self {
            session: Session::new(environment, config.session_settings()),
            view_mode: ViewMode::Login,
            base_view: ViewMode::Login,
            form,
            agents: Region::default(),
            queues: Region::default(),
            focus: Panel::Agents,
            agents_scroll: 0,
            queues_scroll: 0,
            log_scroll: 0,
            last_update: None,
            should_quit: false,
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn base_view(&self) -> ViewMode {
        self.base_view
    }

    fn set_base_view(&mut self, mode: ViewMode) {
        self.base_view = mode;
        if matches!(self.view_mode, ViewMode::Login | ViewMode::Dashboard) {
            self.view_mode = mode;
        }
    }

    pub fn toggle_help(&mut self) {
        self.view_mode = if self.view_mode == ViewMode::Help {
            self.base_view
        } else {
            ViewMode::Help
        };
    }

    pub fn toggle_log(&mut self) {
        if self.view_mode == ViewMode::Log {
            self.view_mode = self.base_view;
        } else {
            self.view_mode = ViewMode::Log;
            self.log_scroll = usize::MAX;
        }
    }

    pub fn back(&mut self) {
        self.view_mode = self.base_view;
    }

    pub fn form(&self) -> &LoginForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut LoginForm {
        &mut self.form
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn is_connecting(&self) -> bool {
        self.session.state() == ConnectionState::Connecting
    }

    pub fn environment(&self) -> Environment {
        self.session.environment()
    }

    pub fn agents(&self) -> &Region<AgentView> {
        &self.agents
    }

    pub fn queues(&self) -> &Region<QueueView> {
        &self.queues
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    /// Connects with the form's credentials. Enter is ignored while a
    /// connect is already in flight.
    pub fn submit_login(&mut self) {
        if self.is_connecting() {
            return;
        }
        self.session.set_environment(self.form.environment.clone());
        match self.session.connect(self.form.credentials()) {
            Ok(()) => {
                self.form.error = None;
                self.agents = Region::default();
                self.queues = Region::default();
                self.last_update = None;
            }
            Err(e) => self.form.error = Some(e.to_string()),
        }
    }

    pub fn login_cycle_environment(&mut self, forward: bool) {
        self.form.environment = self.form.environment.cycle(forward);
    }

    /// Picks the next known environment for the running session. Only
    /// requests built after this see the new value.
    pub fn cycle_environment(&mut self, forward: bool) {
        let next = self.session.environment().cycle(forward);
        self.form.environment = next.clone();
        self.session.set_environment(next);
    }

    pub fn refresh_now(&mut self) {
        if !self.session.is_authenticated() || !self.session.refresh_now() {
            tlog!(warn, "refresh ignored: not connected");
        }
    }

    /// Back to the login form. The running session keeps polling until the
    /// next connect replaces it.
    pub fn reconnect(&mut self) {
        self.form.focus = LoginField::ClientId;
        self.set_base_view(ViewMode::Login);
    }

    /// Esc on the login form returns to a dashboard that is still
    /// connected. Returns false when there is none.
    pub fn cancel_login(&mut self) -> bool {
        if self.session.state() != ConnectionState::Connected {
            return false;
        }
        self.set_base_view(ViewMode::Dashboard);
        true
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.agents.loading = false;
        self.queues.loading = false;
    }

    /// Applies pending session events. Returns true when anything changed.
    pub fn drain_session_events(&mut self) -> bool {
        let events = self.session.drain();
        let changed = !events.is_empty();
        for event in events {
            self.apply_event(event);
        }
        changed
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => {
                self.form.error = None;
                self.set_base_view(ViewMode::Dashboard);
            }
            SessionEvent::ConnectFailed(e) => {
                self.form.error = Some(e.to_string());
                self.set_base_view(ViewMode::Login);
            }
            SessionEvent::Loading(DataKind::Agents) => self.agents.loading = true,
            SessionEvent::Loading(DataKind::Queues) => self.queues.loading = true,
            SessionEvent::Agents(result) => {
                let ok = result.is_ok();
                self.agents.apply(DataKind::Agents, result);
                self.clamp_scroll();
                if ok {
                    self.last_update = Some(Local::now());
                }
            }
            SessionEvent::Queues(result) => {
                let ok = result.is_ok();
                self.queues.apply(DataKind::Queues, result);
                self.clamp_scroll();
                if ok {
                    self.last_update = Some(Local::now());
                }
            }
        }
    }

    pub fn focus(&self) -> Panel {
        self.focus
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Panel::Agents => Panel::Queues,
            Panel::Queues => Panel::Agents,
        };
    }

    pub fn scroll(&self, panel: Panel) -> usize {
        match panel {
            Panel::Agents => self.agents_scroll,
            Panel::Queues => self.queues_scroll,
        }
    }

    fn row_count(&self, panel: Panel) -> usize {
        match panel {
            Panel::Agents => match &self.agents.content {
                RegionContent::Ready(view) => view.rows().len(),
                _ => 0,
            },
            Panel::Queues => match &self.queues.content {
                RegionContent::Ready(view) => view.rows().len(),
                _ => 0,
            },
        }
    }

    fn scroll_mut(&mut self, panel: Panel) -> &mut usize {
        match panel {
            Panel::Agents => &mut self.agents_scroll,
            Panel::Queues => &mut self.queues_scroll,
        }
    }

    fn clamp_scroll(&mut self) {
        for panel in [Panel::Agents, Panel::Queues] {
            let max = self.row_count(panel).saturating_sub(1);
            let scroll = self.scroll_mut(panel);
            *scroll = (*scroll).min(max);
        }
    }

    pub fn move_up(&mut self) {
        if self.view_mode == ViewMode::Log {
            self.log_scroll = self.log_scroll.min(crate::log::entry_count()).saturating_sub(1);
            return;
        }
        let scroll = self.scroll_mut(self.focus);
        *scroll = scroll.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.view_mode == ViewMode::Log {
            self.log_scroll = self.log_scroll.saturating_add(1);
            return;
        }
        let max = self.row_count(self.focus).saturating_sub(1);
        let scroll = self.scroll_mut(self.focus);
        if *scroll < max {
            *scroll += 1;
        }
    }

    pub fn move_to_top(&mut self) {
        if self.view_mode == ViewMode::Log {
            self.log_scroll = 0;
            return;
        }
        *self.scroll_mut(self.focus) = 0;
    }

    pub fn move_to_bottom(&mut self) {
        if self.view_mode == ViewMode::Log {
            self.log_scroll = usize::MAX;
            return;
        }
        let max = self.row_count(self.focus).saturating_sub(1);
        *self.scroll_mut(self.focus) = max;
    }

    pub fn log_scroll(&self) -> usize {
        self.log_scroll
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.session.disconnect();
        self.should_quit = true;
    }
}
