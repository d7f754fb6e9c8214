use crate::tlog;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::genesys::{
    authenticate, AccessToken, Credentials, DashError, Endpoints, Environment, GenesysClient,
    Routing,
};
use crate::present::{present_agents, present_queues, AgentView, QueueView};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Agents,
    Queues,
}

impl DataKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Queues => "queues",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub routing: Routing,
    pub refresh_interval: Duration,
    /// `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            routing: Routing::Direct,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: None,
        }
    }
}

/// What the session reports to whoever renders it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected,
    ConnectFailed(DashError),
    Loading(DataKind),
    Agents(Result<AgentView, DashError>),
    Queues(Result<QueueView, DashError>),
}

enum WorkerMessage {
    Authenticated(AccessToken),
    AuthFailed(DashError),
    Loading(DataKind),
    Agents(Result<AgentView, DashError>),
    Queues(Result<QueueView, DashError>),
}

struct Envelope {
    generation: u64,
    message: WorkerMessage,
}

/// Stop handle for the periodic refresh task. Dropping it stops the task.
struct RefreshHandle {
    stop: Arc<AtomicBool>,
    kick: Arc<AtomicBool>,
    _handle: JoinHandle<()>,
}

impl RefreshHandle {
    fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// One dashboard session: token, selected environment and the refresh
/// task. At most one refresh task is alive; `connect` and `disconnect`
/// stop the previous one and bump the generation so any of its late
/// results are dropped instead of shown.
pub struct Session {
    settings: SessionSettings,
    environment: Arc<Mutex<Environment>>,
    state: ConnectionState,
    token: Option<AccessToken>,
    generation: u64,
    refresh: Option<RefreshHandle>,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl Session {
    pub fn new(environment: Environment, settings: SessionSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            settings,
            environment: Arc::new(Mutex::new(environment)),
            state: ConnectionState::Disconnected,
            token: None,
            generation: 0,
            refresh: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn environment(&self) -> Environment {
        lock_env(&self.environment).clone()
    }

    /// Takes effect from the next request built; in-flight requests keep
    /// the URLs they started with.
    pub fn set_environment(&self, environment: Environment) {
        tlog!(info, "environment -> {}", environment);
        *lock_env(&self.environment) = environment;
    }

    /// Validates, tears down any previous refresh task, then authenticates
    /// and starts polling on a background thread. Validation failures
    /// return immediately and leave the session untouched.
    pub fn connect(&mut self, credentials: Credentials) -> Result<(), DashError> {
        if let Err(e) = credentials.validate() {
            tlog!(warn, "connect rejected: {}", e);
            return Err(e);
        }

        self.teardown();
        self.state = ConnectionState::Connecting;
        tlog!(
            info,
            "connecting (generation {}) to {} via {}",
            self.generation,
            self.environment(),
            self.settings.routing.label()
        );

        let stop = Arc::new(AtomicBool::new(false));
        let kick = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            generation: self.generation,
            credentials,
            environment: Arc::clone(&self.environment),
            settings: self.settings.clone(),
            tx: self.tx.clone(),
            stop: Arc::clone(&stop),
            kick: Arc::clone(&kick),
            agents_in_flight: Arc::new(AtomicBool::new(false)),
            queues_in_flight: Arc::new(AtomicBool::new(false)),
        };
        let handle = std::thread::spawn(move || worker.run());

        self.refresh = Some(RefreshHandle {
            stop,
            kick,
            _handle: handle,
        });
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tlog!(info, "disconnected");
        }
        self.teardown();
        self.state = ConnectionState::Disconnected;
    }

    /// Runs a cycle now without waiting for the timer. Returns false when
    /// there is no connected session to refresh.
    pub fn refresh_now(&self) -> bool {
        match (&self.refresh, self.state) {
            (Some(handle), ConnectionState::Connected) => {
                handle.kick.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// All pending events from the current generation.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            if let Some(event) = self.apply(envelope) {
                events.push(event);
            }
        }
        events
    }

    /// Blocks until the next current-generation event or the timeout.
    pub fn wait_event(&mut self, timeout: Duration) -> Option<SessionEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let envelope = self.rx.recv_timeout(remaining).ok()?;
            if let Some(event) = self.apply(envelope) {
                return Some(event);
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.refresh.take() {
            handle.cancel();
        }
        self.token = None;
        self.generation += 1;
    }

    fn apply(&mut self, envelope: Envelope) -> Option<SessionEvent> {
        if envelope.generation != self.generation {
            return None;
        }

        let event = match envelope.message {
            WorkerMessage::Authenticated(token) => {
                self.token = Some(token);
                self.state = ConnectionState::Connected;
                tlog!(info, "state -> Connected");
                SessionEvent::Connected
            }
            WorkerMessage::AuthFailed(err) => {
                self.refresh = None;
                self.state = ConnectionState::Disconnected;
                tlog!(error, "state -> Disconnected: {}", err);
                SessionEvent::ConnectFailed(err)
            }
            WorkerMessage::Loading(kind) => SessionEvent::Loading(kind),
            WorkerMessage::Agents(result) => SessionEvent::Agents(result),
            WorkerMessage::Queues(result) => SessionEvent::Queues(result),
        };
        Some(event)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock_env(env: &Mutex<Environment>) -> std::sync::MutexGuard<'_, Environment> {
    env.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Worker {
    generation: u64,
    credentials: Credentials,
    environment: Arc<Mutex<Environment>>,
    settings: SessionSettings,
    tx: Sender<Envelope>,
    stop: Arc<AtomicBool>,
    kick: Arc<AtomicBool>,
    agents_in_flight: Arc<AtomicBool>,
    queues_in_flight: Arc<AtomicBool>,
}

impl Worker {
    fn run(self) {
        let client = self.client();
        let token = match authenticate(&client, &self.credentials) {
            Ok(token) => token,
            Err(e) => {
                self.send(WorkerMessage::AuthFailed(e));
                return;
            }
        };
        self.send(WorkerMessage::Authenticated(token.clone()));

        let mut cycle = 0u64;
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            cycle += 1;
            self.dispatch_cycle(cycle, &token);

            if !self.sleep_until_next_tick() {
                tlog!(info, "refresh task {} stopped", self.generation);
                return;
            }
        }
    }

    fn client(&self) -> GenesysClient {
        let environment = lock_env(&self.environment).clone();
        GenesysClient::new(
            Endpoints::resolve(&environment, &self.settings.routing),
            self.settings.request_timeout,
        )
    }

    fn in_flight(&self, kind: DataKind) -> &Arc<AtomicBool> {
        match kind {
            DataKind::Agents => &self.agents_in_flight,
            DataKind::Queues => &self.queues_in_flight,
        }
    }

    /// Fires both fetches on their own threads. Neither waits for the
    /// other and a failure only reaches its own region. A kind whose
    /// previous fetch has not answered yet sits this cycle out, so each
    /// region gets its results in request order.
    fn dispatch_cycle(&self, cycle: u64, token: &AccessToken) {
        tlog!(info, "refresh cycle {} (generation {})", cycle, self.generation);

        for kind in [DataKind::Agents, DataKind::Queues] {
            let in_flight = Arc::clone(self.in_flight(kind));
            if in_flight.swap(true, Ordering::AcqRel) {
                tlog!(warn, "{} still loading, skipping cycle {}", kind.label(), cycle);
                continue;
            }
            let client = self.client();
            let token = token.clone();
            let tx = self.tx.clone();
            let generation = self.generation;

            std::thread::spawn(move || {
                let send = |message| {
                    let _ = tx.send(Envelope {
                        generation,
                        message,
                    });
                };
                send(WorkerMessage::Loading(kind));
                let message = match kind {
                    DataKind::Agents => {
                        WorkerMessage::Agents(client.fetch_agents(&token).map(|p| present_agents(&p)))
                    }
                    DataKind::Queues => {
                        WorkerMessage::Queues(client.fetch_queues(&token).map(|p| present_queues(&p)))
                    }
                };
                match &message {
                    WorkerMessage::Agents(Err(e)) | WorkerMessage::Queues(Err(e)) => {
                        tlog!(error, "error loading {}: {}", kind.label(), e);
                    }
                    _ => tlog!(info, "{} updated", kind.label()),
                }
                send(message);
                in_flight.store(false, Ordering::Release);
            });
        }
    }

    /// Returns false once the task has been stopped.
    fn sleep_until_next_tick(&self) -> bool {
        let started = Instant::now();
        while started.elapsed() < self.settings.refresh_interval {
            if self.stop.load(Ordering::Relaxed) {
                return false;
            }
            if self.kick.swap(false, Ordering::Relaxed) {
                tlog!(info, "manual refresh");
                return true;
            }
            let left = self.settings.refresh_interval.saturating_sub(started.elapsed());
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
        !self.stop.load(Ordering::Relaxed)
    }

    fn send(&self, message: WorkerMessage) {
        let _ = self.tx.send(Envelope {
            generation: self.generation,
            message,
        });
    }
}
