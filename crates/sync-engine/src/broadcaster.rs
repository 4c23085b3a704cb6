// crates/sync-engine/src/broadcaster.rs
//! Background worker pushing the current book to the presence channel

use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};
use shelfsync_core::StatusKind;
use shelfsync_presence::{PresenceError, PresencePayload, PresenceSession};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle of the presence worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastState {
    NotStarted,
    /// Waiting for the first fetch or (re)connecting
    Connecting,
    Connected,
    Stopped,
    /// Gave up on a fatal precondition
    Failed,
}

impl BroadcastState {
    /// Whether a worker is committed to running
    pub fn is_active(&self) -> bool {
        matches!(self, BroadcastState::Connecting | BroadcastState::Connected)
    }
}

impl fmt::Display for BroadcastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BroadcastState::NotStarted => "not started",
            BroadcastState::Connecting => "connecting",
            BroadcastState::Connected => "connected",
            BroadcastState::Stopped => "stopped",
            BroadcastState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Acknowledgement of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Acknowledgement of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The worker will exit at its next loop iteration
    Stopping,
    NotRunning,
}

struct WorkerSlot {
    state: BroadcastState,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    should_run: watch::Sender<bool>,
    slot: Mutex<WorkerSlot>,
}

impl Shared {
    fn set_state(&self, state: BroadcastState) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state = state;
    }

    fn fail(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.state = BroadcastState::Failed;
        self.should_run.send_replace(false);
    }

    /// Decides, under the slot lock, whether a stopping worker exits
    ///
    /// Returns `true` when a start request arrived during shutdown, in which
    /// case the worker keeps going.
    fn settle_stop(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if *self.should_run.borrow() {
            return true;
        }
        slot.state = BroadcastState::Stopped;
        false
    }
}

/// Owns the should-run flag and the single worker task
///
/// Start and stop are cooperative: stop clears the flag and the worker exits
/// at the top of its next iteration or as soon as its current sleep notices.
pub struct PresenceBroadcaster {
    ctx: EngineContext,
    shared: Arc<Shared>,
}

impl PresenceBroadcaster {
    pub(crate) fn new(ctx: EngineContext) -> Self {
        let (should_run, _) = watch::channel(false);
        Self {
            ctx,
            shared: Arc::new(Shared {
                should_run,
                slot: Mutex::new(WorkerSlot {
                    state: BroadcastState::NotStarted,
                    handle: None,
                }),
            }),
        }
    }

    /// Sets the should-run flag and spawns the worker unless one is active
    pub fn request_start(&self) -> EngineResult<StartOutcome> {
        let mut slot = self
            .shared
            .slot
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?;

        if slot.state.is_active() {
            self.shared.should_run.send_replace(true);
            return Ok(StartOutcome::AlreadyRunning);
        }

        let runtime = Handle::try_current().map_err(|e| EngineError::Runtime(e.to_string()))?;

        self.shared.should_run.send_replace(true);
        slot.state = BroadcastState::Connecting;
        slot.handle = Some(runtime.spawn(run_worker(self.ctx.clone(), Arc::clone(&self.shared))));
        log::info!("Presence worker started");
        Ok(StartOutcome::Started)
    }

    /// Clears the should-run flag
    pub fn request_stop(&self) -> EngineResult<StopOutcome> {
        let slot = self
            .shared
            .slot
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?;

        let was_running = self.shared.should_run.send_replace(false);
        if was_running && slot.state.is_active() {
            log::info!("Presence worker stop requested");
            Ok(StopOutcome::Stopping)
        } else {
            Ok(StopOutcome::NotRunning)
        }
    }

    pub fn state(&self) -> EngineResult<BroadcastState> {
        self.shared
            .slot
            .lock()
            .map(|slot| slot.state)
            .map_err(|_| EngineError::LockPoisoned)
    }

    pub fn should_run(&self) -> bool {
        *self.shared.should_run.borrow()
    }

    /// Stops the worker and waits for it to clean up
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.request_stop()?;
        let handle = self
            .shared
            .slot
            .lock()
            .map_err(|_| EngineError::LockPoisoned)?
            .handle
            .take();

        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| EngineError::Runtime(format!("Presence worker panicked: {}", e)))?;
        }
        Ok(())
    }
}

enum Gate {
    Open,
    TimedOut,
    Stopped,
}

async fn wait_for_first_fetch(
    fetched: &mut watch::Receiver<bool>,
    should_run: &mut watch::Receiver<bool>,
    limit: Duration,
) -> Gate {
    tokio::select! {
        result = tokio::time::timeout(limit, fetched.wait_for(|done| *done)) => match result {
            Ok(Ok(_)) => Gate::Open,
            _ => Gate::TimedOut,
        },
        _ = should_run.wait_for(|run| !*run) => Gate::Stopped,
    }
}

/// Sleeps for `duration` unless a stop request arrives first
async fn sleep_or_stop(should_run: &mut watch::Receiver<bool>, duration: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = should_run.wait_for(|run| !*run) => {}
    }
}

async fn close_session(session: &mut Option<Box<dyn PresenceSession>>) {
    if let Some(mut session) = session.take() {
        if let Err(e) = session.clear().await {
            log::debug!("Clearing presence failed: {}", e);
        }
        if let Err(e) = session.close().await {
            log::debug!("Closing presence session failed: {}", e);
        }
    }
}

async fn run_worker(ctx: EngineContext, shared: Arc<Shared>) {
    let mut should_run = shared.should_run.subscribe();
    let mut fetched = ctx.fetched.clone();

    let initial = match ctx.config.snapshot() {
        Ok(config) => config,
        Err(e) => {
            ctx.report(StatusKind::Error, format!("Presence not started: {}", e));
            shared.fail();
            return;
        }
    };

    if initial.presence.app_id().is_none() {
        ctx.report(
            StatusKind::Error,
            "Presence not started: Discord application id is not configured",
        );
        shared.fail();
        return;
    }

    let gate = initial.presence.startup_gate();
    loop {
        match wait_for_first_fetch(&mut fetched, &mut should_run, gate).await {
            Gate::Open => break,
            Gate::TimedOut => {
                ctx.report(
                    StatusKind::Error,
                    format!(
                        "Presence not started: no books fetched within {}s",
                        gate.as_secs()
                    ),
                );
                shared.fail();
                return;
            }
            // Restarted while stopping: the gate still has to open first
            Gate::Stopped => {
                if !shared.settle_stop() {
                    ctx.report(StatusKind::Info, "Presence stopped");
                    return;
                }
            }
        }
    }

    let mut session: Option<Box<dyn PresenceSession>> = None;

    loop {
        if !*should_run.borrow() {
            close_session(&mut session).await;
            if shared.settle_stop() {
                continue;
            }
            ctx.report(StatusKind::Info, "Presence stopped");
            return;
        }

        let config = match ctx.config.snapshot() {
            Ok(config) => config,
            Err(e) => {
                ctx.report(StatusKind::Error, format!("Could not read configuration: {}", e));
                sleep_or_stop(&mut should_run, initial.presence.reconnect_backoff()).await;
                continue;
            }
        };
        let interval = config.presence.effective_interval();
        let backoff = config.presence.reconnect_backoff();

        let Some(app_id) = config.presence.app_id() else {
            close_session(&mut session).await;
            ctx.report(
                StatusKind::Error,
                "Presence stopped: Discord application id was removed",
            );
            shared.fail();
            return;
        };

        if session.is_none() {
            shared.set_state(BroadcastState::Connecting);
            match ctx.connector.connect(app_id).await {
                Ok(connected) => {
                    session = Some(connected);
                    shared.set_state(BroadcastState::Connected);
                    ctx.report(StatusKind::Info, "Connected to Discord");
                }
                Err(e) => {
                    ctx.report(
                        StatusKind::Error,
                        format!("{}; retrying in {}s", e, backoff.as_secs()),
                    );
                    sleep_or_stop(&mut should_run, backoff).await;
                    continue;
                }
            }
        }

        let book = match ctx.current_book() {
            Ok(book) => book,
            Err(e) => {
                ctx.report(StatusKind::Error, format!("Could not read selection: {}", e));
                None
            }
        };

        match book {
            Some(book) => {
                let profile_url = ctx
                    .clients
                    .get(book.platform)
                    .and_then(|client| client.profile_url(&config));
                let payload = PresencePayload::for_book(
                    &book,
                    &config.presence.placeholder_image,
                    profile_url,
                );

                let pushed = match session.as_mut() {
                    Some(active) => active.update(&payload).await,
                    None => Err(PresenceError::Update("not connected".to_string())),
                };

                match pushed {
                    Ok(()) => ctx.report(
                        StatusKind::Active,
                        format!("Showing {} on Discord", book.display_label()),
                    ),
                    Err(e) => {
                        ctx.report(StatusKind::Error, e.to_string());
                        close_session(&mut session).await;
                        shared.set_state(BroadcastState::Connecting);

                        match ctx.connector.connect(app_id).await {
                            Ok(connected) => {
                                session = Some(connected);
                                shared.set_state(BroadcastState::Connected);
                                ctx.report(StatusKind::Info, "Reconnected to Discord");
                            }
                            Err(e) => {
                                ctx.report(
                                    StatusKind::Error,
                                    format!("{}; retrying in {}s", e, backoff.as_secs()),
                                );
                                sleep_or_stop(&mut should_run, backoff).await;
                                continue;
                            }
                        }
                    }
                }
            }
            None => log::debug!("No current book; skipping presence update"),
        }

        sleep_or_stop(&mut should_run, interval).await;
    }
}
