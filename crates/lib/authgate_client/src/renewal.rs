//! Background renewal agent.
//!
//! A cancellable scheduled task that proactively renews the access token
//! before it expires. Overlapping attempts are suppressed, and repeated
//! failures escalate in two steps: first a direct session probe, and only a
//! probe that also reports invalid forces a logout.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::GatewayClient;

/// Renewal agent tuning.
#[derive(Debug, Clone)]
pub struct RenewalConfig {
    /// Interval between renewal attempts; chosen to sit safely inside the
    /// 2-minute access-token TTL.
    pub interval: Duration,
    /// Delay before the first attempt after start.
    pub initial_delay: Duration,
    /// Consecutive failures before escalating to a session probe.
    pub max_failures: u32,
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(90),
            initial_delay: Duration::from_secs(30),
            max_failures: 5,
        }
    }
}

/// Agent lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Created, background task not yet scheduled.
    Idle,
    /// Waiting for the next tick.
    Scheduled,
    /// A renewal attempt is in flight.
    Running,
    /// Waiting for the next tick with at least one recent failure.
    BackingOff,
    /// Timer cleared; the agent will not run again.
    Stopped,
}

struct AgentInner {
    client: GatewayClient,
    config: RenewalConfig,
    state: Mutex<AgentState>,
    failures: AtomicU32,
    in_flight: AtomicBool,
    cancel: CancellationToken,
}

/// Handle to the background renewal task.
pub struct RenewalAgent {
    inner: Arc<AgentInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RenewalAgent {
    /// Spawn the agent. Must be called within a tokio runtime.
    pub fn start(client: GatewayClient, config: RenewalConfig) -> Self {
        let inner = Arc::new(AgentInner {
            client,
            config,
            state: Mutex::new(AgentState::Idle),
            failures: AtomicU32::new(0),
            in_flight: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        });
        let task_inner = inner.clone();
        let handle = tokio::spawn(run(task_inner));
        Self {
            inner,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn state(&self) -> AgentState {
        *self.inner.state.lock().unwrap()
    }

    pub fn failures(&self) -> u32 {
        self.inner.failures.load(Ordering::SeqCst)
    }

    /// Trigger one renewal attempt outside the schedule. Returns `false`
    /// when suppressed because another attempt is already in flight.
    pub async fn renew_now(&self) -> bool {
        attempt(&self.inner).await
    }

    /// Stop the agent and wait for its task to finish.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        set_state(&self.inner, AgentState::Stopped);
    }
}

fn set_state(inner: &AgentInner, state: AgentState) {
    *inner.state.lock().unwrap() = state;
}

async fn run(inner: Arc<AgentInner>) {
    set_state(&inner, AgentState::Scheduled);
    tokio::select! {
        _ = inner.cancel.cancelled() => {
            set_state(&inner, AgentState::Stopped);
            return;
        }
        _ = tokio::time::sleep(inner.config.initial_delay) => {}
    }

    loop {
        attempt(&inner).await;
        if inner.cancel.is_cancelled() {
            break;
        }
        let next = if inner.failures.load(Ordering::SeqCst) > 0 {
            AgentState::BackingOff
        } else {
            AgentState::Scheduled
        };
        set_state(&inner, next);
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = tokio::time::sleep(inner.config.interval) => {}
        }
    }
    set_state(&inner, AgentState::Stopped);
}

/// One renewal attempt. Returns `false` when suppressed by an attempt
/// already in flight or a missing session user.
async fn attempt(inner: &AgentInner) -> bool {
    if inner.in_flight.swap(true, Ordering::SeqCst) {
        debug!("renewal already in flight, skipping");
        return false;
    }

    if inner.client.session().get().is_none() {
        info!("no session user, stopping renewal agent");
        inner.cancel.cancel();
        inner.in_flight.store(false, Ordering::SeqCst);
        return false;
    }

    set_state(inner, AgentState::Running);
    match inner.client.renew_token().await {
        Ok(_) => {
            inner.failures.store(0, Ordering::SeqCst);
            debug!("access token renewed");
        }
        Err(e) => {
            let failures = inner.failures.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(failures, error = %e, "token renewal failed");
            if failures >= inner.config.max_failures {
                escalate(inner).await;
            }
        }
    }
    inner.in_flight.store(false, Ordering::SeqCst);
    true
}

/// Second step of the escalation: ask the session endpoint directly, and
/// only force a logout when it also reports the session invalid.
async fn escalate(inner: &AgentInner) {
    match inner.client.check_session().await {
        Ok(resp) if resp.valid => {
            info!("session still valid after renewal failures, resetting counter");
            inner.failures.store(0, Ordering::SeqCst);
        }
        Ok(_) | Err(_) => {
            warn!("session invalid after repeated renewal failures, logging out");
            if let Err(e) = inner.client.logout().await {
                debug!(error = %e, "logout call failed");
            }
            inner.cancel.cancel();
        }
    }
}
