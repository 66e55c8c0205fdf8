//! # Access Gate
//!
//! Bounded poll for Telegram init data followed by a single access check.
//!
//! ```text
//! Waiting{1} -> ... -> Waiting{n} -> Checking -> Granted | Denied
//!      \__________ attempts exhausted ________/-> NoInit
//! ```
//!
//! A 401 "Missing init data" from the check means the host has not attached
//! init data yet; the gate goes back to waiting while attempts remain.

use std::rc::Rc;

use async_trait::async_trait;
use log::{debug, info, warn};
use shared::AccessStatus;

use crate::config::ClientConfig;
use crate::io::{ApiClient, ApiError, InitDataSource};
use crate::stores::{Store, SubscriptionId};

const DENIED_REASON: &str = "Access denied";

#[derive(Debug, Clone, PartialEq)]
pub enum AccessState {
    /// Polling for init data; `attempt` counts from 1
    Waiting { attempt: u32 },
    Checking,
    Granted { is_admin: bool },
    /// `reason` is only shown in debug builds of the UI
    Denied { reason: String },
    /// Init data never arrived
    NoInit,
}

impl AccessState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AccessState::Granted { .. } | AccessState::Denied { .. } | AccessState::NoInit
        )
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, AccessState::Granted { .. })
    }
}

/// Timer used between polls
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, ms: u32);
}

/// What to do with the answer of one access check
#[derive(Debug, Clone, PartialEq)]
enum CheckOutcome {
    Done(AccessState),
    KeepWaiting,
}

fn classify(result: Result<AccessStatus, ApiError>, attempts_left: bool) -> CheckOutcome {
    match result {
        Ok(status) if status.access => CheckOutcome::Done(AccessState::Granted {
            is_admin: status.is_admin,
        }),
        Ok(_) => CheckOutcome::Done(AccessState::Denied {
            reason: DENIED_REASON.to_string(),
        }),
        Err(e) if e.is_missing_init_data() => {
            if attempts_left {
                CheckOutcome::KeepWaiting
            } else {
                CheckOutcome::Done(AccessState::NoInit)
            }
        }
        Err(e) => CheckOutcome::Done(AccessState::Denied {
            reason: e.to_string(),
        }),
    }
}

pub struct AccessGate {
    api: ApiClient,
    init_data: Rc<dyn InitDataSource>,
    sleeper: Rc<dyn Sleeper>,
    poll_interval_ms: u32,
    max_attempts: u32,
    state: Store<AccessState>,
}

impl AccessGate {
    pub fn new(
        api: ApiClient,
        init_data: Rc<dyn InitDataSource>,
        sleeper: Rc<dyn Sleeper>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            init_data,
            sleeper,
            poll_interval_ms: config.access_poll_interval_ms,
            max_attempts: config.access_max_attempts.max(1),
            state: Store::new(AccessState::Waiting { attempt: 1 }),
        }
    }

    pub fn state(&self) -> AccessState {
        self.state.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&AccessState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    fn has_init_data(&self) -> bool {
        self.init_data
            .init_data()
            .is_some_and(|data| !data.trim().is_empty())
    }

    fn transition(&self, next: AccessState) {
        debug!("Access gate: {:?}", next);
        self.state.set(next);
    }

    /// Run the gate to a terminal state
    pub async fn run(&self) -> AccessState {
        let mut attempt = 1;
        loop {
            self.transition(AccessState::Waiting { attempt });

            if !self.has_init_data() {
                if attempt >= self.max_attempts {
                    warn!("No init data after {} attempts", attempt);
                    self.transition(AccessState::NoInit);
                    return AccessState::NoInit;
                }
                self.sleeper.sleep(self.poll_interval_ms).await;
                attempt += 1;
                continue;
            }

            self.transition(AccessState::Checking);
            let result = self.api.access_status().await;
            match classify(result, attempt < self.max_attempts) {
                CheckOutcome::Done(state) => {
                    info!("Access check finished: {:?}", state);
                    self.transition(state.clone());
                    return state;
                }
                CheckOutcome::KeepWaiting => {
                    debug!("Server has no init data yet, polling again");
                    self.sleeper.sleep(self.poll_interval_ms).await;
                    attempt += 1;
                }
            }
        }
    }
}
